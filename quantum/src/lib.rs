pub mod document;
pub mod error;
pub mod ordered;
pub mod position;
pub mod scope;
pub mod value;

pub use error::ScopeError;
pub use position::{Offset, Position};
pub use scope::{GetterId, ScopeResolver, VariableId};
pub use value::{Data, Value};
