//! Positional scope resolution.
//!
//! Variables and getters are placed by their position in the document rather
//! than by nesting. Per name, a [`VariableChain`] keeps the variables in
//! reading order; a getter reads the closest variable at or before it. Index 0
//! of each chain is the import variable, standing for the binding inherited
//! from outside the block.

pub mod chain;
pub mod events;
pub mod getter;
mod resolver;
pub mod variable;

pub use chain::VariableChain;
pub use events::{EventQueue, Outcome, ScopeEvent};
pub use getter::{Getter, GetterId};
pub use resolver::{ChainView, ScopeResolver};
pub use variable::{Variable, VariableId};
