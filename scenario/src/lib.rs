pub mod error;
pub mod executor;
pub mod model;
pub mod report;

pub use error::{ScenarioDiagnostic, ScenarioError};
pub use executor::{Execution, Handle, execute, execute_source, load_scenario, parse_scenario};
pub use model::{Scenario, Step};
