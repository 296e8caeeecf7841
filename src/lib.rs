pub mod contact;
pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod utils;

// Re-export common items
pub use error::CheckerError;
pub use report::generate_report;
pub use runner::{run_checks, ContractChecker, Endpoint, ScenarioResult};
pub use scenario::{BodyCheck, Payload, Scenario, ScenarioBuilder, Suite};
