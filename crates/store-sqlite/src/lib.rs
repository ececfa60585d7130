mod error;
mod hosts;
mod models;
mod open;
mod results;
mod scans;
mod schema;
mod targets;

pub use error::StoreError;
pub use models::*;
pub use open::Db;
pub use results::{FailureReport, SuccessReport};
