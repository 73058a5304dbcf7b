pub mod action;
pub mod adf;
pub mod approval;
pub mod config;
pub mod enforcement;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod orchestrator;
pub mod request;
pub mod severity;
pub mod ticketing;

pub use error::{RemedyError, Result};
pub use orchestrator::Orchestrator;
