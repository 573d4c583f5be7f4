pub mod alma;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod transport;

pub use alma::{AlmaApi, AlmaClient};
pub use config::AppConfig;
pub use error::{AlmaError, ConfigError, SapError, TransportError};
pub use service::{InvoiceProcess, ProcessOutcome, RunOrchestrator, SequenceManager};
