pub mod cache;
pub mod classifier;
pub mod ledger;
pub mod orchestrator;
pub mod parser;
pub mod process;
pub mod report;
pub mod sap_file;
pub mod sequence;

#[cfg(test)]
pub(crate) mod fake;

pub use cache::{ValidationCache, VendorResolution};
pub use orchestrator::RunOrchestrator;
pub use parser::{retrieve_sorted_invoices, FundResolution, InvoiceParser};
pub use process::{InvoiceProcess, ProcessOutcome};
pub use sequence::SequenceManager;
