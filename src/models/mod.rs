pub mod amount;
pub mod country;
pub mod fund;
pub mod invoice;
pub mod sap;
pub mod vendor;

pub use fund::{FundAllocation, FundRecord, FundSearchResponse};
pub use invoice::{
    CodeValue, InvoiceField, InvoiceType, MultibyteOccurrence, NormalizedInvoice,
    ProblemMarkers, RawFundDistribution, RawInvoiceLine, RawInvoiceLines, RawInvoiceRecord,
    SAP_PAYMENT_METHOD,
};
pub use sap::{PaymentOutcome, RunMode, RunResult, SapFileSet};
pub use vendor::{ContactInfo, RawAddress, VendorAddress, VendorInfo, VendorRecord};
