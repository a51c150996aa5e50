/// Lambda event handlers
pub mod certificate_check;
pub mod common;
pub mod dns_certificate;
pub mod record_set_group;

pub use certificate_check::{CheckOutcome, CompletionChecker};
pub use dns_certificate::{CertificateEventDispatcher, DeliveryOutcome};
pub use record_set_group::{RecordSetGroup, RecordSetGroupHandler};
