/// AWS service seams and their SDK implementations
pub mod acm;
pub mod cloudformation;
pub mod config;
pub mod idempotency;
pub mod metrics;
pub mod response;
pub mod route53;
pub mod stepfunctions;
pub mod store;

pub use acm::*;
pub use cloudformation::*;
pub use config::*;
pub use idempotency::*;
pub use metrics::*;
pub use response::*;
pub use route53::*;
pub use stepfunctions::*;
pub use store::*;
