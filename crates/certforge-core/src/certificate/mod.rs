/// Certificate domain logic: name checks, record generation, DNS change
/// execution and the certificate lifecycle
pub mod changes;
pub mod domain;
pub mod executor;
pub mod lifecycle;
pub mod request;

pub use changes::{GenerationPolicy, caa_value, generate};
pub use executor::DnsChangeExecutor;
pub use lifecycle::{CertificateManager, UpdateOutcome, needs_replacement};
pub use request::{resolve_certificate_request, resolve_hosted_zone};
