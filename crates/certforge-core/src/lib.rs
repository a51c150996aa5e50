/// Certforge Core - Shared library for the DNS validated certificate
/// custom resources
///
/// This crate contains the certificate lifecycle, the DNS change machinery
/// and the handlers behind the `DnsCertificate` and
/// `DnsCertificateRecordSetGroup` Lambda functions.
pub mod certificate;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use error::CertforgeError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
