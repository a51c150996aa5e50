/// Data models for certforge
pub mod certificate;
pub mod dns;
pub mod events;
pub mod properties;
pub mod response;

// Re-export commonly used types
pub use certificate::*;
pub use dns::*;
pub use events::*;
pub use properties::*;
pub use response::*;
