/// Utility modules
pub mod arn;
pub mod logging;
pub mod poll;
pub mod retry;

pub use arn::*;
pub use logging::*;
pub use poll::*;
pub use retry::*;
