pub mod error;
pub mod severity;
pub mod value;

pub use error::RelayError;
pub use severity::{SeverityMap, Threshold, DEFAULT_ERROR_RANK};
pub use value::{ArgValue, CapturedError, LogCall};
