//! HTTP protocol layer module
//!
//! Caching validators, byte ranges, content types and response builders,
//! decoupled from the file-serving logic that drives them.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use cache::{CacheOutcome, CachePolicy, CacheValidators};
pub use range::{ByteRange, RangeOutcome};
pub use response::{build_304_response, build_416_response, build_error_response, FileHeaders};
