//! Request handler module
//!
//! Routing dispatch plus the file-serving pipeline: path resolution,
//! directory listings, compression and the orchestrating `FileHandler`.

pub mod compress;
pub mod index;
pub mod resolve;
pub mod router;
pub mod static_files;

// Re-export main entry points
pub use router::handle_request;
pub use static_files::FileHandler;
