//! Routing module
//!
//! Request path rewriting applied before file resolution.

mod vhost;

pub use vhost::{host_label, vhost_path_rewriter, PathRewrite, INVALID_HOST};
