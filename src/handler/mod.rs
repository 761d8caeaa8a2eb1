//! Request handler module
//!
//! Responsible for request routing dispatch and business logic processing:
//! the search relay, the image proxy, and static file serving.

pub mod proxy;
pub mod router;
pub mod search;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
