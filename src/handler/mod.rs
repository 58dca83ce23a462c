//! Request handler module
//!
//! Routing decisions, directory listings, and the raw per-file responder.

pub mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
