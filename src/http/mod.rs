//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the router and the per-file
//! responder: response builders, MIME lookup, ETag handling and Range parsing.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used builders
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_500_response, build_html_response, build_options_response, build_redirect_response,
};
