//! Raw per-file responder
//!
//! The delegate target of the router: serves individual files with MIME
//! detection, `ETag` and Range support, and issues the canonical redirects
//! for directories requested without a trailing slash and for paths naming
//! `index.html` explicitly.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Resolve a URL path to a filesystem path under `root`
///
/// Rejects any path with a `..` segment so a request can never escape the
/// served directory. Returns None for paths that must be treated as absent.
pub fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => resolved.push(s),
        }
    }
    Some(resolved)
}

/// Serve a request the router delegated: a plain file, a directory redirect,
/// or a directory's implicit `index.html`
pub async fn serve(
    ctx: &RequestContext<'_>,
    root: &Path,
    url_path: &str,
) -> Response<Full<Bytes>> {
    // The canonical location of /dir/index.html is /dir/; redirect rather
    // than serve the same content under two URLs.
    if url_path.ends_with("/index.html") {
        return http::build_redirect_response("./");
    }

    let Some(fs_path) = resolve_path(root, url_path) else {
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&fs_path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return http::build_404_response(),
        Err(e) => return http::build_500_response(&e.to_string()),
    };

    if metadata.is_dir() {
        if !url_path.ends_with('/') {
            let name = url_path.rsplit('/').next().unwrap_or_default();
            return http::build_redirect_response(&format!("{name}/"));
        }
        // Directory request delegated back to us: the implicit index exists
        return serve_file(ctx, &fs_path.join("index.html")).await;
    }

    serve_file(ctx, &fs_path).await
}

/// Serve the bytes of one file with conditional-GET and Range handling
///
/// 404 when the file does not exist, 500 with the error text for any other
/// read failure.
pub async fn serve_file(ctx: &RequestContext<'_>, fs_path: &Path) -> Response<Full<Bytes>> {
    let content = match fs::read(fs_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return http::build_404_response(),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                fs_path.display()
            ));
            return http::build_500_response(&e.to_string());
        }
    };

    let content_type = mime::get_content_type(fs_path.extension().and_then(|e| e.to_str()));
    build_content_response(ctx, content, content_type)
}

/// Build the response for loaded file content
fn build_content_response(
    ctx: &RequestContext<'_>,
    content: Vec<u8>,
    content_type: &str,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&content);
    let total_size = content.len();

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);
            let body = Bytes::from(content[start..=end].to_vec());
            http::response::build_partial_response(
                body,
                content_type,
                &etag,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            http::response::build_file_response(Bytes::from(content), content_type, &etag, ctx.is_head)
        }
    }
}
