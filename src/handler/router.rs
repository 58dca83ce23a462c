//! Request routing dispatch module
//!
//! Single entry point for request processing. Applies the dot-file gate,
//! strips the mount prefix, and decides between four outcomes: delegate to
//! the per-file responder, serve an explicit index file, render a directory
//! listing, or not-found.

use crate::config::AppState;
use crate::handler::{listing, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;

/// Request context handed to the per-file responder
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(ToOwned::to_owned);
    let version = version_label(req.version());

    let ctx = RequestContext {
        path: &path,
        is_head: method == Method::HEAD,
        if_none_match: header_string(&req, "if-none-match"),
        range_header: header_string(&req, "range"),
    };
    let referer = header_string(&req, "referer");
    let user_agent = header_string(&req, "user-agent");

    let mut response = dispatch(&ctx, &method, &state).await;

    if state.config.http.enable_cors {
        response
            .headers_mut()
            .insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.query = query;
        entry.http_version = version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes =
            usize::try_from(response.body().size_hint().lower()).unwrap_or(usize::MAX);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route one request to its outcome
async fn dispatch(
    ctx: &RequestContext<'_>,
    method: &Method,
    state: &AppState,
) -> Response<Full<Bytes>> {
    match *method {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return http::build_options_response(state.config.http.enable_cors),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            return http::build_405_response();
        }
    }

    // Dot-file gate runs before all other routing
    if !state.config.serve.dot && has_dot_segment(ctx.path) {
        return http::build_404_response();
    }

    // Everything served lives under the mount prefix
    let Some(rest) = ctx.path.strip_prefix(state.prefix.as_str()) else {
        return http::build_404_response();
    };
    let url_path = format!("/{rest}");

    // Explicit-index mode serves the named file directly, suppressing the
    // responder's redirect from /dir/index.html to /dir/
    if state.config.serve.explicit_index && url_path.ends_with("/index.html") {
        let Some(fs_path) = static_files::resolve_path(&state.root, &url_path) else {
            return http::build_404_response();
        };
        return static_files::serve_file(ctx, &fs_path).await;
    }

    if !url_path.ends_with('/') {
        // A file path. SPA mode substitutes the root index for absent entries.
        if state.config.serve.spa {
            match static_files::resolve_path(&state.root, &url_path) {
                Some(fs_path) => {
                    if let Err(e) = fs::metadata(&fs_path).await {
                        if e.kind() == ErrorKind::NotFound {
                            return static_files::serve_file(ctx, &state.root.join("index.html"))
                                .await;
                        }
                    }
                }
                None => return http::build_404_response(),
            }
        }
        return static_files::serve(ctx, &state.root, &url_path).await;
    }

    // A directory path
    let Some(dir_path) = static_files::resolve_path(&state.root, &url_path) else {
        return http::build_404_response();
    };
    match listing::list(state, &url_path, &dir_path).await {
        listing::ListOutcome::Delegate => static_files::serve(ctx, &state.root, &url_path).await,
        listing::ListOutcome::View(view) => {
            http::build_html_response(listing::render(&view), ctx.is_head)
        }
        listing::ListOutcome::NotFound => http::build_404_response(),
        listing::ListOutcome::Error(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {e}",
                dir_path.display()
            ));
            http::build_500_response(&e.to_string())
        }
    }
}

/// True when any path segment starts with '.'
fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct TestServer {
        state: AppState,
    }

    fn server(dir: &str) -> TestServer {
        TestServer::new(dir, "/")
    }

    impl TestServer {
        fn new(dir: &str, prefix: &str) -> Self {
            let config: Config = serde_json::from_value(serde_json::json!({
                "server": { "host": "127.0.0.1", "port": 4000, "workers": null },
                "serve": {
                    "dir": dir,
                    "prefix": prefix,
                    "dot": false,
                    "explicit_index": false,
                    "spa": false
                },
                "logging": { "level": "info", "access_log": false },
                "http": { "enable_cors": false },
                "performance": {
                    "keep_alive_timeout": 75,
                    "read_timeout": 30,
                    "write_timeout": 30
                }
            }))
            .unwrap();
            Self {
                state: AppState::new(config).unwrap(),
            }
        }

        fn dot(mut self, dot: bool) -> Self {
            self.state.config.serve.dot = dot;
            self
        }

        fn explicit_index(mut self, on: bool) -> Self {
            self.state.config.serve.explicit_index = on;
            self
        }

        fn spa(mut self, on: bool) -> Self {
            self.state.config.serve.spa = on;
            self
        }

        async fn get(&self, path: &str) -> Response<Full<Bytes>> {
            let ctx = RequestContext {
                path,
                is_head: false,
                if_none_match: None,
                range_header: None,
            };
            dispatch(&ctx, &Method::GET, &self.state).await
        }
    }

    fn content_type(response: &Response<Full<Bytes>>) -> &str {
        response
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn location(response: &Response<Full<Bytes>>) -> &str {
        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serve_index() {
        let response = server("testdata/root").get("/").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        let body = body_string(response).await;
        assert!(body.contains("<title>Index of root</title>"));
    }

    #[tokio::test]
    async fn test_serve_index_with_prefix() {
        let response = TestServer::new("testdata/root", "/foo/bar/")
            .get("/foo/bar/")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        let body = body_string(response).await;
        assert!(body.contains("<title>Index of root</title>"));
    }

    #[tokio::test]
    async fn test_serve_with_prefix_not_found() {
        let response = TestServer::new("testdata/root", "/foo/bar/").get("/").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_serve_file() {
        let response = server("testdata/root").get("/file.txt").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/plain; charset=utf-8");
        assert_eq!(body_string(response).await, "root/file.txt\n");
    }

    #[tokio::test]
    async fn test_serve_file_with_prefix() {
        let server = TestServer::new("testdata/root", "/some/prefix/");
        let response = server.get("/some/prefix/file.txt").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/plain; charset=utf-8");
        assert_eq!(body_string(response).await, "root/file.txt\n");
    }

    #[tokio::test]
    async fn test_serve_file_with_prefix_not_found() {
        let response = TestServer::new("testdata/root", "/some/prefix/")
            .get("/file.txt")
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_serve_css() {
        let response = server("testdata/root").get("/style.css").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn test_serve_sub_index() {
        let response = server("testdata/root").get("/sub/").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        let body = body_string(response).await;
        assert!(body.contains("<title>Index of root/sub</title>"));
    }

    #[tokio::test]
    async fn test_serve_sub_index_redirect() {
        let response = server("testdata/root").get("/sub/index.html").await;
        assert_eq!(response.status(), 301);
        assert_eq!(location(&response), "./");
    }

    #[tokio::test]
    async fn test_serve_sub_dir_redirect() {
        let response = server("testdata/root").get("/sub").await;
        assert_eq!(response.status(), 301);
        assert_eq!(location(&response), "sub/");
    }

    #[tokio::test]
    async fn test_serve_sub_file() {
        let response = server("testdata/root").get("/sub/file.txt").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/plain; charset=utf-8");
        assert_eq!(body_string(response).await, "root/sub/file.txt\n");
    }

    #[tokio::test]
    async fn test_serve_sub_file_prefix() {
        let response = TestServer::new("testdata/root", "some/prefix")
            .get("/some/prefix/sub/file.txt")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/plain; charset=utf-8");
        assert_eq!(body_string(response).await, "root/sub/file.txt\n");
    }

    #[tokio::test]
    async fn test_serve_custom_index() {
        let response = server("testdata/root-with-index").get("/").await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(body_string(response).await, "root-with-index/index.html\n");
    }

    #[tokio::test]
    async fn test_serve_custom_sub_index() {
        let response = server("testdata/root-with-index")
            .get("/sub-with-index/")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(
            body_string(response).await,
            "root-with-index/sub-with-index/index.html\n"
        );
    }

    #[tokio::test]
    async fn test_serve_explicit_index_not_in_path() {
        let response = server("testdata/root-with-index")
            .explicit_index(true)
            .get("/")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        let body = body_string(response).await;
        assert!(body.contains("<title>Index of root-with-index</title>"));
    }

    #[tokio::test]
    async fn test_serve_explicit_index_in_path() {
        let response = server("testdata/root-with-index")
            .explicit_index(true)
            .get("/index.html")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(body_string(response).await, "root-with-index/index.html\n");
    }

    #[tokio::test]
    async fn test_serve_explicit_index_absent() {
        let response = server("testdata/root")
            .explicit_index(true)
            .get("/index.html")
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_dot_file_hidden_by_default() {
        let response = server("testdata/root").get("/.hidden.txt").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_dot_file_served_when_enabled() {
        let response = server("testdata/root").dot(true).get("/.hidden.txt").await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "root/.hidden.txt\n");
    }

    #[tokio::test]
    async fn test_spa_fallback_for_missing_path() {
        let response = server("testdata/root-with-index")
            .spa(true)
            .get("/app/route")
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(body_string(response).await, "root-with-index/index.html\n");
    }

    #[tokio::test]
    async fn test_spa_with_explicit_index_precedence() {
        // Explicit-index handling applies only to paths literally ending in
        // /index.html; any other absent file still gets the SPA fallback.
        let server = server("testdata/root-with-index").spa(true).explicit_index(true);

        let response = server.get("/app/route").await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "root-with-index/index.html\n");

        let response = server.get("/missing/index.html").await;
        assert_eq!(response.status(), 404);

        let response = server.get("/index.html").await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "root-with-index/index.html\n");
    }

    #[tokio::test]
    async fn test_spa_existing_file_unaffected() {
        let response = server("testdata/root").spa(true).get("/file.txt").await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "root/file.txt\n");
    }

    #[tokio::test]
    async fn test_missing_file_404() {
        let response = server("testdata/root").get("/missing.txt").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let response = server("testdata/root").get("/../Cargo.toml").await;
        assert_eq!(response.status(), 404);
    }
}
