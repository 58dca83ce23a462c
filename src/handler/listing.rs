//! Directory listing module
//!
//! Builds the listing data model for a directory request and renders it as
//! HTML. Also decides when an implicit `index.html` must take precedence over
//! browsing, in which case the request is delegated to the per-file responder.

use crate::config::AppState;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Kind of a listed filesystem child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// One filesystem child as shown in a listing
#[derive(Debug, Clone)]
pub struct Entry {
    /// Base name
    pub name: String,
    /// Absolute URL path, mount prefix included, trailing '/' iff directory
    pub url_path: String,
    pub kind: EntryKind,
}

/// Data handed to the listing renderer, rebuilt on every request
#[derive(Debug)]
pub struct ListingView {
    /// Display name of the listed directory, root labeled with the
    /// served directory's base name
    pub label: String,
    /// Breadcrumb entries from the mount root down, root first
    pub parents: Vec<Entry>,
    /// Sorted children, synthetic `..` first when not at the mount root
    pub entries: Vec<Entry>,
}

/// Outcome of a directory request
#[derive(Debug)]
pub enum ListOutcome {
    /// An implicit index.html exists, hand the request to the per-file responder
    Delegate,
    /// Render this listing
    View(ListingView),
    /// Directory does not exist
    NotFound,
    /// Unexpected read failure, surfaces as 500
    Error(std::io::Error),
}

/// Join URL path parts into one absolute path, resolving `.` and `..`
/// segments and collapsing repeated separators
fn join_url(parts: &[&str]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        for segment in part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Append a trailing slash for directory URLs, without doubling the root
fn with_trailing_slash(mut url: String) -> String {
    if url != "/" {
        url.push('/');
    }
    url
}

/// Build the listing outcome for the directory at `dir_path`
///
/// `url_path` is the prefix-stripped request path and always ends with '/'.
/// The delegate decision depends only on membership of `index.html` among the
/// surviving children, never on scan order.
pub async fn list(state: &AppState, url_path: &str, dir_path: &Path) -> ListOutcome {
    let mut reader = match fs::read_dir(dir_path).await {
        Ok(r) => r,
        Err(e) if e.kind() == ErrorKind::NotFound => return ListOutcome::NotFound,
        Err(e) => return ListOutcome::Error(e),
    };

    let serve = &state.config.serve;
    let mut has_index = false;
    let mut entries: Vec<Entry> = Vec::new();

    loop {
        let item = match reader.next_entry().await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(e) => return ListOutcome::Error(e),
        };

        let name = item.file_name().to_string_lossy().into_owned();
        if !serve.dot && name.starts_with('.') {
            continue;
        }

        let is_dir = match item.file_type().await {
            Ok(t) => t.is_dir(),
            Err(e) => return ListOutcome::Error(e),
        };

        let url = join_url(&[&state.prefix, url_path, &name]);
        if is_dir {
            entries.push(Entry {
                name,
                url_path: format!("{url}/"),
                kind: EntryKind::Folder,
            });
        } else {
            if name == "index.html" {
                has_index = true;
            }
            entries.push(Entry {
                name,
                url_path: url,
                kind: EntryKind::File,
            });
        }
    }

    if has_index && !serve.explicit_index {
        return ListOutcome::Delegate;
    }

    // Folders before files, then ascending by name
    entries.sort_by(|a, b| match (a.kind, b.kind) {
        (EntryKind::Folder, EntryKind::File) => std::cmp::Ordering::Less,
        (EntryKind::File, EntryKind::Folder) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });

    if url_path != "/" {
        entries.insert(
            0,
            Entry {
                name: "..".to_string(),
                url_path: join_url(&[&state.prefix, url_path, ".."]),
                kind: EntryKind::Folder,
            },
        );
    }

    ListOutcome::View(ListingView {
        label: format!("{}{}", state.root_label, url_path.trim_end_matches('/')),
        parents: build_parents(state, url_path),
        entries,
    })
}

/// Breadcrumb entries for every segment above the listed directory
///
/// The mount-root segment is labeled with the served directory's base name
/// instead of the empty string.
fn build_parents(state: &AppState, url_path: &str) -> Vec<Entry> {
    let mut parts: Vec<&str> = url_path.split('/').collect();
    parts.pop();

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let name = if part.is_empty() {
                state.root_label.clone()
            } else {
                (*part).to_string()
            };
            Entry {
                name,
                url_path: with_trailing_slash(join_url(&[&state.prefix, &parts[..=i].join("/")])),
                kind: EntryKind::Folder,
            }
        })
        .collect()
}

/// Escape text for inclusion in HTML body or attribute values
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render a listing view as a full HTML page
pub fn render(view: &ListingView) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Index of {}</title>\n", escape_html(&view.label)));
    html.push_str(
        "<style>\n\
         body { font-family: -apple-system, \"Segoe UI\", Roboto, sans-serif; margin: 2em; }\n\
         h1 { font-size: 1.3em; }\n\
         h1 a { text-decoration: none; }\n\
         ul { list-style: none; padding-left: 1em; }\n\
         li { line-height: 1.6; }\n\
         li.folder a { font-weight: 600; }\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str("<h1>");
    for (i, parent) in view.parents.iter().enumerate() {
        if i > 0 {
            html.push('/');
        }
        html.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&parent.url_path),
            escape_html(&parent.name)
        ));
    }
    html.push_str("</h1>\n<ul>\n");

    for entry in &view.entries {
        let (class, suffix) = match entry.kind {
            EntryKind::Folder => ("folder", "/"),
            EntryKind::File => ("file", ""),
        };
        let suffix = if entry.name == ".." { "" } else { suffix };
        html.push_str(&format!(
            "<li class=\"{class}\"><a href=\"{}\">{}{suffix}</a></li>\n",
            escape_html(&entry.url_path),
            escape_html(&entry.name)
        ));
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    html
}
