//! Static file serving from the root directory.
//!
//! Files themselves go through `tower_http::services::ServeDir`, which
//! answers files, `index.html` for directories and 405 for anything but
//! GET/HEAD. Whatever it cannot find lands in [`list_directory`].

use std::{
    fmt::Write as _,
    path::{Component, Path, PathBuf},
};

use axum::{
    extract::State,
    http::{header, Uri},
    response::{IntoResponse, Response},
};

use crate::{error::AppError, AppState};

/// Renders an HTML index for a directory that has no `index.html`.
///
/// Only paths ending in `/` are listed; `ServeDir` has already redirected
/// bare directory paths to that form. Anything else is a 404.
pub async fn list_directory(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, AppError> {
    let display_path = urlencoding::decode(uri.path()).map_err(|_| AppError::NotFound)?;
    if !display_path.ends_with('/') {
        return Err(AppError::NotFound);
    }

    let dir = state.root.join(relative_path(&display_path)?);
    let is_dir = tokio::fs::metadata(&dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(AppError::NotFound);
    }

    let entries = read_entries(&dir).await?;
    tracing::debug!(path = %display_path, count = entries.len(), "Listing directory");

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        render_listing(&display_path, &entries),
    )
        .into_response())
}

/// Maps a decoded request path onto a path relative to the root, refusing
/// anything that could step outside it.
fn relative_path(request_path: &str) -> Result<PathBuf, AppError> {
    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(AppError::NotFound),
        }
    }
    Ok(relative)
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    is_dir: bool,
}

async fn read_entries(dir: &Path) -> Result<Vec<Entry>, AppError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(AppError::ListingDenied)?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(AppError::ListingDenied)?
    {
        // Follows symlinks, so a link to a directory lists as a directory.
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort_by_key(|entry| entry.name.to_lowercase());
    Ok(entries)
}

fn render_listing(display_path: &str, entries: &[Entry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        let slash = if entry.is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}{slash}\">{}{slash}</a></li>",
            urlencoding::encode(&entry.name),
            escape_html(&entry.name),
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
