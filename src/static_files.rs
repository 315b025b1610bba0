//! Static File Responder
//!
//! Maps request paths to files under a fixed root. `/` serves the index
//! document; every other path maps 1:1 onto the root. The content type table
//! is deliberately narrow: `.css` is `text/css`, anything else is `text/html`.
//!
//! Paths that try to leave the root (`..` segments, absolute components) are
//! refused and answered like any other missing file.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A file ready to be sent
#[derive(Debug, Clone)]
pub struct StaticFile {
    /// Resolved location on disk
    pub path: PathBuf,
    /// `Content-Type` header value
    pub content_type: &'static str,
    /// File contents
    pub body: Vec<u8>,
}

impl IntoResponse for StaticFile {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Errors from static file lookup
///
/// All of them reach the client as a plain 404.
#[derive(Debug, Error)]
pub enum StaticError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("path escapes static root: {0}")]
    Traversal(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntoResponse for StaticError {
    fn into_response(self) -> Response {
        match &self {
            StaticError::Traversal(_) => tracing::warn!(error = %self, "Refused static path"),
            _ => tracing::info!(error = %self, "File not found"),
        }

        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "Not found",
        )
            .into_response()
    }
}

/// Resolves request paths against a static root
#[derive(Debug, Clone)]
pub struct StaticResponder {
    root: PathBuf,
    index_document: PathBuf,
}

impl StaticResponder {
    /// Create a responder serving `root`, with `index_document` (relative to `root`) for `/`
    pub fn new(root: impl Into<PathBuf>, index_document: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_document: index_document.into(),
        }
    }

    /// Map a request path to a location under the root
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, StaticError> {
        if request_path == "/" || request_path.is_empty() {
            return Ok(self.root.join(&self.index_document));
        }

        let decoded = urlencoding::decode(request_path)
            .map_err(|_| StaticError::NotFound(PathBuf::from(request_path)))?;
        let relative = decoded.strip_prefix('/').unwrap_or(&*decoded);

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StaticError::Traversal(request_path.to_string()));
                }
            }
        }
        Ok(resolved)
    }

    /// Look up and read the file for `request_path`
    pub async fn lookup(&self, request_path: &str) -> Result<StaticFile, StaticError> {
        let path = self.resolve(request_path)?;
        tracing::debug!(request_path, path = ?path, "Serving file");

        let body = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StaticError::NotFound(path.clone()),
            _ => StaticError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        let content_type = content_type_for(&path);
        tracing::debug!(path = ?path, content_type, bytes = body.len(), "File served");

        Ok(StaticFile {
            path,
            content_type,
            body,
        })
    }
}

/// Guess a content type from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css",
        _ => "text/html",
    }
}
