//! Static resource responder.
//!
//! Maps a request target onto a file under the resource root and builds the
//! full response for it. The file is read exactly once per request; both
//! the declared `Content-Length` and the body come from that single read, so
//! a file changing underneath cannot make them disagree.

use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::config::StaticFilesConfig;
use crate::http::mime::{self, FALLBACK_CONTENT_TYPE};
use crate::http::response::{http_date, Response, ResponseBuilder, StatusCode};

/// A file under the resource root as observed at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: PathBuf,
    pub exists: bool,
    contents: Vec<u8>,
}

impl Resource {
    fn absent(path: PathBuf) -> Self {
        Self { path, exists: false, contents: Vec::new() }
    }

    /// Size in bytes; 0 when the file does not exist.
    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Only non-empty files are served. An empty file answers 404 just
    /// like a missing one.
    pub fn is_servable(&self) -> bool {
        self.exists && !self.contents.is_empty()
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self { root: root.into(), index: index.into() }
    }

    pub fn from_config(cfg: &StaticFilesConfig) -> Self {
        Self::new(cfg.root.clone(), cfg.index.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a request target to a path under the root.
    ///
    /// Query and fragment are dropped and an empty path selects the index
    /// document. Returns `None` for targets that would leave the root
    /// (`..`, absolute or prefixed components).
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let path_part = target.split(&['?', '#'][..]).next().unwrap_or("");
        let relative = path_part.strip_prefix('/').unwrap_or(path_part);
        let relative = if relative.is_empty() { self.index.as_str() } else { relative };

        let mut path = self.root.clone();
        for comp in Path::new(relative).components() {
            match comp {
                Component::Normal(segment) => path.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }

    /// Reads the file at `path` in one pass.
    ///
    /// Missing files, directories and anything else that is not a regular
    /// file come back as an absent resource. A regular file that cannot be
    /// read is an error.
    pub async fn fetch(&self, path: PathBuf) -> anyhow::Result<Resource> {
        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Resource { path, exists: true, contents }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Resource::absent(path)),
            Err(e) => match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    Err(e).with_context(|| format!("failed to read {}", path.display()))
                }
                _ => Ok(Resource::absent(path)),
            },
        }
    }

    /// Builds the GET response for `target`, stamped with `at`.
    pub async fn respond(&self, target: &str, at: SystemTime) -> Response {
        let resource = match self.resolve(target) {
            Some(path) => match self.fetch(path).await {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::error!(path = %target, error = %e, "Failed to read resource");
                    return Response::empty(StatusCode::InternalServerError, at);
                }
            },
            None => {
                tracing::warn!(path = %target, "Rejected target outside resource root");
                Resource::absent(self.root.clone())
            }
        };

        Self::build_response(resource, at)
    }

    fn build_response(resource: Resource, at: SystemTime) -> Response {
        let (status, content_type) = if resource.is_servable() {
            (StatusCode::Ok, mime::content_type_for(&resource.path))
        } else {
            (StatusCode::NotFound, FALLBACK_CONTENT_TYPE)
        };

        let body = if status == StatusCode::Ok { resource.into_contents() } else { Vec::new() };

        ResponseBuilder::new(status)
            .header("Date", http_date(at))
            .header("Content-Length", body.len().to_string())
            .header("Content-Type", content_type)
            .header("Connection", "close")
            .body(body)
            .build()
    }
}
