//! HTTP upload shell around [`generate`](crate::generate).
//!
//! `POST /upload` takes a multipart form whose `folder` parts carry files with
//! their relative paths as file names (what a browser sends for a directory
//! picker). The files are written to a fresh `<upload_root>/<uuid>/upload/`
//! directory, the document is generated to `<output_root>/<uuid>.md`, and both
//! are deleted before the response is returned. Requests never share paths.

use crate::cli::ServerConfig;
use crate::error::{GenerateError, find_generate_error};
use crate::generate;
use anyhow::{Context, Result};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Multipart field holding the uploaded files.
pub const FOLDER_FIELD: &str = "folder";

/// File name offered to the client for the generated document.
pub const DOWNLOAD_NAME: &str = "output.md";

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

/// Errors returned to the client as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No folder was uploaded.")]
    NoFolder,

    #[error("No file was selected.")]
    NoFiles,

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("File not found: {0}.")]
    MissingFile(String),

    #[error("Error processing folder: {0}")]
    Processing(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Maps a generation failure; missing paths are reported relative to `base`.
    fn from_generate(err: &anyhow::Error, base: &Path) -> Self {
        match find_generate_error(err).and_then(GenerateError::missing_path) {
            Some(path) => {
                let shown = path.strip_prefix(base).unwrap_or(path);
                ApiError::MissingFile(shown.display().to_string())
            }
            None => ApiError::Processing(format!("{err:#}")),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/test", get(health))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState {
            config: Arc::new(config),
        })
}

/// Creates the upload and output roots, then serves until the process stops.
pub async fn serve(config: ServerConfig) -> Result<()> {
    for dir in [&config.upload_root, &config.output_root] {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(config))
        .await
        .context("Server stopped with an error")
}

async fn health() -> &'static str {
    "ok"
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Not a multipart upload: {rejection}");
        ApiError::NoFolder
    })?;

    let upload = UploadDir::new(&state.config);
    let result = process_upload(&state.config, &upload, multipart).await;
    upload.cleanup().await;

    match result {
        Ok(markdown) => Ok(markdown_attachment(markdown)),
        Err(err) => {
            if err.status().is_server_error() {
                error!("Upload {} failed: {err}", upload.id);
            } else {
                warn!("Upload {} rejected: {err}", upload.id);
            }
            Err(err)
        }
    }
}

async fn process_upload(
    config: &ServerConfig,
    upload: &UploadDir,
    multipart: Multipart,
) -> Result<Vec<u8>, ApiError> {
    let files_root = upload.files_root();
    let saved = receive_files(multipart, &files_root).await?;
    info!("Upload {}: received {} files", upload.id, saved.len());

    fs::create_dir_all(&config.output_root).await.map_err(|err| {
        ApiError::Processing(format!(
            "Failed to create {}: {err}",
            config.output_root.display()
        ))
    })?;

    let root = analyzed_root(&files_root, &saved);
    generate(&root, &upload.output)
        .await
        .map_err(|err| ApiError::from_generate(&err, &files_root))?;

    fs::read(&upload.output).await.map_err(|err| {
        ApiError::Processing(format!("Failed to read generated document: {err}"))
    })
}

/// Writes every `folder` part under `files_root`, keeping its relative path.
async fn receive_files(
    mut multipart: Multipart,
    files_root: &Path,
) -> Result<Vec<PathBuf>, ApiError> {
    let mut saw_folder = false;
    let mut saved = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::InvalidUpload(err.body_text()))?
    {
        if field.name() != Some(FOLDER_FIELD) {
            continue;
        }
        saw_folder = true;
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        let rel_path = sanitize_relative(&file_name).ok_or(ApiError::InvalidPath(file_name))?;
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::InvalidUpload(err.body_text()))?;

        let dest = files_root.join(&rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| save_error(&rel_path, err))?;
        }
        fs::write(&dest, &data)
            .await
            .map_err(|err| save_error(&rel_path, err))?;

        debug!("Saved upload: {}", dest.display());
        saved.push(rel_path);
    }

    if !saw_folder {
        return Err(ApiError::NoFolder);
    }
    if saved.is_empty() {
        return Err(ApiError::NoFiles);
    }
    Ok(saved)
}

fn save_error(rel_path: &Path, err: io::Error) -> ApiError {
    ApiError::Processing(format!("Failed to save {}: {err}", rel_path.display()))
}

/// Turns an uploaded file name into a relative path, rejecting absolute
/// paths and `..`.
fn sanitize_relative(file_name: &str) -> Option<PathBuf> {
    let normalized = file_name.replace('\\', "/");
    let mut rel_path = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => rel_path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (!rel_path.as_os_str().is_empty()).then_some(rel_path)
}

/// The folder a browser upload was made from, when all files share one;
/// otherwise the upload directory itself.
fn analyzed_root(files_root: &Path, saved: &[PathBuf]) -> PathBuf {
    let common = saved
        .first()
        .and_then(|path| path.components().next())
        .filter(|first| {
            saved.iter().all(|path| {
                let mut components = path.components();
                components.next() == Some(*first) && components.next().is_some()
            })
        });

    match common {
        Some(folder) => files_root.join(folder),
        None => files_root.to_path_buf(),
    }
}

fn markdown_attachment(body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_NAME}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Paths owned by a single request.
struct UploadDir {
    id: Uuid,
    dir: PathBuf,
    output: PathBuf,
}

impl UploadDir {
    fn new(config: &ServerConfig) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            dir: config.upload_root.join(id.to_string()),
            output: config.output_root.join(format!("{id}.md")),
        }
    }

    fn files_root(&self) -> PathBuf {
        self.dir.join("upload")
    }

    async fn cleanup(&self) {
        clean_upload_dir(&self.dir).await;

        for result in [
            fs::remove_dir(&self.dir).await,
            fs::remove_file(&self.output).await,
        ] {
            match result {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    warn!("Cleanup of upload {} incomplete: {err}", self.id);
                }
                _ => {}
            }
        }
    }
}

/// Deletes everything inside `dir`, keeping `dir` itself.
///
/// Files and symlinks are unlinked, directories removed recursively. Failures
/// are logged and skipped.
pub async fn clean_upload_dir(dir: &Path) {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return,
        Err(err) => {
            warn!("Failed to list {}: {err}", dir.display());
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                warn!("Failed to list {}: {err}", dir.display());
                break;
            }
        };

        let path = entry.path();
        match remove_entry(&path).await {
            Ok(()) => debug!("Removed: {}", path.display()),
            Err(err) => warn!("Failed to remove {}: {err}", path.display()),
        }
    }
}

async fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}
