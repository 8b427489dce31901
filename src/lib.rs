//! # dirdoc Library
//!
//! This crate turns a directory tree into a single Markdown document with two
//! sections:
//!
//! - **Project Structure**: an indented outline of every non-hidden directory and file
//! - **File Documentation**: the leading comment or docstring of each file that has one
//!
//! Hidden entries (names starting with `.`) are skipped everywhere. Binary files
//! are listed in the outline but never read.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dirdoc::generate;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     generate(Path::new("my-project"), Path::new("my-project.md")).await
//! }
//! ```
//!
//! With the `server` feature (enabled by default) the same document can be
//! produced from a folder uploaded over HTTP, see [`server`].

pub mod cli;
pub mod error;
pub mod extractor;
pub mod filewalker;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;
pub mod writer;

pub use cli::{Config, ServerConfig};
pub use error::GenerateError;
pub use extractor::{extract_docstring, leading_comment};
pub use filewalker::{SourceTree, collect_tree};
pub use utils::FileKind;
pub use writer::MarkdownWriter;

use anyhow::{Context, Result};
use log::info;
use std::io;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::BufWriter;

/// Writes the structure section of `root` to `output`, replacing any previous content.
pub async fn write_structure(root: &Path, output: &Path) -> Result<()> {
    let tree = walk(root).await?;

    let file = File::create(output)
        .await
        .map_err(|err| output_error(err, output))?;
    let mut md_writer = MarkdownWriter::new(BufWriter::new(file));

    md_writer.write_structure(&tree).await?;
    md_writer.flush().await
}

/// Appends the documentation section of `root` to `output`.
///
/// Returns the number of files that had a leading comment.
pub async fn append_documentation(root: &Path, output: &Path) -> Result<usize> {
    let tree = walk(root).await?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .await
        .map_err(|err| output_error(err, output))?;
    let mut md_writer = MarkdownWriter::new(BufWriter::new(file));

    let documented = md_writer.write_documentation(&tree).await?;
    md_writer.flush().await?;
    Ok(documented)
}

/// Generate the full Markdown document for `root` at `output`.
pub async fn generate(root: &Path, output: &Path) -> Result<()> {
    write_structure(root, output).await?;
    info!("Project structure written");

    let documented = append_documentation(root, output).await?;
    info!("Documentation appended ({documented} files)");

    info!("Done: {}", output.display());
    Ok(())
}

/// Runs [`collect_tree`] on the blocking pool.
async fn walk(root: &Path) -> Result<SourceTree> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || collect_tree(&root))
        .await
        .context("Directory walk task failed")?
}

fn output_error(err: io::Error, output: &Path) -> anyhow::Error {
    if err.kind() == io::ErrorKind::NotFound {
        GenerateError::not_found(output).into()
    } else {
        anyhow::Error::new(err).context(format!("Failed to open output: {}", output.display()))
    }
}
