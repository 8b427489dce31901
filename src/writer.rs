use crate::extractor::extract_docstring;
use crate::filewalker::{OutlineEntry, SourceTree};
use anyhow::{Context, Result};
use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

pub const STRUCTURE_HEADING: &str = "# Project Structure";
pub const DOCUMENTATION_HEADING: &str = "# File Documentation";

const INDENT: &str = "    ";
const DIR_MARKER: &str = "🗀";
const FILE_MARKER: &str = "🗋";

pub struct MarkdownWriter<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> MarkdownWriter<W> {
    pub fn new(writer: BufWriter<W>) -> Self {
        Self { writer }
    }

    /// Writes the structure heading and the indented outline of `tree`.
    pub async fn write_structure(&mut self, tree: &SourceTree) -> Result<()> {
        self.writer
            .write_all(format!("{STRUCTURE_HEADING}\n\n").as_bytes())
            .await
            .context("Failed to write structure heading")?;

        for (depth, entry) in tree.outline() {
            let indent = INDENT.repeat(depth);
            let line = match entry {
                OutlineEntry::Dir(name) => format!("{indent}- **{DIR_MARKER}  {name}/**\n"),
                OutlineEntry::File(name) => format!("{indent}- {FILE_MARKER}  {name}\n"),
            };
            self.writer
                .write_all(line.as_bytes())
                .await
                .with_context(|| format!("Failed to write outline line: {}", line.trim()))?;
        }

        Ok(())
    }

    /// Writes the documentation heading and one section per file with a
    /// leading comment. Returns how many files were documented.
    pub async fn write_documentation(&mut self, tree: &SourceTree) -> Result<usize> {
        self.writer
            .write_all(format!("\n{DOCUMENTATION_HEADING}\n\n").as_bytes())
            .await
            .context("Failed to write documentation heading")?;

        let mut documented = 0;
        for rel_path in tree.files() {
            let root = tree.root().to_path_buf();
            let file = rel_path.clone();
            let doc = tokio::task::spawn_blocking(move || extract_docstring(&root, &file))
                .await
                .with_context(|| format!("Extraction task failed for {}", rel_path.display()))?;
            if doc.is_empty() {
                continue;
            }

            debug!("Documenting file: {}", rel_path.display());
            self.writer
                .write_all(format!("## {}\n\n{doc}\n\n", rel_path.display()).as_bytes())
                .await
                .with_context(|| format!("Failed to write section for {}", rel_path.display()))?;
            documented += 1;
        }

        Ok(documented)
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await.context("Failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}
