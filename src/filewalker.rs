use crate::error::GenerateError;
use anyhow::{Context, Result};
use ignore::{DirEntry, WalkBuilder};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// One directory of the walked tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirNode {
    /// File names directly in this directory, sorted.
    pub files: Vec<String>,
    /// Subdirectories by name.
    pub children: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn dir_mut(&mut self, rel_path: &Path) -> &mut DirNode {
        let mut node = self;
        for component in rel_path.components() {
            let name = component.as_os_str().to_string_lossy().into_owned();
            node = node.children.entry(name).or_default();
        }
        node
    }

    fn insert_dir(&mut self, rel_path: &Path) {
        self.dir_mut(rel_path);
    }

    fn insert_file(&mut self, rel_path: &Path) {
        let Some(name) = rel_path.file_name() else {
            return;
        };
        let parent = rel_path.parent().unwrap_or(Path::new(""));
        self.dir_mut(parent)
            .files
            .push(name.to_string_lossy().into_owned());
    }
}

/// A line of the structure outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineEntry<'a> {
    Dir(&'a str),
    File(&'a str),
}

/// Non-hidden contents of a directory, ready to be rendered.
#[derive(Debug)]
pub struct SourceTree {
    root: PathBuf,
    root_name: Option<String>,
    top: DirNode,
}

impl SourceTree {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Basename of the root, if the root path has one.
    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    pub fn top(&self) -> &DirNode {
        &self.top
    }

    /// Outline entries paired with their indent level, in render order: a
    /// directory line, its files, then its subdirectories.
    pub fn outline(&self) -> Vec<(usize, OutlineEntry<'_>)> {
        let mut lines = Vec::new();
        if let Some(name) = &self.root_name {
            lines.push((0, OutlineEntry::Dir(name.as_str())));
        }
        push_outline(&self.top, 0, &mut lines);
        lines
    }

    /// Relative paths of all files, in outline order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        push_files(&self.top, Path::new(""), &mut files);
        files
    }
}

fn push_outline<'a>(node: &'a DirNode, depth: usize, lines: &mut Vec<(usize, OutlineEntry<'a>)>) {
    for file in &node.files {
        lines.push((depth + 1, OutlineEntry::File(file)));
    }
    for (name, child) in &node.children {
        lines.push((depth + 1, OutlineEntry::Dir(name)));
        push_outline(child, depth + 1, lines);
    }
}

fn push_files(node: &DirNode, prefix: &Path, files: &mut Vec<PathBuf>) {
    for file in &node.files {
        files.push(prefix.join(file));
    }
    for (name, child) in &node.children {
        push_files(child, &prefix.join(name), files);
    }
}

/// Walks `root` and collects every non-hidden file and directory.
///
/// Hidden entries are pruned before descent, so nothing below a hidden
/// directory is ever visited. The root itself is exempt. Entries are sorted
/// by name at each level; symlinks are not followed.
pub fn collect_tree(root: &Path) -> Result<SourceTree> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(GenerateError::not_found(root).into());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", root.display()));
        }
    };
    if !metadata.is_dir() {
        return Err(GenerateError::NotADirectory {
            path: root.to_path_buf(),
        }
        .into());
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    let mut top = DirNode::default();

    for result in builder.build() {
        match result {
            Ok(entry) => {
                if entry.depth() == 0 {
                    continue;
                }
                let Ok(rel_path) = entry.path().strip_prefix(root) else {
                    continue;
                };

                match entry.file_type() {
                    Some(ft) if ft.is_dir() => top.insert_dir(rel_path),
                    Some(ft) if ft.is_symlink() && entry.path().is_dir() => {
                        debug!("Skipping directory symlink: {}", rel_path.display());
                    }
                    _ => top.insert_file(rel_path),
                }
            }
            Err(err) => {
                warn!("Error walking path: {err}");
            }
        }
    }

    Ok(SourceTree {
        root: root.to_path_buf(),
        root_name: root_display_name(root),
        top,
    })
}

/// Name shown on the root line: the last path component, with `.` and `..`
/// kept as written. Paths ending at a root or prefix have none.
fn root_display_name(root: &Path) -> Option<String> {
    match root.components().next_back()? {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        Component::CurDir => Some(".".to_string()),
        Component::ParentDir => Some("..".to_string()),
        Component::RootDir | Component::Prefix(_) => None,
    }
}

/// Determines if a file/folder is hidden (starts with a dot)
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .path()
        .file_name()
        .and_then(|s| s.to_str())
        .is_some_and(is_hidden_name)
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// True if any named component of a relative path is hidden.
pub fn has_hidden_component(rel_path: &Path) -> bool {
    rel_path.components().any(|component| match component {
        Component::Normal(name) => name.to_str().is_some_and(is_hidden_name),
        _ => false,
    })
}
