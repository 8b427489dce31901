use std::ffi::OsStr;
use std::path::Path;

/// How a file's leading comment is looked for, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Images, databases, executables. Never read.
    Binary,
    /// `#` line comments, `"""` / `'''` docstrings.
    Script,
    /// `//` line comments, `/* */` blocks.
    CStyle,
    /// `<!-- -->` blocks only.
    Markup,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "png" | "jpg" | "jpeg" | "gif" | "db" | "bin" | "exe" => FileKind::Binary,
            "py" => FileKind::Script,
            "js" | "php" | "css" => FileKind::CStyle,
            "html" => FileKind::Markup,
            _ => FileKind::Other,
        }
    }

    /// Prefix of a single-line comment, for kinds that have one.
    pub fn line_prefix(self) -> Option<&'static str> {
        match self {
            FileKind::Script => Some("#"),
            FileKind::CStyle => Some("//"),
            _ => None,
        }
    }

    pub fn is_binary(self) -> bool {
        self == FileKind::Binary
    }
}
