//! Leading comment / docstring extraction.
//!
//! Only the very start of a file is inspected: a block comment that opens at
//! the first non-whitespace character, or failing that a run of line
//! comments. This is a heuristic, not a parser: a docstring placed after an
//! import statement is not found.

use crate::filewalker::has_hidden_component;
use crate::utils::FileKind;
use anyhow::{Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

// Either quote style closes a docstring, whichever comes first.
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:"""|''')([\s\S]*?)(?:"""|''')"#).expect("valid docstring regex")
});

static C_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*/\*([\s\S]*?)\*/").expect("valid block comment regex"));

static MARKUP_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<!--([\s\S]*?)-->").expect("valid html comment regex"));

/// Extracts the leading comment of `root/rel_path`.
///
/// Returns an empty string when the file is binary by extension, lives under
/// a hidden directory, has no recognised comment syntax, has no leading
/// comment, or cannot be read as UTF-8 text. Read failures are logged, never
/// returned.
pub fn extract_docstring(root: &Path, rel_path: &Path) -> String {
    let kind = FileKind::of(rel_path);
    if matches!(kind, FileKind::Binary | FileKind::Other) || has_hidden_component(rel_path) {
        return String::new();
    }

    let path = root.join(rel_path);
    match read_text(&path) {
        Ok(content) => leading_comment(kind, &content),
        Err(err) => {
            warn!("Failed to process {}: {err:#}", path.display());
            String::new()
        }
    }
}

/// Leading comment of `content` under the comment rules of `kind`.
pub fn leading_comment(kind: FileKind, content: &str) -> String {
    let content = content.trim_start_matches('\u{feff}');

    let block = match kind {
        FileKind::Script => &SCRIPT_BLOCK,
        FileKind::CStyle => &C_BLOCK,
        FileKind::Markup => &MARKUP_BLOCK,
        FileKind::Binary | FileKind::Other => return String::new(),
    };

    if let Some(text) = block_comment(block, content) {
        return text;
    }

    kind.line_prefix()
        .map(|prefix| line_comments(content, prefix))
        .unwrap_or_default()
}

fn block_comment(re: &Regex, content: &str) -> Option<String> {
    let caps = re.captures(content)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

fn line_comments(content: &str, prefix: &str) -> String {
    let mut comments = Vec::new();

    // A bare `\r` ends a line too.
    for line in content.split(['\n', '\r']) {
        let line = line.trim();
        if line.starts_with(prefix) {
            let text = line.trim_start_matches(|c: char| prefix.contains(c)).trim();
            comments.push(text);
        } else if !line.is_empty() {
            break;
        }
    }

    comments.join("\n")
}

fn read_text(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    String::from_utf8(bytes).with_context(|| format!("Invalid UTF-8 in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn python_docstring_is_trimmed() {
        let src = "\n  \"\"\"\n    Module docs.\n    Second line.\n\"\"\"\nimport os\n";
        assert_eq!(
            leading_comment(FileKind::Script, src),
            "Module docs.\n    Second line."
        );
    }

    #[test]
    fn python_single_quote_docstring() {
        let src = "'''Hello'''\nx = 1\n";
        assert_eq!(leading_comment(FileKind::Script, src), "Hello");
    }

    #[test]
    fn python_hash_comments_skip_blank_lines() {
        let src = "# first\n\n#  second  \n##third\nprint('x')\n# not included\n";
        assert_eq!(
            leading_comment(FileKind::Script, src),
            "first\nsecond\nthird"
        );
    }

    #[test]
    fn docstring_closes_at_first_quote_triple_of_either_style() {
        let mixed = "\"\"\"Opened double, closed single'''\nx = 1\n";
        assert_eq!(
            leading_comment(FileKind::Script, mixed),
            "Opened double, closed single"
        );

        let nested = "\"\"\"Doc with '''inner''' quotes\"\"\"";
        assert_eq!(leading_comment(FileKind::Script, nested), "Doc with");
    }

    #[test]
    fn carriage_return_line_endings_split_comment_runs() {
        let src = "# one\r# two\rimport os\r";
        assert_eq!(leading_comment(FileKind::Script, src), "one\ntwo");

        let crlf = "// one\r\n\r\n// two\r\nrun();\r\n";
        assert_eq!(leading_comment(FileKind::CStyle, crlf), "one\ntwo");
    }

    #[test]
    fn empty_block_comment_still_wins() {
        assert_eq!(leading_comment(FileKind::CStyle, "/**/\n// x\n"), "");
        assert_eq!(leading_comment(FileKind::Script, "\"\"\"  \"\"\"\n# x\n"), "");
    }

    #[test]
    fn docstring_after_code_is_not_found() {
        let src = "import os\n\"\"\"Late docstring\"\"\"\n";
        assert_eq!(leading_comment(FileKind::Script, src), "");
    }

    #[test]
    fn c_style_block_comment() {
        let src = "/*\n * Entry point\n */\nfunction main() {}\n";
        assert_eq!(leading_comment(FileKind::CStyle, src), "* Entry point");
    }

    #[test]
    fn c_style_line_comments_stop_at_code() {
        let src = "// one\n//two\n\n// three\nconst x = 1;\n// four\n";
        assert_eq!(leading_comment(FileKind::CStyle, src), "one\ntwo\nthree");
    }

    #[test]
    fn c_style_block_not_at_start_is_ignored() {
        let src = "// lead\n/* block */\n";
        assert_eq!(leading_comment(FileKind::CStyle, src), "lead");
    }

    #[test]
    fn markup_comment() {
        let src = "  <!-- Landing page -->\n<html></html>";
        assert_eq!(leading_comment(FileKind::Markup, src), "Landing page");
    }

    #[test]
    fn markup_has_no_line_comment_fallback() {
        let src = "<html>\n<!-- late -->\n</html>";
        assert_eq!(leading_comment(FileKind::Markup, src), "");
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let src = "\u{feff}/* bom */";
        assert_eq!(leading_comment(FileKind::CStyle, src), "bom");
    }

    #[test]
    fn binary_extension_is_never_read() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fake.png"), "/* looks like text */").unwrap();
        assert_eq!(extract_docstring(dir.path(), Path::new("fake.png")), "");
    }

    #[test]
    fn hidden_directory_is_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/x.py"), "\"\"\"hidden\"\"\"").unwrap();
        assert_eq!(extract_docstring(dir.path(), Path::new(".cache/x.py")), "");
    }

    #[test]
    fn unreadable_file_yields_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(extract_docstring(dir.path(), Path::new("missing.py")), "");

        fs::write(dir.path().join("latin1.js"), b"// caf\xe9\n").unwrap();
        assert_eq!(extract_docstring(dir.path(), Path::new("latin1.js")), "");
    }

    #[test]
    fn nul_bytes_do_not_hide_a_text_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "// Real header\nvar s = \"\0\";\n").unwrap();
        assert_eq!(extract_docstring(dir.path(), Path::new("a.js")), "Real header");
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.js"), "// App entry\nrun();\n").unwrap();
        assert_eq!(
            extract_docstring(dir.path(), Path::new("src/app.js")),
            "App entry"
        );
    }
}
