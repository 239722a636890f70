use relative_path::{RelativePath, RelativePathBuf};

use crate::codec::TextFormat;

/// A note on disk: its path relative to the notes root, a display-friendly
/// name and the format its extension declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    relative_path: RelativePathBuf,
    display_name: String,
    display_path: String,
    format: TextFormat,
}

impl NoteFile {
    pub fn new(relative_path: RelativePathBuf, format: TextFormat) -> Self {
        let suffix = format!(".{}", format.extension());
        let display_name = relative_path
            .file_name()
            .map(|name| strip_suffix_ignore_case(name, &suffix))
            .unwrap_or("Untitled")
            .to_string();
        let display_path = strip_suffix_ignore_case(relative_path.as_str(), &suffix).to_string();

        Self {
            relative_path,
            display_name,
            display_path,
            format,
        }
    }

    /// Create from a relative path, taking the format from its extension
    pub fn detect(relative_path: RelativePathBuf) -> Option<Self> {
        let format = relative_path
            .extension()
            .and_then(TextFormat::from_extension)?;
        Some(Self::new(relative_path, format))
    }

    /// Create from a relative path string
    pub fn from_relative_str(path: &str) -> Option<Self> {
        Self::detect(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without its extension
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Relative path without its extension, for use in titles
    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> &'a str {
    let Some(split) = s.len().checked_sub(suffix.len()) else {
        return s;
    };
    match s.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &s[..split],
        _ => s,
    }
}
