//! # Codecs
//!
//! Format-specific conversion between stored text and [`DocumentTree`]s.
//!
//! - **`plaintext`**: lines and blank lines, used for previews and search
//! - **`markup`**: the persisted inline-tag fragment that can carry images
//!
//! Each codec can also convert text written in the *other* format into its
//! own in a single hop: parse with the source codec, save with itself.

pub mod markup;
pub mod plaintext;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::DocumentTree;
use crate::registry::ConverterRegistry;

pub use markup::MarkupCodec;
pub use plaintext::PlaintextCodec;

/// A stored text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Plaintext,
    Markup,
}

impl TextFormat {
    pub const ALL: [TextFormat; 2] = [TextFormat::Plaintext, TextFormat::Markup];

    /// File extension used for notes stored in this format.
    pub fn extension(self) -> &'static str {
        match self {
            TextFormat::Plaintext => "txt",
            TextFormat::Markup => "xaml",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextFormat::Plaintext => f.write_str("plaintext"),
            TextFormat::Markup => f.write_str("markup"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("No codec registered for {0}")]
    UnsupportedFormat(TextFormat),
    #[error("Markup parse error at byte {offset}: {reason}")]
    MarkupParse { offset: usize, reason: String },
    #[error("Embedded image is not valid base64: {0}")]
    ImageDecode(#[from] base64::DecodeError),
}

impl CodecError {
    pub(crate) fn markup(offset: usize, reason: impl Into<String>) -> Self {
        CodecError::MarkupParse {
            offset,
            reason: reason.into(),
        }
    }
}

/// A per-format parser and serializer.
pub trait Codec: Send + Sync {
    /// The format this codec reads and writes.
    fn format(&self) -> TextFormat;

    fn parse(&self, text: &str) -> Result<DocumentTree, CodecError>;

    fn save(&self, tree: &DocumentTree) -> String;

    /// Converts `text` stored as `source` into this codec's format.
    ///
    /// Text already in this format is returned unchanged; otherwise it is
    /// parsed by the source format's codec and saved by this one.
    fn convert(
        &self,
        text: &str,
        source: TextFormat,
        registry: &ConverterRegistry,
    ) -> Result<String, CodecError> {
        if source == self.format() {
            return Ok(text.to_string());
        }
        let tree = registry.parse(text, source)?;
        Ok(self.save(&tree))
    }
}
