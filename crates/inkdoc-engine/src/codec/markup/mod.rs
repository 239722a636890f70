//! # Markup Codec
//!
//! The persisted note format: a `FlowDocument` fragment with the root tags
//! stripped, where images travel as paragraphs tagged `base64`.
//!
//! ## Modules
//!
//! - **`cursor`**: byte cursor shared by the lexer
//! - **`lexer`**: tags, attributes and entity-decoded text
//! - **`reader`**: tokens to [`DocumentTree`], flattening unknown containers
//! - **`writer`**: single-pass fragment writer
//! - **`escape`**: the reserved `{` and its `{}{` escape

pub mod cursor;
pub mod escape;
pub mod lexer;
mod reader;
mod writer;

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::DocumentTree;

use super::{Codec, CodecError, TextFormat};

pub use reader::decode_image_payload;

const ROOT_OPEN: &str =
    r#"<FlowDocument xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation">"#;
const ROOT_CLOSE: &str = "</FlowDocument>";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupCodec;

impl Codec for MarkupCodec {
    fn format(&self) -> TextFormat {
        TextFormat::Markup
    }

    /// Blank input is the empty document. Raw `<Image>` elements are removed
    /// before parsing, and a missing root element is supplied.
    fn parse(&self, text: &str) -> Result<DocumentTree, CodecError> {
        if text.trim().is_empty() {
            return Ok(DocumentTree::empty());
        }

        let stripped = strip_image_tags(text);
        let markup = wrap_root(stripped.trim());
        let tree = reader::read_document(&markup)?;

        log::debug!("Parsed markup into {} blocks", tree.len());
        Ok(tree)
    }

    fn save(&self, tree: &DocumentTree) -> String {
        writer::write_fragment(tree)
    }
}

fn strip_image_tags(text: &str) -> Cow<'_, str> {
    static IMAGE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let image_tag = IMAGE_TAG_REGEX.get_or_init(|| {
        Regex::new(r"(?s)<Image\b[^>]*/>|<Image\b.*?</Image>").expect("Invalid image tag regex")
    });

    let stripped = image_tag.replace_all(text, "");
    if matches!(stripped, Cow::Owned(_)) {
        log::warn!("Removed raw image elements from markup");
    }
    stripped
}

fn wrap_root(fragment: &str) -> String {
    let mut markup = String::with_capacity(fragment.len() + ROOT_OPEN.len() + ROOT_CLOSE.len());
    if !fragment.starts_with("<FlowDocument") {
        markup.push_str(ROOT_OPEN);
    }
    markup.push_str(fragment);
    if !fragment.ends_with(ROOT_CLOSE) {
        markup.push_str(ROOT_CLOSE);
    }
    markup
}
