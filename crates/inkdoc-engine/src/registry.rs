use std::collections::HashMap;

use crate::codec::{Codec, CodecError, MarkupCodec, PlaintextCodec, TextFormat};
use crate::document::DocumentTree;

/// Format-keyed table of codecs.
///
/// Built once at startup and passed to whatever needs conversion; read-only
/// afterwards.
pub struct ConverterRegistry {
    codecs: HashMap<TextFormat, Box<dyn Codec>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConverterRegistry {
    /// A registry with no codecs at all.
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry with the plaintext and markup codecs.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(PlaintextCodec))
            .register(Box::new(MarkupCodec))
    }

    /// Adds `codec` under its own format, replacing any previous one.
    pub fn register(mut self, codec: Box<dyn Codec>) -> Self {
        self.codecs.insert(codec.format(), codec);
        self
    }

    pub fn codec(&self, format: TextFormat) -> Result<&dyn Codec, CodecError> {
        self.codecs
            .get(&format)
            .map(|codec| &**codec)
            .ok_or(CodecError::UnsupportedFormat(format))
    }

    pub fn supports(&self, format: TextFormat) -> bool {
        self.codecs.contains_key(&format)
    }

    /// Converts `text` from one format to another through a single call on
    /// the target format's codec.
    pub fn convert(
        &self,
        text: &str,
        from: TextFormat,
        to: TextFormat,
    ) -> Result<String, CodecError> {
        self.codec(to)?.convert(text, from, self)
    }

    pub fn parse(&self, text: &str, format: TextFormat) -> Result<DocumentTree, CodecError> {
        self.codec(format)?.parse(text)
    }

    pub fn save(&self, tree: &DocumentTree, format: TextFormat) -> Result<String, CodecError> {
        Ok(self.codec(format)?.save(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_cover_every_format() {
        let registry = ConverterRegistry::default();
        for format in TextFormat::ALL {
            assert!(registry.supports(format));
            assert_eq!(registry.codec(format).unwrap().format(), format);
        }
    }

    #[test]
    fn missing_codec_is_unsupported_format() {
        let registry = ConverterRegistry::new().register(Box::new(PlaintextCodec));
        assert!(matches!(
            registry.parse("<Paragraph />", TextFormat::Markup),
            Err(CodecError::UnsupportedFormat(TextFormat::Markup))
        ));
        assert!(matches!(
            registry.convert("text", TextFormat::Plaintext, TextFormat::Markup),
            Err(CodecError::UnsupportedFormat(TextFormat::Markup))
        ));
        assert!(matches!(
            registry.save(&DocumentTree::empty(), TextFormat::Markup),
            Err(CodecError::UnsupportedFormat(TextFormat::Markup))
        ));
    }

    #[test]
    fn convert_plaintext_to_markup() {
        let registry = ConverterRegistry::with_defaults();
        let markup = registry
            .convert("one\ntwo\n\nthree", TextFormat::Plaintext, TextFormat::Markup)
            .unwrap();
        assert_eq!(
            markup,
            "<Paragraph><Run>one</Run><LineBreak /><Run>two</Run></Paragraph>\
             <Paragraph><Run>three</Run></Paragraph>"
        );
    }

    #[test]
    fn convert_markup_to_plaintext() {
        let registry = ConverterRegistry::with_defaults();
        let text = registry
            .convert(
                "<Paragraph><Run>one</Run><LineBreak /><Run>two</Run></Paragraph>\
                 <Paragraph Tag=\"base64\">AQID</Paragraph>\
                 <Paragraph><Run>three</Run></Paragraph>",
                TextFormat::Markup,
                TextFormat::Plaintext,
            )
            .unwrap();
        assert_eq!(text, "one\ntwo\n\nthree");
    }

    #[test]
    fn convert_to_same_format_is_identity() {
        let registry = ConverterRegistry::with_defaults();
        let raw = "  untouched {text}\n\n\n";
        assert_eq!(
            registry
                .convert(raw, TextFormat::Plaintext, TextFormat::Plaintext)
                .unwrap(),
            raw
        );
    }

    #[test]
    fn convert_propagates_parse_errors() {
        let registry = ConverterRegistry::with_defaults();
        assert!(matches!(
            registry.convert("<Paragraph>", TextFormat::Markup, TextFormat::Plaintext),
            Err(CodecError::MarkupParse { .. })
        ));
    }
}
