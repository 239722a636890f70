use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::codec::CodecError;
use crate::document::{Block, DocumentTree, ImageBlock, Paragraph, Run};

use super::escape::unescape_braces;
use super::lexer::{Lexer, Token};

pub(crate) const ROOT: &str = "FlowDocument";
const PARAGRAPH: &str = "Paragraph";
const RUN: &str = "Run";
const LINE_BREAK: &str = "LineBreak";
const BLOCK_CONTAINER: &str = "BlockUIContainer";
const INLINE_CONTAINER: &str = "InlineUIContainer";

/// Deepest element nesting accepted below the root.
pub(crate) const MAX_NESTING: usize = 256;

/// Builds a tree from a complete `<FlowDocument>` element.
///
/// Only paragraphs, runs and line breaks carry meaning. Other containers
/// (sections, lists, spans, bold and so on) are flattened into their
/// content so hand-edited notes still open.
pub(crate) fn read_document(markup: &str) -> Result<DocumentTree, CodecError> {
    let mut reader = Reader {
        lexer: Lexer::new(markup),
        end: markup.len(),
        depth: 0,
    };

    let mut blocks = Vec::new();
    match reader.next_significant()? {
        Some(Token::Start {
            name: ROOT,
            self_closing,
            ..
        }) => {
            if !self_closing {
                reader.read_blocks(ROOT, &mut blocks)?;
            }
        }
        Some(other) => {
            return Err(CodecError::markup(
                reader.lexer.offset(),
                format!("expected <{ROOT}> root, found {}", describe(&other)),
            ));
        }
        None => return Err(CodecError::markup(0, "empty document")),
    }

    if let Some(trailing) = reader.next_significant()? {
        return Err(CodecError::markup(
            reader.lexer.offset(),
            format!("unexpected {} after </{ROOT}>", describe(&trailing)),
        ));
    }

    Ok(DocumentTree::from_blocks(blocks))
}

struct Reader<'a> {
    lexer: Lexer<'a>,
    end: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn next(&mut self, closing: &str) -> Result<Token<'a>, CodecError> {
        match self.lexer.next() {
            Some(token) => token,
            None => Err(CodecError::markup(
                self.end,
                format!("unexpected end of input, expected </{closing}>"),
            )),
        }
    }

    /// Runs `read` one element deeper, failing once nesting passes
    /// [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        if self.depth >= MAX_NESTING {
            return Err(CodecError::markup(
                self.lexer.offset(),
                format!("nesting too deep (more than {MAX_NESTING} levels)"),
            ));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Next token that is not whitespace-only text.
    fn next_significant(&mut self) -> Result<Option<Token<'a>>, CodecError> {
        for token in self.lexer.by_ref() {
            match token? {
                Token::Text(text) if text.trim().is_empty() => continue,
                token => return Ok(Some(token)),
            }
        }
        Ok(None)
    }

    fn read_blocks(&mut self, closing: &str, blocks: &mut Vec<Block>) -> Result<(), CodecError> {
        loop {
            let token = self.next(closing)?;
            let (name, self_closing) = match &token {
                Token::End { name, offset } => return check_end(name, closing, *offset),
                Token::Text(text) => {
                    if !text.trim().is_empty() {
                        let text = unescape_braces(text).into_owned();
                        blocks.push(Block::Paragraph(Paragraph::new(vec![Run::Text(text)])));
                    }
                    continue;
                }
                Token::Start {
                    name, self_closing, ..
                } => (*name, *self_closing),
            };

            match name {
                PARAGRAPH if token.attribute("Tag") == Some(ImageBlock::MARKER) => {
                    let payload = if self_closing {
                        String::new()
                    } else {
                        self.collect_text(PARAGRAPH)?
                    };
                    blocks.push(Block::Image(decode_image(&payload)));
                }
                PARAGRAPH => {
                    let mut runs = Vec::new();
                    if !self_closing {
                        self.read_inlines(PARAGRAPH, &mut runs)?;
                    }
                    blocks.push(Block::Paragraph(Paragraph::new(runs)));
                }
                BLOCK_CONTAINER => {
                    if !self_closing {
                        self.collect_text(BLOCK_CONTAINER)?;
                    }
                    log::warn!("Replacing unreadable {BLOCK_CONTAINER} with an empty image");
                    blocks.push(Block::Image(ImageBlock::default()));
                }
                _ if self_closing => {}
                container => self.nested(|reader| reader.read_blocks(container, blocks))?,
            }
        }
    }

    fn read_inlines(&mut self, closing: &str, runs: &mut Vec<Run>) -> Result<(), CodecError> {
        loop {
            let token = self.next(closing)?;
            let (name, self_closing) = match &token {
                Token::End { name, offset } => return check_end(name, closing, *offset),
                Token::Text(text) => {
                    if !text.trim().is_empty() {
                        runs.push(Run::Text(unescape_braces(text).into_owned()));
                    }
                    continue;
                }
                Token::Start {
                    name, self_closing, ..
                } => (*name, *self_closing),
            };

            match name {
                RUN => {
                    let content = if self_closing {
                        String::new()
                    } else {
                        self.collect_text(RUN)?
                    };
                    let text = match token.attribute("Text") {
                        Some(attribute) if content.is_empty() => attribute.to_string(),
                        _ => content,
                    };
                    runs.push(Run::Text(unescape_braces(&text).into_owned()));
                }
                LINE_BREAK => {
                    if !self_closing {
                        self.collect_text(LINE_BREAK)?;
                    }
                    runs.push(Run::LineBreak);
                }
                INLINE_CONTAINER => {
                    if !self_closing {
                        self.collect_text(INLINE_CONTAINER)?;
                    }
                }
                _ if self_closing => {}
                span => self.nested(|reader| reader.read_inlines(span, runs))?,
            }
        }
    }

    /// Concatenates all character data up to the matching `</closing>`,
    /// descending into nested elements.
    fn collect_text(&mut self, closing: &str) -> Result<String, CodecError> {
        let mut out = String::new();
        loop {
            match self.next(closing)? {
                Token::End { name, offset } => {
                    check_end(name, closing, offset)?;
                    return Ok(out);
                }
                Token::Text(text) => out.push_str(&text),
                Token::Start {
                    name,
                    self_closing: false,
                    ..
                } => out.push_str(&self.nested(|reader| reader.collect_text(name))?),
                Token::Start { .. } => {}
            }
        }
    }
}

fn check_end(name: &str, closing: &str, offset: usize) -> Result<(), CodecError> {
    if name == closing {
        Ok(())
    } else {
        Err(CodecError::markup(
            offset,
            format!("mismatched </{name}>, expected </{closing}>"),
        ))
    }
}

fn describe(token: &Token<'_>) -> String {
    match token {
        Token::Start { name, .. } => format!("<{name}>"),
        Token::End { name, .. } => format!("</{name}>"),
        Token::Text(_) => "text".to_string(),
    }
}

/// Decodes an image payload. Whitespace inside the payload is ignored.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = payload.split_ascii_whitespace().collect();
    Ok(BASE64.decode(compact)?)
}

/// A corrupt payload yields an image block with no bytes.
fn decode_image(payload: &str) -> ImageBlock {
    match decode_image_payload(payload) {
        Ok(bytes) => ImageBlock::new(bytes),
        Err(e) => {
            log::warn!("Keeping empty image in place of corrupt embed: {e}");
            ImageBlock::default()
        }
    }
}
