use crate::document::{
    Block, Direction, DocumentTree, PointerContext, PositionMapper, StructuralPosition,
};

use super::{Codec, CodecError, TextFormat};

pub(crate) const LINE_SEPARATOR: char = '\n';

/// Plain text: a blank line between paragraphs, one line per line break.
///
/// Saving is normalizing rather than lossless: runs of blank lines collapse
/// to one paragraph break, surrounding whitespace is trimmed and images are
/// dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCodec;

impl Codec for PlaintextCodec {
    fn format(&self) -> TextFormat {
        TextFormat::Plaintext
    }

    /// Empty lines end the current paragraph; consecutive non-empty lines
    /// are joined by line breaks.
    fn parse(&self, text: &str) -> Result<DocumentTree, CodecError> {
        let normalized = text.replace('\r', "");
        let lines: Vec<&str> = normalized.split(LINE_SEPARATOR).collect();

        let mut tree = DocumentTree::empty();
        let mut pos = tree.content_start();

        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }

            pos = tree.insert_text(pos, line);

            let Some(next) = lines.get(index + 1) else {
                continue;
            };
            pos = if next.is_empty() {
                tree.insert_paragraph_break(pos)
            } else {
                tree.insert_line_break(pos)
            };
        }

        log::debug!("Parsed plaintext into {} blocks", tree.len());
        Ok(tree)
    }

    fn save(&self, tree: &DocumentTree) -> String {
        let mapper = PositionMapper::new(tree);
        let mut content = String::new();
        let mut pos = Some(tree.content_start());

        while let Some(current) = pos {
            pos = translate(&mapper, current, &mut content);
        }

        content.trim().to_string()
    }
}

/// Renders whatever lies ahead of `pos` into `content` and returns the next
/// structural position.
///
/// Entering a paragraph emits a blank line unless nothing has been written
/// yet; a line break emits one separator; images render as nothing.
pub(crate) fn translate(
    mapper: &PositionMapper<'_>,
    pos: StructuralPosition,
    content: &mut String,
) -> Option<StructuralPosition> {
    let context = mapper.context(pos)?;
    let next = mapper.next_structural(pos, Direction::Forward);

    match context {
        PointerContext::Text => content.push_str(mapper.text_in_run(pos)),
        PointerContext::LineBreak => content.push(LINE_SEPARATOR),
        PointerContext::BlockEnd => {
            let entering_paragraph = next
                .and_then(|start| mapper.tree().block(start.block_index()))
                .is_some_and(|block| matches!(block, Block::Paragraph(_)));
            if entering_paragraph && !content.is_empty() {
                content.push(LINE_SEPARATOR);
                content.push(LINE_SEPARATOR);
            }
        }
        PointerContext::Image | PointerContext::RunEnd => {}
    }

    next
}
