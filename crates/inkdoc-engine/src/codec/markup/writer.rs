use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::document::{Block, DocumentTree, ImageBlock, Paragraph, Run};

use super::escape::escape_braces;

/// Serializes the tree as a root-less fragment: one element per block, in
/// document order.
pub(crate) fn write_fragment(tree: &DocumentTree) -> String {
    let mut out = String::new();
    for block in tree.blocks() {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut out, paragraph),
            Block::Image(image) => write_image(&mut out, image),
        }
    }
    out
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    if paragraph.runs.is_empty() {
        out.push_str("<Paragraph />");
        return;
    }
    out.push_str("<Paragraph>");
    for run in &paragraph.runs {
        match run {
            Run::Text(text) if text.is_empty() => out.push_str("<Run />"),
            Run::Text(text) => {
                out.push_str("<Run>");
                out.push_str(&html_escape::encode_text(&escape_braces(text)));
                out.push_str("</Run>");
            }
            Run::LineBreak => out.push_str("<LineBreak />"),
        }
    }
    out.push_str("</Paragraph>");
}

fn write_image(out: &mut String, image: &ImageBlock) {
    out.push_str("<Paragraph Tag=\"");
    out.push_str(ImageBlock::MARKER);
    out.push_str("\">");
    out.push_str(&BASE64.encode(&image.bytes));
    out.push_str("</Paragraph>");
}
