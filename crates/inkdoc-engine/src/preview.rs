use crate::codec::plaintext::translate;
use crate::document::{DocumentTree, PositionMapper};

/// Preview length used by note lists.
pub const DEFAULT_PREVIEW_LENGTH: usize = 250;

/// Plain-text rendering of the start of `tree`, trimmed.
///
/// Rendering stops at the first structural step whose offset reaches
/// `max_len`, so the run that crosses the limit is included whole.
pub fn extract(tree: &DocumentTree, max_len: usize) -> String {
    let mapper = PositionMapper::new(tree);
    let mut content = String::new();
    let mut pos = Some(tree.content_start());

    while let Some(current) = pos {
        if mapper.offset_from_start(current) >= max_len {
            break;
        }
        pos = translate(&mapper, current, &mut content);
    }

    content.trim().to_string()
}

/// [`extract`] with [`DEFAULT_PREVIEW_LENGTH`].
pub fn extract_default(tree: &DocumentTree) -> String {
    extract(tree, DEFAULT_PREVIEW_LENGTH)
}
