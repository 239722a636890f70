//! Find-next / find-previous over a [`DocumentTree`].
//!
//! The scan text is the concatenation of text runs between the caret and one
//! end of the document: line breaks and paragraph boundaries contribute
//! nothing, so a match may span them. A match is mapped back to the tree by
//! walking runs forward to its end, then stepping one caret stop back per
//! character of the target.

use crate::document::{Direction, DocumentTree, PositionMapper, StructuralPosition};

/// A selected range, `start` before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: StructuralPosition,
    pub end: StructuralPosition,
}

/// The editing state a search drives: a tree, a caret and a selection.
pub trait TextSurface {
    fn tree(&self) -> &DocumentTree;

    fn caret(&self) -> StructuralPosition;

    fn set_caret(&mut self, pos: StructuralPosition);

    fn select(&mut self, selection: Selection);
}

/// Finds `target` from the surface's caret and, on a match, moves the caret
/// to the match end and selects it. Leaves the surface untouched otherwise.
pub fn locate<S: TextSurface + ?Sized>(
    surface: &mut S,
    target: &str,
    direction: Direction,
) -> Option<Selection> {
    let selection = find(surface.tree(), surface.caret(), target, direction)?;
    surface.set_caret(selection.end);
    surface.select(selection);
    Some(selection)
}

/// Case-insensitive search for `target` starting at `caret`.
///
/// Forward returns the first occurrence after the caret. Backward returns the
/// last occurrence before it, ignoring one that ends exactly at the caret so
/// repeated find-previous moves on. Returns `None` for an empty target, no
/// match, or a tree too short to map the match back onto.
pub fn find(
    tree: &DocumentTree,
    caret: StructuralPosition,
    target: &str,
    direction: Direction,
) -> Option<Selection> {
    let needle: Vec<char> = target.chars().collect();
    if needle.is_empty() {
        return None;
    }

    let mapper = PositionMapper::new(tree);
    let caret = tree.clamp(caret);
    let (scan_start, scan_end) = match direction {
        Direction::Forward => (caret, tree.content_end()),
        Direction::Backward => (tree.content_start(), caret),
    };
    let mut haystack: Vec<char> = mapper.plaintext_between(scan_start, scan_end).chars().collect();

    let found = match direction {
        Direction::Forward => find_ignore_case(&haystack, &needle),
        Direction::Backward => {
            if ends_with_ignore_case(&haystack, &needle) {
                haystack.truncate(haystack.len() - needle.len());
            }
            rfind_ignore_case(&haystack, &needle)
        }
    };
    let Some(index) = found else {
        log::trace!("No match for {target:?} searching {direction:?}");
        return None;
    };

    let end = walk_to(&mapper, scan_start, index + needle.len())?;
    let mut start = end;
    for _ in 0..needle.len() {
        start = mapper.prev_insertion(start)?;
    }
    Some(Selection { start, end })
}

/// Walks text runs forward from `from` until `chars` characters of run text
/// have been consumed.
fn walk_to(
    mapper: &PositionMapper<'_>,
    from: StructuralPosition,
    chars: usize,
) -> Option<StructuralPosition> {
    let mut consumed = 0;
    let mut pointer = from;
    while consumed < chars {
        let run_len = mapper.text_in_run(pointer).chars().count();
        if consumed + run_len > chars {
            return mapper.advance(pointer, chars - consumed);
        }
        consumed += run_len;
        pointer = mapper.next_structural(pointer, Direction::Forward)?;
    }
    Some(pointer)
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn matches_at(haystack: &[char], needle: &[char], at: usize) -> bool {
    haystack[at..at + needle.len()]
        .iter()
        .zip(needle)
        .all(|(&a, &b)| chars_eq_ignore_case(a, b))
}

fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    let last = haystack.len().checked_sub(needle.len())?;
    (0..=last).find(|&at| matches_at(haystack, needle, at))
}

fn rfind_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    let last = haystack.len().checked_sub(needle.len())?;
    (0..=last).rev().find(|&at| matches_at(haystack, needle, at))
}

fn ends_with_ignore_case(haystack: &[char], needle: &[char]) -> bool {
    haystack
        .len()
        .checked_sub(needle.len())
        .is_some_and(|at| matches_at(haystack, needle, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, PlaintextCodec};
    use crate::document::{Block, Paragraph, Run};
    use pretty_assertions::assert_eq;

    struct Surface {
        tree: DocumentTree,
        caret: StructuralPosition,
        selection: Option<Selection>,
    }

    impl Surface {
        fn new(text: &str) -> Self {
            let tree = PlaintextCodec.parse(text).unwrap();
            let caret = tree.content_start();
            Self {
                tree,
                caret,
                selection: None,
            }
        }

        fn selected_offsets(&self) -> Option<(usize, usize)> {
            let mapper = PositionMapper::new(&self.tree);
            self.selection.map(|s| {
                (
                    mapper.offset_from_start(s.start),
                    mapper.offset_from_start(s.end),
                )
            })
        }
    }

    impl TextSurface for Surface {
        fn tree(&self) -> &DocumentTree {
            &self.tree
        }

        fn caret(&self) -> StructuralPosition {
            self.caret
        }

        fn set_caret(&mut self, pos: StructuralPosition) {
            self.caret = pos;
        }

        fn select(&mut self, selection: Selection) {
            self.selection = Some(selection);
        }
    }

    const SAMPLE: &str = "Hello world, hello again.";

    #[test]
    fn forward_from_start_selects_first_occurrence() {
        let mut surface = Surface::new(SAMPLE);
        locate(&mut surface, "hello", Direction::Forward).unwrap();
        assert_eq!(surface.selected_offsets(), Some((0, 5)));
        assert_eq!(surface.caret, surface.selection.unwrap().end);
    }

    #[test]
    fn backward_from_end_selects_last_occurrence() {
        let mut surface = Surface::new(SAMPLE);
        surface.caret = surface.tree.content_end();
        locate(&mut surface, "hello", Direction::Backward).unwrap();
        assert_eq!(surface.selected_offsets(), Some((13, 18)));
    }

    #[test]
    fn no_match_leaves_surface_unchanged() {
        for direction in [Direction::Forward, Direction::Backward] {
            let mut surface = Surface::new(SAMPLE);
            surface.caret = StructuralPosition::new(0, 0, 7);
            assert_eq!(locate(&mut surface, "xyz", direction), None);
            assert_eq!(surface.caret, StructuralPosition::new(0, 0, 7));
            assert_eq!(surface.selection, None);
        }
    }

    #[test]
    fn repeated_forward_search_moves_on() {
        let mut surface = Surface::new(SAMPLE);
        locate(&mut surface, "HELLO", Direction::Forward).unwrap();
        locate(&mut surface, "HELLO", Direction::Forward).unwrap();
        assert_eq!(surface.selected_offsets(), Some((13, 18)));
        assert_eq!(locate(&mut surface, "HELLO", Direction::Forward), None);
    }

    #[test]
    fn repeated_backward_search_skips_match_at_caret() {
        let mut surface = Surface::new(SAMPLE);
        surface.caret = surface.tree.content_end();
        locate(&mut surface, "hello", Direction::Backward).unwrap();
        locate(&mut surface, "hello", Direction::Backward).unwrap();
        assert_eq!(surface.selected_offsets(), Some((0, 5)));
    }

    #[test]
    fn empty_target_is_no_op() {
        let tree = PlaintextCodec.parse(SAMPLE).unwrap();
        assert_eq!(
            find(&tree, tree.content_start(), "", Direction::Forward),
            None
        );
    }

    #[test]
    fn match_in_later_paragraph_maps_to_that_block() {
        let tree = PlaintextCodec.parse("first line\n\nsecond needle here").unwrap();
        let found = find(&tree, tree.content_start(), "needle", Direction::Forward).unwrap();
        assert_eq!(found.start, StructuralPosition::new(1, 0, 7));
        assert_eq!(found.end, StructuralPosition::new(1, 0, 13));
    }

    #[test]
    fn match_ending_at_run_end_stops_on_that_run() {
        let tree = DocumentTree::from_blocks(vec![Block::Paragraph(Paragraph::new(vec![
            Run::Text("abc".to_string()),
            Run::LineBreak,
            Run::Text("def".to_string()),
        ]))]);
        let found = find(&tree, tree.content_start(), "bc", Direction::Forward).unwrap();
        assert_eq!(found.start, StructuralPosition::new(0, 0, 1));
        assert_eq!(found.end, StructuralPosition::new(0, 0, 3));
    }

    #[test]
    fn match_inside_second_run() {
        let tree = DocumentTree::from_blocks(vec![Block::Paragraph(Paragraph::new(vec![
            Run::Text("abc".to_string()),
            Run::Text("déf".to_string()),
        ]))]);
        let found = find(&tree, tree.content_start(), "DÉ", Direction::Forward).unwrap();
        assert_eq!(found.end, StructuralPosition::new(0, 1, 2));
        // the run boundary resolves to the end of "abc"
        assert_eq!(found.start, StructuralPosition::new(0, 0, 3));
    }

    #[test]
    fn forward_search_starts_mid_run() {
        let tree = PlaintextCodec.parse("abab").unwrap();
        let found = find(&tree, StructuralPosition::new(0, 0, 1), "ab", Direction::Forward).unwrap();
        assert_eq!(found.start, StructuralPosition::new(0, 0, 2));
        assert_eq!(found.end, StructuralPosition::new(0, 0, 4));
    }

    /// Backward search drops an occurrence that ends at the caret before
    /// looking for the last one. With overlapping repeats that trim also
    /// removes the only earlier candidate.
    #[test]
    fn backward_trim_swallows_overlapping_repeat() {
        let tree = PlaintextCodec.parse("aaa").unwrap();
        assert_eq!(
            find(&tree, tree.content_end(), "aa", Direction::Backward),
            None
        );
        let tree = PlaintextCodec.parse("aaaa").unwrap();
        let found = find(&tree, tree.content_end(), "aa", Direction::Backward).unwrap();
        assert_eq!(found.start, StructuralPosition::new(0, 0, 0));
        assert_eq!(found.end, StructuralPosition::new(0, 0, 2));
    }

    #[test]
    fn stale_caret_is_clamped() {
        let tree = PlaintextCodec.parse(SAMPLE).unwrap();
        let found = find(&tree, StructuralPosition::new(9, 9, 9), "again", Direction::Backward)
            .unwrap();
        assert_eq!(found.end, StructuralPosition::new(0, 0, 24));
    }
}
