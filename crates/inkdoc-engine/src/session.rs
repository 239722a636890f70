use crate::codec::{CodecError, TextFormat};
use crate::document::{Direction, DocumentTree, PositionMapper, StructuralPosition};
use crate::preview;
use crate::registry::ConverterRegistry;
use crate::search::{self, Selection, TextSurface};

/// An edit applied at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    InsertText(String),
    ParagraphBreak,
    LineBreak,
}

/// One open note: the editing surface that owns a [`DocumentTree`].
///
/// A session holds:
///
/// ## 1. The Tree
/// - Parsed once from the stored text through the [`ConverterRegistry`]
/// - Mutated only through [`NoteSession::apply`], which keeps the caret valid
///
/// ## 2. Caret and Selection
/// - The caret is where edits land and where searches start
/// - A successful search moves the caret to the end of the match and selects it
/// - Any edit clears the selection
///
/// ## 3. Change Detection
/// - The stored text is normalized once on open by saving it back
/// - [`NoteSession::is_modified`] compares a fresh save against that baseline
///
/// ## Usage Pattern
///
/// ```rust
/// # use inkdoc_engine::{ConverterRegistry, NoteSession, TextFormat, session::Edit};
/// let registry = ConverterRegistry::with_defaults();
/// let mut note = NoteSession::open(&registry, "Hello world", TextFormat::Plaintext).unwrap();
///
/// note.find_next("WORLD").unwrap();
/// assert_eq!(note.selected_text().as_deref(), Some("world"));
///
/// note.apply(Edit::InsertText("!".to_string()));
/// assert_eq!(note.save(&registry).unwrap(), "Hello world!");
/// assert!(note.is_modified(&registry));
/// ```
pub struct NoteSession {
    tree: DocumentTree,
    format: TextFormat,
    baseline: String,
    caret: StructuralPosition,
    selection: Option<Selection>,
    version: u64,
}

impl NoteSession {
    /// Parses `text` stored as `format` and places the caret at the start.
    pub fn open(
        registry: &ConverterRegistry,
        text: &str,
        format: TextFormat,
    ) -> Result<Self, CodecError> {
        let tree = registry.parse(text, format)?;
        let baseline = registry.save(&tree, format)?;
        let caret = tree.content_start();
        Ok(Self {
            tree,
            format,
            baseline,
            caret,
            selection: None,
            version: 0,
        })
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn caret(&self) -> StructuralPosition {
        self.caret
    }

    /// Moves the caret, clamping positions that are not in the tree.
    pub fn set_caret(&mut self, pos: StructuralPosition) {
        self.caret = self.tree.clamp(pos);
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Incremented on each edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Applies `edit` at the caret and leaves the caret after the new content.
    pub fn apply(&mut self, edit: Edit) -> StructuralPosition {
        let at = self.caret;
        self.caret = match edit {
            Edit::InsertText(text) => self.tree.insert_text(at, &text),
            Edit::ParagraphBreak => self.tree.insert_paragraph_break(at),
            Edit::LineBreak => self.tree.insert_line_break(at),
        };
        self.selection = None;
        self.version += 1;
        self.caret
    }

    /// Serializes the tree back to the session's format.
    pub fn save(&self, registry: &ConverterRegistry) -> Result<String, CodecError> {
        registry.save(&self.tree, self.format)
    }

    pub fn is_modified(&self, registry: &ConverterRegistry) -> bool {
        self.save(registry)
            .map(|saved| saved != self.baseline)
            .unwrap_or(true)
    }

    pub fn preview(&self, max_len: usize) -> String {
        preview::extract(&self.tree, max_len)
    }

    pub fn find_next(&mut self, target: &str) -> Option<Selection> {
        search::locate(self, target, Direction::Forward)
    }

    pub fn find_previous(&mut self, target: &str) -> Option<Selection> {
        search::locate(self, target, Direction::Backward)
    }

    /// Run text covered by the selection.
    pub fn selected_text(&self) -> Option<String> {
        let selection = self.selection?;
        Some(PositionMapper::new(&self.tree).plaintext_between(selection.start, selection.end))
    }
}

impl TextSurface for NoteSession {
    fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    fn caret(&self) -> StructuralPosition {
        self.caret
    }

    fn set_caret(&mut self, pos: StructuralPosition) {
        NoteSession::set_caret(self, pos);
    }

    fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open(text: &str, format: TextFormat) -> (ConverterRegistry, NoteSession) {
        let registry = ConverterRegistry::with_defaults();
        let session = NoteSession::open(&registry, text, format).unwrap();
        (registry, session)
    }

    #[test]
    fn fresh_session_is_unmodified() {
        let (registry, session) = open("a\n\n\n\nb", TextFormat::Plaintext);
        assert!(!session.is_modified(&registry));
        assert_eq!(session.caret(), session.tree().content_start());
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn edits_move_caret_and_mark_modified() {
        let (registry, mut session) = open("<Paragraph><Run>ab</Run></Paragraph>", TextFormat::Markup);
        session.set_caret(session.tree().content_end());
        session.apply(Edit::InsertText("c".to_string()));
        session.apply(Edit::LineBreak);
        session.apply(Edit::InsertText("d".to_string()));
        session.apply(Edit::ParagraphBreak);
        session.apply(Edit::InsertText("e".to_string()));

        assert_eq!(session.version(), 5);
        assert!(session.is_modified(&registry));
        assert_eq!(
            session.save(&registry).unwrap(),
            "<Paragraph><Run>abc</Run><LineBreak /><Run>d</Run></Paragraph>\
             <Paragraph><Run>e</Run></Paragraph>"
        );
    }

    #[test]
    fn find_next_and_previous_walk_matches() {
        let (_, mut session) = open("one two one two one", TextFormat::Plaintext);
        session.find_next("one").unwrap();
        session.find_next("one").unwrap();
        assert_eq!(session.caret(), StructuralPosition::new(0, 0, 11));

        session.find_previous("one").unwrap();
        assert_eq!(session.selected_text().as_deref(), Some("one"));
        assert_eq!(
            session.selection().map(|s| s.start),
            Some(StructuralPosition::new(0, 0, 0))
        );
    }

    #[test]
    fn edit_clears_selection() {
        let (_, mut session) = open("find me", TextFormat::Plaintext);
        session.find_next("me").unwrap();
        assert!(session.selection().is_some());
        session.apply(Edit::InsertText("!".to_string()));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn stale_caret_is_clamped() {
        let (_, mut session) = open("short", TextFormat::Plaintext);
        session.set_caret(StructuralPosition::new(4, 4, 4));
        assert_eq!(session.caret(), session.tree().content_end());
    }

    #[test]
    fn open_reports_parse_errors() {
        let registry = ConverterRegistry::with_defaults();
        assert!(matches!(
            NoteSession::open(&registry, "<Paragraph>", TextFormat::Markup),
            Err(CodecError::MarkupParse { .. })
        ));
    }
}
