use inkdoc_engine::{
    ConverterRegistry, Direction, NoteSession, PositionMapper, Selection, TextFormat, search,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const DOCUMENT: &str = "Hello world, hello again.";

fn open(text: &str, format: TextFormat) -> NoteSession {
    NoteSession::open(&ConverterRegistry::with_defaults(), text, format).unwrap()
}

fn offsets(session: &NoteSession, selection: Selection) -> (usize, usize) {
    let mapper = PositionMapper::new(session.tree());
    (
        mapper.offset_from_start(selection.start),
        mapper.offset_from_start(selection.end),
    )
}

#[test]
fn forward_from_start_finds_first_occurrence() {
    let mut session = open(DOCUMENT, TextFormat::Plaintext);
    let selection = session.find_next("hello").unwrap();
    assert_eq!(offsets(&session, selection), (0, 5));
    assert_eq!(session.selected_text().as_deref(), Some("Hello"));
}

#[test]
fn backward_from_end_finds_second_occurrence() {
    let mut session = open(DOCUMENT, TextFormat::Plaintext);
    session.set_caret(session.tree().content_end());
    let selection = session.find_previous("hello").unwrap();
    assert_eq!(offsets(&session, selection), (13, 18));
    assert_eq!(session.selected_text().as_deref(), Some("hello"));
}

#[rstest]
#[case(Direction::Forward)]
#[case(Direction::Backward)]
fn missing_target_changes_nothing(#[case] direction: Direction) {
    let mut session = open(DOCUMENT, TextFormat::Plaintext);
    let caret = session.caret();
    assert_eq!(search::locate(&mut session, "xyz", direction), None);
    assert_eq!(session.caret(), caret);
    assert_eq!(session.selection(), None);
}

#[test]
fn search_reaches_into_later_markup_paragraphs() {
    let mut session = open(
        "<Paragraph><Run>Groceries</Run></Paragraph>\
         <Paragraph Tag=\"base64\">AQID</Paragraph>\
         <Paragraph><Run>buy </Run><Run>Milk</Run><LineBreak /><Run>and eggs</Run></Paragraph>",
        TextFormat::Markup,
    );

    let selection = session.find_next("milk").unwrap();
    assert_eq!(session.selected_text().as_deref(), Some("Milk"));
    assert_eq!(selection.end.block_index(), 2);
    assert_eq!(selection.end.run_index(), 1);

    let selection = session.find_next("eggs").unwrap();
    assert_eq!(selection.end.run_index(), 3);
    assert_eq!(session.find_next("eggs"), None);
}

/// An occurrence ending exactly at the caret is not a candidate, so the one
/// in the last paragraph is never selected from the document end.
#[test]
fn find_previous_skips_occurrence_ending_at_caret() {
    let mut session = open("ab\n\nab\n\nab", TextFormat::Plaintext);
    session.set_caret(session.tree().content_end());

    let blocks: Vec<usize> = std::iter::from_fn(|| session.find_previous("AB"))
        .map(|selection| selection.start.block_index())
        .collect();

    assert_eq!(blocks, vec![1, 0]);
}
