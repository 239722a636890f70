use inkdoc_engine::{
    Block, Codec, CodecError, ConverterRegistry, DocumentTree, ImageBlock, MarkupCodec,
    Paragraph, PlaintextCodec, Run, TextFormat, codec::markup::decode_image_payload, preview,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn text(s: &str) -> Run {
    Run::Text(s.to_string())
}

fn paragraph(runs: Vec<Run>) -> Block {
    Block::Paragraph(Paragraph::new(runs))
}

#[test]
fn fixture_hand_edited_markup() {
    let tree = MarkupCodec.parse(&fixture("hand_edited.xaml")).unwrap();

    assert_eq!(
        tree.blocks().cloned().collect::<Vec<_>>(),
        vec![
            paragraph(vec![text("Shopping")]),
            paragraph(vec![text("eggs & milk"), Run::LineBreak, text("bread")]),
            paragraph(vec![text("Template: {0}")]),
        ]
    );
    insta::assert_snapshot!(
        PlaintextCodec.save(&tree),
        @r"
    Shopping

    eggs & milk
    bread

    Template: {0}
    "
    );
}

#[test]
fn fixture_embedded_image() {
    let tree = MarkupCodec.parse(&fixture("with_image.xaml")).unwrap();

    assert_eq!(tree.len(), 3);
    assert_eq!(
        tree.block(1),
        Some(&Block::Image(ImageBlock::new(PNG_HEADER.to_vec())))
    );
    assert_eq!(
        preview::extract_default(&tree),
        "Before the picture\n\nAfter the picture"
    );
}

#[test]
fn saved_fixture_reparses_to_same_tree() {
    let tree = MarkupCodec.parse(&fixture("with_image.xaml")).unwrap();
    let saved = MarkupCodec.save(&tree);
    assert_eq!(saved.trim(), fixture("with_image.xaml").trim());
    assert_eq!(MarkupCodec.parse(&saved).unwrap(), tree);
}

#[rstest]
#[case(0, 1)]
#[case(2, 5)]
#[case(4, 5)]
#[case(0, 0)]
fn image_keeps_its_place_among_paragraphs(#[case] index: usize, #[case] paragraphs: usize) {
    let mut blocks: Vec<Block> = (0..paragraphs)
        .map(|i| paragraph(vec![text(&format!("paragraph {i}"))]))
        .collect();
    let bytes: Vec<u8> = (0..64).map(|i| (i * 7) as u8).collect();
    blocks.insert(index.min(paragraphs), Block::Image(ImageBlock::new(bytes.clone())));
    let tree = DocumentTree::from_blocks(blocks);

    let parsed = MarkupCodec.parse(&MarkupCodec.save(&tree)).unwrap();

    assert_eq!(parsed.len(), paragraphs + 1);
    assert_eq!(
        parsed.block(index.min(paragraphs)),
        Some(&Block::Image(ImageBlock::new(bytes)))
    );
}

#[test]
fn several_images_keep_document_order() {
    let tree = DocumentTree::from_blocks(vec![
        Block::Image(ImageBlock::new(vec![1])),
        paragraph(vec![text("between")]),
        Block::Image(ImageBlock::new(vec![2, 2])),
        Block::Image(ImageBlock::new(vec![3, 3, 3])),
    ]);
    let parsed = MarkupCodec.parse(&MarkupCodec.save(&tree)).unwrap();
    assert_eq!(parsed, tree);
}

#[test]
fn markup_round_trip_through_registry() {
    let registry = ConverterRegistry::with_defaults();
    let tree = DocumentTree::from_blocks(vec![
        paragraph(vec![text("{ json: true }"), Run::LineBreak, text("<tag>")]),
        paragraph(vec![text(""), Run::LineBreak]),
        paragraph(vec![text("tail")]),
    ]);

    let stored = registry.save(&tree, TextFormat::Markup).unwrap();
    assert_eq!(registry.parse(&stored, TextFormat::Markup).unwrap(), tree);
}

#[rstest]
#[case("plain note")]
#[case("line one\nline two\n\n\n\nnext paragraph")]
#[case("  padded  \r\n\r\n  lines  ")]
#[case("{braces} & <angles>")]
fn plaintext_survives_conversion_to_markup_and_back(#[case] input: &str) {
    let registry = ConverterRegistry::with_defaults();
    let normalized = PlaintextCodec.save(&PlaintextCodec.parse(input).unwrap());

    let markup = registry
        .convert(input, TextFormat::Plaintext, TextFormat::Markup)
        .unwrap();
    let back = registry
        .convert(&markup, TextFormat::Markup, TextFormat::Plaintext)
        .unwrap();

    assert_eq!(back, normalized);
}

#[test]
fn deeply_nested_note_fails_without_crashing() {
    let markup = format!("{}{}", "<Section>".repeat(5000), "</Section>".repeat(5000));

    let result = MarkupCodec.parse(&markup);

    assert!(matches!(result, Err(CodecError::MarkupParse { .. })));
}

#[test]
fn strict_image_decode_is_available_to_callers() {
    assert_eq!(decode_image_payload("iVBORw0KGgo=").unwrap(), PNG_HEADER.to_vec());
    assert!(matches!(
        decode_image_payload("not base64!"),
        Err(CodecError::ImageDecode(_))
    ));
}
