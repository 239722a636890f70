use super::position::StructuralPosition;

/// Inline content inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// A fragment of text. May be empty, which marks an explicit empty line.
    Text(String),
    /// A soft break: advances one line without starting a new paragraph.
    LineBreak,
}

impl Run {
    /// Number of characters this run contributes to the linear text.
    pub fn char_len(&self) -> usize {
        match self {
            Run::Text(text) => text.chars().count(),
            Run::LineBreak => 1,
        }
    }
}

/// A paragraph: an ordered sequence of runs ending in a hard break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        let mut paragraph = Self { runs };
        paragraph.normalize();
        paragraph
    }

    /// Character length of the paragraph's content (line breaks count 1).
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    /// A paragraph whose only run is a line break gets a zero-length text run
    /// in front of it. Returns true when a run was inserted.
    fn normalize(&mut self) -> bool {
        if self.runs.len() == 1 && self.runs[0] == Run::LineBreak {
            self.runs.insert(0, Run::Text(String::new()));
            return true;
        }
        false
    }
}

/// An embedded binary image. Persisted in markup as a paragraph tagged with
/// [`ImageBlock::MARKER`] whose text is the base64 of `bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBlock {
    pub bytes: Vec<u8>,
}

impl ImageBlock {
    pub const MARKER: &'static str = "base64";

    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// A top-level block of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Image(ImageBlock),
}

impl Block {
    /// Character length of the block's content (images contribute nothing).
    pub fn char_len(&self) -> usize {
        match self {
            Block::Paragraph(paragraph) => paragraph.char_len(),
            Block::Image(_) => 0,
        }
    }

    /// Index one past the last run: the run index of the block's end stop.
    pub(crate) fn end_run(&self) -> usize {
        match self {
            Block::Paragraph(paragraph) => paragraph.runs.len(),
            Block::Image(_) => 1,
        }
    }
}

/// The in-memory rich document: an ordered, never-empty sequence of blocks.
///
/// An empty document is exactly one paragraph with no runs. Positions handed
/// out by a tree are only meaningful for that tree and become stale after any
/// insert; stale positions are clamped to the nearest valid one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    blocks: Vec<Block>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl DocumentTree {
    pub fn empty() -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::default())],
        }
    }

    /// Builds a tree from blocks, restoring the tree invariants: no blocks
    /// becomes one empty paragraph, and a lone line break gains a leading
    /// empty text run.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::empty();
        }
        let blocks = blocks
            .into_iter()
            .map(|block| match block {
                Block::Paragraph(paragraph) => Block::Paragraph(Paragraph::new(paragraph.runs)),
                image => image,
            })
            .collect();
        Self { blocks }
    }

    /// Blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter()
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for the canonical empty document.
    pub fn is_empty(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block::Paragraph(p)] if p.runs.is_empty())
    }

    pub fn content_start(&self) -> StructuralPosition {
        StructuralPosition::new(0, 0, 0)
    }

    pub fn content_end(&self) -> StructuralPosition {
        let last = self.blocks.len() - 1;
        StructuralPosition::new(last, self.blocks[last].end_run(), 0)
    }

    /// Whether `pos` addresses a stop inside this tree.
    pub fn is_valid(&self, pos: StructuralPosition) -> bool {
        let Some(block) = self.blocks.get(pos.block) else {
            return false;
        };
        match block {
            Block::Paragraph(paragraph) => match paragraph.runs.get(pos.run) {
                Some(run @ Run::Text(_)) => pos.offset <= run.char_len(),
                Some(Run::LineBreak) => pos.offset == 0,
                None => pos.run == paragraph.runs.len() && pos.offset == 0,
            },
            Block::Image(_) => pos.run <= 1 && pos.offset == 0,
        }
    }

    /// Nearest valid position to `pos`.
    pub fn clamp(&self, pos: StructuralPosition) -> StructuralPosition {
        if self.is_valid(pos) {
            return pos;
        }
        if pos.block >= self.blocks.len() {
            return self.content_end();
        }
        let block = &self.blocks[pos.block];
        let run = pos.run.min(block.end_run());
        let offset = match block {
            Block::Paragraph(paragraph) => match paragraph.runs.get(run) {
                Some(Run::Text(text)) => pos.offset.min(text.chars().count()),
                _ => 0,
            },
            Block::Image(_) => 0,
        };
        StructuralPosition::new(pos.block, run, offset)
    }

    /// Inserts `text` at `pos` and returns the position just after it.
    ///
    /// Text typed at a run boundary extends the preceding text run. Inserting
    /// next to an image creates a new paragraph on that side of it.
    pub fn insert_text(&mut self, pos: StructuralPosition, text: &str) -> StructuralPosition {
        let pos = self.clamp(pos);
        if text.is_empty() {
            return pos;
        }
        let inserted = text.chars().count();

        let paragraph = match &mut self.blocks[pos.block] {
            Block::Paragraph(paragraph) => paragraph,
            Block::Image(_) => {
                let at = pos.block + pos.run;
                self.blocks.insert(
                    at,
                    Block::Paragraph(Paragraph::new(vec![Run::Text(text.to_string())])),
                );
                return StructuralPosition::new(at, 0, inserted);
            }
        };

        if let Some(Run::Text(existing)) = paragraph.runs.get_mut(pos.run) {
            existing.insert_str(byte_index(existing, pos.offset), text);
            return StructuralPosition::new(pos.block, pos.run, pos.offset + inserted);
        }

        // At a line break or the paragraph end: append to a preceding text run.
        if pos.run > 0
            && let Some(Run::Text(previous)) = paragraph.runs.get_mut(pos.run - 1)
        {
            let offset = previous.chars().count() + inserted;
            previous.push_str(text);
            return StructuralPosition::new(pos.block, pos.run - 1, offset);
        }

        paragraph
            .runs
            .insert(pos.run, Run::Text(text.to_string()));
        StructuralPosition::new(pos.block, pos.run, inserted)
    }

    /// Splits the paragraph at `pos` into two and returns the start of the
    /// second one.
    pub fn insert_paragraph_break(&mut self, pos: StructuralPosition) -> StructuralPosition {
        let pos = self.clamp(pos);
        let paragraph = match &mut self.blocks[pos.block] {
            Block::Paragraph(paragraph) => paragraph,
            Block::Image(_) => {
                // Either way the block after the break sits at `block + 1`.
                self.blocks
                    .insert(pos.block + pos.run, Block::Paragraph(Paragraph::default()));
                return StructuralPosition::new(pos.block + 1, 0, 0);
            }
        };

        let tail = split_runs(&mut paragraph.runs, pos.run, pos.offset);
        paragraph.normalize();
        self.blocks
            .insert(pos.block + 1, Block::Paragraph(Paragraph::new(tail)));
        StructuralPosition::new(pos.block + 1, 0, 0)
    }

    /// Inserts a soft line break at `pos` and returns the position after it.
    pub fn insert_line_break(&mut self, pos: StructuralPosition) -> StructuralPosition {
        let pos = self.clamp(pos);
        let paragraph = match &mut self.blocks[pos.block] {
            Block::Paragraph(paragraph) => paragraph,
            Block::Image(_) => {
                let at = pos.block + pos.run;
                self.blocks
                    .insert(at, Block::Paragraph(Paragraph::new(vec![Run::LineBreak])));
                return StructuralPosition::new(at, 2, 0);
            }
        };

        let tail = split_runs(&mut paragraph.runs, pos.run, pos.offset);
        paragraph.runs.push(Run::LineBreak);
        let mut after = paragraph.runs.len();
        paragraph.runs.extend(tail);
        if paragraph.normalize() {
            after += 1;
        }
        StructuralPosition::new(pos.block, after, 0)
    }
}

/// Splits `runs` at (`run`, `offset`), leaving the head in place and
/// returning the tail. A text run split mid-way is divided in two.
fn split_runs(runs: &mut Vec<Run>, run: usize, offset: usize) -> Vec<Run> {
    match runs.get_mut(run) {
        Some(Run::Text(text)) if offset > 0 => {
            let at = byte_index(text, offset);
            if at == text.len() {
                return runs.split_off(run + 1);
            }
            let rest = text.split_off(at);
            let mut tail = runs.split_off(run + 1);
            tail.insert(0, Run::Text(rest));
            tail
        }
        _ => runs.split_off(run.min(runs.len())),
    }
}

/// Byte index of the `chars`-th character of `s` (or `s.len()` past the end).
pub(crate) fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(s.len())
}
