use super::tree::{Block, DocumentTree, Run, byte_index};

/// Width of a block boundary in the linear text (a blank line).
pub const BLOCK_BOUNDARY_LEN: usize = 2;

/// An address into one specific [`DocumentTree`]: block index, run index and
/// character offset inside that run.
///
/// Positions order in document order. Two positions at the same linear offset
/// can still differ (the end of one run and the start of the next), the same
/// way an element end and the following element start do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructuralPosition {
    pub(crate) block: usize,
    pub(crate) run: usize,
    pub(crate) offset: usize,
}

impl StructuralPosition {
    pub(crate) fn new(block: usize, run: usize, offset: usize) -> Self {
        Self { block, run, offset }
    }

    pub fn block_index(&self) -> usize {
        self.block
    }

    pub fn run_index(&self) -> usize {
        self.run
    }

    /// Character offset inside the run.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// What lies immediately ahead of a position when walking forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerContext {
    /// Unread characters of a text run.
    Text,
    /// A line break element.
    LineBreak,
    /// An embedded image.
    Image,
    /// The end of a text run; the next stop is the following run.
    RunEnd,
    /// The end of a block; the next stop is the following block's start.
    BlockEnd,
}

/// Read-only navigation over a [`DocumentTree`].
///
/// Offsets follow the linear text model: text runs count their characters,
/// a line break counts 1, an image counts 0 and every block boundary counts
/// [`BLOCK_BOUNDARY_LEN`]. Every primitive returns `None` instead of failing
/// at the extremities or when handed a position that is not in the tree.
#[derive(Clone, Copy)]
pub struct PositionMapper<'a> {
    tree: &'a DocumentTree,
}

impl<'a> PositionMapper<'a> {
    pub fn new(tree: &'a DocumentTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a DocumentTree {
        self.tree
    }

    /// Number of linear characters between content start and `pos`.
    /// Invalid positions are clamped first.
    pub fn offset_from_start(&self, pos: StructuralPosition) -> usize {
        let pos = self.tree.clamp(pos);
        let before: usize = self
            .tree
            .blocks()
            .take(pos.block)
            .map(Block::char_len)
            .sum();
        let within = match self.tree.block(pos.block) {
            Some(Block::Paragraph(paragraph)) => {
                paragraph.runs[..pos.run].iter().map(Run::char_len).sum::<usize>() + pos.offset
            }
            _ => 0,
        };
        before + pos.block * BLOCK_BOUNDARY_LEN + within
    }

    /// The forward context at `pos`, or `None` for a position outside the tree.
    pub fn context(&self, pos: StructuralPosition) -> Option<PointerContext> {
        if !self.tree.is_valid(pos) {
            return None;
        }
        let context = match self.tree.block(pos.block)? {
            Block::Paragraph(paragraph) => match paragraph.runs.get(pos.run) {
                Some(run @ Run::Text(_)) if pos.offset < run.char_len() => PointerContext::Text,
                Some(Run::Text(_)) => PointerContext::RunEnd,
                Some(Run::LineBreak) => PointerContext::LineBreak,
                None => PointerContext::BlockEnd,
            },
            Block::Image(_) if pos.run == 0 => PointerContext::Image,
            Block::Image(_) => PointerContext::BlockEnd,
        };
        Some(context)
    }

    /// The unread text of the run at `pos`; empty when `pos` is not inside
    /// a text run.
    pub fn text_in_run(&self, pos: StructuralPosition) -> &'a str {
        let tree = self.tree;
        match tree.block(pos.block) {
            Some(Block::Paragraph(paragraph)) => match paragraph.runs.get(pos.run) {
                Some(Run::Text(text)) => &text[byte_index(text, pos.offset)..],
                _ => "",
            },
            _ => "",
        }
    }

    /// Steps `delta` linear characters forward from `pos`.
    ///
    /// A block boundary is indivisible: a step ending inside one lands on the
    /// next block's start. Returns `None` when `delta` runs past content end.
    pub fn advance(&self, pos: StructuralPosition, delta: usize) -> Option<StructuralPosition> {
        let mut pos = pos;
        let mut remaining = delta;
        loop {
            let context = self.context(pos)?;
            if remaining == 0 {
                return Some(pos);
            }
            match context {
                PointerContext::Text => {
                    let available = self.run_len(pos) - pos.offset;
                    if remaining <= available {
                        return Some(StructuralPosition::new(
                            pos.block,
                            pos.run,
                            pos.offset + remaining,
                        ));
                    }
                    remaining -= available;
                    pos = StructuralPosition::new(pos.block, pos.run, pos.offset + available);
                }
                PointerContext::LineBreak => {
                    remaining -= 1;
                    pos = StructuralPosition::new(pos.block, pos.run + 1, 0);
                }
                PointerContext::BlockEnd => {
                    if pos.block + 1 >= self.tree.len() {
                        return None;
                    }
                    remaining = remaining.saturating_sub(BLOCK_BOUNDARY_LEN);
                    pos = StructuralPosition::new(pos.block + 1, 0, 0);
                }
                PointerContext::Image | PointerContext::RunEnd => {
                    pos = StructuralPosition::new(pos.block, pos.run + 1, 0);
                }
            }
        }
    }

    /// Steps to the next run or element boundary in `direction`.
    pub fn next_structural(
        &self,
        pos: StructuralPosition,
        direction: Direction,
    ) -> Option<StructuralPosition> {
        match direction {
            Direction::Forward => self.step_forward(pos),
            Direction::Backward => self.step_backward(pos),
        }
    }

    pub fn prev_structural(&self, pos: StructuralPosition) -> Option<StructuralPosition> {
        self.next_structural(pos, Direction::Backward)
    }

    fn step_forward(&self, pos: StructuralPosition) -> Option<StructuralPosition> {
        match self.context(pos)? {
            PointerContext::Text => Some(StructuralPosition::new(
                pos.block,
                pos.run,
                self.run_len(pos),
            )),
            PointerContext::LineBreak | PointerContext::Image | PointerContext::RunEnd => {
                Some(StructuralPosition::new(pos.block, pos.run + 1, 0))
            }
            PointerContext::BlockEnd => {
                (pos.block + 1 < self.tree.len()).then(|| StructuralPosition::new(pos.block + 1, 0, 0))
            }
        }
    }

    fn step_backward(&self, pos: StructuralPosition) -> Option<StructuralPosition> {
        if !self.tree.is_valid(pos) {
            return None;
        }
        if pos.offset > 0 {
            return Some(StructuralPosition::new(pos.block, pos.run, 0));
        }
        if pos.run == 0 {
            return self.block_end(pos.block.checked_sub(1)?);
        }
        let previous = pos.run - 1;
        let offset = match self.tree.block(pos.block)? {
            Block::Paragraph(paragraph) => match &paragraph.runs[previous] {
                Run::Text(text) => text.chars().count(),
                Run::LineBreak => 0,
            },
            Block::Image(_) => 0,
        };
        Some(StructuralPosition::new(pos.block, previous, offset))
    }

    /// Steps one caret stop forward. Every character is a stop, as are the
    /// start and end of each block and both sides of an image.
    pub fn next_insertion(&self, pos: StructuralPosition) -> Option<StructuralPosition> {
        if !self.tree.is_valid(pos) {
            return None;
        }
        let caret = self.caret_offset(pos);
        if caret < self.caret_len(pos.block) {
            return Some(self.position_at_caret(pos.block, caret + 1));
        }
        (pos.block + 1 < self.tree.len()).then(|| StructuralPosition::new(pos.block + 1, 0, 0))
    }

    /// Steps one caret stop backward.
    pub fn prev_insertion(&self, pos: StructuralPosition) -> Option<StructuralPosition> {
        if !self.tree.is_valid(pos) {
            return None;
        }
        match self.caret_offset(pos) {
            0 => {
                let previous = pos.block.checked_sub(1)?;
                Some(self.position_at_caret(previous, self.caret_len(previous)))
            }
            caret => Some(self.position_at_caret(pos.block, caret - 1)),
        }
    }

    /// Concatenated text-run content between `from` and `to`. Line breaks and
    /// block boundaries contribute nothing.
    pub fn plaintext_between(&self, from: StructuralPosition, to: StructuralPosition) -> String {
        let mut out = String::new();
        let mut cursor = Some(from);
        while let Some(pos) = cursor {
            if pos >= to {
                break;
            }
            if self.context(pos) == Some(PointerContext::Text) {
                let text = self.text_in_run(pos);
                if (pos.block, pos.run) == (to.block, to.run) {
                    let take = to.offset.saturating_sub(pos.offset);
                    out.push_str(&text[..byte_index(text, take)]);
                    break;
                }
                out.push_str(text);
            }
            cursor = self.step_forward(pos);
        }
        out
    }

    fn block_end(&self, block: usize) -> Option<StructuralPosition> {
        let end_run = self.tree.block(block)?.end_run();
        Some(StructuralPosition::new(block, end_run, 0))
    }

    fn run_len(&self, pos: StructuralPosition) -> usize {
        match self.tree.block(pos.block) {
            Some(Block::Paragraph(paragraph)) => {
                paragraph.runs.get(pos.run).map_or(0, Run::char_len)
            }
            _ => 0,
        }
    }

    /// Caret stops inside a block, excluding its start.
    fn caret_len(&self, block: usize) -> usize {
        match self.tree.block(block) {
            Some(Block::Paragraph(paragraph)) => paragraph.char_len(),
            Some(Block::Image(_)) => 1,
            None => 0,
        }
    }

    fn caret_offset(&self, pos: StructuralPosition) -> usize {
        match self.tree.block(pos.block) {
            Some(Block::Paragraph(paragraph)) => {
                paragraph.runs[..pos.run].iter().map(Run::char_len).sum::<usize>() + pos.offset
            }
            _ => pos.run,
        }
    }

    /// Canonical position for caret stop `caret` of `block`. A stop on a run
    /// boundary resolves to the end of the preceding text run.
    fn position_at_caret(&self, block: usize, caret: usize) -> StructuralPosition {
        let paragraph = match self.tree.block(block) {
            Some(Block::Paragraph(paragraph)) => paragraph,
            _ => return StructuralPosition::new(block, caret.min(1), 0),
        };
        let mut consumed = 0;
        for (index, run) in paragraph.runs.iter().enumerate() {
            match run {
                Run::Text(text) => {
                    let len = text.chars().count();
                    if len > 0 && caret <= consumed + len {
                        return StructuralPosition::new(block, index, caret - consumed);
                    }
                    consumed += len;
                }
                Run::LineBreak => {
                    if caret == consumed {
                        return StructuralPosition::new(block, index, 0);
                    }
                    consumed += 1;
                }
            }
        }
        StructuralPosition::new(block, paragraph.runs.len(), 0)
    }
}
