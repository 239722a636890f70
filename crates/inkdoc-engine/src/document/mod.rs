//! # Document Model
//!
//! The in-memory rich document every codec produces and consumes.
//!
//! ## Modules
//!
//! - **`tree`**: `DocumentTree`, `Block` (paragraph or image) and `Run`
//!   (text or line break), plus the insert operations used by editors
//! - **`position`**: `StructuralPosition` addresses and the `PositionMapper`
//!   that converts them to and from linear character offsets
//!
//! ## Linear Text
//!
//! Every tree has one deterministic left-to-right linearization. Paragraph
//! boundaries are hard breaks (a blank line, two characters wide), line
//! breaks are soft breaks (one character), images take no characters.

pub mod position;
pub mod tree;

pub use position::{BLOCK_BOUNDARY_LEN, Direction, PointerContext, PositionMapper, StructuralPosition};
pub use tree::{Block, DocumentTree, ImageBlock, Paragraph, Run};
