//! # inkdoc engine
//!
//! Rich-text notes as an in-memory document tree, plus the codecs that move
//! notes between their stored text and that tree.
//!
//! ## Modules
//!
//! - **`document`**: the tree (paragraphs, runs, images) and position mapping
//! - **`codec`**: plaintext and markup codecs behind the `Codec` trait
//! - **`registry`**: format-keyed codec dispatch
//! - **`preview`**: bounded plaintext previews for note lists
//! - **`search`**: case-insensitive find next/previous with selection
//! - **`session`**: one open note with its caret, selection and edits
//! - **`io`** / **`models`**: notes on disk

pub mod codec;
pub mod document;
pub mod io;
pub mod models;
pub mod preview;
pub mod registry;
pub mod search;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use codec::{Codec, CodecError, MarkupCodec, PlaintextCodec, TextFormat};
pub use document::*;
pub use io::*;
pub use models::NoteFile;
pub use preview::DEFAULT_PREVIEW_LENGTH;
pub use registry::ConverterRegistry;
pub use search::{Selection, TextSurface};
pub use session::NoteSession;
