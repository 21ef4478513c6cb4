use std::{io, path::PathBuf};

use thiserror::Error;
use write_fonts::{read::ReadError, types::Tag};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Cannot parse font: {0}")]
    Read(#[from] ReadError),

    #[error("Font has no '{0}' table")]
    MissingTable(Tag),

    #[error("Malformed '{tag}' table: {reason}")]
    Malformed { tag: Tag, reason: String },

    #[error("No glyph is mapped to code point {0:#06X}")]
    GlyphNotFound(u32),

    #[error("Code point {0:#06X} is already mapped to a glyph")]
    SlotOccupied(u32),

    #[error("Font already holds the maximum number of glyphs")]
    TooManyGlyphs,

    #[error("Unsupported font: {0}")]
    Unsupported(String),
}

impl Error {
    pub(crate) fn malformed(tag: Tag, reason: impl Into<String>) -> Self {
        Error::Malformed {
            tag,
            reason: reason.into(),
        }
    }
}
