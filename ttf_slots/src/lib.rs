//! Glyph slot editing for TrueType fonts.
//!
//! A "slot" is a code point in the font's `cmap`. The crate answers whether a
//! slot is populated, copies a glyph out of one slot and pastes it into an
//! empty one, then writes the font back out. Everything else in the font is
//! carried through untouched, so the table surgery is kept to the handful of
//! tables that count glyphs: `glyf`, `loca`, `hmtx`, `hhea`, `maxp`, `post`
//! and `cmap`.
//!
//! New mappings go into every Unicode and Windows Symbol subtable. Macintosh
//! (1, 0) subtables are left as they are, so a pasted glyph has no Mac Roman
//! code even where one exists (U+00AC is 0xC2 there). Tools that regenerate
//! the whole `cmap` from scratch will differ on that point.
//!
//! Parsing and assembling the sfnt container is left to `read-fonts` and
//! `write-fonts`.

mod cmap;
mod error;
mod font;
mod glyf;
mod metrics;
mod post;
mod sfnt;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use font::{FontResource, GlyphClipboard};
pub use write_fonts::types::{GlyphId, Tag};
