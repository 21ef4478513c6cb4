//! An open font and the slot primitives: query, copy, paste, save.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use kurbo::Rect;
use write_fonts::{
    read::{
        tables::{head::Head, maxp::Maxp},
        FontData, FontRead, FontRef,
    },
    types::{GlyphId, Tag},
    FontBuilder,
};

use crate::cmap::CharMap;
use crate::glyf::{self, Outlines};
use crate::metrics::{self, HMetric};
use crate::post;
use crate::sfnt::{
    self, set_u16, CFF, CFF2, CMAP, GLYF, GVAR, HDMX, HEAD, HHEA, HMTX, HVAR, LOCA, LTSH, MAXP,
    POST, VMTX,
};
use crate::{Error, Result};

const INDEX_TO_LOC_FORMAT: usize = 50;
const MAXP_NUM_GLYPHS: usize = 4;

/// Tables that hold one entry per glyph and are only caches; they are dropped
/// rather than extended when a glyph is added.
const PER_GLYPH_CACHES: [Tag; 2] = [HDMX, LTSH];

/// An open TrueType font.
///
/// Edits are kept as replacement tables on top of the bytes that were read;
/// nothing touches the disk until [`FontResource::save`].
#[derive(Debug)]
pub struct FontResource {
    path: PathBuf,
    data: Vec<u8>,
    replaced: BTreeMap<Tag, Vec<u8>>,
    dropped: BTreeSet<Tag>,
}

/// A glyph lifted out of a font by [`FontResource::copy`].
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphClipboard {
    record: Vec<u8>,
    advance: u16,
    lsb: i16,
    bounds: Option<Rect>,
}

impl GlyphClipboard {
    /// The raw `glyf` record; empty for glyphs without outline.
    pub fn outline(&self) -> &[u8] {
        &self.record
    }

    pub fn advance(&self) -> u16 {
        self.advance
    }

    pub fn lsb(&self) -> i16 {
        self.lsb
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

impl FontResource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, data)
    }

    /// Wraps font bytes that were read elsewhere; `path` is only used for
    /// reporting.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        FontRef::new(&data)?;
        Ok(Self {
            path: path.into(),
            data,
            replaced: BTreeMap::new(),
            dropped: BTreeSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_modified(&self) -> bool {
        !self.replaced.is_empty() || !self.dropped.is_empty()
    }

    /// The glyph `code_point` maps to, or `None` if the slot is empty.
    ///
    /// Only a missing mapping counts as "not found"; a font whose `cmap` is
    /// absent or cannot be parsed is an error.
    pub fn glyph_id(&self, code_point: u32) -> Result<Option<GlyphId>> {
        let Some(glyph) = self.char_map()?.glyph_for(code_point) else {
            return Ok(None);
        };
        let num_glyphs = self.num_glyphs()?;
        if glyph >= u32::from(num_glyphs) {
            log::warn!(
                "{}: code point {code_point:#06X} maps to glyph {glyph}, but the font only has {num_glyphs} glyphs",
                self.path.display()
            );
            return Ok(None);
        }
        Ok(Some(GlyphId::new(glyph)))
    }

    pub fn has_glyph(&self, code_point: u32) -> Result<bool> {
        Ok(self.glyph_id(code_point)?.is_some())
    }

    pub fn num_glyphs(&self) -> Result<u16> {
        Ok(Maxp::read(FontData::new(self.required_table(MAXP)?))?.num_glyphs())
    }

    /// Bounding box of the glyph in `code_point`; `None` for empty slots and
    /// glyphs without outline.
    pub fn glyph_bounds(&self, code_point: u32) -> Result<Option<Rect>> {
        match self.glyph_id(code_point)? {
            Some(glyph) => Ok(glyf::bounds(self.outlines()?.glyph(glyph.to_u32())?)),
            None => Ok(None),
        }
    }

    /// Copies the outline and horizontal metrics of the glyph in
    /// `code_point`.
    pub fn copy(&self, code_point: u32) -> Result<GlyphClipboard> {
        let glyph = self
            .glyph_id(code_point)?
            .ok_or(Error::GlyphNotFound(code_point))?
            .to_u32();
        let record = self.outlines()?.glyph(glyph)?.to_vec();
        let metric = self.metrics()?[glyph as usize];
        Ok(GlyphClipboard {
            bounds: glyf::bounds(&record),
            record,
            advance: metric.advance,
            lsb: metric.lsb,
        })
    }

    /// Adds the clipboard glyph as a new glyph and maps the empty slot
    /// `code_point` to it. No existing glyph is changed.
    pub fn paste(&mut self, clipboard: &GlyphClipboard, code_point: u32) -> Result<GlyphId> {
        if self.glyph_id(code_point)?.is_some() {
            return Err(Error::SlotOccupied(code_point));
        }
        self.check_extensible()?;
        let num_glyphs = self.num_glyphs()?;
        if num_glyphs == u16::MAX {
            return Err(Error::TooManyGlyphs);
        }
        let glyph = u32::from(num_glyphs);

        let mut char_map = self.char_map()?;
        char_map.insert(code_point, glyph)?;
        let cmap = char_map.write()?;

        let mut outlines = self.outlines()?;
        outlines.push(&clipboard.record);

        let mut metrics = self.metrics()?;
        metrics.push(HMetric {
            advance: clipboard.advance,
            lsb: clipboard.lsb,
        });
        let (hmtx, num_long) = metrics::write(&metrics);
        let mut hhea = self.required_table(HHEA)?.to_vec();
        metrics::set_number_of_long_metrics(&mut hhea, num_long)?;

        let mut maxp = self.required_table(MAXP)?.to_vec();
        set_u16(&mut maxp, MAXP, MAXP_NUM_GLYPHS, num_glyphs + 1)?;
        let mut head = self.required_table(HEAD)?.to_vec();
        set_u16(
            &mut head,
            HEAD,
            INDEX_TO_LOC_FORMAT,
            u16::from(outlines.long_offsets()),
        )?;

        let post = match self.table(POST)? {
            Some(post) => post::append_glyph_name(post, &post::glyph_name(code_point), num_glyphs)?,
            None => None,
        };

        // Everything is computed; commit.
        self.replaced.insert(CMAP, cmap);
        self.replaced.insert(GLYF, outlines.glyf().to_vec());
        self.replaced.insert(LOCA, outlines.loca());
        self.replaced.insert(HMTX, hmtx);
        self.replaced.insert(HHEA, hhea);
        self.replaced.insert(MAXP, maxp);
        self.replaced.insert(HEAD, head);
        if let Some(post) = post {
            self.replaced.insert(POST, post);
        }
        for tag in PER_GLYPH_CACHES {
            if self.table(tag)?.is_some() {
                log::info!("{}: dropping '{tag}' table", self.path.display());
                self.dropped.insert(tag);
            }
        }

        log::debug!(
            "{}: pasted {} byte outline as glyph {glyph} at {code_point:#06X}",
            self.path.display(),
            clipboard.record.len()
        );
        Ok(GlyphId::new(glyph))
    }

    /// Serializes the font, edits included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut tags: BTreeSet<Tag> = sfnt::table_tags(&self.data)?.into_iter().collect();
        tags.extend(self.replaced.keys().copied());

        let mut head = self.required_table(HEAD)?.to_vec();
        sfnt::clear_checksum_adjustment(&mut head)?;

        let mut builder = FontBuilder::new();
        builder.add_raw(HEAD, head);
        for tag in tags {
            if tag == HEAD {
                continue;
            }
            if let Some(data) = self.table(tag)? {
                builder.add_raw(tag, data);
            }
        }
        let mut font = builder.build();
        sfnt::fix_checksum_adjustment(&mut font)?;
        Ok(font)
    }

    /// Writes the font to `path`, replacing any file there.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let font = self.to_bytes()?;
        fs::write(path, font).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn table(&self, tag: Tag) -> Result<Option<&[u8]>> {
        if self.dropped.contains(&tag) {
            return Ok(None);
        }
        if let Some(data) = self.replaced.get(&tag) {
            return Ok(Some(data));
        }
        let font = FontRef::new(&self.data)?;
        Ok(font.table_data(tag).map(|data| data.as_bytes()))
    }

    fn required_table(&self, tag: Tag) -> Result<&[u8]> {
        self.table(tag)?.ok_or(Error::MissingTable(tag))
    }

    fn char_map(&self) -> Result<CharMap> {
        CharMap::read(self.required_table(CMAP)?)
    }

    fn outlines(&self) -> Result<Outlines> {
        let head = Head::read(FontData::new(self.required_table(HEAD)?))?;
        Outlines::read(
            self.required_table(GLYF)?,
            self.required_table(LOCA)?,
            head.index_to_loc_format() == 1,
            self.num_glyphs()?,
        )
    }

    fn metrics(&self) -> Result<Vec<HMetric>> {
        let num_long = metrics::number_of_long_metrics(self.required_table(HHEA)?)?;
        metrics::read(self.required_table(HMTX)?, num_long, self.num_glyphs()?)
    }

    fn check_extensible(&self) -> Result<()> {
        for tag in [CFF, CFF2] {
            if self.table(tag)?.is_some() {
                return Err(Error::Unsupported(format!(
                    "'{tag}' outlines cannot be pasted into"
                )));
            }
        }
        if self.table(GLYF)?.is_none() {
            return Err(Error::MissingTable(GLYF));
        }
        for tag in [GVAR, HVAR, VMTX] {
            if self.table(tag)?.is_some() {
                return Err(Error::Unsupported(format!(
                    "'{tag}' table cannot be extended with a new glyph"
                )));
            }
        }
        Ok(())
    }
}
