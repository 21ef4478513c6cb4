//! TrueType outlines: the `glyf` table and its `loca` index.

use kurbo::Rect;
use write_fonts::read::{tables::loca::Loca, FontData};

use crate::sfnt::{GLYF, LOCA};
use crate::{Error, Result};

/// Largest glyf length addressable through short (halved u16) offsets.
const SHORT_OFFSET_LIMIT: usize = 0xFFFF * 2;

#[derive(Debug)]
pub(crate) struct Outlines {
    glyf: Vec<u8>,
    offsets: Vec<u32>,
    long_offsets: bool,
}

impl Outlines {
    pub(crate) fn read(glyf: &[u8], loca: &[u8], long_offsets: bool, num_glyphs: u16) -> Result<Self> {
        let loca = Loca::read(FontData::new(loca), long_offsets)?;
        let offsets = (0..=usize::from(num_glyphs))
            .map(|i| {
                loca.get_raw(i)
                    .ok_or_else(|| Error::malformed(LOCA, format!("no offset for glyph {i}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(Error::malformed(LOCA, "offsets are not ascending"));
        }
        // An empty offset list is impossible: there is always the end offset.
        let end = *offsets.last().unwrap_or(&0) as usize;
        let glyf = glyf
            .get(..end)
            .ok_or_else(|| Error::malformed(GLYF, "glyph data extends past the table"))?
            .to_vec();

        Ok(Self {
            glyf,
            offsets,
            long_offsets,
        })
    }

    /// The raw glyph record of `glyph`; empty for glyphs without outline.
    pub(crate) fn glyph(&self, glyph: u32) -> Result<&[u8]> {
        let glyph = glyph as usize;
        match (self.offsets.get(glyph), self.offsets.get(glyph + 1)) {
            (Some(&start), Some(&end)) => Ok(&self.glyf[start as usize..end as usize]),
            _ => Err(Error::malformed(LOCA, format!("no offset for glyph {glyph}"))),
        }
    }

    /// Appends a glyph record after the last glyph.
    pub(crate) fn push(&mut self, record: &[u8]) {
        self.glyf.extend_from_slice(record);
        while self.glyf.len() % 4 != 0 {
            self.glyf.push(0);
        }
        if !self.long_offsets && self.glyf.len() > SHORT_OFFSET_LIMIT {
            log::debug!("glyf outgrew short loca offsets, switching to long offsets");
            self.long_offsets = true;
        }
        self.offsets.push(self.glyf.len() as u32);
    }

    pub(crate) fn long_offsets(&self) -> bool {
        self.long_offsets
    }

    pub(crate) fn glyf(&self) -> &[u8] {
        &self.glyf
    }

    pub(crate) fn loca(&self) -> Vec<u8> {
        if self.long_offsets {
            self.offsets.iter().flat_map(|o| o.to_be_bytes()).collect()
        } else {
            self.offsets
                .iter()
                .flat_map(|o| ((o / 2) as u16).to_be_bytes())
                .collect()
        }
    }
}

/// Bounding box stored in a glyph record header; `None` for empty glyphs.
pub(crate) fn bounds(record: &[u8]) -> Option<Rect> {
    let data = FontData::new(record);
    let coord = |at: usize| data.read_at::<i16>(at).ok().map(f64::from);
    Some(Rect::new(coord(2)?, coord(4)?, coord(6)?, coord(8)?))
}
