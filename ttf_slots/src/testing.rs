//! Tiny TrueType fonts assembled in memory, for tests.
//!
//! Every glyph is either empty or a single rectangular contour, which is
//! enough to tell copies apart by their bounds and metrics.

use std::collections::{BTreeMap, BTreeSet};

use write_fonts::{types::Tag, FontBuilder};

use crate::cmap::CharMap;
use crate::metrics::{self, HMetric};
use crate::sfnt::{self, CMAP, GLYF, HEAD, HHEA, HMTX, LOCA, MAXP, POST};

#[derive(Clone, Debug)]
pub struct TestFont {
    glyphs: Vec<TestGlyph>,
    symbol: bool,
    long_loca: bool,
    extra: BTreeMap<Tag, Vec<u8>>,
    omitted: BTreeSet<Tag>,
}

#[derive(Clone, Debug)]
struct TestGlyph {
    name: String,
    code_point: Option<u32>,
    advance: u16,
    bbox: Option<[i16; 4]>,
    /// Zeroed outline bytes used instead of a box.
    filler: usize,
}

impl Default for TestFont {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFont {
    /// A font holding only a `.notdef` box.
    pub fn new() -> Self {
        Self {
            glyphs: vec![TestGlyph {
                name: ".notdef".into(),
                code_point: None,
                advance: 500,
                bbox: Some([50, 0, 450, 700]),
                filler: 0,
            }],
            symbol: false,
            long_loca: false,
            extra: BTreeMap::new(),
            omitted: BTreeSet::new(),
        }
    }

    /// Adds a rectangle `[x_min, y_min, x_max, y_max]` mapped to `code_point`.
    pub fn with_box_glyph(mut self, name: &str, code_point: u32, advance: u16, bbox: [i16; 4]) -> Self {
        self.glyphs.push(TestGlyph {
            name: name.into(),
            code_point: Some(code_point),
            advance,
            bbox: Some(bbox),
            filler: 0,
        });
        self
    }

    pub fn with_empty_glyph(mut self, name: &str, code_point: u32, advance: u16) -> Self {
        self.glyphs.push(TestGlyph {
            name: name.into(),
            code_point: Some(code_point),
            advance,
            bbox: None,
            filler: 0,
        });
        self
    }

    /// Adds an unmapped glyph of `len` zero bytes, for growing `glyf`.
    pub fn with_filler_glyph(mut self, name: &str, len: usize) -> Self {
        self.glyphs.push(TestGlyph {
            name: name.into(),
            code_point: None,
            advance: 0,
            bbox: None,
            filler: len,
        });
        self
    }

    /// Uses a Windows Symbol cmap with codes at U+F0xx instead of Unicode.
    pub fn symbol_encoded(mut self) -> Self {
        self.symbol = true;
        self
    }

    pub fn with_long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    /// Adds or replaces a raw table.
    pub fn with_table(mut self, tag: Tag, data: Vec<u8>) -> Self {
        self.extra.insert(tag, data);
        self
    }

    pub fn without_table(mut self, tag: Tag) -> Self {
        self.omitted.insert(tag);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut glyf = Vec::new();
        let mut offsets = vec![0u32];
        for glyph in &self.glyphs {
            if let Some(bbox) = glyph.bbox {
                glyf.extend(box_outline(bbox));
            }
            glyf.resize(glyf.len() + glyph.filler, 0);
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
            offsets.push(glyf.len() as u32);
        }
        let loca: Vec<u8> = if self.long_loca {
            offsets.iter().flat_map(|o| o.to_be_bytes()).collect()
        } else {
            offsets
                .iter()
                .flat_map(|o| ((o / 2) as u16).to_be_bytes())
                .collect()
        };

        let metrics: Vec<HMetric> = self
            .glyphs
            .iter()
            .map(|glyph| HMetric {
                advance: glyph.advance,
                lsb: glyph.bbox.map_or(0, |bbox| bbox[0]),
            })
            .collect();
        let (hmtx, num_long) = metrics::write(&metrics);
        let advance_max = metrics.iter().map(|m| m.advance).max().unwrap_or(0);

        let mapping: BTreeMap<u32, u32> = self
            .glyphs
            .iter()
            .enumerate()
            .filter_map(|(id, glyph)| glyph.code_point.map(|cp| (cp, id as u32)))
            .collect();
        let cmap = if self.symbol {
            CharMap::symbol(mapping)
        } else {
            CharMap::unicode(mapping)
        };

        let mut tables = BTreeMap::new();
        tables.insert(HEAD, head(self.long_loca));
        tables.insert(HHEA, hhea(advance_max, num_long));
        tables.insert(MAXP, maxp(self.glyphs.len() as u16));
        tables.insert(HMTX, hmtx);
        tables.insert(LOCA, loca);
        tables.insert(GLYF, glyf);
        tables.insert(CMAP, cmap.write().expect("test cmap fits format 4"));
        tables.insert(POST, self.post());
        tables.extend(self.extra.clone());
        for tag in &self.omitted {
            tables.remove(tag);
        }

        let mut builder = FontBuilder::new();
        for (tag, data) in &tables {
            builder.add_raw(*tag, data.as_slice());
        }
        let mut font = builder.build();
        if tables.contains_key(&HEAD) {
            sfnt::fix_checksum_adjustment(&mut font).expect("test font has a head table");
        }
        font
    }

    /// `post` 2.0 with every glyph but `.notdef` named explicitly.
    fn post(&self) -> Vec<u8> {
        let mut post = Vec::new();
        post.extend(0x0002_0000u32.to_be_bytes());
        post.extend([0u8; 4]); // italicAngle
        post.extend((-100i16).to_be_bytes());
        post.extend(50i16.to_be_bytes());
        post.extend([0u8; 20]); // isFixedPitch, memory usage hints
        post.extend((self.glyphs.len() as u16).to_be_bytes());
        for i in 0..self.glyphs.len() {
            let index = if i == 0 { 0 } else { 257 + i as u16 };
            post.extend(index.to_be_bytes());
        }
        for glyph in &self.glyphs[1..] {
            post.push(glyph.name.len() as u8);
            post.extend(glyph.name.as_bytes());
        }
        post
    }
}

/// A closed clockwise rectangle with on-curve points only.
fn box_outline([x_min, y_min, x_max, y_max]: [i16; 4]) -> Vec<u8> {
    let mut record = Vec::new();
    for value in [1, x_min, y_min, x_max, y_max, 3, 0] {
        record.extend(value.to_be_bytes());
    }
    record.extend([1u8; 4]);
    for dx in [x_min, 0, x_max - x_min, 0] {
        record.extend(dx.to_be_bytes());
    }
    for dy in [y_min, y_max - y_min, 0, y_min - y_max] {
        record.extend(dy.to_be_bytes());
    }
    record
}

fn head(long_loca: bool) -> Vec<u8> {
    let mut head = Vec::with_capacity(54);
    head.extend(0x0001_0000u32.to_be_bytes()); // version
    head.extend(0x0001_0000u32.to_be_bytes()); // fontRevision
    head.extend(0u32.to_be_bytes()); // checkSumAdjustment
    head.extend(0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    head.extend(0x000Bu16.to_be_bytes()); // flags
    head.extend(1000u16.to_be_bytes()); // unitsPerEm
    head.extend([0u8; 16]); // created, modified
    for value in [0i16, 0, 600, 700] {
        head.extend(value.to_be_bytes());
    }
    head.extend(0u16.to_be_bytes()); // macStyle
    head.extend(8u16.to_be_bytes()); // lowestRecPPEM
    head.extend(2i16.to_be_bytes()); // fontDirectionHint
    head.extend(i16::from(long_loca).to_be_bytes());
    head.extend(0i16.to_be_bytes()); // glyphDataFormat
    head
}

fn hhea(advance_max: u16, num_long: u16) -> Vec<u8> {
    let mut hhea = Vec::with_capacity(36);
    hhea.extend(0x0001_0000u32.to_be_bytes());
    for value in [800i16, -200, 0] {
        hhea.extend(value.to_be_bytes());
    }
    hhea.extend(advance_max.to_be_bytes());
    for value in [0i16, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0] {
        hhea.extend(value.to_be_bytes());
    }
    hhea.extend(num_long.to_be_bytes());
    hhea
}

/// `maxp` 1.0, the TrueType layout. Box outlines have four points on one
/// contour and no instructions.
fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut maxp = Vec::with_capacity(32);
    maxp.extend(0x0001_0000u32.to_be_bytes());
    maxp.extend(num_glyphs.to_be_bytes());
    for value in [4u16, 1, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0] {
        maxp.extend(value.to_be_bytes());
    }
    maxp
}

#[cfg(test)]
mod tests {
    use write_fonts::read::{FontRef, TableProvider};

    use super::*;

    #[test]
    fn builds_a_readable_font() {
        let bytes = TestFont::new()
            .with_box_glyph("A", 0x41, 600, [20, 0, 580, 700])
            .build();
        let font = FontRef::new(&bytes).unwrap();
        let maxp = font.maxp().unwrap();
        assert_eq!(maxp.num_glyphs(), 2);
        assert_eq!(maxp.max_points(), Some(4));
        assert_eq!(font.table_data(MAXP).unwrap().len(), 32);
        assert_eq!(font.head().unwrap().index_to_loc_format(), 0);
        assert_eq!(font.table_data(HHEA).unwrap().len(), 36);
        assert_eq!(font.table_data(HEAD).unwrap().len(), 54);
    }

    #[test]
    fn box_outline_is_a_simple_glyph() {
        let record = box_outline([10, 20, 110, 220]);
        assert_eq!(record.len(), 34);
        assert_eq!(&record[..2], &[0, 1]);
        assert_eq!(crate::glyf::bounds(&record), Some(kurbo::Rect::new(10.0, 20.0, 110.0, 220.0)));
    }
}
