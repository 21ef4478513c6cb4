//! Character to glyph mapping.
//!
//! Format 4 and format 12 subtables of the Unicode and Windows Symbol
//! encodings are decoded into plain maps so that a code point can be looked
//! up and added; every other subtable is carried through as raw bytes.
//!
//! Macintosh (1, 0) subtables are never edited. Their codes are Mac Roman
//! bytes rather than code points, so a pasted glyph is only reachable through
//! the Unicode and Symbol subtables.

use std::collections::BTreeMap;

use write_fonts::read::{
    tables::cmap::{Cmap, Cmap12, Cmap4, CmapSubtable},
    FontData, FontRead,
};

use crate::sfnt::CMAP;
use crate::{Error, Result};

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_WINDOWS: u16 = 3;
const WINDOWS_SYMBOL: u16 = 0;
const WINDOWS_BMP: u16 = 1;
const WINDOWS_FULL: u16 = 10;

/// Symbol fonts conventionally park their 8-bit codes at U+F000.
const SYMBOL_BASE: u32 = 0xF000;
const MAX_CODE_POINT: u32 = 0x10_FFFF;

#[derive(Debug)]
pub(crate) struct CharMap {
    version: u16,
    records: Vec<EncodingRecord>,
}

#[derive(Debug)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    subtable: Subtable,
}

#[derive(Debug, PartialEq)]
enum Subtable {
    /// Format 4: segment mapping to delta values.
    Segments { language: u16, map: BTreeMap<u32, u32> },
    /// Format 12: segmented coverage.
    Groups { language: u32, map: BTreeMap<u32, u32> },
    Raw(Vec<u8>),
}

impl CharMap {
    pub(crate) fn read(cmap: &[u8]) -> Result<Self> {
        let data = FontData::new(cmap);
        let table = Cmap::read(data)?;
        let records = table
            .encoding_records()
            .iter()
            .map(|record| -> Result<EncodingRecord> {
                let offset = record.subtable_offset().to_u32() as usize;
                Ok(EncodingRecord {
                    platform_id: record.platform_id() as u16,
                    encoding_id: record.encoding_id(),
                    subtable: Subtable::read(cmap, offset, record.subtable(data)?)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version: table.version(),
            records,
        })
    }

    /// A map with a BMP and a full Unicode record sharing one format 4
    /// subtable.
    #[cfg(any(test, feature = "testing"))]
    pub(crate) fn unicode(map: BTreeMap<u32, u32>) -> Self {
        let subtable = || Subtable::Segments {
            language: 0,
            map: map.clone(),
        };
        Self {
            version: 0,
            records: vec![
                EncodingRecord {
                    platform_id: PLATFORM_UNICODE,
                    encoding_id: 3,
                    subtable: subtable(),
                },
                EncodingRecord {
                    platform_id: PLATFORM_WINDOWS,
                    encoding_id: WINDOWS_BMP,
                    subtable: subtable(),
                },
            ],
        }
    }

    /// A Windows Symbol map with the 8-bit codes moved to U+F0xx.
    #[cfg(any(test, feature = "testing"))]
    pub(crate) fn symbol(map: BTreeMap<u32, u32>) -> Self {
        let map = map
            .into_iter()
            .map(|(code, glyph)| (SYMBOL_BASE + code, glyph))
            .collect();
        Self {
            version: 0,
            records: vec![EncodingRecord {
                platform_id: PLATFORM_WINDOWS,
                encoding_id: WINDOWS_SYMBOL,
                subtable: Subtable::Segments { language: 0, map },
            }],
        }
    }

    /// The glyph a code point maps to in the first subtable that knows it.
    pub(crate) fn glyph_for(&self, code_point: u32) -> Option<u32> {
        self.records.iter().find_map(|record| {
            let map = record.searchable_map()?;
            record
                .lookup_keys(code_point)
                .into_iter()
                .find_map(|key| map.get(&key).copied())
                .filter(|glyph| *glyph != 0)
        })
    }

    /// Maps `code_point` to `glyph` in every subtable able to hold it and
    /// returns how many took it.
    pub(crate) fn insert(&mut self, code_point: u32, glyph: u32) -> Result<usize> {
        let mut updated = 0;
        for record in &mut self.records {
            if !record.is_unicode() && !record.is_symbol() {
                continue;
            }
            let key = record.insert_key(code_point);
            match &mut record.subtable {
                Subtable::Segments { map, .. } if key < 0xFFFF && glyph <= 0xFFFF => {
                    map.insert(key, glyph);
                }
                Subtable::Groups { map, .. } => {
                    map.insert(key, glyph);
                }
                _ => continue,
            }
            log::trace!(
                "cmap ({}, {}): {key:#06X} -> glyph {glyph}",
                record.platform_id,
                record.encoding_id
            );
            updated += 1;
        }
        if updated == 0 {
            return Err(Error::Unsupported(format!(
                "no cmap subtable can map U+{code_point:04X}"
            )));
        }
        Ok(updated)
    }

    pub(crate) fn write(&self) -> Result<Vec<u8>> {
        let header_len = 4 + self.records.len() * 8;
        let mut header = Vec::with_capacity(header_len);
        header.extend_from_slice(&self.version.to_be_bytes());
        header.extend_from_slice(&(self.records.len() as u16).to_be_bytes());

        // Records whose subtables encode identically share one copy.
        let mut body: Vec<u8> = Vec::new();
        let mut written: Vec<(Vec<u8>, u32)> = Vec::new();
        for record in &self.records {
            let bytes = record.subtable.write()?;
            let offset = match written.iter().find(|(seen, _)| *seen == bytes) {
                Some((_, offset)) => *offset,
                None => {
                    let offset = (header_len + body.len()) as u32;
                    body.extend_from_slice(&bytes);
                    written.push((bytes, offset));
                    offset
                }
            };
            header.extend_from_slice(&record.platform_id.to_be_bytes());
            header.extend_from_slice(&record.encoding_id.to_be_bytes());
            header.extend_from_slice(&offset.to_be_bytes());
        }
        header.extend_from_slice(&body);
        Ok(header)
    }
}

impl EncodingRecord {
    fn is_unicode(&self) -> bool {
        self.platform_id == PLATFORM_UNICODE
            || (self.platform_id == PLATFORM_WINDOWS
                && matches!(self.encoding_id, WINDOWS_BMP | WINDOWS_FULL))
    }

    fn is_symbol(&self) -> bool {
        self.platform_id == PLATFORM_WINDOWS && self.encoding_id == WINDOWS_SYMBOL
    }

    fn searchable_map(&self) -> Option<&BTreeMap<u32, u32>> {
        if !self.is_unicode() && !self.is_symbol() {
            return None;
        }
        match &self.subtable {
            Subtable::Segments { map, .. } | Subtable::Groups { map, .. } => Some(map),
            Subtable::Raw(_) => None,
        }
    }

    fn lookup_keys(&self, code_point: u32) -> Vec<u32> {
        if self.is_symbol() && code_point <= 0xFF {
            vec![code_point, SYMBOL_BASE + code_point]
        } else {
            vec![code_point]
        }
    }

    /// Symbol subtables that already use the U+F0xx block get new codes there.
    fn insert_key(&self, code_point: u32) -> u32 {
        let uses_symbol_block = self
            .searchable_map()
            .is_some_and(|map| map.range(SYMBOL_BASE..=SYMBOL_BASE + 0xFF).next().is_some());
        if self.is_symbol() && code_point <= 0xFF && uses_symbol_block {
            SYMBOL_BASE + code_point
        } else {
            code_point
        }
    }
}

impl Subtable {
    fn read(cmap: &[u8], offset: usize, subtable: CmapSubtable) -> Result<Self> {
        match subtable {
            CmapSubtable::Format4(table) => return Ok(read_format_4(&table)),
            CmapSubtable::Format12(table) => return read_format_12(&table),
            _ => (),
        }
        // Kept as the bytes the length field covers.
        let bytes = cmap
            .get(offset..)
            .ok_or_else(|| Error::malformed(CMAP, "subtable offset is out of bounds"))?;
        let data = FontData::new(bytes);
        let format: u16 = data.read_at(0)?;
        let length = match format {
            0 | 2 | 6 => usize::from(data.read_at::<u16>(2)?),
            8 | 10 | 13 => data.read_at::<u32>(4)? as usize,
            14 => data.read_at::<u32>(2)? as usize,
            _ => {
                return Err(Error::malformed(
                    CMAP,
                    format!("unknown subtable format {format}"),
                ))
            }
        };
        let raw = bytes
            .get(..length)
            .ok_or_else(|| Error::malformed(CMAP, format!("format {format} subtable is truncated")))?;
        Ok(Subtable::Raw(raw.to_vec()))
    }

    fn write(&self) -> Result<Vec<u8>> {
        match self {
            Subtable::Segments { language, map } => write_format_4(*language, map),
            Subtable::Groups { language, map } => Ok(write_format_12(*language, map)),
            Subtable::Raw(bytes) => Ok(bytes.clone()),
        }
    }
}

fn read_format_4(table: &Cmap4) -> Subtable {
    let map = table
        .iter()
        .map(|(code, glyph)| (code, glyph.to_u32()))
        .filter(|&(code, glyph)| code != 0xFFFF && glyph != 0)
        .collect();
    Subtable::Segments {
        language: table.language(),
        map,
    }
}

fn read_format_12(table: &Cmap12) -> Result<Subtable> {
    let mut map = BTreeMap::new();
    for (index, group) in table.groups().iter().enumerate() {
        let start = group.start_char_code();
        let end = group.end_char_code();
        if start > end || end > MAX_CODE_POINT {
            return Err(Error::malformed(
                CMAP,
                format!("format 12 group {index} has an invalid range"),
            ));
        }
        let first_glyph = group.start_glyph_id();
        let last_glyph = first_glyph.checked_add(end - start).ok_or_else(|| {
            Error::malformed(
                CMAP,
                format!("format 12 group {index} runs past the last glyph id"),
            )
        })?;
        map.extend((start..=end).zip(first_glyph..=last_glyph));
    }
    Ok(Subtable::Groups {
        language: table.language(),
        map,
    })
}

/// Runs of consecutive code points mapping to consecutive glyphs, as
/// `(first code, last code, first glyph)`.
fn runs(map: &BTreeMap<u32, u32>) -> Vec<(u32, u32, u32)> {
    let mut runs: Vec<(u32, u32, u32)> = Vec::new();
    for (&code, &glyph) in map {
        match runs.last_mut() {
            Some((start, end, start_glyph))
                if *end + 1 == code && *start_glyph + (code - *start) == glyph =>
            {
                *end = code
            }
            _ => runs.push((code, code, glyph)),
        }
    }
    runs
}

fn write_format_4(language: u16, map: &BTreeMap<u32, u32>) -> Result<Vec<u8>> {
    // Every segment gets an idDelta and no idRangeOffset; the terminating
    // 0xFFFF segment maps to .notdef.
    let mut segments: Vec<(u16, u16, u16)> = runs(map)
        .into_iter()
        .map(|(start, end, glyph)| (start as u16, end as u16, (glyph as u16).wrapping_sub(start as u16)))
        .collect();
    segments.push((0xFFFF, 0xFFFF, 1));

    let seg_count = segments.len();
    let length = 16 + seg_count * 8;
    if length > usize::from(u16::MAX) {
        return Err(Error::Unsupported(format!(
            "{seg_count} segments do not fit a format 4 cmap subtable"
        )));
    }
    let entry_selector = seg_count.ilog2();
    let search_range = 2u16 << entry_selector;
    let seg_count_x2 = (seg_count * 2) as u16;

    let mut out = Vec::with_capacity(length);
    for value in [
        4,
        length as u16,
        language,
        seg_count_x2,
        search_range,
        entry_selector as u16,
        seg_count_x2 - search_range,
    ] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    for (_, end, _) in &segments {
        out.extend_from_slice(&end.to_be_bytes());
    }
    out.extend_from_slice(&0u16.to_be_bytes());
    for (start, _, _) in &segments {
        out.extend_from_slice(&start.to_be_bytes());
    }
    for (_, _, delta) in &segments {
        out.extend_from_slice(&delta.to_be_bytes());
    }
    out.resize(out.len() + seg_count * 2, 0);
    Ok(out)
}

fn write_format_12(language: u32, map: &BTreeMap<u32, u32>) -> Vec<u8> {
    let groups = runs(map);
    let length = 16 + groups.len() * 12;
    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&12u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    for value in [length as u32, language, groups.len() as u32] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    for (start, end, glyph) in groups {
        for value in [start, end, glyph] {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;

    use super::*;

    fn wrap(platform_id: u16, encoding_id: u16, subtable: &[u8]) -> Vec<u8> {
        let mut cmap = Vec::new();
        for value in [0u16, 1, platform_id, encoding_id, 0, 12] {
            cmap.extend_from_slice(&value.to_be_bytes());
        }
        cmap.extend_from_slice(subtable);
        cmap
    }

    #[test]
    fn format_4_with_glyph_id_array() {
        let mut subtable = Vec::new();
        for value in [
            4u16, 36, 0, 4, 4, 1, 0, // header
            0x42, 0xFFFF, // endCode
            0,    // reservedPad
            0x41, 0xFFFF, // startCode
            0, 1, // idDelta
            4, 0, // idRangeOffset
            7, 9, // glyphIdArray
        ] {
            subtable.extend_from_slice(&value.to_be_bytes());
        }
        let cmap = CharMap::read(&wrap(PLATFORM_WINDOWS, WINDOWS_BMP, &subtable)).unwrap();
        assert_eq!(cmap.glyph_for(0x41), Some(7));
        assert_eq!(cmap.glyph_for(0x42), Some(9));
        assert_eq!(cmap.glyph_for(0x43), None);
        assert_eq!(cmap.glyph_for(0xFFFF), None);
    }

    #[test]
    fn format_4_survives_a_rewrite() {
        let map = btreemap! { 0x20 => 3, 0x41 => 1, 0x42 => 2, 0xAD => 5, 0xFFFD => 4 };
        let cmap = CharMap::read(&CharMap::unicode(map.clone()).write().unwrap()).unwrap();
        assert_eq!(cmap.records.len(), 2);
        for record in &cmap.records {
            assert_eq!(record.searchable_map(), Some(&map));
        }
    }

    #[test]
    fn identical_subtables_are_shared() {
        let bytes = CharMap::unicode(btreemap! { 0x41 => 1 }).write().unwrap();
        let data = FontData::new(&bytes);
        let first: u32 = data.read_at(8).unwrap();
        let second: u32 = data.read_at(16).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn format_12_survives_a_rewrite() {
        let map = btreemap! { 0x41 => 1, 0x42 => 2, 0x1F600 => 3 };
        let subtable = write_format_12(0, &map);
        let cmap = CharMap::read(&wrap(PLATFORM_WINDOWS, WINDOWS_FULL, &subtable)).unwrap();
        assert_eq!(cmap.records[0].searchable_map(), Some(&map));
        assert_eq!(cmap.glyph_for(0x1F600), Some(3));
    }

    #[test]
    fn insert_reaches_every_unicode_subtable() {
        let mut cmap = CharMap::unicode(btreemap! { 0xAD => 1 });
        assert_eq!(cmap.insert(0xAC, 2).unwrap(), 2);
        assert_eq!(cmap.glyph_for(0xAC), Some(2));
        assert_eq!(cmap.glyph_for(0xAD), Some(1));
    }

    #[test]
    fn supplementary_code_points_need_format_12() {
        let mut cmap = CharMap::unicode(btreemap! { 0xAD => 1 });
        assert!(matches!(cmap.insert(0x1F600, 2), Err(Error::Unsupported(_))));
    }

    #[test]
    fn symbol_codes_live_in_the_private_use_block() {
        let mut cmap = CharMap::symbol(btreemap! { 0xAD => 1 });
        assert_eq!(cmap.glyph_for(0xAD), Some(1));
        assert_eq!(cmap.glyph_for(0xAC), None);

        cmap.insert(0xAC, 2).unwrap();
        assert_eq!(cmap.glyph_for(0xAC), Some(2));
        assert_eq!(cmap.glyph_for(0xF0AC), Some(2));
    }

    #[test]
    fn other_formats_are_kept_verbatim() {
        let mut format_0 = vec![0, 0, 1, 6, 0, 0];
        format_0.extend(0..=255u8);
        let cmap = CharMap::read(&wrap(1, 0, &format_0)).unwrap();
        assert_eq!(cmap.records[0].subtable, Subtable::Raw(format_0));
        assert_eq!(cmap.glyph_for(0x41), None);
    }

    #[test]
    fn format_12_glyph_overflow_is_malformed() {
        let mut subtable = Vec::new();
        subtable.extend(12u16.to_be_bytes());
        subtable.extend(0u16.to_be_bytes());
        for value in [28u32, 0, 1, 0x41, 0x60, 0xFFFF_FFF0] {
            subtable.extend(value.to_be_bytes());
        }
        assert!(matches!(
            CharMap::read(&wrap(PLATFORM_WINDOWS, WINDOWS_FULL, &subtable)),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn mac_subtables_are_not_edited() {
        let mut format_0 = vec![0, 0, 1, 6, 0, 0];
        format_0.extend([0u8; 256]);
        let mut cmap = CharMap::read(&wrap(1, 0, &format_0)).unwrap();
        cmap.records.extend(CharMap::unicode(btreemap! { 0xAD => 1 }).records);

        assert_eq!(cmap.insert(0xAC, 2).unwrap(), 2);
        assert_eq!(cmap.records[0].subtable, Subtable::Raw(format_0));
    }

    #[test]
    fn truncated_subtable_is_an_error() {
        let mut cmap = wrap(PLATFORM_WINDOWS, WINDOWS_BMP, &[0, 4, 0, 40]);
        cmap.truncate(14);
        assert!(CharMap::read(&cmap).is_err());
    }
}
