//! The sfnt container: table tags, the table directory and checksums.

use std::ops::Range;

use write_fonts::{read::FontRef, types::Tag};

use crate::{Error, Result};

pub(crate) const CFF: Tag = Tag::new(b"CFF ");
pub(crate) const CFF2: Tag = Tag::new(b"CFF2");
pub(crate) const CMAP: Tag = Tag::new(b"cmap");
pub(crate) const GLYF: Tag = Tag::new(b"glyf");
pub(crate) const GVAR: Tag = Tag::new(b"gvar");
pub(crate) const HDMX: Tag = Tag::new(b"hdmx");
pub(crate) const HEAD: Tag = Tag::new(b"head");
pub(crate) const HHEA: Tag = Tag::new(b"hhea");
pub(crate) const HMTX: Tag = Tag::new(b"hmtx");
pub(crate) const HVAR: Tag = Tag::new(b"HVAR");
pub(crate) const LOCA: Tag = Tag::new(b"loca");
pub(crate) const LTSH: Tag = Tag::new(b"LTSH");
pub(crate) const MAXP: Tag = Tag::new(b"maxp");
pub(crate) const POST: Tag = Tag::new(b"post");
pub(crate) const VMTX: Tag = Tag::new(b"vmtx");

/// Every byte of a font, head included, must sum to this.
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
const CHECKSUM_ADJUSTMENT: Range<usize> = 8..12;

/// Tags of the tables in `font`, in table directory order.
pub(crate) fn table_tags(font: &[u8]) -> Result<Vec<Tag>> {
    let font = FontRef::new(font)?;
    Ok(font
        .table_directory
        .table_records()
        .iter()
        .map(|record| record.tag())
        .collect())
}

fn table_range(font: &[u8], tag: Tag) -> Result<Option<Range<usize>>> {
    let len = font.len();
    let font = FontRef::new(font)?;
    let Some(record) = font
        .table_directory
        .table_records()
        .iter()
        .find(|record| record.tag() == tag)
    else {
        return Ok(None);
    };
    let offset = record.offset() as usize;
    let end = offset + record.length() as usize;
    if end > len {
        return Err(Error::malformed(tag, "table extends past the end of the font"));
    }
    Ok(Some(offset..end))
}

/// Sums `data` as big-endian u32 words, zero-padding the last one.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Zeroes `checkSumAdjustment` in a raw `head` table.
pub(crate) fn clear_checksum_adjustment(head: &mut [u8]) -> Result<()> {
    head.get_mut(CHECKSUM_ADJUSTMENT)
        .ok_or_else(|| Error::malformed(HEAD, "table is too short"))?
        .fill(0);
    Ok(())
}

/// Sets `head.checkSumAdjustment` of a complete font.
pub(crate) fn fix_checksum_adjustment(font: &mut [u8]) -> Result<()> {
    let head = table_range(font, HEAD)?.ok_or(Error::MissingTable(HEAD))?;
    let at = head.start + CHECKSUM_ADJUSTMENT.start;
    clear_checksum_adjustment(&mut font[head])?;
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(font));
    font[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
    Ok(())
}

pub(crate) fn set_u16(data: &mut [u8], tag: Tag, at: usize, value: u16) -> Result<()> {
    data.get_mut(at..at + 2)
        .ok_or_else(|| Error::malformed(tag, "table is too short"))?
        .copy_from_slice(&value.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFont;

    #[test]
    fn checksum_pads_the_last_word() {
        assert_eq!(checksum(&[0, 0, 0, 1, 0x80]), 0x8000_0001);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn lists_tables_in_directory_order() {
        let font = TestFont::new().build();
        let tags = table_tags(&font).unwrap();
        assert!(tags.contains(&HEAD));
        assert!(tags.contains(&GLYF));
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn adjustment_makes_the_font_sum_to_magic() {
        let mut font = TestFont::new().build();
        let head = table_range(&font, HEAD).unwrap().unwrap();
        font[head.start + 8..head.start + 12].copy_from_slice(&[1, 2, 3, 4]);

        fix_checksum_adjustment(&mut font).unwrap();
        assert_eq!(checksum(&font), CHECKSUM_MAGIC);
    }
}
