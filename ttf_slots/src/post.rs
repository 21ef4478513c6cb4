//! Glyph names in `post` version 2.0.

use write_fonts::read::FontData;

use crate::sfnt::POST;
use crate::{Error, Result};

const VERSION_2: u32 = 0x0002_0000;
const NUM_GLYPHS: usize = 32;
const GLYPH_NAME_INDEX: usize = 34;
/// Indices below this refer to the standard Macintosh glyph names.
const STANDARD_NAMES: u16 = 258;
const MAX_NAME_INDEX: u16 = 32767;

/// Production name for the glyph that a code point maps to.
pub(crate) fn glyph_name(code_point: u32) -> String {
    if code_point <= 0xFFFF {
        format!("uni{code_point:04X}")
    } else {
        format!("u{code_point:05X}")
    }
}

/// Returns a copy of `post` with a name for one more glyph, or `None` for
/// versions without per-glyph names.
pub(crate) fn append_glyph_name(post: &[u8], name: &str, num_glyphs: u16) -> Result<Option<Vec<u8>>> {
    let data = FontData::new(post);
    let version: u32 = data.read_at(0)?;
    if version != VERSION_2 {
        log::debug!("post version {version:#010x} has no glyph names to extend");
        return Ok(None);
    }
    let count: u16 = data.read_at(NUM_GLYPHS)?;
    if count != num_glyphs {
        return Err(Error::malformed(
            POST,
            format!("names {count} glyphs, font has {num_glyphs}"),
        ));
    }

    let names_start = GLYPH_NAME_INDEX + usize::from(count) * 2;
    let names = pascal_strings(
        post.get(names_start..)
            .ok_or_else(|| Error::malformed(POST, "glyph name index is truncated"))?,
    )?;
    let index = STANDARD_NAMES
        .checked_add(names.len() as u16)
        .filter(|index| *index <= MAX_NAME_INDEX)
        .ok_or_else(|| Error::Unsupported("post table holds too many glyph names".into()))?;

    let mut unique = name.to_string();
    let mut suffix = 0;
    while names.contains(&unique.as_bytes()) {
        suffix += 1;
        unique = format!("{name}.{suffix}");
    }

    let mut out = Vec::with_capacity(post.len() + 3 + unique.len());
    out.extend_from_slice(&post[..NUM_GLYPHS]);
    out.extend_from_slice(&(count + 1).to_be_bytes());
    out.extend_from_slice(&post[GLYPH_NAME_INDEX..names_start]);
    out.extend_from_slice(&index.to_be_bytes());
    out.extend_from_slice(&post[names_start..]);
    out.push(unique.len() as u8);
    out.extend_from_slice(unique.as_bytes());
    Ok(Some(out))
}

fn pascal_strings(mut data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut strings = Vec::new();
    while let Some((&len, rest)) = data.split_first() {
        let len = usize::from(len);
        if len > rest.len() {
            return Err(Error::malformed(POST, "glyph name runs past the table"));
        }
        strings.push(&rest[..len]);
        data = &rest[len..];
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `post` 2.0 naming `.notdef` and one custom glyph.
    fn post_v2(custom: &str) -> Vec<u8> {
        let mut post = vec![0u8; 32];
        post[..4].copy_from_slice(&VERSION_2.to_be_bytes());
        post.extend_from_slice(&2u16.to_be_bytes());
        post.extend_from_slice(&0u16.to_be_bytes());
        post.extend_from_slice(&STANDARD_NAMES.to_be_bytes());
        post.push(custom.len() as u8);
        post.extend_from_slice(custom.as_bytes());
        post
    }

    fn names(post: &[u8]) -> Vec<String> {
        let count = u16::from_be_bytes([post[32], post[33]]);
        pascal_strings(&post[34 + usize::from(count) * 2..])
            .unwrap()
            .into_iter()
            .map(|name| String::from_utf8(name.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn names_follow_the_code_point() {
        assert_eq!(glyph_name(0xAC), "uni00AC");
        assert_eq!(glyph_name(0x1F600), "u1F600");
    }

    #[test]
    fn appends_index_and_name() {
        let post = append_glyph_name(&post_v2("hyphen"), "uni00AC", 2)
            .unwrap()
            .unwrap();
        assert_eq!(u16::from_be_bytes([post[32], post[33]]), 3);
        assert_eq!(&post[34..40], &[0, 0, 1, 2, 1, 3]);
        assert_eq!(names(&post), ["hyphen", "uni00AC"]);
    }

    #[test]
    fn keeps_names_unique() {
        let post = append_glyph_name(&post_v2("uni00AC"), "uni00AC", 2)
            .unwrap()
            .unwrap();
        assert_eq!(names(&post), ["uni00AC", "uni00AC.1"]);
    }

    #[test]
    fn other_versions_are_left_alone() {
        let mut post = vec![0u8; 32];
        post[..4].copy_from_slice(&0x0003_0000u32.to_be_bytes());
        assert_eq!(append_glyph_name(&post, "uni00AC", 5).unwrap(), None);
    }

    #[test]
    fn glyph_count_must_match() {
        assert!(matches!(
            append_glyph_name(&post_v2("hyphen"), "uni00AC", 7),
            Err(Error::Malformed { .. })
        ));
    }
}
