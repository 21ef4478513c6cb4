use std::io::Write;

use anyhow::Result;
use ttf_slots::{FontResource, GlyphId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The source glyph was copied into the target slot as `glyph`.
    Copied { glyph: GlyphId },
    Skipped(Blockers),
}

/// Why a substitution was not possible; either or both may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blockers {
    pub source_missing: bool,
    pub target_present: bool,
}

/// Copies the glyph in `source` into `target` if, and only if, the source
/// slot is populated and the target slot is empty. Otherwise the font is left
/// alone and the reasons are written to `out`.
pub fn replace_glyph(
    font: &mut FontResource,
    source: u32,
    target: u32,
    out: &mut impl Write,
) -> Result<Outcome> {
    let source_exists = font.has_glyph(source)?;
    let target_exists = font.has_glyph(target)?;

    if !source_exists || target_exists {
        writeln!(out, "Unable to replace glyph {target} with glyph {source}.")?;
        if !source_exists {
            writeln!(out, "Glyph {source} doesn't exist.")?;
        }
        if target_exists {
            writeln!(out, "Glyph {target} already exists.")?;
        }
        return Ok(Outcome::Skipped(Blockers {
            source_missing: !source_exists,
            target_present: target_exists,
        }));
    }

    let clipboard = font.copy(source)?;
    let glyph = font.paste(&clipboard, target)?;
    log::info!(
        "{}: copied glyph {source} into {target} (glyph id {}, bounds {:?})",
        font.path().display(),
        glyph.to_u32(),
        clipboard.bounds()
    );
    Ok(Outcome::Copied { glyph })
}

#[cfg(test)]
mod tests {
    use ttf_slots::testing::TestFont;

    use super::*;
    use crate::config::{NOT_SIGN, SOFT_HYPHEN};

    fn open(font: TestFont) -> FontResource {
        FontResource::from_bytes("test.ttf", font.build()).unwrap()
    }

    fn run(font: &mut FontResource) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = replace_glyph(font, SOFT_HYPHEN, NOT_SIGN, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn copies_into_an_empty_slot() {
        let mut font = open(TestFont::new().with_box_glyph("hyphen", SOFT_HYPHEN, 500, [50, 200, 450, 300]));
        let before = font.copy(SOFT_HYPHEN).unwrap();

        let (outcome, printed) = run(&mut font);
        assert_eq!(outcome, Outcome::Copied { glyph: GlyphId::new(2) });
        assert_eq!(printed, "");

        let font = FontResource::from_bytes("test.ttf", font.to_bytes().unwrap()).unwrap();
        assert_eq!(font.copy(NOT_SIGN).unwrap(), before);
        assert_eq!(font.copy(SOFT_HYPHEN).unwrap(), before);
    }

    #[test]
    fn occupied_target_is_left_alone() {
        let mut font = open(
            TestFont::new()
                .with_box_glyph("logicalnot", NOT_SIGN, 600, [40, 100, 560, 400])
                .with_box_glyph("hyphen", SOFT_HYPHEN, 500, [50, 200, 450, 300]),
        );
        let (outcome, printed) = run(&mut font);
        assert_eq!(
            outcome,
            Outcome::Skipped(Blockers {
                source_missing: false,
                target_present: true
            })
        );
        assert_eq!(
            printed,
            "Unable to replace glyph 172 with glyph 173.\nGlyph 172 already exists.\n"
        );
        assert!(!font.is_modified());
    }

    #[test]
    fn missing_source_is_reported() {
        let mut font = open(TestFont::new().with_box_glyph("A", 0x41, 600, [20, 0, 580, 700]));
        let (outcome, printed) = run(&mut font);
        assert_eq!(
            outcome,
            Outcome::Skipped(Blockers {
                source_missing: true,
                target_present: false
            })
        );
        assert_eq!(
            printed,
            "Unable to replace glyph 172 with glyph 173.\nGlyph 173 doesn't exist.\n"
        );
        assert!(!font.is_modified());
    }

    #[test]
    fn both_blockers_are_reported() {
        let mut font = open(TestFont::new().with_box_glyph("logicalnot", NOT_SIGN, 600, [40, 100, 560, 400]));
        let (outcome, printed) = run(&mut font);
        assert_eq!(
            outcome,
            Outcome::Skipped(Blockers {
                source_missing: true,
                target_present: true
            })
        );
        assert_eq!(
            printed,
            "Unable to replace glyph 172 with glyph 173.\n\
             Glyph 173 doesn't exist.\n\
             Glyph 172 already exists.\n"
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        let mut font = open(TestFont::new().with_box_glyph("hyphen", SOFT_HYPHEN, 500, [50, 200, 450, 300]));
        run(&mut font);
        let once = font.to_bytes().unwrap();

        let mut font = FontResource::from_bytes("test.ttf", once.clone()).unwrap();
        let (outcome, printed) = run(&mut font);
        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert!(printed.contains("Glyph 172 already exists."));
        assert!(!font.is_modified());
        assert_eq!(font.to_bytes().unwrap(), once);
    }

    #[test]
    fn lookup_faults_are_errors() {
        let mut font = open(TestFont::new().without_table(ttf_slots::Tag::new(b"cmap")));
        let mut out = Vec::new();
        assert!(replace_glyph(&mut font, SOFT_HYPHEN, NOT_SIGN, &mut out).is_err());
        assert!(out.is_empty());
    }
}
