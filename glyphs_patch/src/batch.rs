use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use ttf_slots::FontResource;

use crate::config::Config;
use crate::substitute::{replace_glyph, Outcome};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub copied: usize,
    pub skipped: usize,
}

/// Expands the input glob. Matches are not filtered further: whatever the
/// pattern selects is treated as a font.
pub fn input_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).with_context(|| format!("Invalid input pattern {pattern:?}"))?;
    paths
        .map(|entry| entry.context("Cannot read input directory"))
        .collect()
}

/// Runs the substitution over every matched font and writes each one back to
/// where it came from, changed or not. Stops at the first failure.
pub fn run(config: &Config, out: &mut impl Write) -> Result<Summary> {
    let files = input_files(&config.pattern)?;
    if files.is_empty() {
        log::warn!("No files match {:?}", config.pattern);
    }

    let mut summary = Summary::default();
    for path in files {
        writeln!(out, "{}", path.display())?;

        let mut font = FontResource::open(&path)
            .with_context(|| format!("Cannot open font {}", path.display()))?;
        let outcome = replace_glyph(&mut font, config.source, config.target, out)
            .with_context(|| format!("Cannot replace glyph in {}", path.display()))?;
        font.save(&path)
            .with_context(|| format!("Cannot save font {}", path.display()))?;

        summary.processed += 1;
        match outcome {
            Outcome::Copied { .. } => summary.copied += 1,
            Outcome::Skipped(_) => summary.skipped += 1,
        }
    }

    log::info!(
        "Processed {} fonts: {} patched, {} skipped",
        summary.processed,
        summary.copied,
        summary.skipped
    );
    Ok(summary)
}
