//! Horizontal metrics: `hmtx` and the metric count kept in `hhea`.

use write_fonts::read::{tables::hmtx::Hmtx, FontData, FontReadWithArgs};

use crate::sfnt::{set_u16, HHEA, HMTX};
use crate::{Error, Result};

const NUMBER_OF_LONG_METRICS: usize = 34;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HMetric {
    pub advance: u16,
    pub lsb: i16,
}

pub(crate) fn number_of_long_metrics(hhea: &[u8]) -> Result<u16> {
    Ok(FontData::new(hhea).read_at(NUMBER_OF_LONG_METRICS)?)
}

pub(crate) fn set_number_of_long_metrics(hhea: &mut [u8], count: u16) -> Result<()> {
    set_u16(hhea, HHEA, NUMBER_OF_LONG_METRICS, count)
}

/// Expands `hmtx` into one metric per glyph.
pub(crate) fn read(hmtx: &[u8], num_long: u16, num_glyphs: u16) -> Result<Vec<HMetric>> {
    if num_long == 0 || num_long > num_glyphs {
        return Err(Error::malformed(
            HHEA,
            format!("{num_long} long metrics for {num_glyphs} glyphs"),
        ));
    }
    let table = Hmtx::read_with_args(FontData::new(hmtx), &(num_long, num_glyphs))
        .map_err(|err| Error::malformed(HMTX, err.to_string()))?;
    let mut metrics: Vec<HMetric> = table
        .h_metrics()
        .iter()
        .map(|m| HMetric {
            advance: m.advance.get(),
            lsb: m.side_bearing.get(),
        })
        .collect();
    let last_advance = metrics.last().map_or(0, |m| m.advance);
    metrics.extend(table.left_side_bearings().iter().map(|lsb| HMetric {
        advance: last_advance,
        lsb: lsb.get(),
    }));

    if metrics.len() != usize::from(num_glyphs) {
        return Err(Error::malformed(
            HMTX,
            format!("{} metrics for {num_glyphs} glyphs", metrics.len()),
        ));
    }
    Ok(metrics)
}

/// Encodes metrics, folding the trailing run of equal advances into bare
/// side bearings. Returns the table and its number of long metrics.
pub(crate) fn write(metrics: &[HMetric]) -> (Vec<u8>, u16) {
    let mut num_long = metrics.len();
    while num_long > 1 && metrics[num_long - 2].advance == metrics[num_long - 1].advance {
        num_long -= 1;
    }

    let mut hmtx = Vec::with_capacity(num_long * 4 + (metrics.len() - num_long) * 2);
    for metric in &metrics[..num_long] {
        hmtx.extend_from_slice(&metric.advance.to_be_bytes());
        hmtx.extend_from_slice(&metric.lsb.to_be_bytes());
    }
    for metric in &metrics[num_long..] {
        hmtx.extend_from_slice(&metric.lsb.to_be_bytes());
    }
    (hmtx, num_long as u16)
}
