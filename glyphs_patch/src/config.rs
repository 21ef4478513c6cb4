//! What to copy where, and which fonts to do it to.

/// U+00AD, the slot whose outline is copied by default.
pub const SOFT_HYPHEN: u32 = 173;
/// U+00AC, the slot that receives the copy by default.
pub const NOT_SIGN: u32 = 172;
pub const DEFAULT_PATTERN: &str = "./dist/bakoma/ttf/*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Code point of the glyph to copy.
    pub source: u32,
    /// Code point of the empty slot to paste into.
    pub target: u32,
    /// Glob selecting the fonts to rewrite in place.
    pub pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SOFT_HYPHEN,
            target: NOT_SIGN,
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Parses a code point written as decimal (`173`), hex (`0xAD`) or
/// Unicode notation (`U+00AD`).
pub fn parse_code_point(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let hex = value
        .strip_prefix("U+")
        .or_else(|| value.strip_prefix("u+"))
        .or_else(|| value.strip_prefix("0x"))
        .or_else(|| value.strip_prefix("0X"));
    let code_point = match hex {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => value.parse(),
    }
    .map_err(|e| format!("'{value}' is not a code point: {e}"))?;

    if char::from_u32(code_point).is_none() {
        return Err(format!("{code_point:#X} is not a Unicode scalar value"));
    }
    Ok(code_point)
}
