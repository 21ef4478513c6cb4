use std::io;

use clap::Parser;

pub mod batch;
pub mod config;
pub mod substitute;

use config::{parse_code_point, Config, DEFAULT_PATTERN, NOT_SIGN, SOFT_HYPHEN};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Copies the glyph of one code point into another, empty one in every
/// matched TrueType font, and saves each font back in place.
///
/// Without arguments, the soft hyphen (173) is copied into the not sign (172)
/// for every font in ./dist/bakoma/ttf/.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Code point of the glyph to copy (e.g. 173, 0xAD or U+00AD).
    #[arg(long, default_value_t = SOFT_HYPHEN, value_parser = parse_code_point)]
    source: u32,

    /// Code point of the empty slot that receives the copy.
    #[arg(long, default_value_t = NOT_SIGN, value_parser = parse_code_point)]
    target: u32,

    /// Glob selecting the fonts to patch. Matched files are overwritten.
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pattern: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            source: cli.source,
            target: cli.target,
            pattern: cli.pattern,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let config = Config::from(Cli::parse());
    log::debug!("{config:?}");

    batch::run(&config, &mut io::stdout().lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_uses_the_defaults() {
        let config = Config::from(Cli::try_parse_from(["glyphs-patch"]).unwrap());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_the_defaults() {
        let cli = Cli::try_parse_from([
            "glyphs-patch",
            "--source",
            "U+0041",
            "--target",
            "0x391",
            "--pattern",
            "fonts/*.ttf",
        ])
        .unwrap();
        assert_eq!(
            Config::from(cli),
            Config {
                source: 0x41,
                target: 0x391,
                pattern: "fonts/*.ttf".into(),
            }
        );
    }
}
