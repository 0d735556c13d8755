//! Tracing subscriber for the binary. The library only emits events.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for the verbosity flags. `-q` wins over `-v`; otherwise
/// each `-v` opens one more level past warnings for this crate.
pub fn directive_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "warn,blokview=debug",
        _ => "warn,blokview=trace",
    }
}

/// `RUST_LOG` takes precedence unless `-q` or `-v` was given.
pub fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    let directive = directive_for(verbose, quiet);
    if quiet || verbose > 0 {
        return EnvFilter::new(directive);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

pub fn init(verbose: u8, quiet: bool, no_color: bool) -> anyhow::Result<()> {
    if no_color {
        colored::control::set_override(false);
    }
    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color)
                .without_time(),
        )
        .try_init()
        .context("Failed to install log subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags_map_to_directives() {
        assert_eq!(directive_for(0, false), "warn");
        assert_eq!(directive_for(1, false), "warn,blokview=debug");
        assert_eq!(directive_for(4, false), "warn,blokview=trace");
        assert_eq!(directive_for(2, true), "error");
    }

    #[test]
    fn explicit_flags_ignore_the_environment() {
        let filter = filter_for(1, false).to_string();
        assert!(filter.contains("blokview=debug"), "{filter}");
    }
}
