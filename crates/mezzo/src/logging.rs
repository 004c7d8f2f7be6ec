//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through a `tracing_subscriber::fmt` layer so they
//! never interleave with the chat transcript on stdout. `RUST_LOG` wins over
//! the verbosity flag when set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter directive for a given `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "mezzo=info,warn",
        2 => "mezzo=debug,info",
        _ => "mezzo=trace,debug",
    }
}

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "warn");
        assert!(default_directive(1).contains("mezzo=info"));
        assert!(default_directive(2).contains("mezzo=debug"));
        assert!(default_directive(9).contains("mezzo=trace"));
    }

    #[test]
    fn directives_parse() {
        for v in 0..4 {
            EnvFilter::try_new(default_directive(v)).unwrap();
        }
    }
}
