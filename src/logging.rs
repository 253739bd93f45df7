//! Diagnostic logging setup.
//!
//! Output goes to stderr so it never interleaves with streamed replies on
//! stdout. Nothing logged here includes message text or the API key.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "GEMICHAT_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";
const VERBOSE_DIRECTIVE: &str = "warn,gemichat=debug";

/// `--verbose` wins over the environment, which wins over the default.
pub fn filter_directive(verbose: bool, env_value: Option<&str>) -> String {
    if verbose {
        return VERBOSE_DIRECTIVE.to_string();
    }
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string()
}

pub fn init_tracing(verbose: bool) {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(verbose, env_value.as_deref());
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
