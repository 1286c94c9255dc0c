use tracing_subscriber::{fmt, EnvFilter};

use crate::immut_data::dynamic::DISCRIMINATOR_SUFFIX;

/// Removes a trailing legacy discriminator (`#` followed by exactly four digits).
pub(crate) fn strip_discriminator(handle: &str) -> &str {
    match DISCRIMINATOR_SUFFIX.find(handle) {
        Some(m) => &handle[..m.start()],
        None => handle,
    }
}

/// Canonical form of a handle for case-insensitive comparisons.
pub(crate) fn fold_handle(handle: &str) -> String {
    strip_discriminator(handle.trim()).to_lowercase()
}

/// `part` as a percentage of `whole`, `0.0` for an empty whole.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

/// Logs go to stderr so that reports printed on stdout stay parseable.
pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
