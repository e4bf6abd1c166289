//! Log output for the binary.

use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;

/// Installs a stderr fmt subscriber as the global default.
///
/// `verbose` lowers the threshold from INFO to DEBUG, which adds one line per
/// optimizer generation.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(verbose: bool) -> Result<(), SetGlobalDefaultError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
