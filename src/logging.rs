/// Logger setup.
///
/// The terminal runs in raw mode on the alternate screen, so everything
/// goes to stderr. Redirect it (`2>crystalrun.log`) to keep the game screen clean.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialize the global logger.
///
/// `verbose` lowers the default filter to debug; `RUST_LOG` always wins.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    // A second init (tests, restarts) is harmless.
    let _ = builder.try_init();
}
