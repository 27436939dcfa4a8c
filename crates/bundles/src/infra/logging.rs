//! Tracing subscriber setup.

use tracing::Level;

/// Map `-v` repetitions onto a maximum level. Warnings are always shown.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install a stderr subscriber so stdout stays free for emitted source.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
