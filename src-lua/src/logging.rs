//! Diagnostic logging
//!
//! Silent unless `LUA_PULSEAUDIO_LOG` holds a filter such as
//! `pulse_mixer=debug`; output goes to stderr so it never mixes with a
//! host's stdout.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const ENV_LOG: &str = "LUA_PULSEAUDIO_LOG";

/// Install the stderr subscriber if logging was requested
///
/// Safe to call more than once; only the first successful call installs.
pub fn init() {
    let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
