//! Process-wide logger setup
//!
//! [`init`] may be called any number of times from any thread; only the
//! first call installs a logger. `RUST_LOG` takes precedence over the level
//! passed in.

use std::sync::Once;

static INIT: Once = Once::new();

/// Pick the default filter from `-v` count and the configured level
pub fn level_for(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the `env_logger` backend once
pub fn init(level: &str) {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or(level);
        if env_logger::Builder::from_env(env)
            .format_timestamp_secs()
            .try_init()
            .is_err()
        {
            // Another logger was installed by the embedding process
            log::debug!("logger already initialized");
        }
    });
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0, "warn"), "warn");
        assert_eq!(level_for(1, "warn"), "info");
        assert_eq!(level_for(2, "warn"), "debug");
        assert_eq!(level_for(5, "warn"), "trace");
    }

    #[test]
    fn test_init_is_idempotent_across_threads() {
        let handles: Vec<_> = (0..4).map(|_| thread::spawn(|| init("info"))).collect();
        for handle in handles {
            handle.join().unwrap();
        }
        init("debug");
        assert!(is_initialized());
    }
}
