//! Subscriber setup for the `cfgmeta` targets.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding the profile's default filter.
pub const LOG_ENV: &str = "CFGMETA_LOG";

/// Selected by `[logging] profile` in the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable, `cfgmeta=debug`
    #[default]
    Development,
    /// JSON lines, `cfgmeta=info`
    Production,
    /// Nothing is printed; tests install `init_test_capture()` instead
    Test,
}

impl Profile {
    fn filter(self) -> EnvFilter {
        let default = match self {
            Profile::Development => "cfgmeta=debug",
            Profile::Production | Profile::Test => "cfgmeta=info",
        };
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the subscriber for `profile`. Output goes to stderr so command
/// output on stdout stays machine-readable.
///
/// Only the first call has an effect, and a subscriber installed by someone
/// else (a test harness, an embedding server) is left in place.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Production);
    }

    #[test]
    fn test_profile_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            profile: Profile,
        }
        let w: Wrapper = toml::from_str("profile = \"production\"").unwrap();
        assert_eq!(w.profile, Profile::Production);
        assert_eq!(Profile::default(), Profile::Development);
    }
}
