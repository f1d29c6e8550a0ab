//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::{Error, Result}};

/// Install the global JSON subscriber
///
/// `RUST_LOG` takes precedence over `service.log_level`. Either accepts a plain
/// level or an `EnvFilter` directive such as `anime_service=debug,tower_http=info`;
/// invalid values fall back to `info`. Fails if a global subscriber is already
/// installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(build_filter(
            env_directives.as_deref(),
            &config.service.log_level,
        ))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(
        environment = %config.service.environment,
        "Tracing initialized for service: {}",
        config.service.name
    );

    Ok(())
}

fn build_filter(env_directives: Option<&str>, log_level: &str) -> EnvFilter {
    env_directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(log_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directives_override_config() {
        assert_eq!(build_filter(Some("warn"), "debug").to_string(), "warn");
        assert_eq!(
            build_filter(Some("anime_service=trace"), "debug").to_string(),
            "anime_service=trace"
        );
    }

    #[test]
    fn test_config_level_used_without_env() {
        assert_eq!(build_filter(None, "debug").to_string(), "debug");
        assert_eq!(build_filter(Some("  "), "debug").to_string(), "debug");
        assert_eq!(build_filter(Some("anime_service=loud"), "error").to_string(), "error");
    }

    #[test]
    fn test_invalid_everything_falls_back_to_info() {
        assert_eq!(build_filter(None, "anime_service=loud").to_string(), "info");
    }

    #[test]
    fn test_second_init_fails() {
        let mut config = Config::default();
        config.service.log_level = "not a [valid filter".to_string();

        // Another test may already have installed a subscriber.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
