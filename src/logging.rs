//! Logging setup

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_logger(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_reports_error_instead_of_panicking() {
        let settings = crate::config::Settings::default();
        init_logger(&settings.log_filter).unwrap();
        assert!(init_logger(&settings.log_filter).is_err());
    }
}
