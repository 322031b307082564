use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_INTERVAL_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct WatchConfig {
    pub input: PathBuf,
    pub interval: Duration,
    /// Number of refresh ticks before stopping, successful or not.
    pub ticks: Option<u64>,
    pub session_id: String,
}

impl WatchConfig {
    pub fn new(
        input: PathBuf,
        interval_secs: u64,
        ticks: Option<u64>,
        session: Option<String>,
    ) -> Self {
        Self {
            input,
            interval: Duration::from_secs(interval_secs.max(1)),
            ticks,
            session_id: resolve_session_id(session),
        }
    }
}

fn resolve_session_id(explicit: Option<String>) -> String {
    explicit
        .into_iter()
        .chain(std::env::var("IDE_SESSION_ID").ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| format!("pid-{}", std::process::id()))
}

/// Logs go to stderr so stdout stays parseable.
pub fn init_logging(quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if quiet {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_session_wins_and_interval_is_clamped() {
        let config = WatchConfig::new(PathBuf::from("records.json"), 0, Some(3), Some("s-1".into()));
        assert_eq!(config.session_id, "s-1");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.ticks, Some(3));
    }

    #[test]
    fn blank_session_falls_back() {
        let config = WatchConfig::new(PathBuf::from("records.json"), 5, None, Some("  ".into()));
        assert!(!config.session_id.trim().is_empty());
    }
}
