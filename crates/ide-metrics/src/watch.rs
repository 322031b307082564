use crate::config::WatchConfig;
use crate::report::{load_records, render_text};
use anyhow::{Context, Result};
use ide_core::feed::{encode_frame, read_feed, MetricsFrame};
use ide_core::AgentMetricsService;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Recomputes on every tick and writes one NDJSON frame per snapshot.
/// Ticks whose input fails to load are logged and still count toward the
/// tick limit. Returns the number of frames written.
pub async fn run<W: Write>(config: &WatchConfig, out: &mut W) -> Result<u64> {
    let service = AgentMetricsService::new();
    let mut ticker = tokio::time::interval(config.interval);
    let mut ticks = 0u64;
    let mut seq = 0u64;

    info!(
        session_id = %config.session_id,
        input = %config.input.display(),
        interval_ms = config.interval.as_millis() as u64,
        "metrics watch started"
    );

    while config.ticks.map_or(true, |limit| ticks < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        ticks += 1;

        let records = match load_records(&config.input) {
            Ok(records) => records,
            Err(err) => {
                warn!(tick = ticks, error = %format!("{err:#}"), "skipping refresh");
                continue;
            }
        };
        seq += 1;
        let snapshot = service.compute(&records.executions, &records.agents);
        let line = encode_frame(&MetricsFrame::new(config.session_id.as_str(), seq, snapshot))?;
        out.write_all(line.as_bytes())
            .context("Failed to write frame")?;
        out.flush().context("Failed to flush frame")?;
    }

    Ok(seq)
}

pub fn tail(feed: &Path) -> Result<String> {
    let file =
        File::open(feed).with_context(|| format!("Failed to open feed {}", feed.display()))?;
    let report = read_feed(BufReader::new(file))
        .with_context(|| format!("Failed to read feed {}", feed.display()))?;

    for (line, err) in &report.errors {
        warn!(line, error = %err, "dropped feed line");
    }

    let summary = match report.latest() {
        Some(frame) => format!(
            "session {}  seq {}  at {}\n{}\n({} frames, {} errors)",
            frame.session_id,
            frame.seq,
            frame.emitted_at.to_rfc3339(),
            render_text(&frame.snapshot),
            report.frames.len(),
            report.errors.len()
        ),
        None => format!("No frames in feed ({} errors)", report.errors.len()),
    };
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn temp_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(body.as_bytes()).expect("write");
        file
    }

    #[tokio::test]
    async fn watch_emits_sequenced_frames() {
        let file = temp_file(r#"{"executions":[{"id":"1","status":"completed"}],"agents":[]}"#);
        let config = WatchConfig::new(file.path().to_path_buf(), 1, Some(2), Some("s-test".into()));

        let mut out = Vec::new();
        let written = run(&config, &mut out).await.expect("watch");
        assert_eq!(written, 2);

        let report = read_feed(Cursor::new(out)).expect("read");
        assert!(report.errors.is_empty());
        assert_eq!(
            report.frames.iter().map(|frame| frame.seq).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(report.frames[0].session_id, "s-test");
        assert_eq!(report.frames[1].snapshot.success_rate, 100.0);
    }

    #[tokio::test]
    async fn watch_stops_after_tick_limit_when_input_never_loads() {
        let config = WatchConfig::new(
            PathBuf::from("/nonexistent/records.json"),
            1,
            Some(2),
            Some("s-missing".into()),
        );

        let mut out = Vec::new();
        let written = run(&config, &mut out).await.expect("watch");
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn tail_summarizes_latest_frame_and_counts_errors() {
        let frame = MetricsFrame::new("s-tail", 9, ide_core::compute_metrics(&[], &[]));
        let mut body = String::from("not json\n");
        body.push_str(&encode_frame(&frame).expect("encode"));
        let file = temp_file(&body);

        let summary = tail(file.path()).expect("tail");
        assert!(summary.starts_with("session s-tail  seq 9"));
        assert!(summary.ends_with("(1 frames, 1 errors)"));
    }

    #[test]
    fn tail_of_missing_feed_fails() {
        assert!(tail(&PathBuf::from("/nonexistent/feed.ndjson")).is_err());
    }
}
