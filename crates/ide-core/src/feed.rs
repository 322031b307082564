//! Snapshot feed for the dashboard: one JSON frame per line.
//!
//! Frames are checked on the way in, so a consumer never renders a snapshot
//! that breaks the aggregator's invariants.

use crate::metrics::AgentMetricsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use thiserror::Error;

pub const FEED_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsFrame {
    #[serde(default = "current_version")]
    pub version: u16,
    pub session_id: String,
    pub seq: u64,
    pub emitted_at: DateTime<Utc>,
    pub snapshot: AgentMetricsSnapshot,
}

fn current_version() -> u16 {
    FEED_VERSION
}

impl MetricsFrame {
    pub fn new(session_id: impl Into<String>, seq: u64, snapshot: AgentMetricsSnapshot) -> Self {
        Self {
            version: FEED_VERSION,
            session_id: session_id.into(),
            seq,
            emitted_at: Utc::now(),
            snapshot,
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported feed version {found}, expected {}", FEED_VERSION)]
    UnsupportedVersion { found: u16 },
    #[error("inconsistent snapshot in frame {seq}: {reason}")]
    InconsistentSnapshot { seq: u64, reason: &'static str },
    #[error("feed read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Frames that decoded cleanly plus the 1-based line numbers that did not.
#[derive(Debug, Default)]
pub struct FeedReport {
    pub frames: Vec<MetricsFrame>,
    pub errors: Vec<(usize, FeedError)>,
}

impl FeedReport {
    pub fn latest(&self) -> Option<&MetricsFrame> {
        self.frames.iter().max_by_key(|frame| frame.seq)
    }
}

pub fn encode_frame(frame: &MetricsFrame) -> Result<String, FeedError> {
    let mut line = serde_json::to_string(frame)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_frame(line: &str) -> Result<MetricsFrame, FeedError> {
    let frame: MetricsFrame = serde_json::from_str(line.trim_end())?;
    if frame.version != FEED_VERSION {
        return Err(FeedError::UnsupportedVersion {
            found: frame.version,
        });
    }
    check_snapshot(&frame.snapshot).map_err(|reason| FeedError::InconsistentSnapshot {
        seq: frame.seq,
        reason,
    })?;
    Ok(frame)
}

fn check_snapshot(snapshot: &AgentMetricsSnapshot) -> Result<(), &'static str> {
    if snapshot.completed_tasks + snapshot.failed_tasks > snapshot.total_tasks {
        return Err("completed and failed exceed total");
    }
    if snapshot.total_tasks_completed != snapshot.completed_tasks {
        return Err("totalTasksCompleted differs from completedTasks");
    }
    if !(0.0..=100.0).contains(&snapshot.success_rate) {
        return Err("successRate outside 0..=100");
    }
    if !(0.0..=100.0).contains(&snapshot.agent_utilization) {
        return Err("agentUtilization outside 0..=100");
    }
    Ok(())
}

/// Reads a whole feed. Blank lines are skipped; bad lines are reported with
/// their line number and reading continues.
pub fn read_feed<R: BufRead>(reader: R) -> Result<FeedReport, FeedError> {
    let mut report = FeedReport::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_frame(&line) {
            Ok(frame) => report.frames.push(frame),
            Err(err) => report.errors.push((idx + 1, err)),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_metrics, Agent, AgentStatus, ExecutionStatus, TaskExecution};
    use std::io::Cursor;

    fn frame(seq: u64) -> MetricsFrame {
        let snapshot = compute_metrics(
            &[
                TaskExecution::new("e1", ExecutionStatus::Completed),
                TaskExecution::new("e2", ExecutionStatus::Running),
            ],
            &[Agent::new("a1", AgentStatus::Busy)],
        );
        MetricsFrame::new("session-alpha", seq, snapshot)
    }

    #[test]
    fn encoded_frame_is_one_line_and_decodes() {
        let original = frame(1);
        let line = encode_frame(&original).expect("encode");
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(decode_frame(&line).expect("decode"), original);
    }

    #[test]
    fn missing_version_defaults_to_current_and_other_versions_are_rejected() {
        let mut value = serde_json::to_value(frame(4)).expect("value");
        value.as_object_mut().expect("object").remove("version");
        let decoded = decode_frame(&value.to_string()).expect("decode");
        assert_eq!(decoded.version, FEED_VERSION);

        value["version"] = serde_json::json!(2);
        assert!(matches!(
            decode_frame(&value.to_string()),
            Err(FeedError::UnsupportedVersion { found: 2 })
        ));
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let mut bad = frame(5);
        bad.snapshot.failed_tasks = bad.snapshot.total_tasks + 1;
        let line = encode_frame(&bad).expect("encode");
        assert!(matches!(
            decode_frame(&line),
            Err(FeedError::InconsistentSnapshot { seq: 5, .. })
        ));

        let mut bad = frame(6);
        bad.snapshot.agent_utilization = 140.0;
        let line = encode_frame(&bad).expect("encode");
        assert!(decode_frame(&line).is_err());
    }

    #[test]
    fn read_feed_reports_bad_lines_and_keeps_going() {
        let mut body = encode_frame(&frame(1)).expect("encode");
        body.push_str("{\"seq\": \n");
        body.push('\n');
        body.push_str(&encode_frame(&frame(2)).expect("encode"));

        let report = read_feed(Cursor::new(body)).expect("read");
        assert_eq!(
            report.frames.iter().map(|f| f.seq).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, 2);
        assert!(matches!(report.errors[0].1, FeedError::Json(_)));
        assert_eq!(report.latest().map(|f| f.seq), Some(2));
    }

    #[test]
    fn trailing_line_without_newline_is_read() {
        let mut body = encode_frame(&frame(3)).expect("encode");
        body.pop();
        let report = read_feed(Cursor::new(body)).expect("read");
        assert_eq!(report.latest().map(|f| f.seq), Some(3));
    }

    #[test]
    fn emitted_at_is_rfc3339_on_the_wire() {
        let line = encode_frame(&frame(1)).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&line).expect("json");
        let raw = value["emitted_at"].as_str().expect("string timestamp");
        assert!(raw.parse::<DateTime<Utc>>().is_ok());
    }
}
