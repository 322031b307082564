use anyhow::{Context, Result};
use ide_core::metrics::format_percent;
use ide_core::{AgentMetricsSnapshot, RecordSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub fn load_records(path: &Path) -> Result<RecordSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let records = RecordSet::from_json(&content)
        .with_context(|| format!("Failed to parse records in {}", path.display()))?;

    let unrecognized = records.unrecognized();
    if !unrecognized.is_empty() {
        warn!(
            executions = unrecognized.executions,
            agents = unrecognized.agents,
            "records with unrecognized status are excluded from status counts"
        );
    }
    debug!(
        executions = records.executions.len(),
        agents = records.agents.len(),
        "loaded records"
    );
    Ok(records)
}

pub fn render_text(snapshot: &AgentMetricsSnapshot) -> String {
    let avg = snapshot.avg_execution_time().as_secs_f64();
    let lines = [
        format!(
            "tasks        total {}  completed {}  failed {}  running {}",
            snapshot.total_tasks,
            snapshot.completed_tasks,
            snapshot.failed_tasks,
            snapshot.current_stats.queued_tasks
        ),
        format!("success      {}%", format_percent(snapshot.success_rate)),
        format!(
            "agents       active {}  utilization {}%",
            snapshot.current_stats.active_agents,
            format_percent(snapshot.agent_utilization)
        ),
        format!("avg task     {avg:.2}s"),
    ];
    lines.join("\n")
}

pub fn render_json(snapshot: &AgentMetricsSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")
}
