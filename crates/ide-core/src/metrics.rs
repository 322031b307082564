//! Operational statistics derived from execution and agent records.
//!
//! Everything here is a pure function of its inputs: no clock, no I/O, no
//! state carried between calls.

use crate::{Agent, AgentStatus, ExecutionStatus, TaskExecution};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reported for both duration fields until the execution tracker supplies
/// timing the dashboard agrees to aggregate.
pub const PLACEHOLDER_TASK_DURATION_MS: u64 = 2_500;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStats {
    pub active_agents: usize,
    /// Counts `running` executions.
    pub queued_tasks: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetricsSnapshot {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    #[serde(rename = "avgExecutionTime")]
    pub avg_execution_time_ms: u64,
    pub total_tasks_completed: usize,
    pub success_rate: f64,
    #[serde(rename = "averageTaskDuration")]
    pub average_task_duration_ms: u64,
    pub current_stats: CurrentStats,
    pub agent_utilization: f64,
}

impl AgentMetricsSnapshot {
    pub fn avg_execution_time(&self) -> Duration {
        Duration::from_millis(self.avg_execution_time_ms)
    }

    pub fn average_task_duration(&self) -> Duration {
        Duration::from_millis(self.average_task_duration_ms)
    }
}

pub fn compute_metrics(executions: &[TaskExecution], agents: &[Agent]) -> AgentMetricsSnapshot {
    let total_tasks = executions.len();
    let mut completed_tasks = 0;
    let mut failed_tasks = 0;
    let mut queued_tasks = 0;
    for execution in executions {
        match execution.status {
            ExecutionStatus::Completed => completed_tasks += 1,
            ExecutionStatus::Failed => failed_tasks += 1,
            ExecutionStatus::Running => queued_tasks += 1,
            ExecutionStatus::Pending | ExecutionStatus::Unrecognized(_) => {}
        }
    }

    let mut active_agents = 0;
    let mut busy_agents = 0;
    for agent in agents {
        match agent.status {
            AgentStatus::Active => active_agents += 1,
            AgentStatus::Busy => busy_agents += 1,
            AgentStatus::Idle | AgentStatus::Offline | AgentStatus::Unrecognized(_) => {}
        }
    }

    AgentMetricsSnapshot {
        total_tasks,
        completed_tasks,
        failed_tasks,
        avg_execution_time_ms: PLACEHOLDER_TASK_DURATION_MS,
        total_tasks_completed: completed_tasks,
        success_rate: percentage(completed_tasks, total_tasks),
        average_task_duration_ms: PLACEHOLDER_TASK_DURATION_MS,
        current_stats: CurrentStats {
            active_agents,
            queued_tasks,
        },
        agent_utilization: percentage(busy_agents, agents.len()),
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}

/// Formats a percentage field for display, e.g. `66.67`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

/// Handle held by callers that refresh metrics on a schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentMetricsService;

impl AgentMetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, executions: &[TaskExecution], agents: &[Agent]) -> AgentMetricsSnapshot {
        compute_metrics(executions, agents)
    }

    pub fn placeholder_duration(&self) -> Duration {
        Duration::from_millis(PLACEHOLDER_TASK_DURATION_MS)
    }
}
