pub mod feed;
pub mod metrics;
pub mod toast;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use metrics::{compute_metrics, AgentMetricsService, AgentMetricsSnapshot, CurrentStats};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid records document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Records handed over by the execution tracker and the agent registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordSet {
    #[serde(default)]
    pub executions: Vec<TaskExecution>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnrecognizedCounts {
    pub executions: usize,
    pub agents: usize,
}

impl UnrecognizedCounts {
    pub fn is_empty(&self) -> bool {
        self.executions == 0 && self.agents == 0
    }
}

impl RecordSet {
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn unrecognized(&self) -> UnrecognizedCounts {
        UnrecognizedCounts {
            executions: self
                .executions
                .iter()
                .filter(|execution| execution.status.is_unrecognized())
                .count(),
            agents: self
                .agents
                .iter()
                .filter(|agent| agent.status.is_unrecognized())
                .count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskExecution {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(
        default = "ExecutionStatus::missing",
        deserialize_with = "deserialize_status"
    )]
    pub status: ExecutionStatus,
    #[serde(default, rename = "agentId", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, rename = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "finishedAt", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl TaskExecution {
    pub fn new(id: impl Into<String>, status: ExecutionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            agent_id: None,
            started_at: None,
            finished_at: None,
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "AgentStatus::missing", deserialize_with = "deserialize_status")]
    pub status: AgentStatus,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl Agent {
    pub fn new(id: impl Into<String>, status: AgentStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
            extra: HashMap::new(),
        }
    }
}

/// Execution status as reported by the tracker. Matching is exact; anything
/// else is kept verbatim so it can be logged and re-serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Unrecognized(String),
}

impl ExecutionStatus {
    pub fn parse(input: &str) -> Self {
        match input {
            "pending" => ExecutionStatus::Pending,
            "running" => ExecutionStatus::Running,
            "completed" => ExecutionStatus::Completed,
            "failed" => ExecutionStatus::Failed,
            other => ExecutionStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ExecutionStatus::Unrecognized(_))
    }

    fn missing() -> Self {
        ExecutionStatus::Unrecognized(String::new())
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ExecutionStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ExecutionStatus {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ExecutionStatus> for String {
    fn from(value: ExecutionStatus) -> Self {
        match value {
            ExecutionStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum AgentStatus {
    Active,
    Busy,
    Idle,
    Offline,
    Unrecognized(String),
}

impl AgentStatus {
    pub fn parse(input: &str) -> Self {
        match input {
            "active" => AgentStatus::Active,
            "busy" => AgentStatus::Busy,
            "idle" => AgentStatus::Idle,
            "offline" => AgentStatus::Offline,
            other => AgentStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Busy => "busy",
            AgentStatus::Idle => "idle",
            AgentStatus::Offline => "offline",
            AgentStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, AgentStatus::Unrecognized(_))
    }

    fn missing() -> Self {
        AgentStatus::Unrecognized(String::new())
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AgentStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for AgentStatus {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<AgentStatus> for String {
    fn from(value: AgentStatus) -> Self {
        match value {
            AgentStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

trait StatusField: From<String> {
    fn unrecognized(raw: String) -> Self;
}

impl StatusField for ExecutionStatus {
    fn unrecognized(raw: String) -> Self {
        ExecutionStatus::Unrecognized(raw)
    }
}

impl StatusField for AgentStatus {
    fn unrecognized(raw: String) -> Self {
        AgentStatus::Unrecognized(raw)
    }
}

/// Strings go through exact matching; `null`, numbers and other JSON values
/// become unrecognized statuses holding their JSON text.
fn deserialize_status<'de, D, S>(deserializer: D) -> Result<S, D::Error>
where
    D: Deserializer<'de>,
    S: StatusField,
{
    let val = Value::deserialize(deserializer)?;
    Ok(match val {
        Value::String(s) => S::from(s),
        other => S::unrecognized(other.to_string()),
    })
}

/// Accepts an id given as a string or a number.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number for id")),
    }
}
