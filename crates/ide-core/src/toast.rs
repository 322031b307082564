//! Toast identifiers for the IDE shell. Callers inject one source and share
//! it; nothing here is a module-level global.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToastId(String);

impl ToastId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait ToastIdSource: Send + Sync {
    fn next_id(&self) -> ToastId;
}

/// Monotonic ids scoped to one instance: `toast-1`, `toast-2`, ...
#[derive(Debug, Default)]
pub struct SequentialToastIds {
    counter: AtomicU64,
}

impl SequentialToastIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToastIdSource for SequentialToastIds {
    fn next_id(&self) -> ToastId {
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        ToastId(format!("toast-{id}"))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomToastIds;

impl ToastIdSource for RandomToastIds {
    fn next_id(&self) -> ToastId {
        ToastId(format!("toast-{}", uuid::Uuid::new_v4()))
    }
}
