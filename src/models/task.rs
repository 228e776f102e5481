use serde::{Deserialize, Serialize};

/// Polled status of a dispatched generation.
///
/// `Processing` is also what a caller sees once a finished result has expired
/// from the result store; the two cases are not distinguishable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Success { image_id: i64 },
    Error { message: String },
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskStatus::Processing)
    }
}

/// Task ids are `<caller>_<unix seconds>`.
pub fn task_id_for(caller_identity: &str, unix_seconds: i64) -> String {
    format!("{}_{}", caller_identity, unix_seconds)
}

pub(crate) fn result_key(task_id: &str) -> String {
    format!("task_result_{}", task_id)
}
