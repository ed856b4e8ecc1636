use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::context::CancelSignal;
use super::log::LogRecord;

/// Invocation lifecycle, spec.md section 4.2. Transitions are one-way:
/// `Pending -> Running -> {Completed, Cancelled, Error}`. `Invocation::
/// transition` panics on an invalid transition rather than silently
/// accepting it — it would only ever be reached by a runtime bug, never by
/// caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Pending,
    Running,
    Completed,
    Cancelled,
    Error,
}

impl Status {
    fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Running)
                | (Status::Running, Status::Completed)
                | (Status::Running, Status::Cancelled)
                | (Status::Running, Status::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled | Status::Error)
    }
}

const LOG_CAPACITY: usize = 1000;

/// A single action execution record, spec.md section 4.2. Identified by a
/// UUID v4 independent of the action/Thing names, so invocation URLs stay
/// stable even if a Thing is re-registered.
pub struct Invocation {
    pub id: Uuid,
    pub thing_name: String,
    pub action_name: String,
    pub input: Value,
    status: Status,
    pub request_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub return_value: Option<Value>,
    pub exception: Option<String>,
    log: VecDeque<LogRecord>,
    pub cancel: CancelSignal,
}

impl Invocation {
    pub fn new(id: Uuid, thing_name: impl Into<String>, action_name: impl Into<String>, input: Value) -> Self {
        Self {
            id,
            thing_name: thing_name.into(),
            action_name: action_name.into(),
            input,
            status: Status::Pending,
            request_time: Utc::now(),
            start_time: None,
            end_time: None,
            return_value: None,
            exception: None,
            log: VecDeque::new(),
            cancel: CancelSignal::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn mark_running(&mut self) {
        self.transition(Status::Running);
        self.start_time = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, value: Value) {
        self.transition(Status::Completed);
        self.end_time = Some(Utc::now());
        self.return_value = Some(value);
    }

    pub fn mark_cancelled(&mut self) {
        self.transition(Status::Cancelled);
        self.end_time = Some(Utc::now());
    }

    pub fn mark_error(&mut self, message: String) {
        self.transition(Status::Error);
        self.end_time = Some(Utc::now());
        self.exception = Some(message);
    }

    fn transition(&mut self, next: Status) {
        assert!(
            self.status.can_transition_to(next),
            "invalid invocation transition {:?} -> {next:?}",
            self.status
        );
        self.status = next;
    }

    pub fn push_log(&mut self, record: LogRecord) {
        if self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(record);
    }

    pub fn log(&self) -> &VecDeque<LogRecord> {
        &self.log
    }

    pub fn to_json(&self) -> Value {
        let href = format!("/action_invocations/{}", self.id);
        let mut links = vec![serde_json::json!({"rel": "self", "href": href})];
        if self.return_value.is_some() {
            links.push(serde_json::json!({"rel": "output", "href": format!("{href}/output")}));
        }

        serde_json::json!({
            "id": self.id,
            "action": self.action_name,
            "thing": self.thing_name,
            "href": href,
            "status": self.status,
            "input": self.input,
            "timeRequested": self.request_time,
            "timeStarted": self.start_time,
            "timeCompleted": self.end_time,
            "output": self.return_value,
            "error": self.exception,
            "log": self.log,
            "links": links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut inv = Invocation::new(Uuid::new_v4(), "counter", "increment", Value::Null);
        assert_eq!(inv.status(), Status::Pending);
        inv.mark_running();
        assert_eq!(inv.status(), Status::Running);
        inv.mark_completed(Value::from(1));
        assert_eq!(inv.status(), Status::Completed);
        assert!(inv.status().is_terminal());
    }

    #[test]
    #[should_panic(expected = "invalid invocation transition")]
    fn cannot_skip_running() {
        let mut inv = Invocation::new(Uuid::new_v4(), "counter", "increment", Value::Null);
        inv.mark_completed(Value::Null);
    }

    #[test]
    fn to_json_includes_log_and_links() {
        let mut inv = Invocation::new(Uuid::new_v4(), "counter", "increment", Value::Null);
        inv.mark_running();
        inv.push_log(LogRecord {
            message: "incrementing".into(),
            level: "INFO".into(),
            level_no: 20,
            line_no: 42,
            filename: "counter.rs".into(),
            timestamp: Utc::now(),
            exception_type: None,
            traceback: None,
        });
        inv.mark_completed(Value::from(1));

        let json = inv.to_json();
        assert_eq!(json["log"][0]["message"], "incrementing");
        assert_eq!(json["log"][0]["lineNo"], 42);
        let links = json["links"].as_array().unwrap();
        assert!(links.iter().any(|l| l["rel"] == "self"));
        assert!(links.iter().any(|l| l["rel"] == "output"));
    }

    #[test]
    fn log_ring_buffer_drops_oldest() {
        let mut inv = Invocation::new(Uuid::new_v4(), "counter", "increment", Value::Null);
        for i in 0..(LOG_CAPACITY + 10) {
            inv.push_log(LogRecord {
                message: format!("line {i}"),
                level: "INFO".into(),
                level_no: 20,
                line_no: 1,
                filename: "invocation.rs".into(),
                timestamp: Utc::now(),
                exception_type: None,
                traceback: None,
            });
        }
        assert_eq!(inv.log().len(), LOG_CAPACITY);
        assert_eq!(inv.log().front().unwrap().message, "line 10");
    }
}
