use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Complete,
    Failed,
    Break,
    #[default]
    None,
}

impl DayStatus {
    /// Points granted when a day takes this status. Reversal is the negation.
    pub fn points(self) -> i64 {
        match self {
            DayStatus::Complete => 10,
            DayStatus::Failed => -5,
            DayStatus::Break => 2,
            DayStatus::None => 0,
        }
    }

    pub fn level_delta(self) -> i64 {
        match self {
            DayStatus::Complete => 1,
            DayStatus::Failed => -1,
            DayStatus::Break | DayStatus::None => 0,
        }
    }

    pub fn is_set(self) -> bool {
        self != DayStatus::None
    }
}

/// A stored `null` status means the day is unset.
fn status_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DayStatus, D::Error> {
    Option::<DayStatus>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "status_or_none")]
    pub status: DayStatus,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    pub weekly_status: [DayEntry; DAYS_PER_WEEK],
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Fields present here replace the task's fields; absent ones are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// The `taskData` blob: the full task collection plus counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub task_id: String,
    /// Title captured when the reminder was created; not synced on rename.
    #[serde(default)]
    pub task_title: Option<String>,
    pub time: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub task_id: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DayStatusRequest {
    #[serde(default, deserialize_with = "status_or_none")]
    pub status: DayStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayStatusResponse {
    pub task: Task,
    pub level: u32,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub completed: u32,
    pub failed: u32,
    #[serde(rename = "break")]
    pub breaks: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub completed: u32,
    pub failed: u32,
    #[serde(rename = "break")]
    pub breaks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub weekly: Vec<DayStats>,
    pub total: StatusTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionStats {
    pub overall_success_rate: u32,
    pub level_bonus: u32,
    pub consistency_bonus: u32,
    pub adjusted_success_rate: u32,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub stats: Option<PredictionStats>,
    pub prediction: Option<TaskPrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub rest_breaks: Vec<String>,
    #[serde(default)]
    pub productivity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPrediction {
    pub success_rate: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestSuggestion {
    #[serde(default)]
    pub suggested_breaks: Vec<String>,
    #[serde(default)]
    pub rest_duration: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Success,
    Encouragement,
    Challenge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationalMessage {
    pub message: String,
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_blob_with_null_statuses_decodes() {
        let day = |date: &str, status: serde_json::Value| {
            json!({ "date": date, "status": status, "enabled": true })
        };
        let blob = json!({
            "tasks": [{
                "id": "1767600000000",
                "title": "Read",
                "type": "habit",
                "dueDate": "2026-01-10T09:00",
                "weeklyStatus": [
                    day("2026-01-04T08:00:00.000Z", json!("complete")),
                    day("2026-01-05T08:00:00.000Z", json!(null)),
                    day("2026-01-06T08:00:00.000Z", json!("failed")),
                    day("2026-01-07T08:00:00.000Z", json!(null)),
                    day("2026-01-08T08:00:00.000Z", json!("break")),
                    day("2026-01-09T08:00:00.000Z", json!(null)),
                    day("2026-01-10T08:00:00.000Z", json!(null)),
                ],
                "createdAt": "2026-01-05T10:00:00.000Z"
            }],
            "level": 1,
            "points": 7
        });

        let data: TaskData = serde_json::from_value(blob).unwrap();
        let task = &data.tasks[0];
        assert_eq!(task.task_type.as_deref(), Some("habit"));
        assert_eq!(task.due_date.as_deref(), Some("2026-01-10T09:00"));
        assert_eq!(task.weekly_status[0].status, DayStatus::Complete);
        assert_eq!(task.weekly_status[1].status, DayStatus::None);
        assert_eq!(task.weekly_status[4].status, DayStatus::Break);
        assert_eq!(data.points, 7);
    }

    #[test]
    fn task_and_reminder_serialize_in_camel_case() {
        let reminder = Reminder {
            id: "r1".into(),
            task_id: "t1".into(),
            task_title: Some("Read".into()),
            time: "2026-01-05T10:00:00Z".parse().unwrap(),
            message: String::new(),
        };
        let value = serde_json::to_value(&reminder).unwrap();
        assert_eq!(value["taskId"], "t1");
        assert_eq!(value["taskTitle"], "Read");

        let filter: TaskFilter = serde_json::from_value(json!({ "taskId": "t1" })).unwrap();
        assert_eq!(filter.task_id.as_deref(), Some("t1"));

        let request: DayStatusRequest = serde_json::from_value(json!({ "status": null })).unwrap();
        assert_eq!(request.status, DayStatus::None);
    }
}
