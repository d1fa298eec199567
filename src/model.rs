use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ModelError;
use crate::layout::is_reserved_node_id;

pub type ExtraData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collides with a junction or terminal node id.
    pub fn is_reserved(&self) -> bool {
        is_reserved_node_id(&self.0)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StepId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The goal a quest map belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Locked,
    Active,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Task,
    Milestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One step of a goal's plan, as cached from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StepRecord", into = "StepRecord")]
pub struct Step {
    pub id: StepId,
    pub title: String,
    pub description: Option<String>,
    pub order: i64,
    pub status: StepStatus,
    pub can_parallel: bool,
    pub node_type: NodeType,
    /// Server-persisted top-left position. `None` lets the layout engine place the node.
    pub position: Option<Position>,
    pub extra_data: ExtraData,
}

impl Step {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            order,
            status: StepStatus::Locked,
            can_parallel: false,
            node_type: NodeType::Task,
            position: None,
            extra_data: ExtraData::new(),
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn parallel(mut self, can_parallel: bool) -> Self {
        self.can_parallel = can_parallel;
        self
    }

    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.extra_data
            .get("checklist")
            .and_then(|value| value.as_array())
            .map(|items| items.iter().filter_map(ChecklistItem::from_value).collect())
            .unwrap_or_default()
    }

    /// Flips the `done` flag of one checklist entry. Returns the new flag, or
    /// `None` when the step has no entry at `index`.
    pub fn toggle_checklist_item(&mut self, index: usize) -> Option<bool> {
        let item = self
            .extra_data
            .get_mut("checklist")?
            .as_array_mut()?
            .get_mut(index)?;
        match item {
            Value::Object(fields) => {
                let done = !fields.get("done").and_then(Value::as_bool).unwrap_or(false);
                fields.insert("done".to_string(), Value::Bool(done));
                Some(done)
            }
            Value::String(text) => {
                let mut fields = Map::new();
                fields.insert("text".to_string(), Value::String(std::mem::take(text)));
                fields.insert("done".to_string(), Value::Bool(true));
                *item = Value::Object(fields);
                Some(true)
            }
            _ => None,
        }
    }

    /// Human readable duration from `duration` or `estimated_duration`.
    /// Numbers are minutes.
    pub fn duration_label(&self) -> Option<String> {
        let value = self
            .extra_data
            .get("duration")
            .or_else(|| self.extra_data.get("estimated_duration"))?;
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(num) => {
                let minutes = num.as_f64()?.max(0.0).round() as u64;
                Some(format_minutes(minutes))
            }
            _ => None,
        }
    }
}

fn format_minutes(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub done: bool,
}

impl ChecklistItem {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self {
                text: text.clone(),
                done: false,
            }),
            Value::Object(fields) => Some(Self {
                text: fields
                    .get("text")
                    .or_else(|| fields.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                done: fields.get("done").and_then(Value::as_bool).unwrap_or(false),
            }),
            _ => None,
        }
    }
}

/// Partial replace of the editable step fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
}

impl StepPatch {
    pub fn apply(&self, step: &mut Step) {
        if let Some(title) = &self.title {
            step.title = title.clone();
        }
        if let Some(description) = &self.description {
            step.description = Some(description.clone());
        }
        if let Some(node_type) = self.node_type {
            step.node_type = node_type;
        }
        if let Some(extra) = &self.extra_data {
            step.extra_data = extra.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.node_type.is_none()
            && self.extra_data.is_none()
    }
}

/// Payload for creating a step; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStep {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i64,
    #[serde(default)]
    pub can_parallel: bool,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub extra_data: ExtraData,
}

/// Wire shape of a step as the REST API sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepRecord {
    id: StepId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    order: i64,
    status: StepStatus,
    #[serde(default)]
    can_parallel: bool,
    #[serde(default)]
    node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position_y: Option<f32>,
    #[serde(default)]
    extra_data: ExtraData,
}

impl TryFrom<StepRecord> for Step {
    type Error = ModelError;

    fn try_from(record: StepRecord) -> Result<Self, Self::Error> {
        if record.id.as_str().trim().is_empty() {
            return Err(ModelError::EmptyId);
        }
        if record.id.is_reserved() {
            return Err(ModelError::ReservedId(record.id.to_string()));
        }
        let position = match (record.position_x, record.position_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Position { x, y }),
            (None, None) => None,
            _ => {
                return Err(ModelError::InvalidPosition {
                    id: record.id.to_string(),
                });
            }
        };
        Ok(Step {
            id: record.id,
            title: record.title,
            description: record.description,
            order: record.order,
            status: record.status,
            can_parallel: record.can_parallel,
            node_type: record.node_type,
            position,
            extra_data: record.extra_data,
        })
    }
}

impl From<Step> for StepRecord {
    fn from(step: Step) -> Self {
        StepRecord {
            id: step.id,
            title: step.title,
            description: step.description,
            order: step.order,
            status: step.status,
            can_parallel: step.can_parallel,
            node_type: step.node_type,
            position_x: step.position.map(|p| p.x),
            position_y: step.position.map(|p| p.y),
            extra_data: step.extra_data,
        }
    }
}

/// Stable ascending sort on `order`; equal keys keep their input order.
pub fn sort_steps(steps: &[Step]) -> Vec<&Step> {
    let mut sorted: Vec<&Step> = steps.iter().collect();
    sorted.sort_by_key(|step| step.order);
    sorted
}

/// Share of completed steps in percent. `None` for an empty plan.
pub fn progress_percent(steps: &[Step]) -> Option<f32> {
    if steps.is_empty() {
        return None;
    }
    let completed = steps.iter().filter(|step| step.is_completed()).count();
    Some(completed as f32 / steps.len() as f32 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_is_stable_for_equal_orders() {
        let steps = vec![
            Step::new("b", "B", 2),
            Step::new("a1", "A1", 1),
            Step::new("c", "C", 3),
            Step::new("a2", "A2", 1),
        ];
        let ids: Vec<&str> = sort_steps(&steps).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn deserializes_wire_record() {
        let step: Step = serde_json::from_value(json!({
            "id": "s1",
            "title": "Warm up",
            "order": 4,
            "status": "active",
            "can_parallel": true,
            "node_type": "milestone",
            "position_x": 12.5,
            "position_y": -3.0,
            "extra_data": {"duration": 90}
        }))
        .expect("valid step");
        assert_eq!(step.status, StepStatus::Active);
        assert_eq!(step.node_type, NodeType::Milestone);
        assert_eq!(step.position, Some(Position::new(12.5, -3.0)));
        assert_eq!(step.duration_label().as_deref(), Some("1h 30m"));
    }

    #[test]
    fn rejects_unknown_status() {
        let result: Result<Step, _> = serde_json::from_value(json!({
            "id": "s1",
            "title": "x",
            "order": 1,
            "status": "paused"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_half_position() {
        let result: Result<Step, _> = serde_json::from_value(json!({
            "id": "s1",
            "title": "x",
            "order": 1,
            "status": "locked",
            "position_x": 1.0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_engine_node_ids() {
        for id in ["__fork_0", "__join_3", "__goal_complete"] {
            let result: Result<Step, _> = serde_json::from_value(json!({
                "id": id,
                "title": "x",
                "order": 1,
                "status": "locked"
            }));
            let err = result.expect_err("reserved id accepted");
            assert!(err.to_string().contains("reserved"), "{id}: {err}");
        }
        assert!(!StepId::new("fork_0").is_reserved());
    }

    #[test]
    fn toggles_checklist_entries() {
        let mut step = Step::new("s", "S", 1);
        step.extra_data.insert(
            "checklist".to_string(),
            json!([{"text": "one", "done": false}, "two"]),
        );
        assert_eq!(step.toggle_checklist_item(0), Some(true));
        assert_eq!(step.toggle_checklist_item(1), Some(true));
        assert_eq!(step.toggle_checklist_item(5), None);
        let items = step.checklist();
        assert!(items.iter().all(|item| item.done));
        assert_eq!(items[1].text, "two");
    }

    #[test]
    fn progress_is_none_for_empty_plan() {
        assert_eq!(progress_percent(&[]), None);
        let steps = vec![
            Step::new("a", "A", 1).with_status(StepStatus::Completed),
            Step::new("b", "B", 2).with_status(StepStatus::Completed),
            Step::new("c", "C", 3).with_status(StepStatus::Active),
        ];
        let pct = progress_percent(&steps).expect("non-empty");
        assert!((pct - 66.666_67).abs() < 0.01);
    }
}
