//! Contract with the REST backend that owns steps.
//!
//! The quest map never talks HTTP itself; the hosting page hands it a
//! [`StepApi`] implementation. [`InMemoryStepApi`] backs the CLI demo, the
//! benches and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::model::{GoalId, NewStep, Position, Step, StepId, StepPatch, StepStatus};

#[async_trait]
pub trait StepApi: Send + Sync {
    /// Steps of a goal, in any order.
    async fn fetch_steps(&self, goal: &GoalId) -> Result<Vec<Step>, ApiError>;

    /// Marks a step completed. Completing an already completed step succeeds.
    async fn complete_step(&self, id: &StepId) -> Result<(), ApiError>;

    async fn update_position(&self, id: &StepId, position: Position) -> Result<(), ApiError>;

    async fn update_step(&self, id: &StepId, patch: &StepPatch) -> Result<Step, ApiError>;

    async fn create_step(&self, goal: &GoalId, step: &NewStep) -> Result<Step, ApiError>;

    async fn delete_step(&self, id: &StepId) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStepApi {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    goals: BTreeMap<GoalId, Vec<Step>>,
    next_id: u64,
}

impl MemoryState {
    fn find_mut(&mut self, id: &StepId) -> Option<&mut Step> {
        self.goals
            .values_mut()
            .flat_map(|steps| steps.iter_mut())
            .find(|step| &step.id == id)
    }
}

impl InMemoryStepApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(goal: GoalId, steps: Vec<Step>) -> Self {
        let api = Self::new();
        api.state.lock().goals.insert(goal, steps);
        api
    }

    pub fn snapshot(&self, goal: &GoalId) -> Vec<Step> {
        self.state.lock().goals.get(goal).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl StepApi for InMemoryStepApi {
    async fn fetch_steps(&self, goal: &GoalId) -> Result<Vec<Step>, ApiError> {
        Ok(self.snapshot(goal))
    }

    async fn complete_step(&self, id: &StepId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        let step = state.find_mut(id).ok_or_else(|| ApiError::NotFound(id.clone()))?;
        step.status = StepStatus::Completed;
        Ok(())
    }

    async fn update_position(&self, id: &StepId, position: Position) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        let step = state.find_mut(id).ok_or_else(|| ApiError::NotFound(id.clone()))?;
        step.position = Some(position);
        Ok(())
    }

    async fn update_step(&self, id: &StepId, patch: &StepPatch) -> Result<Step, ApiError> {
        let mut state = self.state.lock();
        let step = state.find_mut(id).ok_or_else(|| ApiError::NotFound(id.clone()))?;
        patch.apply(step);
        Ok(step.clone())
    }

    async fn create_step(&self, goal: &GoalId, new: &NewStep) -> Result<Step, ApiError> {
        if new.title.trim().is_empty() {
            return Err(ApiError::Rejected("title must not be empty".to_string()));
        }
        let mut state = self.state.lock();
        state.next_id += 1;
        let mut step = Step::new(format!("step-{}", state.next_id), new.title.clone(), new.order)
            .parallel(new.can_parallel)
            .with_node_type(new.node_type);
        step.description = new.description.clone();
        step.extra_data = new.extra_data.clone();
        state.goals.entry(goal.clone()).or_default().push(step.clone());
        Ok(step)
    }

    async fn delete_step(&self, id: &StepId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        for steps in state.goals.values_mut() {
            if let Some(idx) = steps.iter().position(|step| &step.id == id) {
                steps.remove(idx);
                return Ok(());
            }
        }
        Err(ApiError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_api_round_trips_mutations() {
        let goal = GoalId::new("g1");
        let api = InMemoryStepApi::with_goal(goal.clone(), vec![Step::new("a", "A", 1)]);

        api.complete_step(&StepId::new("a")).await.expect("complete");
        api.complete_step(&StepId::new("a")).await.expect("complete twice");
        api.update_position(&StepId::new("a"), Position::new(5.0, 6.0))
            .await
            .expect("position");
        let created = api
            .create_step(
                &goal,
                &NewStep {
                    title: "B".to_string(),
                    description: None,
                    order: 2,
                    can_parallel: true,
                    node_type: Default::default(),
                    extra_data: Default::default(),
                },
            )
            .await
            .expect("create");

        let steps = api.fetch_steps(&goal).await.expect("fetch");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(steps[0].position, Some(Position::new(5.0, 6.0)));
        assert!(steps[1].can_parallel);

        api.delete_step(&created.id).await.expect("delete");
        assert!(matches!(
            api.delete_step(&created.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
