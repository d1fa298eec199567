//! Page-level owner of one goal's quest map.
//!
//! Holds the locally cached step list, applies every user action to it
//! optimistically, and forwards the change to the [`StepApi`]. Positions are
//! cosmetic and never rolled back; content edits that the backend rejects
//! are reconciled by refetching the authoritative list.

use std::sync::Arc;

use crate::api::StepApi;
use crate::config::Config;
use crate::error::{ApiError, QuestMapError};
use crate::interaction::{DragRelease, DragTracker, Selection};
use crate::layout::{NodeKind, QuestLayout, TERMINAL_NODE_ID, compute_layout};
use crate::model::{GoalId, NewStep, Position, Step, StepId, StepPatch, StepStatus, progress_percent};
use crate::persist::{PositionSaver, SaveStatus};
use crate::render::render_svg;
use crate::session::{Access, Session, UserId};

/// Monotonic sequence numbers for refetches; a response older than the last
/// applied one is dropped.
#[derive(Debug, Default, Clone)]
pub struct RequestFence {
    issued: u64,
    applied: u64,
}

impl RequestFence {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Returns `true` and records `seq` if it is newer than anything applied.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

/// A refetch that has been sequenced but not yet sent.
pub struct RefetchRequest {
    seq: u64,
    api: Arc<dyn StepApi>,
    goal: GoalId,
}

impl RefetchRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub async fn fetch(self) -> FetchedSteps {
        let result = self.api.fetch_steps(&self.goal).await;
        FetchedSteps {
            seq: self.seq,
            result,
        }
    }
}

/// Response of a [`RefetchRequest`], tagged with its sequence number.
#[derive(Debug)]
pub struct FetchedSteps {
    seq: u64,
    result: Result<Vec<Step>, ApiError>,
}

impl FetchedSteps {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

pub struct QuestMapController {
    api: Arc<dyn StepApi>,
    goal: GoalId,
    access: Access,
    config: Config,
    steps: Vec<Step>,
    loaded: bool,
    drag: DragTracker,
    saver: PositionSaver,
    fence: RequestFence,
}

impl QuestMapController {
    pub fn new(api: Arc<dyn StepApi>, session: &Session, goal: GoalId, owner: &UserId, config: Config) -> Self {
        let access = Access::resolve(session, owner);
        let saver = PositionSaver::new(Arc::clone(&api), &config.interaction);
        Self {
            api,
            goal,
            access,
            config,
            steps: Vec::new(),
            loaded: false,
            drag: DragTracker::new(),
            saver,
            fence: RequestFence::default(),
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn goal(&self) -> &GoalId {
        &self.goal
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }

    pub fn saver(&self) -> &PositionSaver {
        &self.saver
    }

    /// Initial fetch. On failure the page shows an error banner and no graph.
    pub async fn load(&mut self) -> Result<(), QuestMapError> {
        let FetchedSteps { seq, result } = self.start_refetch().fetch().await;
        let steps = result.map_err(QuestMapError::Fetch)?;
        if self.accept_steps(seq, steps) {
            tracing::debug!(goal = %self.goal, steps = self.steps.len(), "loaded quest map");
        }
        Ok(())
    }

    /// Replaces the local list with the backend's, keeping positions that are
    /// still waiting to be saved.
    pub async fn refresh(&mut self) -> Result<bool, QuestMapError> {
        let fetched = self.start_refetch().fetch().await;
        self.apply_refetch(fetched)
    }

    /// Takes a sequence number for a refetch. The returned request does not
    /// borrow the controller, so several may be in flight at once.
    pub fn start_refetch(&mut self) -> RefetchRequest {
        RefetchRequest {
            seq: self.fence.issue(),
            api: Arc::clone(&self.api),
            goal: self.goal.clone(),
        }
    }

    /// Applies a finished refetch. Returns `Ok(false)` when a newer list has
    /// already been applied.
    pub fn apply_refetch(&mut self, fetched: FetchedSteps) -> Result<bool, QuestMapError> {
        let steps = fetched.result?;
        Ok(self.accept_steps(fetched.seq, steps))
    }

    fn accept_steps(&mut self, seq: u64, mut steps: Vec<Step>) -> bool {
        if !self.fence.accept(seq) {
            tracing::debug!(seq, "dropping stale step list");
            return false;
        }
        steps.retain(|step| {
            let reserved = step.id.is_reserved();
            if reserved {
                tracing::warn!(step = %step.id, "ignoring step with a reserved node id");
            }
            !reserved
        });
        let pending = self.saver.pending();
        for step in &mut steps {
            if let Some(position) = pending.get(&step.id) {
                step.position = Some(*position);
            }
        }
        self.steps = steps;
        self.loaded = true;
        true
    }

    pub fn layout(&self) -> QuestLayout {
        compute_layout(&self.steps, &self.config.layout)
    }

    /// `None` until the list is loaded; the page renders its banner instead.
    pub fn render_svg(&self, theme_key: Option<&str>) -> Option<String> {
        if !self.loaded {
            return None;
        }
        let theme = self.config.theme_for(theme_key);
        Some(render_svg(&self.layout(), &self.steps, &theme, &self.config.render))
    }

    pub fn progress_percent(&self) -> Option<f32> {
        progress_percent(&self.steps)
    }

    pub fn click(&self, node_id: &str) -> Option<Selection> {
        if node_id == TERMINAL_NODE_ID {
            return Some(Selection::Goal);
        }
        self.step(node_id)
            .map(|step| Selection::Detail(Box::new(step.clone())))
    }

    pub fn social_click(&self, id: &StepId) -> Option<Selection> {
        self.step(id.as_str())
            .map(|step| Selection::Social(Box::new(step.clone())))
    }

    /// Starts dragging a step node. Junctions and the terminal are not
    /// draggable and return `Ok(false)`.
    pub fn begin_drag(&mut self, node_id: &str) -> Result<bool, QuestMapError> {
        self.require_owner()?;
        let layout = self.layout();
        let Some(node) = layout.node(node_id) else {
            return Ok(false);
        };
        if !matches!(node.kind, NodeKind::Step(_)) {
            return Ok(false);
        }
        self.drag
            .begin(StepId::new(node_id), Position::new(node.x, node.y));
        Ok(true)
    }

    pub fn drag_to(&mut self, position: Position) -> Result<(), QuestMapError> {
        self.require_owner()?;
        if let Some(id) = self.drag.move_to(position).cloned()
            && let Some(step) = self.step_mut(id.as_str())
        {
            step.position = Some(position);
        }
        Ok(())
    }

    /// Ends the gesture and queues the final position for saving.
    pub fn end_drag(&mut self) -> Result<Option<DragRelease>, QuestMapError> {
        self.require_owner()?;
        let Some(release) = self.drag.release() else {
            return Ok(None);
        };
        if release.moved {
            if let Some(step) = self.step_mut(release.node.as_str()) {
                step.position = Some(release.position);
            }
            self.saver.record(release.node.clone(), release.position);
        }
        Ok(Some(release))
    }

    pub fn cancel_drag(&mut self) {
        if let Some((id, origin)) = self.drag.cancel()
            && let Some(step) = self.step_mut(id.as_str())
        {
            step.position = Some(origin);
        }
    }

    /// Marks a step completed locally, then tells the backend. A failed call
    /// is logged and the local status is kept.
    pub async fn complete_step(&mut self, id: &StepId) -> Result<(), QuestMapError> {
        self.require_owner()?;
        let step = self
            .step_mut(id.as_str())
            .ok_or_else(|| QuestMapError::UnknownStep(id.clone()))?;
        if step.status == StepStatus::Completed {
            return Ok(());
        }
        step.status = StepStatus::Completed;
        if let Err(err) = self.api.complete_step(id).await {
            tracing::warn!(step = %id, error = %err, "failed to complete step");
        }
        Ok(())
    }

    /// Flips one checklist entry. Returns the new flag, `None` if the step
    /// has no such entry.
    pub async fn toggle_checklist(&mut self, id: &StepId, index: usize) -> Result<Option<bool>, QuestMapError> {
        self.require_owner()?;
        let step = self
            .step_mut(id.as_str())
            .ok_or_else(|| QuestMapError::UnknownStep(id.clone()))?;
        let Some(done) = step.toggle_checklist_item(index) else {
            return Ok(None);
        };
        let patch = StepPatch {
            extra_data: Some(step.extra_data.clone()),
            ..Default::default()
        };
        self.push_content_patch(id, &patch).await?;
        Ok(Some(done))
    }

    pub async fn edit_step(&mut self, id: &StepId, patch: StepPatch) -> Result<(), QuestMapError> {
        self.require_owner()?;
        if patch.is_empty() {
            return Ok(());
        }
        let step = self
            .step_mut(id.as_str())
            .ok_or_else(|| QuestMapError::UnknownStep(id.clone()))?;
        patch.apply(step);
        self.push_content_patch(id, &patch).await
    }

    pub async fn create_step(&mut self, new: NewStep) -> Result<StepId, QuestMapError> {
        self.require_owner()?;
        let step = self.api.create_step(&self.goal, &new).await?;
        let id = step.id.clone();
        self.steps.push(step);
        Ok(id)
    }

    pub async fn delete_step(&mut self, id: &StepId) -> Result<(), QuestMapError> {
        self.require_owner()?;
        let idx = self
            .steps
            .iter()
            .position(|step| &step.id == id)
            .ok_or_else(|| QuestMapError::UnknownStep(id.clone()))?;
        self.steps.remove(idx);
        if let Err(err) = self.api.delete_step(id).await {
            tracing::warn!(step = %id, error = %err, "failed to delete step, reloading");
            self.refresh().await?;
        }
        Ok(())
    }

    /// Leaving the page: stop timers, abandon unsaved positions.
    pub fn unmount(&mut self) {
        self.drag.cancel();
        self.saver.shutdown();
    }

    async fn push_content_patch(&mut self, id: &StepId, patch: &StepPatch) -> Result<(), QuestMapError> {
        match self.api.update_step(id, patch).await {
            Ok(updated) => {
                if let Some(step) = self.step_mut(id.as_str()) {
                    // Positions are owned locally; the server copy may predate a drag.
                    let position = step.position;
                    *step = updated;
                    step.position = position.or(step.position);
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(step = %id, error = %err, "failed to update step, reloading");
                self.refresh().await?;
                Ok(())
            }
        }
    }

    fn require_owner(&self) -> Result<(), QuestMapError> {
        if self.access.can_edit() {
            Ok(())
        } else {
            Err(QuestMapError::ReadOnly)
        }
    }

    fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id.as_str() == id)
    }

    fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|step| step.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryStepApi;
    use crate::layout::{edge_id, fork_node_id};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// In-memory backend whose content writes can be switched to fail.
    #[derive(Default)]
    struct FlakyApi {
        inner: InMemoryStepApi,
        fail_writes: AtomicBool,
    }

    impl FlakyApi {
        fn check(&self) -> Result<(), ApiError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(ApiError::Network("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl StepApi for FlakyApi {
        async fn fetch_steps(&self, goal: &GoalId) -> Result<Vec<Step>, ApiError> {
            self.inner.fetch_steps(goal).await
        }

        async fn complete_step(&self, id: &StepId) -> Result<(), ApiError> {
            self.check()?;
            self.inner.complete_step(id).await
        }

        async fn update_position(&self, id: &StepId, position: Position) -> Result<(), ApiError> {
            self.inner.update_position(id, position).await
        }

        async fn update_step(&self, id: &StepId, patch: &StepPatch) -> Result<Step, ApiError> {
            self.check()?;
            self.inner.update_step(id, patch).await
        }

        async fn create_step(&self, goal: &GoalId, step: &NewStep) -> Result<Step, ApiError> {
            self.inner.create_step(goal, step).await
        }

        async fn delete_step(&self, id: &StepId) -> Result<(), ApiError> {
            self.check()?;
            self.inner.delete_step(id).await
        }
    }

    fn goal() -> GoalId {
        GoalId::new("g1")
    }

    fn owner() -> UserId {
        UserId::new("u1")
    }

    fn plan() -> Vec<Step> {
        let mut checklist_step = Step::new("c", "Pack", 3);
        checklist_step.extra_data.insert(
            "checklist".to_string(),
            serde_json::json!([{"text": "Boots", "done": false}]),
        );
        vec![
            Step::new("a", "Scout", 1).with_status(StepStatus::Completed),
            Step::new("b", "Climb", 2).with_status(StepStatus::Active),
            checklist_step,
        ]
    }

    fn flaky() -> Arc<FlakyApi> {
        Arc::new(FlakyApi {
            inner: InMemoryStepApi::with_goal(goal(), plan()),
            fail_writes: AtomicBool::new(false),
        })
    }

    async fn loaded(api: Arc<FlakyApi>, session: Session) -> QuestMapController {
        let mut controller = QuestMapController::new(api, &session, goal(), &owner(), Config::default());
        controller.load().await.expect("load");
        controller
    }

    #[test]
    fn fence_drops_responses_older_than_last_applied() {
        let mut fence = RequestFence::default();
        let first = fence.issue();
        let second = fence.issue();
        assert!(fence.accept(second));
        assert!(!fence.accept(first));
        assert_eq!(fence.last_applied(), second);
        let third = fence.issue();
        assert!(fence.accept(third));
    }

    #[tokio::test]
    async fn nothing_renders_before_load() {
        let controller = QuestMapController::new(
            flaky(),
            &Session::signed_in(owner()),
            goal(),
            &owner(),
            Config::default(),
        );
        assert!(controller.render_svg(None).is_none());
    }

    #[tokio::test]
    async fn completing_a_step_completes_its_outgoing_edge() {
        let mut controller = loaded(flaky(), Session::signed_in(owner())).await;
        assert!(!controller.layout().edge("b", "c").expect("edge").is_completed);

        controller.complete_step(&StepId::new("b")).await.expect("complete");
        let layout = controller.layout();
        assert!(layout.edge("b", "c").expect("edge").is_completed);
        assert_eq!(layout.terminal_status(), StepStatus::Locked);

        // Completing again is a no-op.
        controller.complete_step(&StepId::new("b")).await.expect("idempotent");
        controller.complete_step(&StepId::new("c")).await.expect("complete");
        assert_eq!(controller.layout().terminal_status(), StepStatus::Completed);
        assert_eq!(controller.progress_percent(), Some(100.0));
    }

    #[tokio::test]
    async fn failed_completion_keeps_local_status() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;
        api.fail_writes.store(true, Ordering::SeqCst);

        controller.complete_step(&StepId::new("b")).await.expect("logged, not returned");
        let step = controller.steps().iter().find(|s| s.id.as_str() == "b").expect("b");
        assert_eq!(step.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn failed_edit_refetches_authoritative_list() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;
        api.fail_writes.store(true, Ordering::SeqCst);

        let patch = StepPatch {
            title: Some("Summit".to_string()),
            ..Default::default()
        };
        controller.edit_step(&StepId::new("b"), patch).await.expect("edit");
        let step = controller.steps().iter().find(|s| s.id.as_str() == "b").expect("b");
        assert_eq!(step.title, "Climb");
    }

    #[tokio::test]
    async fn checklist_toggle_is_persisted() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;

        let done = controller
            .toggle_checklist(&StepId::new("c"), 0)
            .await
            .expect("toggle");
        assert_eq!(done, Some(true));
        assert_eq!(
            controller.toggle_checklist(&StepId::new("c"), 5).await.expect("toggle"),
            None
        );

        let stored = api.inner.snapshot(&goal());
        let step = stored.iter().find(|s| s.id.as_str() == "c").expect("c");
        assert!(step.checklist()[0].done);
    }

    #[tokio::test]
    async fn failed_delete_restores_the_step() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;
        api.fail_writes.store(true, Ordering::SeqCst);

        controller.delete_step(&StepId::new("a")).await.expect("delete");
        assert_eq!(controller.steps().len(), 3);

        api.fail_writes.store(false, Ordering::SeqCst);
        controller.delete_step(&StepId::new("a")).await.expect("delete");
        assert_eq!(controller.steps().len(), 2);
    }

    #[tokio::test]
    async fn created_parallel_steps_form_a_group() {
        let mut controller = loaded(flaky(), Session::signed_in(owner())).await;
        for order in [4, 5] {
            controller
                .create_step(NewStep {
                    title: format!("Camp {order}"),
                    description: None,
                    order,
                    can_parallel: true,
                    node_type: Default::default(),
                    extra_data: Default::default(),
                })
                .await
                .expect("create");
        }
        let layout = controller.layout();
        assert_eq!(layout.groups.len(), 1);
        assert!(layout.node(&fork_node_id(0)).is_some());
        assert!(layout.edges.iter().any(|edge| edge.id == edge_id("c", &fork_node_id(0))));
    }

    #[tokio::test]
    async fn read_only_viewers_cannot_mutate() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(UserId::new("u2"))).await;
        assert_eq!(controller.access(), Access::ReadOnly);

        assert!(matches!(
            controller.complete_step(&StepId::new("b")).await,
            Err(QuestMapError::ReadOnly)
        ));
        assert!(matches!(controller.begin_drag("b"), Err(QuestMapError::ReadOnly)));
        assert!(matches!(
            controller.click("b"),
            Some(Selection::Detail(step)) if step.id.as_str() == "b"
        ));
        assert!(matches!(
            controller.social_click(&StepId::new("a")),
            Some(Selection::Social(_))
        ));
        assert_eq!(controller.click(TERMINAL_NODE_ID), Some(Selection::Goal));
    }

    #[tokio::test]
    async fn junctions_are_not_draggable() {
        let mut steps = plan();
        steps.push(Step::new("d", "D", 4).parallel(true));
        steps.push(Step::new("e", "E", 5).parallel(true));
        let api = Arc::new(FlakyApi {
            inner: InMemoryStepApi::with_goal(goal(), steps),
            fail_writes: AtomicBool::new(false),
        });
        let mut controller = loaded(api, Session::signed_in(owner())).await;
        assert!(!controller.begin_drag(&fork_node_id(0)).expect("owner"));
        assert!(!controller.begin_drag(TERMINAL_NODE_ID).expect("owner"));
        assert!(controller.begin_drag("d").expect("owner"));
    }

    #[tokio::test(start_paused = true)]
    async fn dragged_positions_are_saved_after_the_quiet_period() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;

        assert!(controller.begin_drag("a").expect("owner"));
        controller.drag_to(Position::new(40.0, 50.0)).expect("owner");
        let release = controller.end_drag().expect("owner").expect("was dragging");
        assert!(release.moved);
        assert_eq!(controller.save_status(), SaveStatus::Pending);

        let layout = controller.layout();
        let node = layout.node("a").expect("a");
        assert!(node.pinned);
        assert_eq!((node.x, node.y), (40.0, 50.0));

        // A refetch while the save is pending keeps the local position.
        controller.refresh().await.expect("refresh");
        let step = controller.steps().iter().find(|s| s.id.as_str() == "a").expect("a");
        assert_eq!(step.position, Some(Position::new(40.0, 50.0)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        let stored = api.inner.snapshot(&goal());
        assert_eq!(stored[0].position, Some(Position::new(40.0, 50.0)));
        assert_eq!(controller.saver().batches_flushed(), 1);
    }

    #[tokio::test]
    async fn older_refetch_arriving_last_is_dropped() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;

        let older = controller.start_refetch();
        let before = older.fetch().await;
        api.inner.complete_step(&StepId::new("b")).await.expect("complete");
        let newer = controller.start_refetch();
        let after = newer.fetch().await;
        assert!(before.seq() < after.seq());

        assert!(controller.apply_refetch(after).expect("apply newer"));
        assert!(!controller.apply_refetch(before).expect("apply older"));
        let b = controller.steps().iter().find(|s| s.id.as_str() == "b").expect("b");
        assert_eq!(b.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn failed_refetch_leaves_list_untouched() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;
        let stale = FetchedSteps {
            seq: controller.start_refetch().seq(),
            result: Err(ApiError::Network("offline".to_string())),
        };
        assert!(matches!(controller.apply_refetch(stale), Err(QuestMapError::Api(_))));
        assert_eq!(controller.steps().len(), 3);
    }

    #[tokio::test]
    async fn reserved_ids_from_the_backend_are_ignored() {
        let mut steps = plan();
        steps.push(Step::new(TERMINAL_NODE_ID, "Impostor", 4));
        steps.push(Step::new("__fork_0", "Impostor", 5));
        let api = Arc::new(FlakyApi {
            inner: InMemoryStepApi::with_goal(goal(), steps),
            fail_writes: AtomicBool::new(false),
        });
        let controller = loaded(api, Session::signed_in(owner())).await;

        assert_eq!(controller.steps().len(), 3);
        assert!(matches!(controller.click(TERMINAL_NODE_ID), Some(Selection::Goal)));
        let layout = controller.layout();
        assert!(layout.edges.iter().all(|edge| edge.from != edge.to));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_before_flush_keeps_dragged_position() {
        let mut steps = plan();
        steps[0].position = Some(Position::new(10.0, 10.0));
        let api = Arc::new(FlakyApi {
            inner: InMemoryStepApi::with_goal(goal(), steps),
            fail_writes: AtomicBool::new(false),
        });
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;

        controller.begin_drag("a").expect("owner");
        controller.drag_to(Position::new(40.0, 50.0)).expect("owner");
        controller.end_drag().expect("owner");
        let patch = StepPatch {
            title: Some("Scout the ridge".to_string()),
            ..Default::default()
        };
        controller.edit_step(&StepId::new("a"), patch).await.expect("edit");

        let step = controller.steps().iter().find(|s| s.id.as_str() == "a").expect("a");
        assert_eq!(step.title, "Scout the ridge");
        assert_eq!(step.position, Some(Position::new(40.0, 50.0)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.inner.snapshot(&goal())[0].position, Some(Position::new(40.0, 50.0)));
    }

    #[tokio::test]
    async fn theme_switch_keeps_configured_overrides() {
        let mut config = Config::default();
        config.theme_overrides.font_family = Some("Lexend".to_string());
        config.theme_overrides.apply_to(&mut config.theme);
        let api = flaky();
        let mut controller = QuestMapController::new(api, &Session::signed_in(owner()), goal(), &owner(), config);
        controller.load().await.expect("load");

        let svg = controller.render_svg(Some("ocean")).expect("loaded");
        assert!(svg.contains("data-theme=\"ocean\""));
        assert!(svg.contains("Lexend"));
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_abandons_pending_saves() {
        let api = flaky();
        let mut controller = loaded(Arc::clone(&api), Session::signed_in(owner())).await;

        controller.begin_drag("a").expect("owner");
        controller.drag_to(Position::new(1.0, 2.0)).expect("owner");
        controller.end_drag().expect("owner");
        controller.unmount();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.inner.snapshot(&goal())[0].position, None);
    }
}
