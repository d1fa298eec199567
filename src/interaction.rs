use crate::model::{Position, Step, StepId};

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        node: StepId,
        origin: Position,
        current: Position,
    },
}

/// Result of letting go of a dragged node.
#[derive(Debug, Clone, PartialEq)]
pub struct DragRelease {
    pub node: StepId,
    pub position: Position,
    pub moved: bool,
}

/// Per-gesture drag state. Moves only touch local state; the release is
/// what gets queued for persistence.
#[derive(Debug, Clone)]
pub struct DragTracker {
    state: DragState,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
        }
    }
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Starts a gesture. A gesture already in progress is replaced.
    pub fn begin(&mut self, node: StepId, origin: Position) {
        self.state = DragState::Dragging {
            node,
            origin,
            current: origin,
        };
    }

    /// Returns the node being dragged, or `None` when idle.
    pub fn move_to(&mut self, position: Position) -> Option<&StepId> {
        match &mut self.state {
            DragState::Dragging { node, current, .. } => {
                *current = position;
                Some(&*node)
            }
            DragState::Idle => None,
        }
    }

    pub fn release(&mut self) -> Option<DragRelease> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging {
                node,
                origin,
                current,
            } => Some(DragRelease {
                node,
                position: current,
                moved: origin != current,
            }),
            DragState::Idle => None,
        }
    }

    /// Abandons the gesture and returns where the node started.
    pub fn cancel(&mut self) -> Option<(StepId, Position)> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging { node, origin, .. } => Some((node, origin)),
            DragState::Idle => None,
        }
    }
}

/// What a click on the map opens.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Detail(Box<Step>),
    Social(Box<Step>),
    /// The terminal node: the goal summary.
    Goal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_reports_last_position() {
        let mut drag = DragTracker::new();
        drag.begin(StepId::new("a"), Position::new(0.0, 0.0));
        assert_eq!(drag.move_to(Position::new(4.0, 4.0)), Some(&StepId::new("a")));
        drag.move_to(Position::new(10.0, 20.0));
        let release = drag.release().expect("was dragging");
        assert_eq!(release.position, Position::new(10.0, 20.0));
        assert!(release.moved);
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn release_without_gesture_is_a_no_op() {
        let mut drag = DragTracker::new();
        assert!(drag.release().is_none());
        assert!(drag.move_to(Position::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn click_without_motion_is_not_a_move() {
        let mut drag = DragTracker::new();
        drag.begin(StepId::new("a"), Position::new(3.0, 3.0));
        let release = drag.release().expect("was dragging");
        assert!(!release.moved);
    }

    #[test]
    fn cancel_returns_origin() {
        let mut drag = DragTracker::new();
        drag.begin(StepId::new("a"), Position::new(3.0, 3.0));
        drag.move_to(Position::new(50.0, 50.0));
        assert_eq!(drag.cancel(), Some((StepId::new("a"), Position::new(3.0, 3.0))));
        assert!(!drag.is_dragging());
    }
}
