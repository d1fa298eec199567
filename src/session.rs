use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is looking at the page. Passed in by the host rather than read from
/// any global store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    viewer: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { viewer: None }
    }

    pub fn signed_in(viewer: UserId) -> Self {
        Self {
            viewer: Some(viewer),
        }
    }

    pub fn viewer(&self) -> Option<&UserId> {
        self.viewer.as_ref()
    }
}

/// Interaction hooks a host page can wire to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    NodeClick,
    SocialClick,
    Complete,
    ChecklistToggle,
    PositionChange,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    ReadOnly,
}

impl Access {
    pub fn resolve(session: &Session, owner: &UserId) -> Self {
        match session.viewer() {
            Some(viewer) if viewer == owner => Access::Owner,
            _ => Access::ReadOnly,
        }
    }

    pub fn can_edit(self) -> bool {
        self == Access::Owner
    }

    pub fn callbacks(self) -> &'static [Callback] {
        match self {
            Access::Owner => &[
                Callback::NodeClick,
                Callback::SocialClick,
                Callback::Complete,
                Callback::ChecklistToggle,
                Callback::PositionChange,
                Callback::Edit,
            ],
            Access::ReadOnly => &[Callback::NodeClick, Callback::SocialClick],
        }
    }
}
