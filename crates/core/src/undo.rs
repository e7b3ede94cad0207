//! Undo/redo transitions over the linear action log.
//!
//! The log carries one `undone` flag per entry. Undo picks the newest entry
//! with `undone = false`, redo the newest with `undone = true` (newest by
//! timestamp, ties broken by id). [`plan_reversal`] decides what the chosen
//! entry does to its object and which delta subscribers see.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::{ActionType, LoggedAction, ObjectSnapshot};

/// Which way the history pointer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl HistoryDirection {
    /// The `undone` value of entries eligible for selection.
    pub fn selects_undone(self) -> bool {
        match self {
            Self::Undo => false,
            Self::Redo => true,
        }
    }

    /// The `undone` value written to the selected entry.
    pub fn flag_after(self) -> bool {
        !self.selects_undone()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a reversal changes the object row.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRestore {
    /// Set active and restore the payload.
    Activate { payload: serde_json::Value },
    /// Replace the payload, leaving the active flag alone.
    Replace { payload: serde_json::Value },
    /// Soft-delete.
    Deactivate,
    /// Leave the row untouched.
    Unchanged,
}

/// The delta a reversal emits, before it is bound to a concrete object.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaIntent {
    pub kind: ActionType,
    pub payload: Option<serde_json::Value>,
}

/// What a store must do, atomically, for one undo or redo step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversalPlan {
    /// New value of the entry's `undone` flag.
    pub undone: bool,
    pub restore: ObjectRestore,
    /// `None` means the step completes silently.
    pub delta: Option<DeltaIntent>,
}

/// Plan one history step for the selected log entry.
///
/// `object` is the entry's referenced object. The flag always flips, even
/// when the object is missing or the step has no visible effect, so the
/// pointer never stalls on the same entry.
pub fn plan_reversal(
    direction: HistoryDirection,
    action: &LoggedAction,
    object: Option<&ObjectSnapshot>,
) -> ReversalPlan {
    let undone = direction.flag_after();
    let silent = ReversalPlan {
        undone,
        restore: ObjectRestore::Unchanged,
        delta: None,
    };

    let Some(object) = object else {
        return silent;
    };

    let (restore, kind, payload) = match (direction, action) {
        (HistoryDirection::Undo, LoggedAction::Add { .. }) => {
            (ObjectRestore::Deactivate, ActionType::Delete, None)
        }
        (HistoryDirection::Undo, LoggedAction::Update { before, .. }) => (
            ObjectRestore::Replace {
                payload: before.clone(),
            },
            ActionType::Update,
            Some(before.clone()),
        ),
        (HistoryDirection::Undo, LoggedAction::Delete { before }) => (
            ObjectRestore::Activate {
                payload: before.clone(),
            },
            ActionType::Add,
            Some(before.clone()),
        ),
        (HistoryDirection::Redo, LoggedAction::Add { after }) => (
            ObjectRestore::Activate {
                payload: after.clone(),
            },
            ActionType::Add,
            Some(after.clone()),
        ),
        (HistoryDirection::Redo, LoggedAction::Update { after, .. }) => {
            if !object.is_active {
                return silent;
            }
            (
                ObjectRestore::Replace {
                    payload: after.clone(),
                },
                ActionType::Update,
                Some(after.clone()),
            )
        }
        (HistoryDirection::Redo, LoggedAction::Delete { .. }) => {
            (ObjectRestore::Deactivate, ActionType::Delete, None)
        }
    };

    ReversalPlan {
        undone,
        restore,
        delta: Some(DeltaIntent { kind, payload }),
    }
}

/// Apply `restore` to a snapshot. Used by stores that keep objects in memory
/// and by tests that check round-trip behaviour.
pub fn apply_restore(object: &mut ObjectSnapshot, restore: &ObjectRestore) {
    match restore {
        ObjectRestore::Activate { payload } => {
            object.is_active = true;
            object.payload = payload.clone();
        }
        ObjectRestore::Replace { payload } => object.payload = payload.clone(),
        ObjectRestore::Deactivate => object.is_active = false,
        ObjectRestore::Unchanged => {}
    }
}
