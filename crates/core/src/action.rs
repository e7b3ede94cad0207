//! Action kinds, logged actions, and mutation planning.
//!
//! [`plan_mutation`] is the single place that decides what an ADD, UPDATE,
//! or DELETE does to a stored object and what gets written to the action
//! log. Stores execute the returned [`MutationPlan`] inside one transaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{validate_instance_id, validate_object_type, validate_payload};
use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// The three mutations a client can apply to a board object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Add,
    Update,
    Delete,
}

impl ActionType {
    /// Name used in the `board_actions.action_type` column and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Parse from the database / wire name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "ADD" => Ok(Self::Add),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(CoreError::Validation(format!(
                "Unknown action type '{other}'. Must be one of: ADD, UPDATE, DELETE"
            ))),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LoggedAction
// ---------------------------------------------------------------------------

/// The frozen before/after snapshots of one action log entry.
///
/// Each variant carries exactly the snapshots its kind has: an ADD has no
/// prior state and a DELETE has no resulting state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggedAction {
    Add {
        after: serde_json::Value,
    },
    Update {
        before: serde_json::Value,
        after: serde_json::Value,
    },
    Delete {
        before: serde_json::Value,
    },
}

impl LoggedAction {
    /// Rebuild a logged action from its stored columns.
    ///
    /// A row whose snapshots do not match its kind means the log is corrupt
    /// and is reported as an internal error.
    pub fn from_parts(
        action_type: ActionType,
        state_before: Option<serde_json::Value>,
        state_after: Option<serde_json::Value>,
    ) -> Result<Self, CoreError> {
        match (action_type, state_before, state_after) {
            (ActionType::Add, None, Some(after)) => Ok(Self::Add { after }),
            (ActionType::Update, Some(before), Some(after)) => Ok(Self::Update { before, after }),
            (ActionType::Delete, Some(before), None) => Ok(Self::Delete { before }),
            (action_type, before, after) => Err(CoreError::Internal(format!(
                "{action_type} action has inconsistent snapshots \
                 (state_before present: {}, state_after present: {})",
                before.is_some(),
                after.is_some()
            ))),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Add { .. } => ActionType::Add,
            Self::Update { .. } => ActionType::Update,
            Self::Delete { .. } => ActionType::Delete,
        }
    }

    pub fn state_before(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Add { .. } => None,
            Self::Update { before, .. } | Self::Delete { before } => Some(before),
        }
    }

    pub fn state_after(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Add { after } | Self::Update { after, .. } => Some(after),
            Self::Delete { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation requests and plans
// ---------------------------------------------------------------------------

/// A client's request to mutate one object on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub board_id: DbId,
    pub user_id: DbId,
    pub action_type: ActionType,
    pub instance_id: String,
    /// Required for ADD, ignored otherwise.
    pub object_type: Option<String>,
    /// Required for ADD and UPDATE, ignored for DELETE.
    pub payload: Option<serde_json::Value>,
}

impl MutationRequest {
    /// Check everything that can be checked without reading the store.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_instance_id(&self.instance_id)?;
        match self.action_type {
            ActionType::Add => {
                let object_type = self.object_type.as_deref().ok_or_else(|| {
                    CoreError::Validation("object_type is required for ADD".to_string())
                })?;
                validate_object_type(object_type)?;
                validate_payload(self.payload.as_ref())?;
            }
            ActionType::Update => {
                validate_payload(self.payload.as_ref())?;
            }
            ActionType::Delete => {}
        }
        Ok(())
    }
}

/// The current state of a stored object, as far as planning is concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub is_active: bool,
    /// Fixed when the row is first created.
    pub object_type: String,
    pub payload: serde_json::Value,
}

/// How a mutation changes the object row.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectWrite {
    /// Insert a new active row.
    Create {
        object_type: String,
        payload: serde_json::Value,
    },
    /// Reactivate a soft-deleted row with a fresh payload. Its type is kept.
    Revive { payload: serde_json::Value },
    /// Replace the payload of an active row.
    Replace { payload: serde_json::Value },
    /// Soft-delete the row.
    Deactivate,
}

/// What a store must do, atomically, to apply a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationPlan {
    pub write: ObjectWrite,
    pub action: LoggedAction,
}

/// Decide the object write and log entry for `request`.
///
/// `existing` is the stored row for `(instance_id, board_id)`, if any,
/// read under the board's serialization unit.
pub fn plan_mutation(
    request: &MutationRequest,
    existing: Option<&ObjectSnapshot>,
) -> Result<MutationPlan, CoreError> {
    request.validate()?;

    let not_found = || CoreError::ObjectNotFound {
        board_id: request.board_id,
        instance_id: request.instance_id.clone(),
    };

    match request.action_type {
        ActionType::Add => {
            let payload = validate_payload(request.payload.as_ref())?.clone();
            let object_type = request.object_type.clone().unwrap_or_default();
            let write = match existing {
                Some(object) if object.is_active => {
                    return Err(CoreError::ObjectExists {
                        board_id: request.board_id,
                        instance_id: request.instance_id.clone(),
                    });
                }
                // The log only snapshots payloads, so a revived row must keep
                // its type for undo past this ADD to restore a coherent object.
                Some(object) if object.object_type != object_type => {
                    return Err(CoreError::Validation(format!(
                        "'{}' was created as '{}' and cannot be re-added as '{object_type}'",
                        request.instance_id, object.object_type
                    )));
                }
                Some(_) => ObjectWrite::Revive {
                    payload: payload.clone(),
                },
                None => ObjectWrite::Create {
                    object_type,
                    payload: payload.clone(),
                },
            };
            Ok(MutationPlan {
                write,
                action: LoggedAction::Add { after: payload },
            })
        }
        ActionType::Update => {
            let object = existing.filter(|o| o.is_active).ok_or_else(not_found)?;
            let payload = validate_payload(request.payload.as_ref())?.clone();
            Ok(MutationPlan {
                write: ObjectWrite::Replace {
                    payload: payload.clone(),
                },
                action: LoggedAction::Update {
                    before: object.payload.clone(),
                    after: payload,
                },
            })
        }
        ActionType::Delete => {
            let object = existing.filter(|o| o.is_active).ok_or_else(not_found)?;
            Ok(MutationPlan {
                write: ObjectWrite::Deactivate,
                action: LoggedAction::Delete {
                    before: object.payload.clone(),
                },
            })
        }
    }
}
