//! Wire DTOs for the remote todo service.
//!
//! # Design
//! Defined independently of the mock-server's schema; the integration tests
//! catch drift between the two. Field names follow the service's camelCase
//! JSON (`userId`).

use serde::{Deserialize, Serialize};

/// Server-assigned todo identifier.
pub type TodoId = u64;

/// Identifier of the user whose todos are listed and created.
pub type UserId = u64;

/// A single todo item returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub user_id: UserId,
    pub title: String,
    pub completed: bool,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: UserId,
}

/// Partial update. Omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }
}
