use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: u64,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<u64>,
}

/// Todos keyed by id; ids come from `next_id` so key order is creation order.
#[derive(Debug)]
pub struct Tables {
    todos: BTreeMap<u64, Todo>,
    next_id: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            todos: BTreeMap::new(),
            next_id: 1,
        }
    }
}

pub type Db = Arc<RwLock<Tables>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Tables::default()));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_todos(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Todo>> {
    let tables = db.read().await;
    let todos = tables
        .todos
        .values()
        .filter(|todo| query.user_id.is_none_or(|user| todo.user_id == user))
        .cloned()
        .collect();
    Json(todos)
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), StatusCode> {
    if input.title.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut tables = db.write().await;
    let todo = Todo {
        id: tables.next_id,
        user_id: input.user_id,
        title: input.title,
        completed: input.completed,
    };
    tables.next_id += 1;
    tables.todos.insert(todo.id, todo.clone());
    debug!(id = todo.id, user_id = todo.user_id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut tables = db.write().await;
    let todo = tables.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    debug!(id, "todo updated");
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut tables = db.write().await;
    tables
        .todos
        .remove(&id)
        .map(|_| {
            debug!(id, "todo deleted");
            StatusCode::NO_CONTENT
        })
        .ok_or(StatusCode::NOT_FOUND)
}
