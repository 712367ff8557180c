//! The todo store: authoritative client-side state and its intents.
//!
//! # Design
//! `TodoStore` never touches the network. Each intent updates local state and
//! returns `Effects`: requests the host must execute (each tagged with a
//! `Ticket`) and one-shot timers it must arm. The host reports a request's
//! outcome with [`TodoStore::complete`] or [`TodoStore::abort`], in whatever
//! order responses arrive.
//!
//! Local state only changes once the service confirms a mutation. While a
//! request for a row is outstanding that row is pending and further intents on
//! it are rejected, which serializes operations per id without queueing.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::TodoClient;
use crate::config::TodoConfig;
use crate::error::{ApiError, TodoError};
use crate::filter::{self, StatusFilter};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Todo, TodoId, UpdateTodo};

/// Identifies one outstanding request. Never reused within a store.
pub type Ticket = u64;

/// A request the host must execute and report back under `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

/// Work the host performs on behalf of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Execute the request, then call `complete` or `abort`.
    Send(Command),
    /// Call `expire_error(epoch)` once `after` has elapsed.
    ExpireError { epoch: u64, after: Duration },
}

/// Effects produced by a single intent or completion, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects(Vec<Effect>);

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.0.iter().filter_map(|effect| match effect {
            Effect::Send(command) => Some(command),
            Effect::ExpireError { .. } => None,
        })
    }

    /// The error timer armed by these effects, if any.
    pub fn error_timer(&self) -> Option<(u64, Duration)> {
        self.0.iter().find_map(|effect| match effect {
            Effect::ExpireError { epoch, after } => Some((*epoch, *after)),
            Effect::Send(_) => None,
        })
    }

    pub fn as_slice(&self) -> &[Effect] {
        &self.0
    }

    fn push(&mut self, effect: Effect) {
        self.0.push(effect);
    }

    fn extend(&mut self, other: Effects) {
        self.0.extend(other.0);
    }
}

impl IntoIterator for Effects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// What an outstanding ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Load,
    /// Carries the number of loads applied when the create was issued.
    Create(u64),
    Update(TodoId),
    Delete(TodoId),
}

impl Operation {
    fn row(self) -> Option<TodoId> {
        match self {
            Operation::Update(id) | Operation::Delete(id) => Some(id),
            Operation::Load | Operation::Create(_) => None,
        }
    }
}

/// Mutations confirmed while a load was outstanding. The list response may
/// predate them, so they are replayed over it.
#[derive(Debug, Default)]
struct LoadOverlay {
    created: Vec<Todo>,
    updated: BTreeMap<TodoId, Todo>,
    deleted: HashSet<TodoId>,
}

impl LoadOverlay {
    fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Apply the recorded mutations to a freshly loaded list.
    fn replay(self, todos: &mut Vec<Todo>) {
        todos.retain(|todo| !self.deleted.contains(&todo.id));
        for todo in todos.iter_mut() {
            if let Some(updated) = self.updated.get(&todo.id) {
                todo.title.clone_from(&updated.title);
                todo.completed = updated.completed;
            }
        }
        for created in self.created {
            if !self.deleted.contains(&created.id) && todos.iter().all(|t| t.id != created.id) {
                todos.push(created);
            }
        }
    }
}

/// Handle returned by [`TodoStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Snapshot) + Send>;

/// Read-only copy of the store's state, taken after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub todos: Vec<Todo>,
    pub filter: StatusFilter,
    pub pending: HashSet<TodoId>,
    pub error: Option<TodoError>,
    pub new_title: String,
    pub submitting: bool,
    pub loading: bool,
    pub version: u64,
}

impl Snapshot {
    /// Todos passing the current filter, in list order.
    pub fn visible(&self) -> impl Iterator<Item = &Todo> {
        filter::filter_todos(&self.todos, self.filter)
    }

    pub fn items_left(&self) -> usize {
        filter::items_left(&self.todos)
    }

    pub fn has_completed(&self) -> bool {
        filter::any_completed(&self.todos)
    }

    pub fn all_completed(&self) -> bool {
        filter::all_completed(&self.todos)
    }

    pub fn is_pending(&self, id: TodoId) -> bool {
        self.pending.contains(&id)
    }
}

pub struct TodoStore {
    client: TodoClient,
    error_timeout: Option<Duration>,
    todos: Vec<Todo>,
    filter: StatusFilter,
    new_title: String,
    error: Option<TodoError>,
    error_epoch: u64,
    in_flight: BTreeMap<Ticket, Operation>,
    next_ticket: Ticket,
    loads_applied: u64,
    overlay: LoadOverlay,
    version: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore")
            .field("client", &self.client)
            .field("todos", &self.todos)
            .field("filter", &self.filter)
            .field("error", &self.error)
            .field("in_flight", &self.in_flight)
            .field("version", &self.version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TodoStore {
    /// Empty store talking to `client`. Errors stay until dismissed.
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            error_timeout: None,
            todos: Vec::new(),
            filter: StatusFilter::All,
            new_title: String::new(),
            error: None,
            error_epoch: 0,
            in_flight: BTreeMap::new(),
            next_ticket: 1,
            loads_applied: 0,
            overlay: LoadOverlay::default(),
            version: 0,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn from_config(config: &TodoConfig) -> Self {
        Self::new(TodoClient::new(&config.base_url, config.user_id)).with_error_timeout(config.error_timeout)
    }

    /// Arm an `ExpireError` effect for every error set from now on.
    pub fn with_error_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.set_error_timeout(timeout);
        self
    }

    pub fn set_error_timeout(&mut self, timeout: Option<Duration>) {
        self.error_timeout = timeout;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn filtered_todos(&self) -> impl Iterator<Item = &Todo> {
        filter::filter_todos(&self.todos, self.filter)
    }

    pub fn items_left(&self) -> usize {
        filter::items_left(&self.todos)
    }

    pub fn has_completed(&self) -> bool {
        filter::any_completed(&self.todos)
    }

    pub fn all_completed(&self) -> bool {
        filter::all_completed(&self.todos)
    }

    pub fn error(&self) -> Option<TodoError> {
        self.error
    }

    pub fn new_title(&self) -> &str {
        &self.new_title
    }

    pub fn is_pending(&self, id: TodoId) -> bool {
        self.in_flight.values().any(|op| op.row() == Some(id))
    }

    /// A create request is outstanding; the input is disabled.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.values().any(|op| matches!(op, Operation::Create(_)))
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.values().any(|op| *op == Operation::Load)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Bumped after every state change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            todos: self.todos.clone(),
            filter: self.filter,
            pending: self.in_flight.values().filter_map(|op| op.row()).collect(),
            error: self.error,
            new_title: self.new_title.clone(),
            submitting: self.is_submitting(),
            loading: self.is_loading(),
            version: self.version,
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Call `listener` with a fresh snapshot after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&Snapshot) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    /// Fetch the user's todos. Rejected while a load is already outstanding.
    pub fn load(&mut self) -> Effects {
        if self.is_loading() {
            debug!("load rejected: already in flight");
            return Effects::default();
        }
        let request = self.client.build_list_todos();
        let effects = self.send(Operation::Load, request);
        self.changed();
        effects
    }

    /// Replace the new-todo input text.
    pub fn edit_new_title(&mut self, text: &str) {
        if self.new_title != text {
            self.new_title = text.to_string();
            self.changed();
        }
    }

    /// Submit the current input text.
    pub fn submit(&mut self) -> Effects {
        let title = self.new_title.clone();
        self.add_todo(&title)
    }

    /// Create a todo titled `title` (trimmed). The input keeps `title` until
    /// the service confirms the create.
    pub fn add_todo(&mut self, title: &str) -> Effects {
        if self.is_submitting() {
            debug!("add rejected: create already in flight");
            return Effects::default();
        }
        self.new_title = title.to_string();

        let trimmed = title.trim();
        let effects = if trimmed.is_empty() {
            self.set_error(TodoError::EmptyTitle)
        } else {
            match self.client.build_create_todo(trimmed) {
                Ok(request) => self.send(Operation::Create(self.loads_applied), request),
                Err(err) => {
                    warn!(error = %err, "could not build create request");
                    self.set_error(TodoError::CreateFailed)
                }
            }
        };
        self.changed();
        effects
    }

    /// Flip the completion flag of `id` once the service confirms it.
    pub fn toggle_completed(&mut self, id: TodoId) -> Effects {
        let Some(completed) = self.idle_row(id).map(|todo| todo.completed) else {
            return Effects::default();
        };
        let effects = self.request_update(id, !completed);
        self.changed();
        effects
    }

    /// Mark every todo completed, or every todo active when all already are.
    pub fn toggle_all(&mut self) -> Effects {
        if self.todos.is_empty() {
            return Effects::default();
        }
        let target = !self.all_completed();
        let ids: Vec<TodoId> = self
            .todos
            .iter()
            .filter(|todo| todo.completed != target)
            .map(|todo| todo.id)
            .filter(|id| !self.is_pending(*id))
            .collect();
        if ids.is_empty() {
            return Effects::default();
        }

        let mut effects = Effects::default();
        for id in ids {
            effects.extend(self.request_update(id, target));
        }
        self.changed();
        effects
    }

    /// Delete `id`; the row stays until the service confirms.
    pub fn delete_todo(&mut self, id: TodoId) -> Effects {
        if self.idle_row(id).is_none() {
            return Effects::default();
        }
        let request = self.client.build_delete_todo(id);
        let effects = self.send(Operation::Delete(id), request);
        self.changed();
        effects
    }

    /// Delete every completed todo, each as its own request.
    pub fn clear_completed(&mut self) -> Effects {
        let ids: Vec<TodoId> = self
            .todos
            .iter()
            .filter(|todo| todo.completed)
            .map(|todo| todo.id)
            .filter(|id| !self.is_pending(*id))
            .collect();
        if ids.is_empty() {
            debug!("clear completed: nothing to clear");
            return Effects::default();
        }

        let mut effects = Effects::default();
        for id in ids {
            let request = self.client.build_delete_todo(id);
            effects.extend(self.send(Operation::Delete(id), request));
        }
        self.changed();
        effects
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        if self.filter != status {
            self.filter = status;
            self.changed();
        }
    }

    pub fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.changed();
        }
    }

    /// Clear the error armed under `epoch`, unless it was replaced since.
    pub fn expire_error(&mut self, epoch: u64) {
        if epoch == self.error_epoch && self.error.is_some() {
            self.error = None;
            self.changed();
        }
    }

    /// Forget every outstanding ticket so late responses are dropped.
    pub fn cancel_in_flight(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(count = self.in_flight.len(), "cancelling in-flight requests");
            self.in_flight.clear();
            self.overlay = LoadOverlay::default();
            self.changed();
        }
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    /// Apply the service's response to the request issued under `ticket`.
    pub fn complete(&mut self, ticket: Ticket, response: HttpResponse) -> Effects {
        self.settle(ticket, Ok(response))
    }

    /// Report that the request issued under `ticket` never got a response.
    pub fn abort(&mut self, ticket: Ticket, reason: impl Into<String>) -> Effects {
        self.settle(ticket, Err(ApiError::Transport(reason.into())))
    }

    fn settle(&mut self, ticket: Ticket, outcome: Result<HttpResponse, ApiError>) -> Effects {
        let Some(op) = self.in_flight.remove(&ticket) else {
            debug!(ticket, "dropping response for unknown ticket");
            return Effects::default();
        };

        let effects = match op {
            Operation::Load => {
                let result = outcome.and_then(|r| self.client.parse_list_todos(r));
                self.finish_load(result)
            }
            Operation::Create(loads_at_issue) => {
                let result = outcome.and_then(|r| self.client.parse_create_todo(r));
                self.finish_create(loads_at_issue, result)
            }
            Operation::Update(id) => {
                let result = outcome.and_then(|r| self.client.parse_update_todo(r));
                self.finish_update(id, result)
            }
            Operation::Delete(id) => {
                let result = outcome.and_then(|r| self.client.parse_delete_todo(r));
                self.finish_delete(id, result)
            }
        };
        self.changed();
        effects
    }

    fn finish_load(&mut self, result: Result<Vec<Todo>, ApiError>) -> Effects {
        match result {
            Ok(todos) => {
                let mut seen = HashSet::new();
                let total = todos.len();
                let mut todos: Vec<Todo> = todos.into_iter().filter(|todo| seen.insert(todo.id)).collect();
                if todos.len() != total {
                    warn!(dropped = total - todos.len(), "load returned duplicate ids");
                }
                let overlay = std::mem::take(&mut self.overlay);
                if !overlay.is_empty() {
                    debug!("replaying mutations confirmed during load");
                    overlay.replay(&mut todos);
                }
                self.todos = todos;
                self.loads_applied += 1;
                self.error = None;
                info!(count = self.todos.len(), "todos loaded");
                Effects::default()
            }
            Err(err) => {
                warn!(error = %err, "load failed");
                self.overlay = LoadOverlay::default();
                self.set_error(TodoError::LoadFailed)
            }
        }
    }

    fn finish_create(&mut self, loads_at_issue: u64, result: Result<Todo, ApiError>) -> Effects {
        match result {
            Ok(todo) => {
                match self.todos.iter().position(|t| t.id == todo.id) {
                    Some(_) if self.loads_applied == loads_at_issue => {
                        warn!(id = todo.id, "create returned an id already in the list");
                        return self.set_error(TodoError::CreateFailed);
                    }
                    // A load applied after the create was issued already lists it.
                    Some(index) => {
                        debug!(id = todo.id, "created todo already listed by a later load");
                        self.todos[index] = todo;
                    }
                    None => {
                        debug!(id = todo.id, "todo created");
                        if self.is_loading() {
                            self.overlay.created.push(todo.clone());
                        }
                        self.todos.push(todo);
                    }
                }
                self.new_title.clear();
                Effects::default()
            }
            Err(err) => {
                warn!(error = %err, "create failed");
                self.set_error(TodoError::CreateFailed)
            }
        }
    }

    fn finish_update(&mut self, id: TodoId, result: Result<Todo, ApiError>) -> Effects {
        match result {
            Ok(updated) => {
                if self.is_loading() {
                    self.overlay.updated.insert(id, updated.clone());
                }
                if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                    todo.title = updated.title;
                    todo.completed = updated.completed;
                } else {
                    debug!(id, "updated todo is no longer listed");
                }
                Effects::default()
            }
            Err(err) => {
                warn!(id, error = %err, "update failed");
                self.set_error(TodoError::UpdateFailed)
            }
        }
    }

    fn finish_delete(&mut self, id: TodoId, result: Result<(), ApiError>) -> Effects {
        match result {
            Ok(()) => {
                if self.is_loading() {
                    self.overlay.deleted.insert(id);
                }
                self.todos.retain(|t| t.id != id);
                Effects::default()
            }
            Err(err) => {
                warn!(id, error = %err, "delete failed");
                self.set_error(TodoError::DeleteFailed)
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// The todo `id` if it exists and has no outstanding request.
    fn idle_row(&self, id: TodoId) -> Option<&Todo> {
        let Some(todo) = self.todos.iter().find(|t| t.id == id) else {
            debug!(id, "intent rejected: unknown todo");
            return None;
        };
        if self.is_pending(id) {
            debug!(id, "intent rejected: todo is pending");
            return None;
        }
        Some(todo)
    }

    fn request_update(&mut self, id: TodoId, completed: bool) -> Effects {
        match self.client.build_update_todo(id, &UpdateTodo::completed(completed)) {
            Ok(request) => self.send(Operation::Update(id), request),
            Err(err) => {
                warn!(id, error = %err, "could not build update request");
                self.set_error(TodoError::UpdateFailed)
            }
        }
    }

    fn send(&mut self, op: Operation, request: HttpRequest) -> Effects {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(ticket, op);
        debug!(ticket, method = %request.method, path = %request.path, "request issued");

        let mut effects = Effects::default();
        effects.push(Effect::Send(Command { ticket, request }));
        effects
    }

    fn set_error(&mut self, error: TodoError) -> Effects {
        self.error = Some(error);
        self.error_epoch += 1;

        let mut effects = Effects::default();
        if let Some(after) = self.error_timeout {
            effects.push(Effect::ExpireError {
                epoch: self.error_epoch,
                after,
            });
        }
        effects
    }

    fn changed(&mut self) {
        self.version += 1;
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }
}
