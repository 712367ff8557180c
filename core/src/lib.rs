//! Client-side state for a todo list backed by a remote todo service.
//!
//! # Overview
//! `TodoStore` owns the list, the status filter, the error banner and the
//! set of outstanding requests, and derives what the page shows. It never
//! performs I/O (host-does-IO pattern): intents return `Effects` describing
//! the requests to execute, and the host feeds the responses back.
//!
//! # Design
//! - `TodoClient` is stateless: it builds `HttpRequest`s and parses
//!   `HttpResponse`s for one user scope.
//! - Local state changes only after the service confirms a mutation.
//! - Presentation lives in `view` as plain structs derived from a `Snapshot`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod store;
pub mod types;
pub mod view;

pub use action::Action;
pub use client::TodoClient;
pub use config::TodoConfig;
pub use error::{ApiError, ConfigError, TodoError};
pub use filter::StatusFilter;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{Command, Effect, Effects, Snapshot, SubscriptionId, Ticket, TodoStore};
pub use types::{CreateTodo, Todo, TodoId, UpdateTodo, UserId};
pub use view::PageView;
