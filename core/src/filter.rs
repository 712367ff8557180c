//! Status filter and the counters derived from a todo sequence.
//!
//! Everything here is a pure function of the slice it is given; the store and
//! the views call into it rather than caching derived lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Todo;

/// The All / Active / Completed view selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Every filter, in footer order.
    pub const ALL: [StatusFilter; 3] = [StatusFilter::All, StatusFilter::Active, StatusFilter::Completed];

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }

    /// Footer link text.
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status filter: {0:?}")]
pub struct ParseStatusFilterError(String);

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            _ => Err(ParseStatusFilterError(s.to_string())),
        }
    }
}

/// Todos matching `status`, in their original order.
pub fn filter_todos(todos: &[Todo], status: StatusFilter) -> impl Iterator<Item = &Todo> {
    todos.iter().filter(move |todo| status.matches(todo))
}

/// Number of incomplete todos in the whole sequence.
pub fn items_left(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| !todo.completed).count()
}

pub fn any_completed(todos: &[Todo]) -> bool {
    todos.iter().any(|todo| todo.completed)
}

/// True when the list is non-empty and every todo is completed.
pub fn all_completed(todos: &[Todo]) -> bool {
    !todos.is_empty() && todos.iter().all(|todo| todo.completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn todo(id: u64, completed: bool) -> Todo {
        Todo {
            id,
            user_id: 1,
            title: format!("todo {id}"),
            completed,
        }
    }

    fn sample() -> Vec<Todo> {
        vec![todo(1, false), todo(2, true), todo(3, false), todo(4, true), todo(5, false)]
    }

    fn ids(todos: &[Todo], status: StatusFilter) -> Vec<u64> {
        filter_todos(todos, status).map(|t| t.id).collect()
    }

    #[test]
    fn filters_keep_matching_todos_in_order() {
        let todos = sample();
        assert_eq!(ids(&todos, StatusFilter::All), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(&todos, StatusFilter::Active), vec![1, 3, 5]);
        assert_eq!(ids(&todos, StatusFilter::Completed), vec![2, 4]);
    }

    #[test]
    fn filtering_twice_is_idempotent() {
        let todos = sample();
        for status in StatusFilter::ALL {
            let once: Vec<Todo> = filter_todos(&todos, status).cloned().collect();
            let twice: Vec<Todo> = filter_todos(&once, status).cloned().collect();
            assert_eq!(once, twice, "{status}");
        }
    }

    #[test]
    fn items_left_ignores_filter() {
        let todos = sample();
        assert_eq!(items_left(&todos), 3);
        let completed_only: Vec<Todo> = filter_todos(&todos, StatusFilter::Completed).cloned().collect();
        assert_eq!(items_left(&completed_only), 0);
    }

    #[test]
    fn completed_flags() {
        assert!(any_completed(&sample()));
        assert!(!all_completed(&sample()));
        assert!(all_completed(&[todo(1, true)]));
        assert!(!all_completed(&[]));
        assert!(!any_completed(&[todo(1, false)]));
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!("Active".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
        assert_eq!(" completed ".parse::<StatusFilter>().unwrap(), StatusFilter::Completed);
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::All.to_string(), "all");
        assert_eq!(StatusFilter::default(), StatusFilter::All);
    }
}
