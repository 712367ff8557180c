//! Presentation components as plain data.
//!
//! # Design
//! Each view is derived from a [`Snapshot`] and nothing else; none of them
//! hold state of their own. A host renders them with its toolkit of choice
//! and turns clicks back into [`Action`](crate::action::Action)s. `PageView`
//! also implements `Display` as a compact text rendering.

use std::fmt;

use crate::filter::StatusFilter;
use crate::store::Snapshot;
use crate::types::TodoId;

/// Input form and the toggle-all control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub new_title: String,
    pub input_disabled: bool,
    pub show_toggle_all: bool,
    pub toggle_all_active: bool,
}

/// One list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRowView {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    /// Loading overlay while a request for this row is outstanding.
    pub pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLink {
    pub filter: StatusFilter,
    pub label: &'static str,
    pub selected: bool,
}

/// Counter, filter links and clear-completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterView {
    pub visible: bool,
    pub items_left: usize,
    pub links: [FilterLink; 3],
    pub clear_completed_enabled: bool,
}

impl FooterView {
    pub fn items_left_label(&self) -> String {
        format!("{} items left", self.items_left)
    }

    pub fn selected(&self) -> StatusFilter {
        self.links
            .iter()
            .find(|link| link.selected)
            .map_or(StatusFilter::All, |link| link.filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBannerView {
    pub message: Option<&'static str>,
}

impl ErrorBannerView {
    pub fn hidden(&self) -> bool {
        self.message.is_none()
    }
}

/// The whole page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub header: HeaderView,
    pub rows: Vec<TodoRowView>,
    pub footer: FooterView,
    pub error: ErrorBannerView,
}

impl PageView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let has_todos = !snapshot.todos.is_empty();

        let header = HeaderView {
            new_title: snapshot.new_title.clone(),
            input_disabled: snapshot.submitting,
            show_toggle_all: has_todos,
            toggle_all_active: snapshot.all_completed(),
        };

        let rows = snapshot
            .visible()
            .map(|todo| TodoRowView {
                id: todo.id,
                title: todo.title.clone(),
                completed: todo.completed,
                pending: snapshot.is_pending(todo.id),
            })
            .collect();

        let footer = FooterView {
            visible: has_todos,
            items_left: snapshot.items_left(),
            links: StatusFilter::ALL.map(|filter| FilterLink {
                filter,
                label: filter.label(),
                selected: filter == snapshot.filter,
            }),
            clear_completed_enabled: snapshot.has_completed(),
        };

        let error = ErrorBannerView {
            message: snapshot.error.map(|e| e.message()),
        };

        Self {
            header,
            rows,
            footer,
            error,
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "todos")?;

        let toggle = match (self.header.show_toggle_all, self.header.toggle_all_active) {
            (false, _) => "   ",
            (true, false) => "[v]",
            (true, true) => "[V]",
        };
        let input = if self.header.new_title.is_empty() {
            "What needs to be done?"
        } else {
            self.header.new_title.as_str()
        };
        writeln!(f, "{toggle} {input}")?;

        for row in &self.rows {
            let check = if row.completed { 'x' } else { ' ' };
            let busy = if row.pending { " ..." } else { "" };
            writeln!(f, "[{check}] {}{busy}", row.title)?;
        }

        if self.footer.visible {
            let links: Vec<String> = self
                .footer
                .links
                .iter()
                .map(|link| {
                    if link.selected {
                        format!("<{}>", link.label)
                    } else {
                        link.label.to_string()
                    }
                })
                .collect();
            write!(f, "{} | {}", self.footer.items_left_label(), links.join(" "))?;
            if self.footer.clear_completed_enabled {
                write!(f, " | Clear completed")?;
            }
            writeln!(f)?;
        }

        if let Some(message) = self.error.message {
            writeln!(f, "! {message}")?;
        }
        Ok(())
    }
}
