//! UI events mapped onto store intents.

use crate::filter::StatusFilter;
use crate::store::{Effects, TodoStore};
use crate::types::TodoId;

/// Something the user did in one of the page's components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Load,
    EditTitle(String),
    Submit,
    Toggle(TodoId),
    ToggleAll,
    Delete(TodoId),
    ClearCompleted,
    SetFilter(StatusFilter),
    DismissError,
}

impl TodoStore {
    /// Route `action` to the matching intent.
    pub fn dispatch(&mut self, action: Action) -> Effects {
        match action {
            Action::Load => self.load(),
            Action::EditTitle(text) => {
                self.edit_new_title(&text);
                Effects::default()
            }
            Action::Submit => self.submit(),
            Action::Toggle(id) => self.toggle_completed(id),
            Action::ToggleAll => self.toggle_all(),
            Action::Delete(id) => self.delete_todo(id),
            Action::ClearCompleted => self.clear_completed(),
            Action::SetFilter(status) => {
                self.set_status_filter(status);
                Effects::default()
            }
            Action::DismissError => {
                self.dismiss_error();
                Effects::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TodoClient;
    use crate::error::TodoError;

    #[test]
    fn edit_then_submit_sends_create() {
        let mut store = TodoStore::new(TodoClient::new("http://api.test", 1));
        assert!(store.dispatch(Action::EditTitle("Plant tree".into())).is_empty());
        assert_eq!(store.dispatch(Action::Submit).commands().count(), 1);
    }

    #[test]
    fn local_actions_emit_nothing() {
        let mut store = TodoStore::new(TodoClient::new("http://api.test", 1));
        store.dispatch(Action::EditTitle(" ".into()));
        store.dispatch(Action::Submit);
        assert_eq!(store.error(), Some(TodoError::EmptyTitle));

        assert!(store.dispatch(Action::DismissError).is_empty());
        assert_eq!(store.error(), None);
        assert!(store.dispatch(Action::SetFilter(StatusFilter::Active)).is_empty());
        assert_eq!(store.filter(), StatusFilter::Active);
    }
}
