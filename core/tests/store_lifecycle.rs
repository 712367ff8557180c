//! The store driven end-to-end against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and plays the host: every request
//! the store emits is executed over real HTTP with ureq and the response is
//! fed back through `complete`. Checks that the store's requests and the
//! server's schema agree, including the failure paths a real 404 produces.

use pretty_assertions::assert_eq;
use todo_core::{
    Action, Command, Effects, HttpMethod, HttpRequest, HttpResponse, PageView, StatusFilter, TodoClient,
    TodoError, TodoStore,
};

const USER_ID: u64 = 2042;

/// Execute an `HttpRequest` and return an `HttpResponse`.
///
/// Status codes are returned as data, not errors, so the store does its own
/// status interpretation.
fn execute(req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            agent.patch(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse::new(status, body))
}

/// Run one command and report its outcome to the store.
fn settle(store: &mut TodoStore, command: Command) -> Effects {
    match execute(command.request) {
        Ok(response) => store.complete(command.ticket, response),
        Err(err) => store.abort(command.ticket, err.to_string()),
    }
}

/// Run every request in `effects` in order; timers are ignored.
fn drive(store: &mut TodoStore, effects: Effects) {
    let commands: Vec<Command> = effects.commands().cloned().collect();
    for command in commands {
        let follow_up = settle(store, command);
        drive(store, follow_up);
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn titles(store: &TodoStore) -> Vec<String> {
    store.todos().iter().map(|t| t.title.clone()).collect()
}

#[test]
fn store_lifecycle() {
    let base_url = start_server();
    let mut store = TodoStore::new(TodoClient::new(&base_url, USER_ID));

    // Step 1: initial load of an empty list.
    let effects = store.dispatch(Action::Load);
    drive(&mut store, effects);
    assert!(store.todos().is_empty());
    assert_eq!(store.error(), None);
    assert!(!PageView::from_snapshot(&store.snapshot()).footer.visible);

    // Step 2: blank title never reaches the server.
    let effects = store.add_todo("   ");
    assert_eq!(effects.commands().count(), 0);
    assert_eq!(store.error(), Some(TodoError::EmptyTitle));
    store.dismiss_error();

    // Step 3: add three todos; ids are server-assigned and increasing.
    for title in ["Buy milk", "Walk dog", "Read book"] {
        store.dispatch(Action::EditTitle(title.to_string()));
        let effects = store.dispatch(Action::Submit);
        drive(&mut store, effects);
        assert_eq!(store.new_title(), "");
    }
    assert_eq!(titles(&store), vec!["Buy milk", "Walk dog", "Read book"]);
    let ids: Vec<u64> = store.todos().iter().map(|t| t.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {ids:?}");
    assert_eq!(store.items_left(), 3);

    // Step 4: toggle two todos with both requests outstanding, answer out of order.
    let first = store.toggle_completed(ids[0]).commands().next().cloned().unwrap();
    let second = store.toggle_completed(ids[1]).commands().next().cloned().unwrap();
    assert!(store.toggle_completed(ids[0]).is_empty());
    settle(&mut store, second);
    settle(&mut store, first);
    assert_eq!(store.items_left(), 1);
    assert!(store.has_completed());

    // Step 5: filter is local and leaves the list intact.
    store.set_status_filter(StatusFilter::Active);
    let visible: Vec<&str> = store.filtered_todos().map(|t| t.title.as_str()).collect();
    assert_eq!(visible, vec!["Read book"]);
    assert_eq!(store.todos().len(), 3);
    store.set_status_filter(StatusFilter::All);

    // Step 6: someone else removes a completed todo behind our back.
    let other = TodoClient::new(&base_url, USER_ID);
    let gone = other.build_delete_todo(ids[0]);
    other.parse_delete_todo(execute(gone).unwrap()).unwrap();

    // Step 7: clear completed; the stale one fails, the other succeeds.
    let effects = store.clear_completed();
    assert_eq!(effects.commands().count(), 2);
    drive(&mut store, effects);
    assert_eq!(titles(&store), vec!["Buy milk", "Read book"]);
    assert_eq!(store.error(), Some(TodoError::DeleteFailed));

    // Step 8: a reload resyncs with the server and clears the error.
    let effects = store.load();
    drive(&mut store, effects);
    assert_eq!(titles(&store), vec!["Read book"]);
    assert_eq!(store.error(), None);

    // Step 9: delete the last todo.
    let effects = store.delete_todo(ids[2]);
    drive(&mut store, effects);
    assert!(store.todos().is_empty());
}

#[test]
fn load_failure_against_unreachable_service() {
    // Bind and drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut store = TodoStore::new(TodoClient::new(&format!("http://127.0.0.1:{port}"), USER_ID));

    let effects = store.load();
    drive(&mut store, effects);
    assert!(store.todos().is_empty());
    assert_eq!(store.error(), Some(TodoError::LoadFailed));
    assert!(!store.is_loading());
}
