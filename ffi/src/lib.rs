//! C-ABI wrapper around the `todo-core` store.
//!
//! # Overview
//! Lets any language with a C FFI drive a `TodoStore` without linking to
//! serde or an async runtime. The C host performs the HTTP round-trips.
//!
//! # Protocol
//! 1. `todo_store_new` once, then `todo_store_load`.
//! 2. Every intent returns an `FfiEffectList`. For each `Request` effect,
//!    execute the request and pass the result back with
//!    `todo_store_complete` (or `todo_store_abort` on transport failure),
//!    quoting the effect's `ticket`. Completions return effects too.
//!    For each `ExpireError` effect, call `todo_store_expire_error` after
//!    `delay_ms`.
//! 3. Re-read `todo_store_snapshot` whenever `todo_store_version` changes.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Null arguments never crash: intents return an empty effect list, queries
//!   return null or zero.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `todo_free_*` function.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use todo_core::{HttpResponse, TodoClient, TodoStore};

use types::*;

/// Read a borrowed C string; null or invalid UTF-8 reads as empty.
fn read_str<'a>(s: *const c_char) -> &'a str {
    if s.is_null() {
        return "";
    }
    unsafe { CStr::from_ptr(s) }.to_str().unwrap_or("")
}

/// Run an intent against the store behind `store`, converting the result to
/// an `FfiEffectList`. Null stores and panics yield an empty list.
fn with_store(
    store: *mut FfiTodoStore,
    f: impl FnOnce(&mut TodoStore) -> todo_core::Effects,
) -> *mut FfiEffectList {
    if store.is_null() {
        return FfiEffectList::empty();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        FfiEffectList::from_core(f(&mut store.inner))
    }))
    .unwrap_or_else(|_| FfiEffectList::empty())
}

// ---------------------------------------------------------------------------
// Store lifecycle
// ---------------------------------------------------------------------------

/// Create an empty store talking to `base_url` on behalf of `user_id`.
///
/// Errors are kept until dismissed; use
/// `todo_store_set_error_timeout` to have them expire.
/// Returns null if `base_url` is null, `user_id` is 0, or on panic.
/// The caller must free the returned pointer with `todo_store_free`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_new(base_url: *const c_char, user_id: u64) -> *mut FfiTodoStore {
    catch_unwind(|| {
        if base_url.is_null() || user_id == 0 {
            return std::ptr::null_mut();
        }
        let store = TodoStore::new(TodoClient::new(read_str(base_url), user_id));
        Box::into_raw(Box::new(FfiTodoStore { inner: store }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a store created by `todo_store_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_free(store: *mut FfiTodoStore) {
    if !store.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(store) });
        }));
    }
}

/// Arm `ExpireError` effects `timeout_ms` after each error; 0 disables.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_set_error_timeout(store: *mut FfiTodoStore, timeout_ms: u64) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        store.inner.set_error_timeout(timeout);
    }));
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// Request the todo list. Call once at startup; again only to retry.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_load(store: *mut FfiTodoStore) -> *mut FfiEffectList {
    with_store(store, |s| s.load())
}

/// Replace the new-todo input text. `text` may be null (clears it).
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_edit_title(store: *mut FfiTodoStore, text: *const c_char) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        store.inner.edit_new_title(read_str(text));
    }));
}

/// Create a todo titled `title`. A null or blank title sets the
/// `EmptyTitle` error and returns no request.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_add_todo(store: *mut FfiTodoStore, title: *const c_char) -> *mut FfiEffectList {
    let title = read_str(title).to_string();
    with_store(store, move |s| s.add_todo(&title))
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_toggle_completed(store: *mut FfiTodoStore, id: u64) -> *mut FfiEffectList {
    with_store(store, |s| s.toggle_completed(id))
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_toggle_all(store: *mut FfiTodoStore) -> *mut FfiEffectList {
    with_store(store, |s| s.toggle_all())
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_delete_todo(store: *mut FfiTodoStore, id: u64) -> *mut FfiEffectList {
    with_store(store, |s| s.delete_todo(id))
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_clear_completed(store: *mut FfiTodoStore) -> *mut FfiEffectList {
    with_store(store, |s| s.clear_completed())
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_set_filter(store: *mut FfiTodoStore, filter: FfiStatusFilter) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        store.inner.set_status_filter(filter.into());
    }));
}

#[unsafe(no_mangle)]
pub extern "C" fn todo_store_dismiss_error(store: *mut FfiTodoStore) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        store.inner.dismiss_error();
    }));
}

/// Clear the error armed under `epoch` if it is still showing.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_expire_error(store: *mut FfiTodoStore, epoch: u64) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        store.inner.expire_error(epoch);
    }));
}

/// Drop every outstanding ticket; late completions are then ignored.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_cancel_in_flight(store: *mut FfiTodoStore) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut *store };
        store.inner.cancel_in_flight();
    }));
}

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

/// Feed back the response to the request issued under `ticket`.
///
/// A null `response` is treated as a transport failure.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_complete(
    store: *mut FfiTodoStore,
    ticket: u64,
    response: *const FfiHttpResponse,
) -> *mut FfiEffectList {
    if response.is_null() {
        return with_store(store, |s| s.abort(ticket, "null response"));
    }
    let resp = unsafe { &*response };
    let core_resp = HttpResponse::new(resp.status, read_str(resp.body));
    with_store(store, move |s| s.complete(ticket, core_resp))
}

/// Report that the request issued under `ticket` failed before a response
/// arrived. `reason` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_abort(
    store: *mut FfiTodoStore,
    ticket: u64,
    reason: *const c_char,
) -> *mut FfiEffectList {
    let reason = read_str(reason).to_string();
    with_store(store, move |s| s.abort(ticket, reason))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Current state for rendering. Returns null if `store` is null.
/// The caller must free the result with `todo_free_snapshot`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_snapshot(store: *const FfiTodoStore) -> *mut FfiSnapshot {
    if store.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &*store };
        FfiSnapshot::from_core(&store.inner.snapshot())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Changes after every state update; 0 for a null store.
#[unsafe(no_mangle)]
pub extern "C" fn todo_store_version(store: *const FfiTodoStore) -> u64 {
    if store.is_null() {
        return 0;
    }
    unsafe { &*store }.inner.version()
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiEffectList` returned by any intent or completion.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_effects(effects: *mut FfiEffectList) {
    if effects.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let list = unsafe { Box::from_raw(effects) };
        let items = unsafe { reclaim_vec(list.items, list.len) };
        for item in &items {
            unsafe { item.request.free_fields() };
        }
    }));
}

/// Free an `FfiSnapshot` returned by `todo_store_snapshot`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_snapshot(snapshot: *mut FfiSnapshot) {
    if snapshot.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let snapshot = unsafe { Box::from_raw(snapshot) };
        free_string(snapshot.error_message);
        free_string(snapshot.new_title);
        let rows = unsafe { reclaim_vec(snapshot.rows, snapshot.rows_len) };
        for row in rows {
            free_string(row.title);
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
