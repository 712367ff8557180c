//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations: `*mut
//! c_char` instead of `String`, pointer + length instead of `Vec`, and enums
//! with explicit discriminants. Conversions live here so `lib.rs` stays
//! focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use todo_core::{Effect, Effects, HttpMethod, Snapshot, StatusFilter, TodoError, TodoStore};

/// Opaque handle to a `TodoStore`. C callers receive a pointer to this and
/// pass it back into every `todo_store_*` function.
pub struct FfiTodoStore {
    pub(crate) inner: TodoStore,
}

/// Owned C string; interior NULs degrade to an empty string.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Counts cross the boundary as `u32`; larger values saturate.
pub(crate) fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Leak a `Vec` as pointer + length. Empty vectors become null; anything past
/// `u32::MAX` items is dropped so the length stays exact.
fn leak_vec<T>(mut items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    items.truncate(u32::MAX as usize);
    let mut items = items.into_boxed_slice();
    let len = saturating_u32(items.len());
    let ptr = items.as_mut_ptr();
    std::mem::forget(items);
    (ptr, len)
}

/// Reclaim a slice leaked by `leak_vec`.
///
/// # Safety
/// `ptr`/`len` must come from `leak_vec` and not have been reclaimed yet.
pub(crate) unsafe fn reclaim_vec<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request the C host must execute.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request has no body.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    fn from_core(req: todo_core::HttpRequest) -> Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = leak_vec(headers);
        FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), c_string),
        }
    }

    /// Free the strings and header array owned by this request.
    ///
    /// # Safety
    /// Must be called at most once per request built by `from_core`.
    pub(crate) unsafe fn free_fields(&self) {
        free_string(self.path);
        free_string(self.body);
        let headers = unsafe { reclaim_vec(self.headers, self.headers_len) };
        for h in headers {
            free_string(h.key);
            free_string(h.value);
        }
    }
}

/// An HTTP response built by the C host after executing a request. The FFI
/// layer reads but never frees these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEffectKind {
    /// Execute `request`, then call `todo_store_complete` or `todo_store_abort`
    /// with `ticket`.
    Request = 0,
    /// After `delay_ms`, call `todo_store_expire_error` with `error_epoch`.
    ExpireError = 1,
}

#[repr(C)]
pub struct FfiEffect {
    pub kind: FfiEffectKind,
    pub ticket: u64,
    pub request: FfiHttpRequest,
    pub error_epoch: u64,
    pub delay_ms: u64,
}

impl FfiEffect {
    fn from_core(effect: Effect) -> Self {
        match effect {
            Effect::Send(command) => FfiEffect {
                kind: FfiEffectKind::Request,
                ticket: command.ticket,
                request: FfiHttpRequest::from_core(command.request),
                error_epoch: 0,
                delay_ms: 0,
            },
            Effect::ExpireError { epoch, after } => FfiEffect {
                kind: FfiEffectKind::ExpireError,
                ticket: 0,
                request: FfiHttpRequest {
                    method: FfiHttpMethod::Get,
                    path: std::ptr::null_mut(),
                    headers: std::ptr::null_mut(),
                    headers_len: 0,
                    body: std::ptr::null_mut(),
                },
                error_epoch: epoch,
                delay_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            },
        }
    }
}

/// Effects returned by every intent. Free with `todo_free_effects`.
#[repr(C)]
pub struct FfiEffectList {
    pub items: *mut FfiEffect,
    pub len: u32,
}

impl FfiEffectList {
    pub(crate) fn from_core(effects: Effects) -> *mut Self {
        let items: Vec<FfiEffect> = effects.into_iter().map(FfiEffect::from_core).collect();
        let (items, len) = leak_vec(items);
        Box::into_raw(Box::new(FfiEffectList { items, len }))
    }

    pub(crate) fn empty() -> *mut Self {
        Self::from_core(Effects::default())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatusFilter {
    All = 0,
    Active = 1,
    Completed = 2,
}

impl From<StatusFilter> for FfiStatusFilter {
    fn from(f: StatusFilter) -> Self {
        match f {
            StatusFilter::All => FfiStatusFilter::All,
            StatusFilter::Active => FfiStatusFilter::Active,
            StatusFilter::Completed => FfiStatusFilter::Completed,
        }
    }
}

impl From<FfiStatusFilter> for StatusFilter {
    fn from(f: FfiStatusFilter) -> Self {
        match f {
            FfiStatusFilter::All => StatusFilter::All,
            FfiStatusFilter::Active => StatusFilter::Active,
            FfiStatusFilter::Completed => StatusFilter::Completed,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorKind {
    None = 0,
    LoadFailed = 1,
    EmptyTitle = 2,
    CreateFailed = 3,
    UpdateFailed = 4,
    DeleteFailed = 5,
}

impl From<Option<TodoError>> for FfiErrorKind {
    fn from(e: Option<TodoError>) -> Self {
        match e {
            None => FfiErrorKind::None,
            Some(TodoError::LoadFailed) => FfiErrorKind::LoadFailed,
            Some(TodoError::EmptyTitle) => FfiErrorKind::EmptyTitle,
            Some(TodoError::CreateFailed) => FfiErrorKind::CreateFailed,
            Some(TodoError::UpdateFailed) => FfiErrorKind::UpdateFailed,
            Some(TodoError::DeleteFailed) => FfiErrorKind::DeleteFailed,
        }
    }
}

/// One visible row.
#[repr(C)]
pub struct FfiTodoRow {
    pub id: u64,
    pub title: *mut c_char,
    pub completed: bool,
    pub pending: bool,
}

/// What the page should show right now. Free with `todo_free_snapshot`.
///
/// `rows` holds only the todos passing `filter`; `total` and `items_left`
/// count the whole list.
#[repr(C)]
pub struct FfiSnapshot {
    pub rows: *mut FfiTodoRow,
    pub rows_len: u32,
    pub total: u32,
    pub items_left: u32,
    pub filter: FfiStatusFilter,
    pub has_completed: bool,
    pub all_completed: bool,
    pub submitting: bool,
    pub loading: bool,
    pub error_kind: FfiErrorKind,
    /// Null when `error_kind` is `None`.
    pub error_message: *mut c_char,
    pub new_title: *mut c_char,
    pub version: u64,
}

impl FfiSnapshot {
    pub(crate) fn from_core(snapshot: &Snapshot) -> *mut Self {
        let rows: Vec<FfiTodoRow> = snapshot
            .visible()
            .map(|todo| FfiTodoRow {
                id: todo.id,
                title: c_string(todo.title.as_str()),
                completed: todo.completed,
                pending: snapshot.is_pending(todo.id),
            })
            .collect();
        let (rows, rows_len) = leak_vec(rows);

        Box::into_raw(Box::new(FfiSnapshot {
            rows,
            rows_len,
            total: saturating_u32(snapshot.todos.len()),
            items_left: saturating_u32(snapshot.items_left()),
            filter: snapshot.filter.into(),
            has_completed: snapshot.has_completed(),
            all_completed: snapshot.all_completed(),
            submitting: snapshot.submitting,
            loading: snapshot.loading,
            error_kind: snapshot.error.into(),
            error_message: snapshot.error.map_or(std::ptr::null_mut(), |e| c_string(e.message())),
            new_title: c_string(snapshot.new_title.as_str()),
            version: snapshot.version,
        }))
    }
}

/// Free a C string allocated by `c_string`. Null is ignored.
pub(crate) fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
