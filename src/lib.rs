//! # Todo List Core
//!
//! Native core of a personal to-do app: an ordered list of dated tasks with
//! optional photos and a completion flag, persisted locally in LMDB and exposed
//! to mobile front ends (Flutter, React Native, Swift/Kotlin) through a C ABI.
//!
//! ## Features
//!
//! - **Most-recent-first list**: new tasks are prepended, ids are unique per session
//! - **Best-effort persistence**: every mutation flushes the list to a single LMDB key
//! - **Forward-compatible loading**: lists saved by older builds get `date`/`completed` backfilled
//! - **Edit flow**: a shared draft that either composes a new task or edits an existing one
//! - **Safe error handling**: no `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use todo_list_core::{create_todo_list, add_todo, get_partition, free_response};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"db_name":"my_todos"}"#).unwrap();
//! let state = create_todo_list(config.as_ptr());
//!
//! let input = CString::new(r#"{"title":"Buy milk","date":"2024-01-01"}"#).unwrap();
//! free_response(add_todo(state, input.as_ptr()));
//!
//! let partition = get_partition(state);
//! free_response(partition);
//! ```
//!
//! ## FFI Functions
//!
//! Every function except [`create_todo_list`] and [`free_response`] answers with a
//! JSON-encoded [`AppResponse`]. Mutations answer `Ok` with the current list, also
//! when they turned out to be no-ops.
//!
//! - [`create_todo_list`] - Open the store and load the persisted list
//! - [`get_todos`] / [`get_partition`] - Read the list or its pending/completed split
//! - [`add_todo`] / [`submit_todo`] - Add a task, or submit the draft in its current mode
//! - [`begin_edit`] / [`commit_edit`] / [`cancel_edit`] - Edit flow
//! - [`toggle_completed`] / [`remove_todo`] - Per-task actions
//! - [`request_delete`] / [`confirm_delete`] / [`cancel_delete`] - Delete confirmation
//! - [`close_todo_list`] - Release the handle
//! - [`free_response`] - Release a string returned by this library

pub mod app_response;
pub mod config;
pub mod device;
pub mod todo_manager;
pub mod todo_record;
pub mod todo_store;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use chrono::NaiveDate;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use crate::app_response::AppResponse;
use crate::config::TodoConfig;
use crate::todo_manager::TodoListManager;
use crate::todo_record::{parse_input_date, today};
use crate::todo_store::LmdbStore;

/// Opaque handle given to the host.
pub type TodoListHandle = TodoListManager<LmdbStore>;

/// Task fields as sent by the host when adding or submitting.
#[derive(Debug, Deserialize)]
struct TodoInput {
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditInput {
    id: String,
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    photo: Option<String>,
}

/// Opens the LMDB store described by `config_json` and loads the persisted list.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`TodoConfig`], e.g. `{"db_name":"todos"}`
///
/// # Returns
///
/// A pointer to the handle, or null when the input is invalid or the store
/// cannot be opened. Release it with [`close_todo_list`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use todo_list_core::create_todo_list;
///
/// let config = CString::new(r#"{"db_name":"todos","storage_key":"MY_TODO_LIST_1"}"#).unwrap();
/// let state = create_todo_list(config.as_ptr());
///
/// if !state.is_null() {
///     // Ready to use
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_todo_list(config_json: *const c_char) -> *mut TodoListHandle {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_todo_list");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match TodoConfig::from_json(json) {
        Ok(config) => config,
        Err(e) => {
            warn!("Rejected configuration: {e}");
            return std::ptr::null_mut();
        }
    };

    info!("Opening todo list at: {}", config.lmdb_dir());

    match LmdbStore::open(&config) {
        Ok(store) => {
            let mut manager = TodoListManager::new(store, config.storage_key.clone());
            manager.load();
            info!("Todo list ready with {} items", manager.items().len());
            Box::into_raw(Box::new(manager))
        }
        Err(e) => {
            warn!("Failed to open todo store: {e}");
            warn!("Attempted path: {}", config.lmdb_dir());
            std::ptr::null_mut()
        }
    }
}

/// Returns the whole list, most recent first.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_todos(state: *mut TodoListHandle) -> *const c_char {
    match state_mut(state, "get_todos") {
        Ok(manager) => list_response(manager),
        Err(error) => error,
    }
}

/// Returns `{"pending":[...],"completed":[...]}` inside an `Ok` response.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_partition(state: *mut TodoListHandle) -> *const c_char {
    let manager = match state_mut(state, "get_partition") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    match serde_json::to_string(&manager.partition()) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Adds a task.
///
/// # JSON Format
///
/// ```json
/// { "title": "Buy milk", "date": "2024-01-01", "photo": "file:///photo.jpg" }
/// ```
///
/// `date` defaults to today and `photo` to none. A blank title leaves the list
/// unchanged.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_todo(state: *mut TodoListHandle, json_ptr: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "add_todo") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let input: TodoInput = match parse_json(json_ptr) {
        Ok(input) => input,
        Err(error) => return error,
    };

    let date = match resolve_date(input.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return response_to_c_string(&e),
    };

    manager.add(&input.title, date, input.photo);
    list_response(manager)
}

/// Fills the shared draft with the given fields and submits it: adds a task
/// when idle, commits the edit when editing.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn submit_todo(state: *mut TodoListHandle, json_ptr: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "submit_todo") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let input: TodoInput = match parse_json(json_ptr) {
        Ok(input) => input,
        Err(error) => return error,
    };

    let date = match resolve_date(input.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return response_to_c_string(&e),
    };

    manager.set_draft_title(input.title);
    manager.set_draft_date(date);
    manager.set_draft_photo(input.photo);
    manager.submit();
    list_response(manager)
}

/// Starts editing the task with `id` and returns its draft.
///
/// The draft is `{"title":..,"date":"YYYY-MM-DD","photo":..}`; an unknown id
/// answers `NotFound`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn begin_edit(state: *mut TodoListHandle, id: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "begin_edit") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error) => return error,
    };

    match manager.begin_edit(&id_str) {
        Ok(draft) => match serde_json::to_string(&draft) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => response_to_c_string(&AppResponse::from(e)),
        },
        Err(e) => response_to_c_string(&e),
    }
}

/// Commits the edit started with [`begin_edit`].
///
/// Expects `{"id":..,"title":..,"date":..,"photo":..}`; ignored unless `id` is
/// the task being edited.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn commit_edit(state: *mut TodoListHandle, json_ptr: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "commit_edit") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let input: EditInput = match parse_json(json_ptr) {
        Ok(input) => input,
        Err(error) => return error,
    };

    let date = match resolve_date(input.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return response_to_c_string(&e),
    };

    manager.commit_edit(&input.id, &input.title, date, input.photo);
    list_response(manager)
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cancel_edit(state: *mut TodoListHandle) -> *const c_char {
    let manager = match state_mut(state, "cancel_edit") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    manager.cancel_edit();
    list_response(manager)
}

/// Deletes the task with `id` immediately, bypassing confirmation.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_todo(state: *mut TodoListHandle, id: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "remove_todo") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error) => return error,
    };

    manager.remove(&id_str);
    list_response(manager)
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_completed(state: *mut TodoListHandle, id: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "toggle_completed") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error) => return error,
    };

    manager.toggle_completed(&id_str);
    list_response(manager)
}

/// Marks `id` as awaiting delete confirmation.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn request_delete(state: *mut TodoListHandle, id: *const c_char) -> *const c_char {
    let manager = match state_mut(state, "request_delete") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error) => return error,
    };

    manager.request_delete(id_str);
    list_response(manager)
}

/// Deletes the task passed to [`request_delete`], if any.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn confirm_delete(state: *mut TodoListHandle) -> *const c_char {
    let manager = match state_mut(state, "confirm_delete") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    manager.confirm_delete();
    list_response(manager)
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cancel_delete(state: *mut TodoListHandle) -> *const c_char {
    let manager = match state_mut(state, "cancel_delete") {
        Ok(manager) => manager,
        Err(error) => return error,
    };

    manager.cancel_delete();
    list_response(manager)
}

/// Releases the handle returned by [`create_todo_list`].
///
/// The LMDB environment is closed when the handle is dropped. The pointer must
/// not be used afterwards.
///
/// # Notes
///
/// Useful before a Flutter hot restart so the next [`create_todo_list`] opens a
/// fresh environment.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_todo_list(state: *mut TodoListHandle) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_todo_list".to_string());
        return response_to_c_string(&error);
    }

    let manager = unsafe { Box::from_raw(state) };
    info!("Closing todo list with {} items", manager.items().len());
    drop(manager);

    response_to_c_string(&AppResponse::success("Todo list closed successfully"))
}

/// Frees a string returned by any function of this library. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }

    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

/// Resolves the handle pointer, answering `BadRequest` for null.
fn state_mut<'a>(
    state: *mut TodoListHandle,
    fn_name: &str,
) -> Result<&'a mut TodoListHandle, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(manager) => Ok(manager),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// `Ok` response carrying the current list.
fn list_response(manager: &TodoListHandle) -> *const c_char {
    match serde_json::to_string(manager.items()) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize todos: {e}"));
            response_to_c_string(&error)
        }
    }
}

fn parse_json<T: DeserializeOwned>(json_ptr: *const c_char) -> Result<T, *const c_char> {
    let json = c_ptr_to_string(json_ptr, "JSON")?;

    serde_json::from_str(&json).map_err(|e| {
        warn!("Rejected JSON input: {e}");
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Absent dates mean today.
fn resolve_date(raw: Option<&str>) -> Result<NaiveDate, AppResponse> {
    match raw {
        Some(raw) => parse_input_date(raw),
        None => Ok(today()),
    }
}

/// Serializes `response` into a newly allocated C string.
///
/// Returns null if serialization or C string creation fails. The caller owns
/// the string and releases it with [`free_response`].
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to an owned `String`.
///
/// Null pointers and invalid UTF-8 become a `BadRequest` response naming
/// `field_name`.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
