//! The to-do list and every operation that mutates it.
//!
//! [`TodoListManager`] owns the list exclusively and mirrors it to a
//! [`TodoStore`] after each mutation. Persistence is best effort: read and
//! write failures are logged, remembered in [`TodoListManager::last_failure`],
//! and otherwise ignored so the list stays usable in memory.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use todo_list_core::todo_manager::TodoListManager;
//! use todo_list_core::todo_store::InMemoryStore;
//!
//! let mut manager = TodoListManager::new(InMemoryStore::new(), "MY_TODO_LIST_1");
//! manager.load();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let record = manager.add("Buy milk", date, None).unwrap();
//! manager.toggle_completed(&record.id);
//!
//! let partition = manager.partition();
//! assert!(partition.pending.is_empty());
//! assert_eq!(partition.completed[0].title, "Buy milk");
//! ```

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::app_response::{AppResponse, PersistenceFailure};
use crate::device::{acquire_photo, DatePicker, PhotoSource};
use crate::todo_record::{
    decode_list, encode_list, format_date, today, today_utc, EditDraft, TodoRecord,
};
use crate::todo_store::TodoStore;

/// Which record, if any, the shared input draft targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Composing a new record.
    Idle { draft: EditDraft },
    /// Editing the record with `id`.
    Editing { id: String, draft: EditDraft },
}

impl Mode {
    fn idle(date: NaiveDate) -> Self {
        Mode::Idle {
            draft: EditDraft::blank(date),
        }
    }

    pub fn draft(&self) -> &EditDraft {
        match self {
            Mode::Idle { draft } | Mode::Editing { draft, .. } => draft,
        }
    }

    fn draft_mut(&mut self) -> &mut EditDraft {
        match self {
            Mode::Idle { draft } | Mode::Editing { draft, .. } => draft,
        }
    }
}

/// Pending and completed views of the list, each in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub pending: Vec<TodoRecord>,
    pub completed: Vec<TodoRecord>,
}

pub struct TodoListManager<S: TodoStore> {
    store: S,
    storage_key: String,
    items: Vec<TodoRecord>,
    loaded: bool,
    mode: Mode,
    pending_delete: Option<String>,
    last_id: i64,
    last_failure: Option<PersistenceFailure>,
}

impl<S: TodoStore> TodoListManager<S> {
    pub fn new(store: S, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            items: Vec::new(),
            loaded: false,
            mode: Mode::idle(today()),
            pending_delete: None,
            last_id: 0,
            last_failure: None,
        }
    }

    // -- persistence --

    /// Replaces the in-memory list with the persisted one.
    ///
    /// Missing `date` (with the UTC date) and `completed` fields are backfilled;
    /// unreadable entries are skipped. A read failure or a blob that is not a
    /// list leaves an empty list. Saves are allowed from here on either way.
    pub fn load(&mut self) -> &[TodoRecord] {
        let result = match self.store.get(&self.storage_key) {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(json)) => {
                decode_list(&json, today_utc()).map_err(|e| PersistenceFailure::Read(e.to_string()))
            }
            Err(e) => Err(PersistenceFailure::Read(e.to_string())),
        };

        match result {
            Ok(items) => {
                info!("Loaded {} todos from '{}'", items.len(), self.storage_key);
                self.items = items;
            }
            Err(failure) => {
                warn!("{failure}");
                self.items = Vec::new();
                self.last_failure = Some(failure);
            }
        }

        self.loaded = true;
        &self.items
    }

    /// Writes the whole list under the storage key, overwriting what was there.
    ///
    /// Skipped until [`load`](Self::load) has run so an empty startup list can
    /// never clobber persisted data.
    pub fn save(&mut self) {
        if !self.loaded {
            debug!("Save skipped, list not loaded yet");
            return;
        }

        let outcome = encode_list(&self.items).and_then(|json| self.store.set(&self.storage_key, &json));

        if let Err(e) = outcome {
            let failure = PersistenceFailure::Write(e.to_string());
            warn!("{failure}");
            self.last_failure = Some(failure);
        }
    }

    // -- list operations --

    /// Prepends a new record. Blank titles are ignored.
    pub fn add(&mut self, title: &str, date: NaiveDate, photo: Option<String>) -> Option<TodoRecord> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring add with empty title");
            return None;
        }

        let record = TodoRecord {
            id: self.next_id(),
            title: title.to_string(),
            date: format_date(date),
            photo,
            completed: false,
            extra: Default::default(),
        };

        self.items.insert(0, record.clone());
        self.save();
        Some(record)
    }

    /// Loads the record into the draft and switches to editing it.
    pub fn begin_edit(&mut self, id: &str) -> Result<EditDraft, AppResponse> {
        let record = self
            .get(id)
            .ok_or_else(|| AppResponse::NotFound(format!("No todo found with id: {id}")))?;

        let draft = EditDraft::from_record(record, today());
        self.mode = Mode::Editing {
            id: id.to_string(),
            draft: draft.clone(),
        };
        Ok(draft)
    }

    /// Applies an edit to the record currently being edited.
    ///
    /// Only `title`, `date` and `photo` change. The title is stored as given;
    /// unlike [`add`](Self::add) an empty title is accepted. Does nothing unless
    /// `id` is the active edit target; otherwise leaves editing mode and saves,
    /// even when the target has been removed meanwhile.
    pub fn commit_edit(
        &mut self,
        id: &str,
        title: &str,
        date: NaiveDate,
        photo: Option<String>,
    ) -> Option<TodoRecord> {
        if self.editing_id() != Some(id) {
            debug!("Ignoring commit for {id}, not the active edit");
            return None;
        }

        self.mode = Mode::idle(date);

        let updated = self.items.iter_mut().find(|record| record.id == id).map(|record| {
            record.title = title.to_string();
            record.date = format_date(date);
            record.photo = photo;
            record.clone()
        });

        if updated.is_none() {
            debug!("Edited todo {id} no longer exists");
        }
        self.save();
        updated
    }

    /// Leaves editing mode without touching any record.
    pub fn cancel_edit(&mut self) {
        let date = self.mode.draft().date;
        self.mode = Mode::idle(date);
    }

    /// Deletes the record with `id`; unknown ids leave the list as is.
    /// Saves either way.
    pub fn remove(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|record| record.id != id);

        if self.items.len() == before {
            debug!("No todo with id {id} to remove");
        }
        self.save();
    }

    /// Flips `completed` on the record with `id`. Returns whether a record
    /// matched; saves either way.
    pub fn toggle_completed(&mut self, id: &str) -> bool {
        let found = match self.items.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.completed = !record.completed;
                true
            }
            None => {
                debug!("No todo with id {id} to toggle");
                false
            }
        };

        self.save();
        found
    }

    pub fn partition(&self) -> Partition {
        let (completed, pending) = self
            .items
            .iter()
            .cloned()
            .partition(|record| record.completed);

        Partition { pending, completed }
    }

    // -- draft --

    pub fn draft(&self) -> &EditDraft {
        self.mode.draft()
    }

    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.mode.draft_mut().title = title.into();
    }

    pub fn set_draft_date(&mut self, date: NaiveDate) {
        self.mode.draft_mut().date = date;
    }

    pub fn set_draft_photo(&mut self, photo: Option<String>) {
        self.mode.draft_mut().photo = photo;
    }

    /// Lets the user pick a date for the draft. Returns whether it changed.
    pub fn pick_date(&mut self, picker: &mut dyn DatePicker) -> bool {
        match picker.pick(self.mode.draft().date) {
            Some(date) => {
                self.set_draft_date(date);
                true
            }
            None => false,
        }
    }

    /// Captures or picks a photo for the draft. Returns whether one was attached.
    pub fn attach_photo(&mut self, source: &mut dyn PhotoSource) -> bool {
        match acquire_photo(source) {
            Some(uri) => {
                self.set_draft_photo(Some(uri));
                true
            }
            None => false,
        }
    }

    /// The add/update button: adds the draft when idle, commits it when editing.
    pub fn submit(&mut self) -> Option<TodoRecord> {
        match &self.mode {
            Mode::Idle { draft } => {
                let draft = draft.clone();
                let created = self.add(&draft.title, draft.date, draft.photo);
                if created.is_some() {
                    let draft = self.mode.draft_mut();
                    draft.title.clear();
                    draft.photo = None;
                }
                created
            }
            Mode::Editing { id, draft } => {
                let (id, draft) = (id.clone(), draft.clone());
                self.commit_edit(&id, &draft.title, draft.date, draft.photo)
            }
        }
    }

    // -- delete confirmation --

    /// Marks `id` as awaiting confirmation, replacing any earlier target.
    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.pending_delete = Some(id.into());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Removes the pending target. Returns whether there was one.
    pub fn confirm_delete(&mut self) -> bool {
        match self.pending_delete.take() {
            Some(id) => {
                self.remove(&id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // -- accessors --

    pub fn items(&self) -> &[TodoRecord] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&TodoRecord> {
        self.items.iter().find(|record| record.id == id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing { .. })
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            Mode::Editing { id, .. } => Some(id),
            Mode::Idle { .. } => None,
        }
    }

    /// Most recent persistence failure, kept for diagnostics only.
    pub fn last_failure(&self) -> Option<&PersistenceFailure> {
        self.last_failure.as_ref()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Millisecond timestamp as text, bumped past the last issued id and any id
    /// already in the list.
    fn next_id(&mut self) -> String {
        let mut candidate = Utc::now().timestamp_millis().max(self.last_id + 1);
        while self.items.iter().any(|record| record.id == candidate.to_string()) {
            candidate += 1;
        }

        self.last_id = candidate;
        candidate.to_string()
    }
}
