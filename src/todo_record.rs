//! Data model for to-do entries.
//!
//! Two shapes exist for a record:
//!
//! - [`TodoRecord`] is the in-memory, fully populated form the manager works with.
//! - [`StoredTodoRecord`] is the lenient form read back from storage. Lists written
//!   by older builds may lack `date` or `completed`; [`StoredTodoRecord::normalize`]
//!   fills those in so the rest of the crate never sees a partial record.
//!
//! Fields this crate does not know about are kept in `extra` and written back
//! on the next save.
//!
//! Dates travel as `YYYY-MM-DD` text, built from the calendar date's own
//! year/month/day components with no timezone conversion.

use chrono::{Local, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

use crate::app_response::AppResponse;

/// Format used for every persisted and transmitted date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One task entry.
///
/// # Serialization
///
/// Records serialize to the same JSON objects the list is persisted as:
///
/// ```rust
/// use todo_list_core::todo_record::TodoRecord;
///
/// let record = TodoRecord {
///     id: "1709800000000".to_string(),
///     title: "Buy milk".to_string(),
///     date: "2024-03-07".to_string(),
///     photo: None,
///     completed: false,
///     extra: Default::default(),
/// };
///
/// let json = serde_json::to_string(&record)?;
/// assert_eq!(
///     json,
///     r#"{"id":"1709800000000","title":"Buy milk","date":"2024-03-07","completed":false}"#
/// );
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    /// Identity key, assigned once at creation and never changed.
    pub id: String,

    /// Trimmed, non-empty on creation. Edits may replace it freely.
    pub title: String,

    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,

    /// URI of a locally captured or picked image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    pub completed: bool,

    /// Unknown fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// A record exactly as found in storage, before defaults are applied.
///
/// `null` and a missing field are treated the same way. Numeric ids are
/// accepted and kept as their decimal text; a missing or `null` title reads
/// as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredTodoRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(Number),
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

fn lenient_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl StoredTodoRecord {
    /// Fills in the fields older lists may lack: `date` becomes `today`,
    /// `completed` becomes `false`. Present values are kept untouched, so
    /// normalizing an already complete record is the identity.
    pub fn normalize(self, today: NaiveDate) -> TodoRecord {
        TodoRecord {
            id: self.id,
            title: self.title,
            date: self.date.unwrap_or_else(|| format_date(today)),
            photo: self.photo,
            completed: self.completed.unwrap_or(false),
            extra: self.extra,
        }
    }
}

/// Decodes a persisted list, applying [`StoredTodoRecord::normalize`] to every entry.
///
/// Fails only when the blob is not a JSON array. Entries that cannot be read
/// as a record (no id, a non-text title, not an object) are logged and skipped
/// so the rest of the list survives.
pub fn decode_list(json: &str, today: NaiveDate) -> Result<Vec<TodoRecord>, AppResponse> {
    let entries: Vec<JsonValue> = serde_json::from_str(json)?;

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<StoredTodoRecord>(entry) {
            Ok(stored) => items.push(stored.normalize(today)),
            Err(e) => warn!("Skipping unreadable todo at index {index}: {e}"),
        }
    }
    Ok(items)
}

/// Serializes the list in the persisted layout.
pub fn encode_list(items: &[TodoRecord]) -> Result<String, AppResponse> {
    Ok(serde_json::to_string(items)?)
}

/// Input draft shared by the add and edit flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDraft {
    pub title: String,
    pub date: NaiveDate,
    pub photo: Option<String>,
}

impl EditDraft {
    /// Empty draft dated `date`.
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            title: String::new(),
            date,
            photo: None,
        }
    }

    /// Draft pre-populated from an existing record.
    ///
    /// The stored date is re-parsed leniently and falls back to `today`.
    pub fn from_record(record: &TodoRecord, today: NaiveDate) -> Self {
        Self {
            title: record.title.clone(),
            date: parse_draft_date(&record.date, today),
            photo: record.photo.clone(),
        }
    }
}

/// Zero-padded `YYYY-MM-DD` rendering of a calendar date.
///
/// ```rust
/// use chrono::NaiveDate;
/// use todo_list_core::todo_record::format_date;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(format_date(date), "2024-03-07");
/// ```
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Current date in the device's local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current UTC date, used to backfill records stored without a date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Lenient parse used when an existing record is loaded into the draft.
///
/// Dashes are swapped for slashes before parsing so both `2024-03-07` and
/// `2024/03/07` are accepted; anything else yields `fallback`.
pub fn parse_draft_date(raw: &str, fallback: NaiveDate) -> NaiveDate {
    let normalized = raw.trim().replace('-', "/");
    NaiveDate::parse_from_str(&normalized, "%Y/%m/%d").unwrap_or(fallback)
}

/// Strict parse for dates arriving over FFI.
pub fn parse_input_date(raw: &str) -> Result<NaiveDate, AppResponse> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        AppResponse::BadRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD: {e}"))
    })
}
