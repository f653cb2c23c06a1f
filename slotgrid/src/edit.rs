//! Single-cell edit session.
//!
//! `Idle -> Editing -> {Committing, Cancelling} -> Idle`. At most one session
//! is live; starting a new one forces the previous one through `Cancelling`.

use chrono::NaiveDate;

use crate::validation::{parse_number, validate};
use crate::value::DATE_FORMAT;
use crate::{
    Column, FieldPath, RecordStore, RowKey, Rule, ValidationError, ValidationMessages, Value,
    ValueKind,
};

/// Inset of the editor overlay inside its cell, in pixels.
pub const EDITOR_INSET: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditPhase {
    #[default]
    Idle,
    Editing,
    Committing,
    Cancelling,
}

impl EditPhase {
    fn can_enter(self, next: EditPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Editing)
                | (Self::Editing, Self::Committing)
                | (Self::Editing, Self::Cancelling)
                | (Self::Committing, Self::Editing)
                | (Self::Committing, Self::Idle)
                | (Self::Cancelling, Self::Idle)
        )
    }
}

/// Pixel rectangle of the editor overlay, relative to the row canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EditorRect {
    pub left: u32,
    pub top: u64,
    pub width: u32,
    pub height: u32,
}

impl EditorRect {
    /// Overlay for a cell at `cell_left` with `cell_width`, in view row `view_index`.
    pub fn for_cell(cell_left: u32, cell_width: u32, view_index: usize, row_height: u32) -> Self {
        let inset = EDITOR_INSET;
        Self {
            left: cell_left,
            top: (view_index as u64)
                .saturating_mul(row_height as u64)
                .saturating_add(inset as u64),
            width: cell_width.saturating_sub(inset * 2),
            height: row_height.saturating_sub(inset * 2),
        }
    }
}

/// The visual cell an edit originated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellAnchor {
    pub view_index: usize,
    /// Pool slot bound to the row when the edit started, if any.
    pub slot: Option<usize>,
    pub field: String,
    pub rect: EditorRect,
}

#[derive(Clone, Debug)]
pub struct ActiveEdit {
    key: RowKey,
    field: String,
    path: FieldPath,
    kind: ValueKind,
    rules: Vec<Rule>,
    old_value: Value,
    input: String,
    anchor: CellAnchor,
    error: Option<ValidationError>,
}

impl ActiveEdit {
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    /// Live editor text.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn anchor(&self) -> &CellAnchor {
        &self.anchor
    }

    /// Message of the last refused commit, cleared on the next input change.
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditStarted {
    pub key: RowKey,
    pub field: String,
    pub old_value: Value,
    pub input: String,
    pub anchor: CellAnchor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditCommitted {
    pub key: RowKey,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub anchor: CellAnchor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditCancelled {
    pub key: RowKey,
    pub field: String,
    pub anchor: CellAnchor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditStart {
    /// Column not editable or record unknown; nothing changed.
    Rejected,
    Started {
        started: EditStarted,
        /// The session that was forced to cancel to make room for this one.
        superseded: Option<EditCancelled>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommitOutcome {
    Committed(EditCommitted),
    /// The first failing rule; the session stays `Editing`.
    Refused(ValidationError),
    /// No live session.
    Idle,
    /// The target record left the store; the session was dropped.
    Stale,
}

#[derive(Clone, Debug, Default)]
pub struct EditSession {
    phase: EditPhase,
    active: Option<ActiveEdit>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn is_editing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveEdit> {
        self.active.as_ref()
    }

    fn enter(&mut self, next: EditPhase) {
        debug_assert!(
            self.phase.can_enter(next),
            "illegal edit transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Opens an editor for `key` / `column`, seeded with the current value.
    pub fn start(
        &mut self,
        store: &RecordStore,
        key: &RowKey,
        column: &Column,
        anchor: CellAnchor,
    ) -> EditStart {
        if !column.is_editable() {
            gtrace!(field = column.field(), "edit rejected: column not editable");
            return EditStart::Rejected;
        }
        let Some(record) = store.get_by_key(key) else {
            return EditStart::Rejected;
        };
        let old_value = record.get(column.path()).cloned().unwrap_or_default();

        let superseded = self.cancel();

        let input = seed_text(&old_value);
        let started = EditStarted {
            key: key.clone(),
            field: column.field().to_string(),
            old_value: old_value.clone(),
            input: input.clone(),
            anchor: anchor.clone(),
        };
        self.active = Some(ActiveEdit {
            key: key.clone(),
            field: column.field().to_string(),
            path: column.path().clone(),
            kind: column.kind(),
            rules: column.rules().to_vec(),
            old_value,
            input,
            anchor,
            error: None,
        });
        self.enter(EditPhase::Editing);
        gdebug!(key = %key, field = column.field(), "edit started");
        EditStart::Started {
            started,
            superseded,
        }
    }

    /// Replaces the live editor text. Returns `false` when idle.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.input = text.into();
        active.error = None;
        true
    }

    /// Validates, coerces and writes the live input into the record.
    pub fn commit(&mut self, store: &mut RecordStore, messages: &ValidationMessages) -> CommitOutcome {
        if self.active.is_none() {
            return CommitOutcome::Idle;
        }
        self.enter(EditPhase::Committing);
        let Some(active) = self.active.as_mut() else {
            return CommitOutcome::Idle;
        };

        if let Err(err) = validate(&active.rules, &active.input, messages) {
            gdebug!(field = %active.field, rule = ?err.rule, "commit refused");
            active.error = Some(err.clone());
            self.enter(EditPhase::Editing);
            return CommitOutcome::Refused(err);
        }

        let Some(active) = self.active.take() else {
            return CommitOutcome::Idle;
        };
        self.enter(EditPhase::Idle);

        let Some(record) = store.get_by_key_mut(&active.key) else {
            gwarn!(key = %active.key, "edit target left the store");
            return CommitOutcome::Stale;
        };
        // Typed coercion; see `coerce` for how dates and blank numbers are stored.
        let new_value = coerce(active.kind, &active.input);
        record.set(&active.path, new_value.clone());
        gdebug!(key = %active.key, field = %active.field, "edit committed");

        CommitOutcome::Committed(EditCommitted {
            key: active.key,
            field: active.field,
            old_value: active.old_value,
            new_value,
            anchor: active.anchor,
        })
    }

    /// Focus left the editor; same as an explicit commit.
    pub fn blur(&mut self, store: &mut RecordStore, messages: &ValidationMessages) -> CommitOutcome {
        self.commit(store, messages)
    }

    /// Discards the live edit without touching the record.
    pub fn cancel(&mut self) -> Option<EditCancelled> {
        let active = self.active.take()?;
        self.enter(EditPhase::Cancelling);
        self.enter(EditPhase::Idle);
        gdebug!(key = %active.key, field = %active.field, "edit cancelled");
        Some(EditCancelled {
            key: active.key,
            field: active.field,
            anchor: active.anchor,
        })
    }
}

/// Initial editor text for a value: dates as `YYYY-MM-DD`, numbers as plain text.
pub fn seed_text(value: &Value) -> String {
    value.display_text()
}

/// Converts editor text into a value of the column's kind.
///
/// Values stay typed rather than textual:
/// - numbers: empty or whitespace-only text becomes null, never `0`
/// - dates: a valid `YYYY-MM-DD` becomes [`Value::Date`] (it displays and
///   re-seeds as the same text); anything else, including empty text, is kept
///   as raw text
/// - booleans: `true`/`false` in any case; anything else is kept as raw text
pub fn coerce(kind: ValueKind, text: &str) -> Value {
    match kind {
        ValueKind::Text => Value::Text(text.to_string()),
        ValueKind::Number => {
            if text.trim().is_empty() {
                return Value::Null;
            }
            match parse_number(text) {
                Some(n) => Value::Number(n),
                None => {
                    gwarn!(input = text, "unparsable number input stored as null");
                    Value::Null
                }
            }
        }
        ValueKind::Date => {
            if text.is_empty() {
                return Value::Text(String::new());
            }
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                .map(Value::Date)
                .unwrap_or_else(|_| Value::Text(text.to_string()))
        }
        ValueKind::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(text.to_string()),
        },
    }
}
