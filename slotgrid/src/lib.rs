//! A headless data grid engine.
//!
//! For a host-facing controller (options, remote data sources, scroll throttling),
//! see the `slotgrid-adapter` crate.
//!
//! This crate holds the core pieces needed to present large record sets at
//! interactive frame rates: a keyed record store, a search/sort/paginate
//! pipeline, a key-based selection ledger, a validating edit session and a
//! fixed-size slot pool that recycles visual rows while scrolling.
//!
//! It is UI-agnostic. A presentation layer is expected to provide:
//! - viewport height and scroll offset
//! - user intents (clicks, header toggles, editor text)
//! - rendering of the slot cells this crate binds
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod column;
mod edit;
mod events;
mod pipeline;
mod pool;
mod query;
mod record;
mod selection;
mod state;
mod store;
mod validation;
mod value;

#[cfg(test)]
mod tests;

pub use column::{
    Align, Column, Columns, DEFAULT_COLUMN_WIDTH, MIN_COLUMN_WIDTH, SELECT_COLUMN_MIN_WIDTH,
    SELECT_COLUMN_WIDTH, SELECT_FIELD,
};
pub use edit::{
    ActiveEdit, CellAnchor, CommitOutcome, EDITOR_INSET, EditCancelled, EditCommitted, EditPhase,
    EditSession, EditStart, EditStarted, EditorRect, coerce, seed_text,
};
pub use events::{EventBus, EventHandler, EventKind, GridEvent, HandlerId};
pub use pipeline::{PipelineMode, View, filter_rows, recompute, sort_rows};
pub use pool::{RowSource, Slot, SlotCell, SlotPool, SlotWindow};
pub use query::{QueryState, SortDirection, SortTerm, page_count};
pub use record::{FieldPath, Record};
pub use selection::{HeaderCheckState, SelectionLedger, SelectionMode};
pub use state::{GridState, GridStatePatch, PageSummary};
pub use store::{AUTO_KEY_FIELD, RecordStore, RowKey};
pub use validation::{
    Predicate, Rule, RuleKind, ValidationError, ValidationMessages, parse_number, validate,
};
pub use value::{DATE_FORMAT, Value, ValueKind, format_number};
