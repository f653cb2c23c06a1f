//! Host-facing controller for the `slotgrid` engine.
//!
//! The `slotgrid` crate is UI-agnostic and focuses on the core pipeline, pooling,
//! selection and editing state. This crate composes those pieces into a single
//! [`Grid`] and provides the framework-neutral plumbing most hosts need:
//!
//! - Builder-style configuration ([`GridOptions`])
//! - Display-refresh-throttled scroll binding (`on_scroll` / `on_frame`)
//! - Remote data sources: request composition, schema mapping and ticketed resolution
//!
//! This crate is intentionally framework-agnostic (no DOM/egui/ratatui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod grid;
mod options;
mod remote;


pub use grid::Grid;
pub use options::{
    EditingOptions, FilteringOptions, GridOptions, PaginationOptions, SelectionOptions,
    SortingOptions, VirtualizationOptions,
};
pub use remote::{
    DataSource, FetchError, FetchRequest, FetchTicket, FetchedPage, FilterClause, FilterOp,
    SchemaMapping, Transport, json_to_value,
};
