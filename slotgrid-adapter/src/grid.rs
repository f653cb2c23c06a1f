use slotgrid::{
    ActiveEdit, CellAnchor, Column, Columns, CommitOutcome, EditCancelled, EditSession, EditStart,
    EditorRect, EventBus, EventKind, GridEvent, GridState, GridStatePatch, HandlerId,
    HeaderCheckState, PageSummary, PipelineMode, QueryState, Record, RecordStore, RowKey,
    RowSource, SelectionLedger, SlotPool, SortDirection, View, recompute,
};

use crate::{FetchError, FetchRequest, FetchTicket, GridOptions, Transport};

/// The presented query and scroll position, restored when a server-driven change fails to load.
#[derive(Clone, Debug)]
struct Rollback {
    query: QueryState,
    scroll_offset: u64,
}

/// A framework-neutral grid controller.
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `on_scroll` when the scroll container reports an offset, then `on_frame`
///   once per display refresh tick
/// - the user-intent methods (`click_row`, `toggle_sort`, `set_search`, ...)
/// - `take_fetch_request` / `resolve_fetch` (or `drive`) when a data source is configured
///
/// Slot cell contents are read back through [`Grid::pool`].
#[derive(Debug)]
pub struct Grid {
    options: GridOptions,
    columns: Columns,
    store: RecordStore,
    query: QueryState,
    view: View,
    selection: SelectionLedger,
    edit: EditSession,
    pool: SlotPool,
    events: EventBus,
    pending_scroll: Option<u64>,
    server_page: bool,
    server_total: usize,
    next_ticket: u64,
    latest_ticket: Option<FetchTicket>,
    pending_request: Option<FetchRequest>,
    rollback: Option<Rollback>,
}

impl Grid {
    /// Builds the grid, loads the initial data (or issues the first fetch when a
    /// data source is configured) and emits `Ready`.
    pub fn new(mut options: GridOptions) -> Self {
        let events = std::mem::take(&mut options.events);
        let data = std::mem::take(&mut options.data);
        let columns = Columns::new(options.columns.iter().cloned(), options.selection.checkbox);
        let virt = options.virtualization;
        gdebug!(
            columns = columns.len(),
            rows = data.len(),
            server = options.is_server_driven(),
            "Grid::new"
        );

        let mut grid = Self {
            store: RecordStore::new(options.row_key.as_deref()),
            query: QueryState::new(options.pagination.page_size),
            view: View::default(),
            selection: SelectionLedger::new(options.selection.mode),
            edit: EditSession::new(),
            pool: SlotPool::new(virt.row_height, virt.overscan, options.height),
            events,
            pending_scroll: None,
            server_page: false,
            server_total: 0,
            next_ticket: 0,
            latest_ticket: None,
            pending_request: None,
            rollback: None,
            columns,
            options,
        };

        if grid.options.data_source.is_some() {
            grid.apply_pipeline();
            grid.reload();
        } else {
            grid.set_data(data);
        }
        grid.events.emit(&GridEvent::Ready);
        grid
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn selection(&self) -> &SelectionLedger {
        &self.selection
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn active_edit(&self) -> Option<&ActiveEdit> {
        self.edit.active()
    }

    /// Inline validation message of the live edit, when messages are shown.
    pub fn edit_message(&self) -> Option<&str> {
        if !self.options.editing.show_messages {
            return None;
        }
        self.edit.active()?.error().map(|e| e.message.as_str())
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&GridEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        self.events.off(id)
    }

    fn is_server_driven(&self) -> bool {
        self.options.is_server_driven()
    }

    fn pipeline_mode(&self) -> PipelineMode {
        if self.server_page {
            PipelineMode::Server {
                total: self.server_total,
            }
        } else {
            PipelineMode::Client
        }
    }

    /// Recomputes the view and rebinds every slot.
    fn apply_pipeline(&mut self) {
        let mode = self.pipeline_mode();
        self.view = recompute(&self.store, &self.columns, &self.query, mode);
        if mode == PipelineMode::Client {
            self.query.page = self.view.page();
        }
        self.pool.ensure_capacity(self.view.len(), &self.columns);
        self.pool.invalidate();
        self.bind_at(self.pool.scroll_offset());
    }

    fn bind_at(&mut self, offset: u64) -> bool {
        let offset = self.pool.clamp_scroll_offset(offset);
        let src = RowSource {
            store: &self.store,
            view: &self.view,
            columns: &self.columns,
            selection: &self.selection,
        };
        self.pool.sync(offset, &src)
    }

    fn rollback_point(&self) -> Rollback {
        Rollback {
            query: self.query.clone(),
            scroll_offset: self.pool.scroll_offset(),
        }
    }

    /// Applies a query change: refetch when server-driven, local recompute otherwise.
    ///
    /// `before` is the state the view still presents. It is kept until the fetch
    /// resolves; while a fetch is outstanding the oldest point wins.
    fn query_changed(&mut self, before: Rollback) {
        if self.is_server_driven() {
            if self.rollback.is_none() {
                self.rollback = Some(before);
            }
            self.reload();
        } else {
            self.apply_pipeline();
        }
    }

    fn emit_selection_changed(&self) {
        if !self.events.has_handlers(EventKind::SelectionChanged) {
            return;
        }
        let rows = self
            .selection
            .selected_rows(&self.store)
            .into_iter()
            .cloned()
            .collect();
        self.events.emit(&GridEvent::SelectionChanged { rows });
    }

    fn row_by_key(&self, key: &RowKey) -> Record {
        self.store.get_by_key(key).cloned().unwrap_or_default()
    }

    fn emit_cancelled(&self, cancelled: EditCancelled) {
        self.events.emit(&GridEvent::CellEditCancel {
            row: self.row_by_key(&cancelled.key),
            key: cancelled.key,
            field: cancelled.field,
        });
    }

    // Data

    /// Replaces the local data set and returns to page 1.
    pub fn set_data(&mut self, records: Vec<Record>) {
        if let Some(cancelled) = self.edit.cancel() {
            self.emit_cancelled(cancelled);
        }
        self.store.replace(records);
        self.server_page = false;
        self.query.page = 1;
        self.apply_pipeline();
    }

    /// The source records, unfiltered and in store order.
    pub fn get_data(&self) -> &[Record] {
        self.store.records()
    }

    /// Issues a fetch from the data source. Any earlier in-flight fetch is superseded.
    ///
    /// Returns `None` when no data source is configured.
    pub fn reload(&mut self) -> Option<FetchTicket> {
        self.options.data_source.as_ref()?;
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        let request = FetchRequest::from_query(ticket, &self.query);
        gdebug!(
            ticket = ticket.get(),
            page = request.page,
            page_size = request.page_size,
            "fetch issued"
        );
        self.latest_ticket = Some(ticket);
        self.pending_request = Some(request);
        Some(ticket)
    }

    /// Hands the pending fetch to the host's transport.
    pub fn take_fetch_request(&mut self) -> Option<FetchRequest> {
        self.pending_request.take()
    }

    pub fn is_fetch_pending(&self) -> bool {
        self.latest_ticket.is_some()
    }

    /// Feeds a transport result back in.
    ///
    /// Only the latest ticket is accepted; older ones return
    /// [`FetchError::Superseded`] and change nothing. Failures emit `Error` and
    /// leave the view and selection untouched. Returns the row total on success.
    pub fn resolve_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<serde_json::Value, FetchError>,
    ) -> Result<usize, FetchError> {
        if self.latest_ticket != Some(ticket) {
            gwarn!(ticket = ticket.get(), "discarding superseded fetch result");
            return Err(FetchError::Superseded);
        }
        self.latest_ticket = None;
        if self
            .pending_request
            .as_ref()
            .is_some_and(|r| r.ticket == ticket)
        {
            self.pending_request = None;
        }

        let schema = self
            .options
            .data_source
            .as_ref()
            .map(|ds| ds.schema.clone())
            .unwrap_or_default();
        let page = match result.and_then(|payload| schema.extract(&payload)) {
            Ok(page) => page,
            Err(err) => {
                gwarn!(ticket = ticket.get(), error = %err, "fetch failed");
                if let Some(rollback) = self.rollback.take() {
                    self.query = rollback.query;
                    self.pending_scroll = None;
                    self.bind_at(rollback.scroll_offset);
                }
                self.events.emit(&GridEvent::Error {
                    cause: err.to_string(),
                });
                return Err(err);
            }
        };

        if let Some(cancelled) = self.edit.cancel() {
            self.emit_cancelled(cancelled);
        }
        self.rollback = None;
        let total = page.total;
        self.store.replace(page.records);
        self.server_page = self.is_server_driven();
        self.server_total = total;
        self.apply_pipeline();
        gdebug!(ticket = ticket.get(), rows = self.store.len(), total, "fetch resolved");

        if self.events.has_handlers(EventKind::DataLoaded) {
            self.events.emit(&GridEvent::DataLoaded {
                data: self.view.records(&self.store).cloned().collect(),
                total: self.view.total(),
            });
        }
        Ok(self.view.total())
    }

    /// Runs the pending fetch (if any) through `transport` and resolves it.
    pub fn drive(&mut self, transport: &mut impl Transport) -> Option<Result<usize, FetchError>> {
        let request = self.take_fetch_request()?;
        let result = transport.read(&request);
        Some(self.resolve_fetch(request.ticket, result))
    }

    // Selection

    pub fn get_selected_rows(&self) -> Vec<&Record> {
        self.selection.selected_rows(&self.store)
    }

    pub fn is_row_selected(&self, key: &RowKey) -> bool {
        self.selection.is_row_selected(key)
    }

    /// Selects every record in the store, including rows outside the current view.
    pub fn select_all(&mut self) {
        self.selection.select_all(&self.store);
        self.pool.refresh_selection(&self.selection);
        self.emit_selection_changed();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.pool.refresh_selection(&self.selection);
        self.emit_selection_changed();
    }

    /// Header checkbox state for the rows of the current view.
    pub fn header_state(&self) -> HeaderCheckState {
        self.selection.header_state(self.view.keys(&self.store))
    }

    /// Header checkbox toggled: selects or deselects the current view's rows only.
    pub fn toggle_header_checkbox(&mut self, checked: bool) {
        let visible: Vec<RowKey> = self.view.keys(&self.store).cloned().collect();
        if checked {
            self.selection.select_all_visible(&visible);
        } else {
            self.selection.deselect_visible(&visible);
        }
        self.pool.refresh_selection(&self.selection);
        self.emit_selection_changed();
    }

    /// Row click on pool slot `slot`. Stale or unbound slots are ignored.
    ///
    /// With the checkbox column present only the checkboxes select, so the click
    /// is ignored as well.
    pub fn click_row(&mut self, slot: usize, modifier: bool) -> bool {
        if self.columns.has_selection_column() {
            return false;
        }
        let Some(key) = self.pool.slot(slot).and_then(|s| s.key()).cloned() else {
            return false;
        };
        self.selection.click(&key, modifier);
        self.pool.refresh_selection(&self.selection);
        self.emit_selection_changed();
        true
    }

    /// Row checkbox on pool slot `slot` set to `checked`.
    pub fn toggle_row_checkbox(&mut self, slot: usize, checked: bool) -> bool {
        let Some(key) = self.pool.slot(slot).and_then(|s| s.key()).cloned() else {
            return false;
        };
        if checked {
            self.selection.add(key);
        } else {
            self.selection.remove(&key);
        }
        self.pool.set_slot_selected(slot, checked);
        self.emit_selection_changed();
        true
    }

    // Query

    pub fn get_state(&self) -> GridState {
        GridState::from_query(&self.query)
    }

    pub fn set_state(&mut self, state: impl Into<GridStatePatch>) {
        let before = self.rollback_point();
        state.into().apply(&mut self.query);
        self.query_changed(before);
    }

    pub fn page_count(&self) -> usize {
        self.query.page_count(self.view.total())
    }

    pub fn page_summary(&self) -> PageSummary {
        PageSummary::new(&self.query, self.view.total())
    }

    pub fn page_size_choices(&self) -> Vec<usize> {
        let mut sizes = self.options.pagination.choices();
        if !sizes.contains(&self.query.page_size) {
            sizes.push(self.query.page_size);
            sizes.sort_unstable();
        }
        sizes
    }

    /// Moves to page `page`, clamped into range. Returns `false` when already there.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        let page = page.clamp(1, self.page_count());
        if page == self.query.page {
            return false;
        }
        let before = self.rollback_point();
        self.query.page = page;
        self.pending_scroll = None;
        self.pool.reset_scroll();
        self.query_changed(before);
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let before = self.rollback_point();
        if !self.query.set_page_size(page_size) {
            return false;
        }
        self.pending_scroll = None;
        self.pool.reset_scroll();
        self.query_changed(before);
        true
    }

    pub fn set_search(&mut self, text: &str) -> bool {
        let before = self.rollback_point();
        if !self.query.set_search(text) {
            return false;
        }
        self.query_changed(before);
        true
    }

    pub fn sort_direction(&self, field: &str) -> Option<SortDirection> {
        self.query.sort_direction(field)
    }

    /// Header click on `field`. Non-sortable or unknown columns are ignored.
    ///
    /// `modifier` is the Ctrl/Meta key; it adds to the sort model only when
    /// `sorting.multi` is on. See [`Grid::toggle_sort_additive`] for Shift.
    pub fn toggle_sort(&mut self, field: &str, modifier: bool) -> bool {
        let additive = modifier && self.options.sorting.multi;
        self.header_sort(field, additive)
    }

    /// Shift + header click: always adds `field` to the sort model.
    pub fn toggle_sort_additive(&mut self, field: &str) -> bool {
        self.header_sort(field, true)
    }

    fn header_sort(&mut self, field: &str, additive: bool) -> bool {
        if !self.columns.get(field).is_some_and(Column::is_sortable) {
            return false;
        }
        let before = self.rollback_point();
        let _next = self.query.toggle_sort(field, additive);
        gdebug!(field, additive, direction = ?_next, "toggle_sort");
        self.query_changed(before);
        true
    }

    // Editing

    /// Opens an editor on view row `view_index`, column `field`.
    pub fn start_edit(&mut self, view_index: usize, field: &str) -> bool {
        let Some(key) = self.view.key(&self.store, view_index).cloned() else {
            return false;
        };
        let Some(column) = self.columns.get(field) else {
            return false;
        };
        let Some(left) = self.columns.visible_offset(field) else {
            return false;
        };
        let anchor = CellAnchor {
            view_index,
            slot: self.pool.slot_for_view_index(view_index),
            field: field.to_string(),
            rect: EditorRect::for_cell(left, column.width(), view_index, self.pool.row_height()),
        };

        match self.edit.start(&self.store, &key, column, anchor) {
            EditStart::Rejected => false,
            EditStart::Started {
                started,
                superseded,
            } => {
                if let Some(cancelled) = superseded {
                    self.emit_cancelled(cancelled);
                }
                self.events.emit(&GridEvent::CellEditStart {
                    row: self.row_by_key(&started.key),
                    key: started.key,
                    field: started.field,
                    old_value: started.old_value,
                });
                true
            }
        }
    }

    /// Double click on a cell of pool slot `slot`.
    pub fn double_click_cell(&mut self, slot: usize, field: &str) -> bool {
        let Some(view_index) = self.pool.slot(slot).and_then(|s| s.bound()) else {
            return false;
        };
        self.start_edit(view_index, field)
    }

    pub fn set_edit_input(&mut self, text: impl Into<String>) -> bool {
        self.edit.set_input(text)
    }

    /// Confirms the live edit.
    pub fn commit_edits(&mut self) -> CommitOutcome {
        let outcome = self.edit.commit(&mut self.store, &self.options.messages);
        if let CommitOutcome::Committed(done) = &outcome {
            self.pool
                .refresh_cell(&done.key, &done.field, done.new_value.display_text());
            self.events.emit(&GridEvent::CellEditCommit {
                key: done.key.clone(),
                row: self.row_by_key(&done.key),
                field: done.field.clone(),
                old_value: done.old_value.clone(),
                new_value: done.new_value.clone(),
            });
        }
        outcome
    }

    /// The editor lost focus; commits like [`Grid::commit_edits`].
    pub fn blur_editor(&mut self) -> CommitOutcome {
        self.commit_edits()
    }

    /// Discards the live edit. Returns `false` when nothing was being edited.
    pub fn cancel_edits(&mut self) -> bool {
        let Some(cancelled) = self.edit.cancel() else {
            return false;
        };
        self.emit_cancelled(cancelled);
        true
    }

    // Scrolling and layout

    pub fn scroll_offset(&self) -> u64 {
        self.pending_scroll.unwrap_or(self.pool.scroll_offset())
    }

    /// Records the latest scroll offset. Binding happens on the next [`Grid::on_frame`].
    pub fn on_scroll(&mut self, offset: u64) {
        self.pending_scroll = Some(offset);
    }

    /// One display refresh tick: applies the latest scroll offset, rebinding at most once.
    ///
    /// Returns whether any slot was rebound.
    pub fn on_frame(&mut self) -> bool {
        let Some(offset) = self.pending_scroll.take() else {
            return false;
        };
        self.bind_at(offset)
    }

    /// Scrolls so view row `index` is at the top (clamped). Returns the applied offset.
    pub fn scroll_to_row(&mut self, index: usize) -> u64 {
        let offset = (index as u64).saturating_mul(self.pool.row_height() as u64);
        let offset = self.pool.clamp_scroll_offset(offset);
        self.pending_scroll = None;
        self.bind_at(offset);
        offset
    }

    /// Viewport height changed. Rebuilds the pool when its capacity changes.
    pub fn resize_viewport(&mut self, height: u32) -> bool {
        let rebuilt = self.pool.set_viewport_height(height, &self.columns);
        self.bind_at(self.pool.scroll_offset());
        rebuilt
    }

    pub fn resize_column(&mut self, field: &str, width: u32) -> bool {
        if !self.columns.resize(field, width) {
            return false;
        }
        self.pool.apply_widths(&self.columns);
        true
    }

    pub fn size_columns_to_fit(&mut self, container_width: u32) -> bool {
        if !self.columns.fit_to_width(container_width) {
            return false;
        }
        self.pool.apply_widths(&self.columns);
        true
    }

    /// Shows or hides a column. The visible cell set changes, so the pool is rebuilt.
    pub fn set_column_hidden(&mut self, field: &str, hidden: bool) -> bool {
        if !self.columns.set_hidden(field, hidden) {
            return false;
        }
        self.pool.rebuild(&self.columns);
        self.apply_pipeline();
        true
    }
}
