use crate::{Columns, RecordStore, RowKey, SelectionLedger, View};

/// Half-open range `[start, end)` of view indices currently bound to slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotWindow {
    pub start: usize,
    pub end: usize, // exclusive
}

impl SlotWindow {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// One cell of a slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotCell {
    pub field: String,
    pub text: String,
    /// Checkbox state; only set on the selection column.
    pub checked: Option<bool>,
    pub width: u32,
    pub min_width: u32,
}

/// A reusable visual row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    index: usize,
    bound: Option<usize>,
    key: Option<RowKey>,
    offset: u64,
    selected: bool,
    cells: Vec<SlotCell>,
}

impl Slot {
    fn new(index: usize, columns: &Columns) -> Self {
        let cells = columns
            .visible()
            .map(|c| SlotCell {
                field: c.field().to_string(),
                text: String::new(),
                checked: c.is_selection().then_some(false),
                width: c.width(),
                min_width: c.min_width(),
            })
            .collect();
        Self {
            index,
            cells,
            ..Self::default()
        }
    }

    /// Position in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Absolute view index this slot shows, if bound.
    pub fn bound(&self) -> Option<usize> {
        self.bound
    }

    pub fn key(&self) -> Option<&RowKey> {
        self.key.as_ref()
    }

    /// Vertical translation in pixels.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn cells(&self) -> &[SlotCell] {
        &self.cells
    }

    pub fn cell(&self, field: &str) -> Option<&SlotCell> {
        self.cells.iter().find(|c| c.field == field)
    }

    fn unbind(&mut self) {
        self.bound = None;
        self.key = None;
        self.selected = false;
        for cell in &mut self.cells {
            cell.text.clear();
            if cell.checked.is_some() {
                cell.checked = Some(false);
            }
        }
    }
}

/// Everything a slot needs to bind a view row.
#[derive(Clone, Copy, Debug)]
pub struct RowSource<'a> {
    pub store: &'a RecordStore,
    pub view: &'a View,
    pub columns: &'a Columns,
    pub selection: &'a SelectionLedger,
}

/// Fixed-height row recycler.
///
/// Holds exactly `capacity` slots. A capacity change reallocates the arena
/// (a rebuild); a scroll only overwrites bindings (a rebind), and only when the
/// bound window moves.
#[derive(Clone, Debug)]
pub struct SlotPool {
    slots: Vec<Slot>,
    row_height: u32,
    overscan: usize,
    viewport_height: u32,
    view_len: usize,
    scroll_offset: u64,
    window: Option<SlotWindow>,
    generation: u64,
    bind_count: u64,
}

impl SlotPool {
    pub fn new(row_height: u32, overscan: usize, viewport_height: u32) -> Self {
        gdebug!(row_height, overscan, viewport_height, "SlotPool::new");
        Self {
            slots: Vec::new(),
            row_height: row_height.max(1),
            overscan,
            viewport_height,
            view_len: 0,
            scroll_offset: 0,
            window: None,
            generation: 0,
            bind_count: 0,
        }
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn view_len(&self) -> usize {
        self.view_len
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Window bound by the last [`SlotPool::sync`], `None` after a rebuild or invalidation.
    pub fn window(&self) -> Option<SlotWindow> {
        self.window
    }

    /// Incremented on every structural rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cumulative number of slot bindings performed.
    pub fn bind_count(&self) -> u64 {
        self.bind_count
    }

    /// `min(view_len, ceil(viewport / row_height) + 2 * overscan)`.
    pub fn capacity_for(&self, view_len: usize) -> usize {
        let visible = self.viewport_height.div_ceil(self.row_height) as usize;
        view_len.min(visible.saturating_add(self.overscan.saturating_mul(2)))
    }

    /// Records the view length and rebuilds if the required capacity changed.
    /// Returns whether a rebuild happened.
    pub fn ensure_capacity(&mut self, view_len: usize, columns: &Columns) -> bool {
        self.view_len = view_len;
        let want = self.capacity_for(view_len);
        if want == self.slots.len() {
            return false;
        }
        self.rebuild_with(want, columns);
        true
    }

    /// Reallocates the arena at the current capacity (e.g. the visible column set changed).
    pub fn rebuild(&mut self, columns: &Columns) {
        let size = self.capacity_for(self.view_len);
        self.rebuild_with(size, columns);
    }

    fn rebuild_with(&mut self, size: usize, columns: &Columns) {
        self.slots = (0..size).map(|i| Slot::new(i, columns)).collect();
        self.window = None;
        self.generation = self.generation.saturating_add(1);
        gdebug!(
            size,
            view_len = self.view_len,
            generation = self.generation,
            "SlotPool::rebuild"
        );
    }

    /// Updates the viewport height; rebuilds when capacity changes.
    ///
    /// Bindings stay valid otherwise: the next [`SlotPool::sync`] rebinds only if
    /// the window moved.
    pub fn set_viewport_height(&mut self, height: u32, columns: &Columns) -> bool {
        if self.viewport_height == height {
            return false;
        }
        self.viewport_height = height;
        self.ensure_capacity(self.view_len, columns)
    }

    /// Moves back to the top without binding; the next [`SlotPool::sync`] rebinds.
    pub fn reset_scroll(&mut self) {
        self.scroll_offset = 0;
        self.window = None;
    }

    /// Forces the next [`SlotPool::sync`] to rebind even if the window is unchanged.
    pub fn invalidate(&mut self) {
        self.window = None;
    }

    pub fn total_height(&self) -> u64 {
        (self.view_len as u64).saturating_mul(self.row_height as u64)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_height()
            .saturating_sub(self.viewport_height as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// The window for `scroll_offset`.
    ///
    /// `start = clamp(floor(offset / row_height) - overscan, 0, len - capacity)`,
    /// `end = min(start + capacity, len)`.
    pub fn compute_window(&self, scroll_offset: u64) -> SlotWindow {
        let pool = self.slots.len();
        if pool == 0 || self.view_len == 0 {
            return SlotWindow::default();
        }
        let first = (scroll_offset / self.row_height as u64).min(usize::MAX as u64) as usize;
        let start = first
            .saturating_sub(self.overscan)
            .min(self.view_len.saturating_sub(pool));
        let end = start.saturating_add(pool).min(self.view_len);
        SlotWindow { start, end }
    }

    /// Binds slots for `scroll_offset`. Returns `false` (and touches nothing)
    /// when the window is unchanged.
    pub fn sync(&mut self, scroll_offset: u64, src: &RowSource<'_>) -> bool {
        self.scroll_offset = scroll_offset;
        let window = self.compute_window(scroll_offset);
        if self.window == Some(window) {
            gtrace!(scroll_offset, start = window.start, end = window.end, "sync: no-op");
            return false;
        }

        let row_height = self.row_height as u64;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let abs = window.start + i;
            if abs >= window.end {
                slot.unbind();
                continue;
            }
            let (Some(record), Some(key)) = (src.view.record(src.store, abs), src.view.key(src.store, abs))
            else {
                slot.unbind();
                continue;
            };
            let selected = src.selection.is_row_selected(key);
            slot.bound = Some(abs);
            slot.key = Some(key.clone());
            slot.offset = (abs as u64).saturating_mul(row_height);
            slot.selected = selected;
            for (cell, column) in slot.cells.iter_mut().zip(src.columns.visible()) {
                if column.is_selection() {
                    cell.text.clear();
                    cell.checked = Some(selected);
                } else {
                    cell.text = record
                        .get(column.path())
                        .map(|v| v.display_text())
                        .unwrap_or_default();
                }
            }
            self.bind_count = self.bind_count.saturating_add(1);
        }

        gtrace!(
            scroll_offset,
            start = window.start,
            end = window.end,
            "sync: rebound"
        );
        self.window = Some(window);
        true
    }

    /// Restyles cell widths without touching bindings or the scroll offset.
    pub fn apply_widths(&mut self, columns: &Columns) {
        for slot in &mut self.slots {
            for cell in &mut slot.cells {
                if let Some(column) = columns.get(&cell.field) {
                    cell.width = column.width();
                    cell.min_width = column.min_width();
                }
            }
        }
    }

    /// Sets the selected look of one slot. Returns `false` for unknown or unbound slots.
    pub fn set_slot_selected(&mut self, slot: usize, selected: bool) -> bool {
        let Some(slot) = self.slots.get_mut(slot) else {
            return false;
        };
        if slot.bound.is_none() {
            return false;
        }
        slot.selected = selected;
        for cell in &mut slot.cells {
            if cell.checked.is_some() {
                cell.checked = Some(selected);
            }
        }
        true
    }

    /// Re-reads the selected look of every bound slot from `selection`.
    pub fn refresh_selection(&mut self, selection: &SelectionLedger) {
        for i in 0..self.slots.len() {
            let selected = self.slots[i]
                .key
                .as_ref()
                .is_some_and(|k| selection.is_row_selected(k));
            self.set_slot_selected(i, selected);
        }
    }

    /// Overwrites one cell's text on the slot currently showing `key`.
    pub fn refresh_cell(&mut self, key: &RowKey, field: &str, text: String) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.key.as_ref() == Some(key))
        else {
            return false;
        };
        let Some(cell) = slot.cells.iter_mut().find(|c| c.field == field) else {
            return false;
        };
        cell.text = text;
        true
    }

    /// Slot currently bound to view index `index`.
    pub fn slot_for_view_index(&self, index: usize) -> Option<usize> {
        let window = self.window?;
        window.contains(index).then(|| index - window.start)
    }
}
