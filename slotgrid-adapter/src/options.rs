use slotgrid::{Column, EventBus, EventKind, GridEvent, HandlerId, Record, SelectionMode, ValidationMessages};

use crate::DataSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionOptions {
    pub mode: SelectionMode,
    /// Prepends the checkbox column.
    pub checkbox: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Multiple,
            checkbox: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortingOptions {
    /// Allows the additive modifier to build multi-column sorts.
    pub multi: bool,
    pub server: bool,
}

impl Default for SortingOptions {
    fn default() -> Self {
        Self {
            multi: true,
            server: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilteringOptions {
    pub server: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationOptions {
    pub server: bool,
    pub page_size: usize,
    pub page_sizes: Vec<usize>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            server: false,
            page_size: 50,
            page_sizes: vec![20, 50, 100, 200],
        }
    }
}

impl PaginationOptions {
    /// Page-size choices for the footer, including the configured size; sorted and deduplicated.
    pub fn choices(&self) -> Vec<usize> {
        let mut sizes = self.page_sizes.clone();
        sizes.push(self.page_size);
        sizes.retain(|&n| n > 0);
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualizationOptions {
    pub row_height: u32,
    pub overscan: usize,
}

impl Default for VirtualizationOptions {
    fn default() -> Self {
        Self {
            row_height: 36,
            overscan: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditingOptions {
    /// Keeps the failing rule's message on the live edit for inline display.
    pub show_messages: bool,
}

impl Default for EditingOptions {
    fn default() -> Self {
        Self {
            show_messages: true,
        }
    }
}

/// Configuration for [`crate::Grid`].
///
/// Handlers registered here (via [`GridOptions::on`]) are attached before
/// construction, so they observe the `Ready` notification.
#[derive(Clone, Debug)]
pub struct GridOptions {
    pub columns: Vec<Column>,
    pub data: Vec<Record>,
    /// Record field holding the identity key; auto keys are used when unset.
    pub row_key: Option<String>,
    /// Viewport height in pixels.
    pub height: u32,
    pub selection: SelectionOptions,
    pub sorting: SortingOptions,
    pub filtering: FilteringOptions,
    pub pagination: PaginationOptions,
    pub virtualization: VirtualizationOptions,
    pub editing: EditingOptions,
    pub data_source: Option<DataSource>,
    pub messages: ValidationMessages,
    pub(crate) events: EventBus,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            data: Vec::new(),
            row_key: None,
            height: 480,
            selection: SelectionOptions::default(),
            sorting: SortingOptions::default(),
            filtering: FilteringOptions::default(),
            pagination: PaginationOptions::default(),
            virtualization: VirtualizationOptions::default(),
            editing: EditingOptions::default(),
            data_source: None,
            messages: ValidationMessages::default(),
            events: EventBus::new(),
        }
    }
}

impl GridOptions {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Vec<Record>) -> Self {
        self.data = data;
        self
    }

    pub fn with_row_key(mut self, field: impl Into<String>) -> Self {
        self.row_key = Some(field.into());
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_selection(mut self, mode: SelectionMode, checkbox: bool) -> Self {
        self.selection = SelectionOptions { mode, checkbox };
        self
    }

    pub fn with_multi_sort(mut self, multi: bool) -> Self {
        self.sorting.multi = multi;
        self
    }

    /// Delegates sort, filter and pagination to the data source.
    pub fn with_server(mut self, sorting: bool, filtering: bool, pagination: bool) -> Self {
        self.sorting.server = sorting;
        self.filtering.server = filtering;
        self.pagination.server = pagination;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.pagination.page_size = page_size.max(1);
        self
    }

    pub fn with_page_sizes(mut self, page_sizes: Vec<usize>) -> Self {
        self.pagination.page_sizes = page_sizes;
        self
    }

    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.virtualization.row_height = row_height.max(1);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.virtualization.overscan = overscan;
        self
    }

    pub fn with_show_messages(mut self, show_messages: bool) -> Self {
        self.editing.show_messages = show_messages;
        self
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_source = Some(data_source);
        self
    }

    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Registers a handler before construction.
    pub fn on(
        mut self,
        kind: EventKind,
        handler: impl Fn(&GridEvent) + Send + Sync + 'static,
    ) -> Self {
        self.events.on(kind, handler);
        self
    }

    /// Like [`GridOptions::on`], also returning the handler id.
    pub fn on_with_id(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&GridEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    /// Any server flag is set.
    pub fn server_flags(&self) -> bool {
        self.pagination.server || self.sorting.server || self.filtering.server
    }

    /// A data source is configured and at least one server flag is set.
    pub fn is_server_driven(&self) -> bool {
        self.data_source.is_some() && self.server_flags()
    }
}
