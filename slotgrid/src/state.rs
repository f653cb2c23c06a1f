use crate::{QueryState, SortTerm, query::page_count};

/// A lightweight, serializable snapshot of the paging and sort state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridState {
    pub page: usize,
    pub page_size: usize,
    pub sort_model: Vec<SortTerm>,
}

impl GridState {
    pub fn from_query(query: &QueryState) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
            sort_model: query.sort.clone(),
        }
    }
}

/// Partial state for restoring; unset fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridStatePatch {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_model: Option<Vec<SortTerm>>,
}

impl GridStatePatch {
    /// Applies the patch. Returns whether anything changed.
    pub fn apply(self, query: &mut QueryState) -> bool {
        let before = query.clone();
        if let Some(page_size) = self.page_size {
            query.page_size = page_size.max(1);
        }
        if let Some(page) = self.page {
            query.page = page.max(1);
        }
        if let Some(sort_model) = self.sort_model {
            query.sort = sort_model;
        }
        *query != before
    }
}

impl From<GridState> for GridStatePatch {
    fn from(state: GridState) -> Self {
        Self {
            page: Some(state.page),
            page_size: Some(state.page_size),
            sort_model: Some(state.sort_model),
        }
    }
}

/// Footer summary of the current page.
///
/// Rows are 1-based; `first_row` is 0 when there are no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSummary {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub page_count: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl PageSummary {
    pub fn new(query: &QueryState, total: usize) -> Self {
        let page_size = query.page_size.max(1);
        let page_count = page_count(total, page_size);
        let page = query.page.clamp(1, page_count);
        let first_row = if total == 0 {
            0
        } else {
            (page - 1) * page_size + 1
        };
        Self {
            page,
            page_size,
            total,
            page_count,
            first_row,
            last_row: (page * page_size).min(total),
        }
    }
}
