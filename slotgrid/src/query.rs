use core::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Maps an ascending ordering into this direction.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortTerm {
    pub field: String,
    pub direction: SortDirection,
}

impl SortTerm {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Number of pages for `total` rows; never less than one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// The transient query applied to the record store.
///
/// Mutated only by user-facing operations; the pipeline reads it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryState {
    pub search: String,
    pub sort: Vec<SortTerm>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            sort: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Sets the (trimmed) search text. A change moves back to page 1.
    pub fn set_search(&mut self, text: &str) -> bool {
        let text = text.trim();
        if self.search == text {
            return false;
        }
        self.search = text.to_string();
        self.page = 1;
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    pub fn sort_direction(&self, field: &str) -> Option<SortDirection> {
        self.sort
            .iter()
            .find(|t| t.field == field)
            .map(|t| t.direction)
    }

    /// Cycles `field` through ascending, descending and unsorted.
    ///
    /// Without `additive` the sort model collapses to this field alone. With it,
    /// the field moves to the end of the model and other terms stay.
    /// Returns the field's new direction.
    pub fn toggle_sort(&mut self, field: &str, additive: bool) -> Option<SortDirection> {
        let next = match self.sort_direction(field) {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };
        if !additive {
            self.sort.clear();
        }
        self.sort.retain(|t| t.field != field);
        if let Some(direction) = next {
            self.sort.push(SortTerm {
                field: field.to_string(),
                direction,
            });
        }
        next
    }

    pub fn page_count(&self, total: usize) -> usize {
        page_count(total, self.page_size)
    }

    /// Clamps `page` into `[1, page_count(total)]`. Returns whether it moved.
    pub fn clamp_page(&mut self, total: usize) -> bool {
        let clamped = self.page.clamp(1, self.page_count(total));
        let moved = clamped != self.page;
        self.page = clamped;
        moved
    }

    /// Index of the first row on the current page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(50)
    }
}
