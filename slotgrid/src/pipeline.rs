//! Search → sort → paginate.
//!
//! The pipeline is a pure function of the store, the column set and the query.
//! It produces a fresh [`View`] of store positions; records are never cloned.

use core::cmp::Ordering;

use crate::{Columns, FieldPath, QueryState, Record, RecordStore, RowKey, SortDirection, SortTerm};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineMode {
    /// Search, sort and pagination run locally.
    Client,
    /// The store already holds the server's page; `total` is server-reported.
    Server { total: usize },
}

/// The current, presented sequence of rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct View {
    rows: Vec<usize>,
    total: usize,
    page: usize,
}

impl View {
    /// Store positions in presentation order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count before pagination (or the server-reported total).
    pub fn total(&self) -> usize {
        self.total
    }

    /// The effective (clamped) page this view was cut from.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Store position of view row `index`.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.rows.get(index).copied()
    }

    pub fn record<'s>(&self, store: &'s RecordStore, index: usize) -> Option<&'s Record> {
        store.get(self.get(index)?)
    }

    pub fn key<'s>(&self, store: &'s RecordStore, index: usize) -> Option<&'s RowKey> {
        store.key_at(self.get(index)?)
    }

    pub fn keys<'a>(&'a self, store: &'a RecordStore) -> impl Iterator<Item = &'a RowKey> + 'a {
        self.rows.iter().filter_map(move |&pos| store.key_at(pos))
    }

    pub fn records<'a>(&'a self, store: &'a RecordStore) -> impl Iterator<Item = &'a Record> + 'a {
        self.rows.iter().filter_map(move |&pos| store.get(pos))
    }
}

/// Applies `query` to `store` and returns the new view.
pub fn recompute(
    store: &RecordStore,
    columns: &Columns,
    query: &QueryState,
    mode: PipelineMode,
) -> View {
    let view = match mode {
        PipelineMode::Server { total } => View {
            rows: (0..store.len()).collect(),
            total,
            page: query.page.max(1),
        },
        PipelineMode::Client => {
            let rows = filter_rows(store, columns, &query.search);
            let rows = sort_rows(store, rows, &query.sort);
            let total = rows.len();
            let page = query.page.clamp(1, query.page_count(total));
            let start = (page - 1).saturating_mul(query.page_size).min(total);
            let end = start.saturating_add(query.page_size).min(total);
            View {
                rows: rows[start..end].to_vec(),
                total,
                page,
            }
        }
    };
    gdebug!(
        store = store.len(),
        rows = view.rows.len(),
        total = view.total,
        page = view.page,
        "pipeline::recompute"
    );
    view
}

/// Keeps store positions whose visible data columns contain `search`, case-insensitively.
pub fn filter_rows(store: &RecordStore, columns: &Columns, search: &str) -> Vec<usize> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return (0..store.len()).collect();
    }
    let paths: Vec<&FieldPath> = columns.searchable().map(|c| c.path()).collect();
    store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            paths.iter().any(|path| {
                record
                    .get(path)
                    .and_then(|v| v.search_text())
                    .is_some_and(|text| text.contains(&needle))
            })
        })
        .map(|(pos, _)| pos)
        .collect()
}

/// Stable multi-key sort of store positions.
///
/// Rows are decorated with their incoming index and ties on every term fall
/// back to that index, so equal rows keep their relative order regardless of
/// the underlying sort algorithm.
pub fn sort_rows(store: &RecordStore, rows: Vec<usize>, sort: &[SortTerm]) -> Vec<usize> {
    if sort.is_empty() || rows.len() < 2 {
        return rows;
    }
    let terms: Vec<(FieldPath, SortDirection)> = sort
        .iter()
        .map(|t| (FieldPath::parse(&t.field), t.direction))
        .collect();

    let mut decorated: Vec<(usize, usize)> = rows.into_iter().enumerate().collect();
    decorated.sort_unstable_by(|&(ia, pa), &(ib, pb)| {
        compare_records(store.get(pa), store.get(pb), &terms).then(ia.cmp(&ib))
    });
    decorated.into_iter().map(|(_, pos)| pos).collect()
}

fn compare_records(
    a: Option<&Record>,
    b: Option<&Record>,
    terms: &[(FieldPath, SortDirection)],
) -> Ordering {
    for (path, direction) in terms {
        let av = a.and_then(|r| r.get(path)).filter(|v| !v.is_null());
        let bv = b.and_then(|r| r.get(path)).filter(|v| !v.is_null());
        let ord = match (av, bv) {
            (None, None) => continue,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(av), Some(bv)) => av.compare(bv),
        };
        if ord != Ordering::Equal {
            return direction.apply(ord);
        }
    }
    Ordering::Equal
}
