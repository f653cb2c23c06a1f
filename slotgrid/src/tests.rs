use crate::*;

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use chrono::NaiveDate;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

fn person(id: i64, name: &str, age: i64) -> Record {
    Record::new()
        .with("id", id)
        .with("name", name)
        .with("age", age)
}

fn people(n: i64) -> RecordStore {
    let mut store = RecordStore::new(Some("id"));
    store.replace(
        (1..=n)
            .map(|i| person(i, &format!("Person {i}"), 20 + i))
            .collect(),
    );
    store
}

fn person_columns() -> Columns {
    Columns::new(
        [
            Column::new("id").with_kind(ValueKind::Number),
            Column::new("name"),
            Column::new("age")
                .with_kind(ValueKind::Number)
                .with_editable(true)
                .with_rule(Rule::range(0.0, 120.0)),
        ],
        true,
    )
}

fn ids(store: &RecordStore, view: &View) -> Vec<i64> {
    view.records(store)
        .map(|r| r.get_field("id").and_then(Value::as_f64).unwrap_or(-1.0) as i64)
        .collect()
}

fn anchor(field: &str) -> CellAnchor {
    CellAnchor {
        view_index: 0,
        slot: None,
        field: field.to_string(),
        rect: EditorRect::default(),
    }
}

#[test]
fn value_display_text() {
    assert_eq!(Value::Null.display_text(), "");
    assert_eq!(Value::from(45.0).display_text(), "45");
    assert_eq!(Value::from(0.5).display_text(), "0.5");
    assert_eq!(Value::from(-0.0).display_text(), "0");
    assert_eq!(Value::from(true).display_text(), "true");
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(Value::from(date).display_text(), "2024-03-09");
    assert_eq!(Value::from(None::<i64>), Value::Null);
}

#[test]
fn mixed_kinds_compare_by_rank() {
    assert_eq!(Value::from(1).compare(&Value::from("a")), Ordering::Less);
    assert_eq!(Value::from("b").compare(&Value::from("a")), Ordering::Greater);
    assert_eq!(Value::from(true).compare(&Value::from(0)), Ordering::Less);
}

#[test]
fn dotted_paths_read_and_create_intermediates() {
    let mut r = Record::new().with("name", "Ann").with("address", "unknown");
    assert_eq!(r.get_field("address.city"), None);

    r.set_field("address.city", "Oslo");
    assert_eq!(r.get_field("address.city"), Some(&Value::from("Oslo")));

    r.set_field("meta.tags.primary", "x");
    assert_eq!(r.get_field("meta.tags.primary"), Some(&Value::from("x")));
    assert!(r.get_field("meta.tags").is_some_and(|v| v.as_map().is_some()));
}

#[test]
fn auto_keys_are_attached_and_stable_across_reingestion() {
    let mut store = RecordStore::new(None);
    store.replace(vec![person(1, "a", 1), person(2, "b", 2)]);
    assert_eq!(store.keys(), &[RowKey::Auto(1), RowKey::Auto(2)]);
    assert_eq!(
        store.get(0).and_then(|r| r.get_field(AUTO_KEY_FIELD)),
        Some(&Value::from(1u64))
    );

    // Re-ingesting the same record objects keeps their keys; new ones continue the sequence.
    let mut again: Vec<Record> = store.records().to_vec();
    again.reverse();
    again.push(person(3, "c", 3));
    store.replace(again);
    assert_eq!(
        store.keys(),
        &[RowKey::Auto(2), RowKey::Auto(1), RowKey::Auto(3)]
    );
}

#[test]
fn auto_key_counters_are_per_store() {
    let mut a = RecordStore::new(None);
    let mut b = RecordStore::new(None);
    a.replace(vec![Record::new(), Record::new()]);
    b.replace(vec![Record::new()]);
    assert_eq!(b.keys(), &[RowKey::Auto(1)]);
}

#[test]
fn configured_keys_fall_back_on_null_or_duplicate() {
    let mut store = RecordStore::new(Some("id"));
    store.replace(vec![
        person(7, "a", 1),
        person(7, "dup", 2),
        Record::new().with("name", "no id"),
        Record::new().with("id", "x-1"),
    ]);
    assert_eq!(store.key_at(0), Some(&RowKey::Int(7)));
    assert!(matches!(store.key_at(1), Some(RowKey::Auto(_))));
    assert!(matches!(store.key_at(2), Some(RowKey::Auto(_))));
    assert_eq!(store.key_at(3), Some(&RowKey::Text("x-1".into())));
    assert_eq!(
        store.get_by_key(&RowKey::Int(7)).and_then(|r| r.get_field("name")),
        Some(&Value::from("a"))
    );
}

#[test]
fn validation_stops_at_first_failing_rule() {
    let rules = [Rule::Required, Rule::range(0.0, 120.0)];
    let err = validate(&rules, "", &ValidationMessages::default()).unwrap_err();
    assert_eq!(err.rule, RuleKind::Required);
    assert_eq!(err.to_string(), "This field is required");
}

#[test]
fn builtin_rules() {
    let m = ValidationMessages::default();
    assert!(Rule::Required.check(" x "));
    assert!(!Rule::Required.check("   "));

    assert!(Rule::Email.check("a@b.io"));
    assert!(!Rule::Email.check("a@b"));
    assert!(!Rule::Email.check("a b@c.d"));
    assert!(!Rule::Email.check(""));

    assert!(Rule::Numeric.check(""));
    assert!(Rule::Numeric.check(" 12.5 "));
    assert!(Rule::Numeric.check("1e3"));
    assert!(!Rule::Numeric.check("12abc"));
    assert!(!Rule::Numeric.check("NaN"));

    let range = Rule::range(0.0, 120.0);
    assert!(range.check(""));
    assert!(range.check("120"));
    assert!(!range.check("-1"));
    assert!(!range.check("abc"));
    assert_eq!(range.message(&m), "Must be between 0 and 120");

    let even = Rule::custom(|s| s.len() % 2 == 0, "even length");
    let err = validate(&[even], "abc", &m).unwrap_err();
    assert_eq!(err.rule, RuleKind::Custom);
    assert_eq!(err.message, "even length");
}

#[test]
fn custom_messages_are_used() {
    let messages = ValidationMessages {
        range: "{min}..{max}".to_string(),
        ..ValidationMessages::default()
    };
    let err = validate(&[Rule::range(1.5, 3.0)], "9", &messages).unwrap_err();
    assert_eq!(err.message, "1.5..3");
}

#[test]
fn search_is_case_insensitive_over_visible_columns() {
    let mut store = RecordStore::new(None);
    store.replace(vec![
        Record::new().with("name", "Alice Chen"),
        Record::new().with("name", "Bob"),
        Record::new().with("name", "ALICIA"),
    ]);
    let cols = Columns::new([Column::new("name")], true);
    let mut q = QueryState::default();
    q.set_search("alice");
    let view = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(view.len(), 1);
    assert_eq!(
        view.record(&store, 0).and_then(|r| r.get_field("name")),
        Some(&Value::from("Alice Chen"))
    );

    q.set_search("  ");
    assert_eq!(recompute(&store, &cols, &q, PipelineMode::Client).len(), 3);
}

#[test]
fn search_ignores_hidden_columns() {
    let mut store = RecordStore::new(None);
    store.replace(vec![Record::new().with("name", "Bob").with("note", "alice")]);
    let mut cols = Columns::new([Column::new("name"), Column::new("note")], false);
    let mut q = QueryState::default();
    q.set_search("alice");
    assert_eq!(recompute(&store, &cols, &q, PipelineMode::Client).len(), 1);
    cols.set_hidden("note", true);
    assert_eq!(recompute(&store, &cols, &q, PipelineMode::Client).len(), 0);
}

#[test]
fn pagination_slices_and_clamps() {
    let store = people(5);
    let cols = person_columns();
    let mut q = QueryState::new(2);
    q.sort.push(SortTerm::asc("id"));

    q.page = 3;
    let view = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(ids(&store, &view), vec![5]);
    assert_eq!(view.total(), 5);
    assert_eq!(q.page_count(view.total()), 3);

    q.page = 10;
    let view = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(view.page(), 3);
    assert_eq!(ids(&store, &view), vec![5]);
    assert!(q.clamp_page(view.total()));
    assert_eq!(q.page, 3);

    q.page = 0;
    let view = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(view.page(), 1);
    assert_eq!(ids(&store, &view), vec![1, 2]);
}

#[test]
fn server_mode_bypasses_client_steps() {
    let store = people(3);
    let cols = person_columns();
    let mut q = QueryState::new(2);
    q.set_search("nothing matches");
    q.sort.push(SortTerm::desc("id"));
    q.page = 4;
    let view = recompute(&store, &cols, &q, PipelineMode::Server { total: 40 });
    assert_eq!(ids(&store, &view), vec![1, 2, 3]);
    assert_eq!(view.total(), 40);
    assert_eq!(view.page(), 4);
}

#[test]
fn nulls_sort_first_ascending_and_last_descending() {
    let mut store = RecordStore::new(None);
    store.replace(vec![
        Record::new().with("n", 2),
        Record::new(),
        Record::new().with("n", 1),
    ]);
    let rows = sort_rows(&store, vec![0, 1, 2], &[SortTerm::asc("n")]);
    assert_eq!(rows, vec![1, 2, 0]);
    let rows = sort_rows(&store, vec![0, 1, 2], &[SortTerm::desc("n")]);
    assert_eq!(rows, vec![0, 2, 1]);
}

#[test]
fn property_multi_key_sort_is_stable() {
    for seed in [1u64, 2, 3, 7, 42, 1234] {
        let mut rng = Lcg::new(seed);
        let n = rng.gen_range_usize(1, 200);
        let mut store = RecordStore::new(None);
        let mut keys: Vec<(i64, Option<i64>)> = Vec::with_capacity(n);
        let records = (0..n)
            .map(|_| {
                let g = rng.gen_range_u64(0, 4) as i64;
                let h = rng.gen_bool().then(|| rng.gen_range_u64(0, 3) as i64);
                keys.push((g, h));
                Record::new().with("g", g).with("h", h)
            })
            .collect();
        store.replace(records);

        let got = sort_rows(
            &store,
            (0..n).collect(),
            &[SortTerm::asc("g"), SortTerm::desc("h")],
        );

        let mut expected: Vec<usize> = (0..n).collect();
        expected.sort_by(|&a, &b| {
            let (ga, ha) = keys[a];
            let (gb, hb) = keys[b];
            ga.cmp(&gb).then_with(|| {
                let asc = match (ha, hb) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(x), Some(y)) => x.cmp(&y),
                };
                asc.reverse()
            })
        });
        assert_eq!(got, expected, "seed {seed}");
    }
}

#[test]
fn property_recompute_is_idempotent() {
    for seed in [3u64, 5, 8, 13] {
        let mut rng = Lcg::new(seed);
        let store = people(rng.gen_range_usize(0, 120) as i64);
        let cols = person_columns();
        let mut q = QueryState::new(rng.gen_range_usize(1, 30));
        if rng.gen_bool() {
            q.sort.push(SortTerm::desc("age"));
        }
        if rng.gen_bool() {
            q.set_search("1");
        }
        q.page = rng.gen_range_usize(1, 6);

        let a = recompute(&store, &cols, &q, PipelineMode::Client);
        let b = recompute(&store, &cols, &q, PipelineMode::Client);
        assert_eq!(a, b, "seed {seed}");
    }
}

#[test]
fn toggle_sort_cycles_and_resets_without_modifier() {
    let mut q = QueryState::default();
    assert_eq!(q.toggle_sort("a", false), Some(SortDirection::Ascending));
    assert_eq!(q.toggle_sort("b", true), Some(SortDirection::Ascending));
    assert_eq!(q.sort, vec![SortTerm::asc("a"), SortTerm::asc("b")]);

    assert_eq!(q.toggle_sort("a", true), Some(SortDirection::Descending));
    assert_eq!(q.sort, vec![SortTerm::asc("b"), SortTerm::desc("a")]);

    assert_eq!(q.toggle_sort("a", true), None);
    assert_eq!(q.sort, vec![SortTerm::asc("b")]);

    q.toggle_sort("b", true);
    assert_eq!(q.toggle_sort("c", false), Some(SortDirection::Ascending));
    assert_eq!(q.sort, vec![SortTerm::asc("c")]);
}

#[test]
fn search_and_page_size_changes_reset_page() {
    let mut q = QueryState::new(10);
    q.page = 4;
    assert!(q.set_search(" bob "));
    assert_eq!(q.search, "bob");
    assert_eq!(q.page, 1);
    q.page = 4;
    assert!(!q.set_search("bob"));
    assert_eq!(q.page, 4);
    assert!(q.set_page_size(20));
    assert_eq!(q.page, 1);
}

#[test]
fn selection_persists_across_sort_filter_and_page() {
    let store = people(10);
    let cols = person_columns();
    let mut sel = SelectionLedger::new(SelectionMode::Multiple);
    let seven = RowKey::Int(7);
    sel.toggle(&seven);

    let mut q = QueryState::new(3);
    q.sort.push(SortTerm::desc("id"));
    let page1 = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(ids(&store, &page1), vec![10, 9, 8]);
    assert_eq!(sel.header_state(page1.keys(&store)), HeaderCheckState::default());

    q.set_search("Person 1");
    let filtered = recompute(&store, &cols, &q, PipelineMode::Client);
    assert!(!filtered.keys(&store).any(|k| *k == seven));

    q.set_search("");
    q.page = 2;
    let page2 = recompute(&store, &cols, &q, PipelineMode::Client);
    assert_eq!(ids(&store, &page2), vec![7, 6, 5]);
    assert!(page2.keys(&store).any(|k| sel.is_row_selected(k)));
    assert_eq!(
        sel.header_state(page2.keys(&store)),
        HeaderCheckState {
            checked: false,
            indeterminate: true
        }
    );

    let rows = sel.selected_rows(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_field("id"), Some(&Value::from(7)));
}

#[test]
fn header_state_tracks_visible_keys_only() {
    let store = people(4);
    let mut sel = SelectionLedger::default();
    let visible = &store.keys()[..2];
    assert_eq!(sel.select_all_visible(visible), 2);
    assert_eq!(
        sel.header_state(visible),
        HeaderCheckState {
            checked: true,
            indeterminate: false
        }
    );
    assert_eq!(sel.len(), 2);
    assert_eq!(
        sel.header_state(store.keys()),
        HeaderCheckState {
            checked: false,
            indeterminate: true
        }
    );
    assert_eq!(
        sel.header_state(std::iter::empty::<&RowKey>()),
        HeaderCheckState::default()
    );

    assert_eq!(sel.deselect_visible(visible), 2);
    assert!(sel.is_empty());

    sel.select_all(&store);
    assert_eq!(sel.len(), 4);
    assert!(sel.clear());
    assert!(!sel.clear());
}

#[test]
fn single_mode_plain_click_clears_other_keys() {
    let mut sel = SelectionLedger::new(SelectionMode::Single);
    let (a, b, c) = (RowKey::Int(1), RowKey::Int(2), RowKey::Int(3));
    assert!(sel.click(&a, false));
    assert!(sel.click(&b, false));
    assert!(!sel.is_row_selected(&a));
    assert!(sel.click(&c, true));
    assert_eq!(sel.len(), 2);
    assert!(!sel.click(&b, false));
    assert!(sel.is_empty());

    let mut multi = SelectionLedger::new(SelectionMode::Multiple);
    multi.click(&a, false);
    multi.click(&b, false);
    assert_eq!(multi.len(), 2);
}

#[test]
fn columns_prepend_selection_and_fit_width() {
    let mut cols = Columns::new(
        [
            Column::new("a"),
            Column::new(SELECT_FIELD),
            Column::new("b").with_min_width(10),
            Column::new("c").with_hidden(true),
        ],
        true,
    );
    assert_eq!(cols.len(), 4);
    assert!(cols.iter().next().is_some_and(Column::is_selection));
    assert_eq!(cols.get("b").map(Column::min_width), Some(MIN_COLUMN_WIDTH));
    assert_eq!(cols.visible_offset("b"), Some(SELECT_COLUMN_WIDTH + 140));

    assert!(cols.fit_to_width(440));
    assert_eq!(cols.get("a").map(Column::width), Some(200));
    assert_eq!(cols.get("b").map(Column::width), Some(200));
    assert_eq!(cols.get("c").map(Column::width), Some(140));
    assert_eq!(cols.get(SELECT_FIELD).map(Column::width), Some(SELECT_COLUMN_WIDTH));

    cols.fit_to_width(50);
    assert_eq!(cols.get("a").map(Column::width), Some(MIN_COLUMN_WIDTH));

    assert!(!cols.resize("a", 5));
    assert_eq!(cols.get("a").map(Column::width), Some(MIN_COLUMN_WIDTH));
    assert!(!cols.resize(SELECT_FIELD, 100));
    assert!(cols.resize("a", 300));
    assert_eq!(cols.total_width(), SELECT_COLUMN_WIDTH + 300 + 60);
}

fn pool_for(n: i64) -> (RecordStore, Columns, View, SelectionLedger, SlotPool) {
    let store = people(n);
    let cols = person_columns();
    let q = QueryState::new(n.max(1) as usize);
    let view = recompute(&store, &cols, &q, PipelineMode::Client);
    let mut pool = SlotPool::new(36, 6, 480);
    pool.ensure_capacity(view.len(), &cols);
    (store, cols, view, SelectionLedger::default(), pool)
}

#[test]
fn pool_capacity_and_window() {
    let (store, cols, view, sel, mut pool) = pool_for(1000);
    assert_eq!(pool.capacity(), 14 + 12);
    assert_eq!(pool.generation(), 1);

    let src = RowSource {
        store: &store,
        view: &view,
        columns: &cols,
        selection: &sel,
    };
    assert!(pool.sync(0, &src));
    assert_eq!(pool.window(), Some(SlotWindow { start: 0, end: 26 }));
    assert_eq!(pool.bind_count(), 26);

    assert!(pool.sync(3600, &src));
    assert_eq!(pool.window(), Some(SlotWindow { start: 94, end: 120 }));
    let slot = pool.slot(0).unwrap();
    assert_eq!(slot.bound(), Some(94));
    assert_eq!(slot.offset(), 94 * 36);
    assert_eq!(slot.cell("id").map(|c| c.text.as_str()), Some("95"));
    assert_eq!(slot.cell(SELECT_FIELD).and_then(|c| c.checked), Some(false));

    let end = pool.max_scroll_offset();
    assert_eq!(end, 1000 * 36 - 480);
    pool.sync(end + 10_000, &src);
    assert_eq!(pool.window(), Some(SlotWindow { start: 974, end: 1000 }));

    let small = pool_for(5).4;
    assert_eq!(small.capacity(), 5);
}

#[test]
fn property_sub_row_scroll_does_not_rebind() {
    let (store, cols, view, sel, mut pool) = pool_for(500);
    let src = RowSource {
        store: &store,
        view: &view,
        columns: &cols,
        selection: &sel,
    };
    let mut rng = Lcg::new(77);
    let mut offset = 1000u64;
    pool.sync(offset, &src);
    for _ in 0..500 {
        let delta = rng.gen_range_u64(0, 36);
        offset = if rng.gen_bool() {
            offset.saturating_add(delta)
        } else {
            offset.saturating_sub(delta)
        }
        .min(pool.max_scroll_offset());

        let before = pool.bind_count();
        let expected = pool.compute_window(offset);
        let changed = pool.window() != Some(expected);
        assert_eq!(pool.sync(offset, &src), changed);
        if changed {
            assert_eq!(pool.bind_count() - before, expected.len() as u64);
        } else {
            assert_eq!(pool.bind_count(), before);
        }
    }
}

#[test]
fn pool_invalidate_rebuild_and_widths() {
    let (store, mut cols, view, mut sel, mut pool) = pool_for(100);
    let src_sync = |pool: &mut SlotPool, cols: &Columns, sel: &SelectionLedger| {
        pool.sync(
            0,
            &RowSource {
                store: &store,
                view: &view,
                columns: cols,
                selection: sel,
            },
        )
    };
    assert!(src_sync(&mut pool, &cols, &sel));
    assert!(!src_sync(&mut pool, &cols, &sel));

    sel.toggle(&RowKey::Int(1));
    pool.invalidate();
    assert!(src_sync(&mut pool, &cols, &sel));
    assert!(pool.slot(0).is_some_and(Slot::is_selected));

    let generation = pool.generation();
    cols.resize("name", 222);
    pool.apply_widths(&cols);
    assert_eq!(pool.generation(), generation);
    assert_eq!(pool.window(), Some(SlotWindow { start: 0, end: 26 }));
    assert_eq!(
        pool.slot(3).and_then(|s| s.cell("name")).map(|c| c.width),
        Some(222)
    );

    let binds = pool.bind_count();
    assert!(!pool.set_viewport_height(470, &cols));
    assert_eq!(pool.window(), Some(SlotWindow { start: 0, end: 26 }));
    assert!(!src_sync(&mut pool, &cols, &sel));
    assert_eq!(pool.bind_count(), binds);

    assert!(pool.set_viewport_height(240, &cols));
    assert_eq!(pool.capacity(), 7 + 12);
    assert_eq!(pool.generation(), generation + 1);
    assert_eq!(pool.window(), None);

    assert!(!pool.refresh_cell(&RowKey::Int(1), "name", "x".into()));
    src_sync(&mut pool, &cols, &sel);
    assert!(pool.refresh_cell(&RowKey::Int(1), "name", "x".into()));
    assert_eq!(pool.slot_for_view_index(3), Some(3));
    assert_eq!(pool.slot_for_view_index(50), None);
}

#[test]
fn edit_scenario_range_refusal_then_commit() {
    let mut store = RecordStore::new(Some("id"));
    store.replace(vec![
        Record::new().with("id", 1).with("age", 200),
        Record::new().with("id", 2).with("age", 30),
        Record::new().with("id", 3).with("age", -5),
    ]);
    let cols = person_columns();
    let age = cols.get("age").unwrap();
    let messages = ValidationMessages::default();
    let mut session = EditSession::new();

    let EditStart::Started { started, superseded } =
        session.start(&store, &RowKey::Int(1), age, anchor("age"))
    else {
        panic!("edit should start");
    };
    assert!(superseded.is_none());
    assert_eq!(started.input, "200");
    assert_eq!(session.phase(), EditPhase::Editing);

    session.set_input("200");
    let CommitOutcome::Refused(err) = session.commit(&mut store, &messages) else {
        panic!("commit should be refused");
    };
    assert_eq!(err.rule, RuleKind::Range);
    assert_eq!(err.message, "Must be between 0 and 120");
    assert_eq!(session.phase(), EditPhase::Editing);
    assert!(session.active().and_then(ActiveEdit::error).is_some());

    session.set_input("45");
    let CommitOutcome::Committed(done) = session.commit(&mut store, &messages) else {
        panic!("commit should succeed");
    };
    assert_eq!(done.old_value, Value::from(200));
    assert_eq!(done.new_value, Value::from(45));
    assert_eq!(session.phase(), EditPhase::Idle);

    let age_of = |id| {
        store
            .get_by_key(&RowKey::Int(id))
            .and_then(|r| r.get_field("age"))
            .cloned()
    };
    assert_eq!(age_of(1), Some(Value::from(45)));
    assert_eq!(age_of(2), Some(Value::from(30)));
    assert_eq!(age_of(3), Some(Value::from(-5)));
}

#[test]
fn edit_rejects_non_editable_and_supersedes_prior_session() {
    let mut store = people(3);
    let cols = person_columns();
    let mut session = EditSession::new();

    let name = cols.get("name").unwrap();
    assert_eq!(
        session.start(&store, &RowKey::Int(1), name, anchor("name")),
        EditStart::Rejected
    );
    assert_eq!(session.phase(), EditPhase::Idle);

    let age = cols.get("age").unwrap();
    session.start(&store, &RowKey::Int(1), age, anchor("age"));
    session.set_input("99");
    let EditStart::Started { superseded, .. } =
        session.start(&store, &RowKey::Int(2), age, anchor("age"))
    else {
        panic!("second edit should start");
    };
    assert_eq!(superseded.map(|c| c.key), Some(RowKey::Int(1)));
    assert_eq!(
        store.get_by_key(&RowKey::Int(1)).and_then(|r| r.get_field("age")),
        Some(&Value::from(21))
    );

    let cancelled = session.cancel().unwrap();
    assert_eq!(cancelled.key, RowKey::Int(2));
    assert!(session.cancel().is_none());
    assert_eq!(
        session.commit(&mut store, &ValidationMessages::default()),
        CommitOutcome::Idle
    );
}

#[test]
fn edit_writes_through_dotted_paths() {
    let mut store = RecordStore::new(None);
    store.replace(vec![Record::new().with("name", "Ann")]);
    let key = store.keys()[0].clone();
    let col = Column::new("address.city").with_editable(true);
    let mut session = EditSession::new();
    session.start(&store, &key, &col, anchor("address.city"));
    assert_eq!(session.active().map(ActiveEdit::input), Some(""));
    session.set_input("Oslo");
    assert!(matches!(
        session.blur(&mut store, &ValidationMessages::default()),
        CommitOutcome::Committed(_)
    ));
    assert_eq!(
        store.get_by_key(&key).and_then(|r| r.get_field("address.city")),
        Some(&Value::from("Oslo"))
    );
}

#[test]
fn coerce_by_kind() {
    assert_eq!(coerce(ValueKind::Number, ""), Value::Null);
    assert_eq!(coerce(ValueKind::Number, " 12 "), Value::from(12));
    assert_eq!(coerce(ValueKind::Number, "twelve"), Value::Null);
    assert_eq!(coerce(ValueKind::Number, "   "), Value::Null);
    assert_eq!(coerce(ValueKind::Text, " a "), Value::from(" a "));
    assert_eq!(coerce(ValueKind::Date, ""), Value::from(""));
    assert_eq!(
        coerce(ValueKind::Date, "2024-02-29"),
        Value::from(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
    assert_eq!(
        coerce(ValueKind::Date, "2024-02-29").display_text(),
        seed_text(&Value::from("2024-02-29"))
    );
    assert_eq!(coerce(ValueKind::Date, "soon"), Value::from("soon"));
    assert_eq!(coerce(ValueKind::Boolean, "TRUE"), Value::from(true));
    assert_eq!(coerce(ValueKind::Boolean, "maybe"), Value::from("maybe"));
}

#[test]
fn editor_rect_insets_cell() {
    let rect = EditorRect::for_cell(180, 140, 4, 36);
    assert_eq!(
        rect,
        EditorRect {
            left: 180,
            top: 4 * 36 + 3,
            width: 134,
            height: 30
        }
    );
}

#[test]
fn page_summary() {
    let mut q = QueryState::new(50);
    q.page = 2;
    let s = PageSummary::new(&q, 120);
    assert_eq!((s.first_row, s.last_row, s.page_count), (51, 100, 3));
    q.page = 3;
    assert_eq!(PageSummary::new(&q, 120).last_row, 120);
    let empty = PageSummary::new(&q, 0);
    assert_eq!((empty.page, empty.first_row, empty.last_row, empty.page_count), (1, 0, 0, 1));
}

#[test]
fn state_patch_applies_only_set_fields() {
    let mut q = QueryState::new(50);
    q.page = 3;
    let patch = GridStatePatch {
        sort_model: Some(vec![SortTerm::desc("age")]),
        ..GridStatePatch::default()
    };
    assert!(patch.apply(&mut q));
    assert_eq!(GridState::from_query(&q).page, 3);
    assert_eq!(q.sort, vec![SortTerm::desc("age")]);
    assert!(!GridStatePatch::from(GridState::from_query(&q)).apply(&mut q));
}

#[test]
fn event_bus_dispatches_by_kind_in_order() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut bus = EventBus::new();
    let first = bus.on(EventKind::Ready, {
        let hits = Arc::clone(&hits);
        move |_| {
            assert_eq!(hits.fetch_add(1, AtomicOrdering::SeqCst), 0);
        }
    });
    bus.on(EventKind::Ready, {
        let hits = Arc::clone(&hits);
        move |_| {
            assert_eq!(hits.fetch_add(1, AtomicOrdering::SeqCst), 1);
        }
    });
    bus.on(EventKind::Error, |_| panic!("not an error"));

    bus.emit(&GridEvent::Ready);
    assert_eq!(hits.load(AtomicOrdering::SeqCst), 2);

    assert!(bus.off(first));
    assert!(!bus.off(first));
    hits.store(1, AtomicOrdering::SeqCst);
    bus.emit(&GridEvent::Ready);
    assert_eq!(hits.load(AtomicOrdering::SeqCst), 2);
    assert!(bus.has_handlers(EventKind::Error));
    assert!(!bus.has_handlers(EventKind::DataLoaded));
}
