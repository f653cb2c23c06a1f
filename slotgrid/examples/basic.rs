// Example: run the pipeline over an in-memory store and bind a slot pool.
use slotgrid::{
    Column, Columns, PipelineMode, QueryState, Record, RecordStore, RowSource, SelectionLedger,
    SelectionMode, SlotPool, ValueKind, recompute,
};

fn main() {
    let columns = Columns::new(
        [
            Column::new("id").with_kind(ValueKind::Number),
            Column::new("name"),
            Column::new("team.city"),
        ],
        true,
    );

    let mut store = RecordStore::new(Some("id"));
    store.replace(
        (0..10_000i64)
            .map(|i| {
                Record::new()
                    .with("id", i)
                    .with("name", format!("Person {i}"))
                    .with("team.city", if i % 3 == 0 { "Oslo" } else { "Lima" })
            })
            .collect(),
    );

    let mut query = QueryState::new(1_000);
    query.set_search("oslo");
    query.toggle_sort("id", false);
    query.toggle_sort("id", false);
    let view = recompute(&store, &columns, &query, PipelineMode::Client);
    println!("matches={} page_rows={} page={}", view.total(), view.len(), view.page());

    let mut selection = SelectionLedger::new(SelectionMode::Multiple);
    if let Some(key) = view.key(&store, 0) {
        selection.toggle(key);
    }

    let mut pool = SlotPool::new(36, 6, 480);
    pool.ensure_capacity(view.len(), &columns);
    let src = RowSource {
        store: &store,
        view: &view,
        columns: &columns,
        selection: &selection,
    };
    pool.sync(0, &src);
    println!("capacity={} window={:?}", pool.capacity(), pool.window());

    let moved = pool.sync(10, &src);
    println!("sub-row scroll rebound={moved}");
    pool.sync(pool.clamp_scroll_offset(20_000), &src);
    println!("after jump: window={:?} binds={}", pool.window(), pool.bind_count());

    if let Some(slot) = pool.slot(0) {
        let cells: Vec<_> = slot.cells().iter().map(|c| c.text.as_str()).collect();
        println!("slot0 bound={:?} cells={cells:?}", slot.bound());
    }
}
