use serde_json::json;
use slotgrid::{Column, EventKind, GridEvent, ValueKind};
use slotgrid_adapter::{
    DataSource, FetchError, FetchRequest, Grid, GridOptions, SchemaMapping,
};

const TOTAL: usize = 95;

// Pretends to be a server: pages over synthetic rows and honors the sort direction on `id`.
fn serve(request: &FetchRequest) -> Result<serde_json::Value, FetchError> {
    let descending = request
        .sort
        .first()
        .is_some_and(|t| t.field == "id" && t.direction == slotgrid::SortDirection::Descending);
    let start = (request.page - 1) * request.page_size;
    let rows: Vec<_> = (start..(start + request.page_size).min(TOTAL))
        .map(|i| if descending { TOTAL - 1 - i } else { i })
        .map(|id| json!({ "id": id, "name": format!("Row {id}") }))
        .collect();
    println!("serve {}", request.to_json());
    Ok(json!({ "result": { "rows": rows, "count": TOTAL } }))
}

fn main() {
    // Example: a server-driven grid. The host owns the transport and the frame loop:
    // - hand pending fetches to the transport (`drive`)
    // - forward scroll offsets and call `on_frame` once per tick
    // - read slot contents back for rendering
    let options = GridOptions::new([
        Column::new("id").with_kind(ValueKind::Number),
        Column::new("name"),
    ])
    .with_row_key("id")
    .with_page_size(20)
    .with_data_source(DataSource::new().with_schema(SchemaMapping::new("result.rows", "result.count")))
    .with_server(true, true, true)
    .on(EventKind::DataLoaded, |e| {
        if let GridEvent::DataLoaded { data, total } = e {
            println!("loaded rows={} total={total}", data.len());
        }
    })
    .on(EventKind::Error, |e| println!("error: {e:?}"));

    let mut grid = Grid::new(options);
    let mut transport = serve;
    grid.drive(&mut transport);

    grid.go_to_page(5);
    grid.drive(&mut transport);
    println!("summary={:?}", grid.page_summary());

    grid.toggle_sort("id", false);
    grid.toggle_sort("id", false);
    grid.drive(&mut transport);

    grid.on_scroll(200);
    grid.on_frame();
    for slot in grid.pool().slots().iter().take(3) {
        let cells: Vec<_> = slot.cells().iter().map(|c| c.text.as_str()).collect();
        println!("slot {} -> {:?} {cells:?}", slot.index(), slot.bound());
    }

    // A stale response is dropped without touching the grid.
    let stale = grid.reload();
    grid.reload();
    if let Some(ticket) = stale {
        println!("stale={:?}", grid.resolve_fetch(ticket, Ok(json!({}))));
    }
    grid.drive(&mut transport);
}
