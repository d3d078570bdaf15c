use comfy_table::{Table, presets::UTF8_FULL, ContentArrangement, Cell};

use crate::inventory::{Inventory, InventoryRecord, ResultFilter};

/// Renders the filtered records as a table on stdout.
pub fn print_results(inventory: &Inventory, filter: &ResultFilter, show_sources: bool) {
    println!("{}", render_table(inventory.filtered(filter), show_sources));
}

/// Builds the result table; the Sources column is only present on request.
pub fn render_table<'a>(
    records: impl Iterator<Item = &'a InventoryRecord>,
    show_sources: bool,
) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if show_sources {
        table.set_header(vec![
            "Type",
            "Brand",
            "Model",
            "Serial",
            "Location/Owner",
            "Extra",
            "Sources",
        ]);
    } else {
        table.set_header(vec![
            "Type",
            "Brand",
            "Model",
            "Serial",
            "Location/Owner",
            "Extra",
        ]);
    }
    for r in records {
        let mut row = vec![
            Cell::new(&r.kind),
            Cell::new(&r.brand),
            Cell::new(&r.model),
            Cell::new(&r.serial),
            Cell::new(&r.location),
            Cell::new(r.extra.join(";")),
        ];
        if show_sources {
            row.push(Cell::new(r.sources.join(",")));
        }
        table.add_row(row);
    }
    table
}
