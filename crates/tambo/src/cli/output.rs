//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use tambo_db::StoredRecord;

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Print stored rows of one section: id prefix, creation time, then every
/// form column.
pub fn print_records(rows: &[StoredRecord]) {
    let Some(first) = rows.first() else {
        return;
    };
    let columns = first.kind().columns();

    let mut headers = vec!["id", "created"];
    headers.extend(columns.iter().map(|c| c.form_key));

    let body = rows
        .iter()
        .map(|row| {
            let form = row.record.to_form();
            let mut cells = vec![
                short_id(row.id.as_str()),
                row.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ];
            cells.extend(columns.iter().map(|c| {
                form.get(c.form_key)
                    .map(tambo::export::cell)
                    .unwrap_or_default()
            }));
            cells
        })
        .collect();

    print_table(&headers, body);
}

/// First eight characters of an identifier.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Format a number with thousands separators (1234567.8 -> "1,234,567.8").
pub fn format_number(value: f64) -> String {
    let rounded = format!("{:.1}", value);
    let (int_part, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "0"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac == "0" {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}
