use super::render_ansi;
use crate::entry::NameStatus;
use crate::session::SessionSnapshot;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::io::{self, IsTerminal};

fn status_color(status: NameStatus) -> Color {
    match status {
        NameStatus::Valid => Color::Green,
        NameStatus::NoChange => Color::DarkGrey,
        NameStatus::Invalid | NameStatus::Duplicated => Color::Red,
    }
}

/// Render a session as an Old / New / Status table.
///
/// The New column shows the annotated preview while a chain is pending,
/// otherwise the current candidate.
pub fn render_table(snapshot: &SessionSnapshot, use_color: bool) -> String {
    let mut table = Table::new();
    if io::stdout().is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    } else {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }

    if use_color {
        table.enforce_styling();
        table.set_header(vec![
            Cell::new("Old").fg(Color::Cyan),
            Cell::new("New").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);
    } else {
        table.set_header(vec!["Old", "New", "Status"]);
    }

    for row in &snapshot.rows {
        let old = if snapshot.config.show_full_path {
            row.original_path.clone()
        } else {
            row.original_name.clone()
        };
        let status = if use_color {
            Cell::new(row.status.to_string()).fg(status_color(row.status))
        } else {
            Cell::new(row.status.to_string())
        };
        table.add_row(vec![
            Cell::new(old),
            Cell::new(render_ansi(&row.preview, use_color)),
            status,
        ]);
    }

    table.to_string()
}
