use logmill_core::report::ReportTable;

/// Fixed-width column rendering for report output. Logs go to stderr, so
/// stdout carries only the table.
pub fn print_table(table: &ReportTable) {
    if table.rows.is_empty() {
        println!("No data available for this report.");
        return;
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    print_row(table.headers.iter().map(|h| h.to_string()), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    print_row(rule.into_iter(), &widths);
    for row in &table.rows {
        print_row(row.iter().cloned(), &widths);
    }
}

fn print_row(cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    println!("{}", line.join("  "));
}
