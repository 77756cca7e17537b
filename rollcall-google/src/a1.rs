//! A1 range notation.

/// Column letters for a 1-based column index: 1 → `A`, 27 → `AA`.
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// `'Sheet'!A2:G5` for a block of `rows` × `columns` cells at `(row, column)`.
pub fn a1_range(sheet: &str, row: usize, column: usize, rows: usize, columns: usize) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet(sheet),
        column_letters(column),
        row,
        column_letters(column + columns.max(1) - 1),
        row + rows.max(1) - 1
    )
}

/// Range naming a whole sheet.
pub(crate) fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}
