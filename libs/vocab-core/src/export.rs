//! Printable wrong-word sheets.

use serde::Serialize;

/// Header row of a two-column sheet.
pub const SHEET_HEADERS: [&str; 5] = ["단어1", "뜻1", "공백", "단어2", "뜻2"];

/// Byte-order mark so spreadsheet tools detect UTF-8.
const BOM: &str = "\u{feff}";

/// One printed line: a pair on the left, an optional pair on the right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetRow {
    pub word_left: String,
    pub meaning_left: String,
    pub word_right: String,
    pub meaning_right: String,
}

impl SheetRow {
    fn cells(&self) -> [&str; 5] {
        [
            self.word_left.as_str(),
            self.meaning_left.as_str(),
            "",
            self.word_right.as_str(),
            self.meaning_right.as_str(),
        ]
    }
}

/// Lay out `(word, meaning)` pairs in two columns. The first `ceil(n/2)`
/// pairs go left, the rest right.
pub fn two_column_sheet(pairs: &[(String, String)]) -> Vec<SheetRow> {
    let half = pairs.len().div_ceil(2);
    let (left, right) = pairs.split_at(half);

    left.iter()
        .enumerate()
        .map(|(i, (word, meaning))| {
            let (word_right, meaning_right) = right.get(i).cloned().unwrap_or_default();
            SheetRow {
                word_left: word.clone(),
                meaning_left: meaning.clone(),
                word_right,
                meaning_right,
            }
        })
        .collect()
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_line(out: &mut String, cells: &[&str]) {
    let line: Vec<String> = cells.iter().map(|c| escape_field(c)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Render a sheet as CSV with a UTF-8 byte-order mark.
pub fn to_csv(rows: &[SheetRow]) -> String {
    let mut out = String::from(BOM);
    write_line(&mut out, &SHEET_HEADERS);
    for row in rows {
        write_line(&mut out, &row.cells());
    }
    out
}
