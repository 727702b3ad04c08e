//! Word-list import from CSV or an xlsx workbook.
//!
//! # Format
//! ```text
//! day,word,meaning
//! Day 1,apple,사과
//! Day 1,"give up","포기하다, 그만두다"
//! ```
//!
//! Header names are trimmed and lower-cased; the Korean headers `데이`,
//! `단어`, `뜻` and `의미` are accepted too. Extra columns are ignored. Every
//! imported row is assigned to the book given by the uploader. Workbooks are
//! read from their first sheet with the same header rules.

use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::error::ImportError;
use crate::types::VocabItem;

/// Parse CSV content into catalog items for `book`.
pub fn parse(content: &str, book: &str) -> Result<Vec<VocabItem>, ImportError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(ImportError::EmptyFile);
    }

    items_from_records(split_records(content)?, book)
}

/// Parse the first sheet of an xlsx workbook into catalog items for `book`.
pub fn parse_xlsx(bytes: &[u8], book: &str) -> Result<Vec<VocabItem>, ImportError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ImportError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyFile)?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let records = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>())
        .filter(|record| record.iter().any(|f| !f.trim().is_empty()))
        .collect();
    items_from_records(records, book)
}

fn items_from_records(records: Vec<Vec<String>>, book: &str) -> Result<Vec<VocabItem>, ImportError> {
    let mut records = records.into_iter();
    let header = records.next().ok_or(ImportError::EmptyFile)?;
    let columns = Columns::from_header(&header)?;

    Ok(records
        .filter_map(|record| columns.item(&record, book))
        .collect())
}

/// Canonical column name for a header cell.
fn canonical(name: &str) -> String {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        "데이" => "day".to_string(),
        "단어" => "word".to_string(),
        "뜻" | "의미" => "meaning".to_string(),
        _ => name,
    }
}

struct Columns {
    day: usize,
    word: usize,
    meaning: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, ImportError> {
        let names: Vec<String> = header.iter().map(|h| canonical(h)).collect();
        let find = |wanted: &str| names.iter().position(|n| n == wanted);

        match (find("day"), find("word"), find("meaning")) {
            (Some(day), Some(word), Some(meaning)) => Ok(Self { day, word, meaning }),
            (day, word, meaning) => {
                let missing: Vec<&str> = [("day", day), ("word", word), ("meaning", meaning)]
                    .into_iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(ImportError::MissingColumns(missing.join(", ")))
            }
        }
    }

    fn item(&self, record: &[String], book: &str) -> Option<VocabItem> {
        let cell = |idx: usize| record.get(idx).map(|s| s.trim()).unwrap_or_default();
        let word = cell(self.word);
        if word.is_empty() {
            return None;
        }
        Some(VocabItem::new(book, cell(self.day), word, cell(self.meaning)))
    }
}

/// Split CSV text into records of fields. Handles quoted fields with
/// embedded commas, doubled quotes and line breaks.
fn split_records(content: &str) -> Result<Vec<Vec<String>>, ImportError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_line = 0;
    let mut line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ImportError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_simple_list() {
        let input = "day,word,meaning\nDay 1,apple,사과\nDay 1,bee,벌\n";
        let items = parse(input, "Voca").unwrap();
        assert_eq!(
            items,
            vec![
                VocabItem::new("Voca", "Day 1", "apple", "사과"),
                VocabItem::new("Voca", "Day 1", "bee", "벌"),
            ]
        );
    }

    #[test]
    fn parse_korean_headers_and_extra_columns() {
        let input = "No, 데이 ,단어,의미\n1,Day 3,cat,고양이";
        let items = parse(input, "Voca").unwrap();
        assert_eq!(items, vec![VocabItem::new("Voca", "Day 3", "cat", "고양이")]);
    }

    #[test]
    fn parse_quoted_fields() {
        let input = "Day,Word,Meaning\r\nDay 2,\"give up\",\"포기하다, \"\"그만두다\"\"\"\r\n";
        let items = parse(input, "Voca").unwrap();
        assert_eq!(items[0].word, "give up");
        assert_eq!(items[0].meaning, "포기하다, \"그만두다\"");
    }

    #[test]
    fn parse_multiline_quoted_meaning() {
        let input = "day,word,meaning\nDay 1,run,\"달리다\n운영하다\"\nDay 1,sit,앉다";
        let items = parse(input, "Voca").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].meaning, "달리다\n운영하다");
    }

    #[test]
    fn skip_blank_rows_and_missing_words() {
        let input = "\u{feff}day,word,meaning\n\n,,\nDay 1,,뜻만\nDay 1,ok,좋아";
        let items = parse(input, "Voca").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].word, "ok");
    }

    #[test]
    fn reject_missing_columns() {
        let result = parse("word,meaning\napple,사과", "Voca");
        assert_eq!(result, Err(ImportError::MissingColumns("day".to_string())));
    }

    #[test]
    fn reject_unterminated_quote() {
        let result = parse("day,word,meaning\nDay 1,\"apple,사과", "Voca");
        assert_eq!(result, Err(ImportError::UnterminatedQuote { line: 2 }));
    }

    #[test]
    fn reject_empty_content() {
        assert_eq!(parse("  \n", "Voca"), Err(ImportError::EmptyFile));
    }

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn parse_xlsx_with_korean_headers() {
        let bytes = workbook(&[
            &["No", "데이", "단어", "뜻"],
            &["1", "Day 1", "apple", "사과"],
            &["", "", "", ""],
            &["2", "Day 2", " bee ", "벌"],
        ]);
        let items = parse_xlsx(&bytes, "Voca").unwrap();
        assert_eq!(
            items,
            vec![
                VocabItem::new("Voca", "Day 1", "apple", "사과"),
                VocabItem::new("Voca", "Day 2", "bee", "벌"),
            ]
        );
    }

    #[test]
    fn parse_xlsx_numeric_day_cells() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Day").unwrap();
        sheet.write_string(0, 1, "Word").unwrap();
        sheet.write_string(0, 2, "Meaning").unwrap();
        sheet.write_number(1, 0, 3.0).unwrap();
        sheet.write_string(1, 1, "cat").unwrap();
        sheet.write_string(1, 2, "고양이").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let items = parse_xlsx(&bytes, "Voca").unwrap();
        assert_eq!(items, vec![VocabItem::new("Voca", "3", "cat", "고양이")]);
    }

    #[test]
    fn parse_xlsx_reports_missing_columns() {
        let bytes = workbook(&[&["word", "의미"], &["apple", "사과"]]);
        assert_eq!(
            parse_xlsx(&bytes, "Voca"),
            Err(ImportError::MissingColumns("day".to_string()))
        );
    }

    #[test]
    fn reject_bytes_that_are_not_a_workbook() {
        let result = parse_xlsx(b"day,word,meaning", "Voca");
        assert!(matches!(result, Err(ImportError::Workbook(_))));
    }
}
