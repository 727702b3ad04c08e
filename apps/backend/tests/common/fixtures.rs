//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};

pub const TEACHER: (&str, &str) = ("t_eng", "1234");
pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const STUDENT: (&str, &str) = ("student1", "1234");
pub const PARENT: (&str, &str) = ("parent1", "1234");

/// Word list in the upload format: (day, word, meaning).
pub const WORDS: [(&str, &str, &str); 6] = [
    ("Day 1", "apple", "사과"),
    ("Day 1", "bee", "벌"),
    ("Day 1", "cat", "고양이"),
    ("Day 2", "dog", "개"),
    ("Day 2", "egg", "달걀"),
    ("Day 10", "fish", "물고기"),
];

/// CSV body with a header row.
pub fn word_list_csv() -> String {
    let mut csv = String::from("Day,Word,Meaning\n");
    for (day, word, meaning) in WORDS {
        csv.push_str(&format!("{day},{word},{meaning}\n"));
    }
    csv
}

/// The same words as an xlsx workbook with Korean headers.
pub fn word_list_xlsx() -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["데이", "단어", "의미"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header).unwrap();
    }
    for (row, (day, word, meaning)) in WORDS.into_iter().enumerate() {
        let row = row as u32 + 1;
        sheet.write_string(row, 0, day).unwrap();
        sheet.write_string(row, 1, word).unwrap();
        sheet.write_string(row, 2, meaning).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

pub fn import_request(book: &str) -> Value {
    json!({ "book": book, "content": word_list_csv() })
}

pub fn word_for_meaning(meaning: &str) -> &'static str {
    WORDS
        .iter()
        .find(|(_, _, m)| *m == meaning)
        .map(|(_, w, _)| *w)
        .unwrap()
}

pub fn meaning_for_word(word: &str) -> &'static str {
    WORDS
        .iter()
        .find(|(_, w, _)| *w == word)
        .map(|(_, _, m)| *m)
        .unwrap()
}

pub fn chapter_session(book: &str, day: &str, mode: &str) -> Value {
    json!({
        "source": { "kind": "chapter", "book": book, "day": day },
        "mode": mode,
    })
}

pub fn test_session(book: &str, start_day: &str, end_day: &str, count: usize, mode: &str) -> Value {
    json!({
        "source": {
            "kind": "test",
            "book": book,
            "start_day": start_day,
            "end_day": end_day,
            "count": count,
        },
        "mode": mode,
    })
}
