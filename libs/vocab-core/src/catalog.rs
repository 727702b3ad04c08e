//! The vocabulary catalog: books, their days, and the words in them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::types::VocabItem;

/// One piece of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Text(String),
    Number(u64),
}

/// Sort key that orders digit runs numerically: "Day 2" < "Day 10".
pub fn natural_sort_key(s: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !text.is_empty() || parts.is_empty() {
                parts.push(KeyPart::Text(std::mem::take(&mut text).to_lowercase()));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                parts.push(KeyPart::Number(
                    std::mem::take(&mut digits).parse().unwrap_or(u64::MAX),
                ));
            }
            text.push(c);
        }
    }
    if !digits.is_empty() {
        parts.push(KeyPart::Number(digits.parse().unwrap_or(u64::MAX)));
    }
    if !text.is_empty() || parts.is_empty() {
        parts.push(KeyPart::Text(text.to_lowercase()));
    }
    parts
}

/// Compare two labels in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}

/// In-memory view of the vocabulary table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<VocabItem>,
}

impl Catalog {
    pub fn new(items: Vec<VocabItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[VocabItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<VocabItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct book names, sorted.
    pub fn books(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|i| i.book.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct days of a book in natural order.
    pub fn days(&self, book: &str) -> Vec<String> {
        let mut days: Vec<String> = self
            .book_items(book)
            .map(|i| i.day.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        days.sort_by(|a, b| natural_cmp(a, b));
        days
    }

    pub fn book_items<'a>(&'a self, book: &'a str) -> impl Iterator<Item = &'a VocabItem> + 'a {
        self.items.iter().filter(move |i| i.book == book)
    }

    /// Words of one chapter, in catalog order.
    pub fn chapter(&self, book: &str, day: &str) -> Vec<VocabItem> {
        self.book_items(book)
            .filter(|i| i.day == day)
            .cloned()
            .collect()
    }

    /// Words of a book whose day lies in `[start_day, end_day]` in natural
    /// day order. Empty when either day is unknown or start comes after end.
    pub fn day_range(&self, book: &str, start_day: &str, end_day: &str) -> Vec<VocabItem> {
        let days = self.days(book);
        let (Some(start), Some(end)) = (
            days.iter().position(|d| d == start_day),
            days.iter().position(|d| d == end_day),
        ) else {
            return Vec::new();
        };
        if start > end {
            return Vec::new();
        }
        let selected = &days[start..=end];
        self.book_items(book)
            .filter(|i| selected.contains(&i.day))
            .cloned()
            .collect()
    }

    /// First entry for (book, word).
    pub fn find(&self, book: &str, word: &str) -> Option<&VocabItem> {
        self.items.iter().find(|i| i.book == book && i.word == word)
    }

    /// Append imported items.
    pub fn extend(&mut self, items: impl IntoIterator<Item = VocabItem>) {
        self.items.extend(items);
    }

    /// Rename a book. Returns the number of items moved.
    pub fn rename_book(&mut self, from: &str, to: &str) -> usize {
        let mut count = 0;
        for item in self.items.iter_mut().filter(|i| i.book == from) {
            item.book = to.to_string();
            count += 1;
        }
        count
    }

    /// Remove a book. Returns the number of items removed.
    pub fn delete_book(&mut self, book: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.book != book);
        before - self.items.len()
    }
}
