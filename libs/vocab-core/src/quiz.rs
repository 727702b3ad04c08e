//! Multiple-choice options for objective tests.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::VocabItem;

/// Number of wrong meanings offered next to the correct one.
pub const DISTRACTOR_COUNT: usize = 3;

/// A book needs at least this many meanings to draw distractors from it alone.
const SAME_BOOK_MINIMUM: usize = 4;

/// Meanings eligible as distractors for `item`: the item's own book when it
/// is large enough, otherwise the whole catalog.
fn candidate_meanings<'a>(item: &VocabItem, catalog: &'a [VocabItem]) -> Vec<&'a str> {
    let same_book: Vec<&str> = catalog
        .iter()
        .filter(|c| c.book == item.book)
        .map(|c| c.meaning.as_str())
        .collect();

    if same_book.len() >= SAME_BOOK_MINIMUM {
        same_book
    } else {
        catalog.iter().map(|c| c.meaning.as_str()).collect()
    }
}

/// Pick up to three distinct wrong meanings for `item`.
pub fn pick_distractors<R: Rng + ?Sized>(
    item: &VocabItem,
    catalog: &[VocabItem],
    rng: &mut R,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let distinct: Vec<&str> = candidate_meanings(item, catalog)
        .into_iter()
        .filter(|m| !m.trim().is_empty() && *m != item.meaning && seen.insert(*m))
        .collect();

    distinct
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .map(|m| m.to_string())
        .collect()
}

/// Distractors plus the correct meaning, shuffled.
pub fn build_choices<R: Rng + ?Sized>(
    item: &VocabItem,
    catalog: &[VocabItem],
    rng: &mut R,
) -> Vec<String> {
    let mut choices = pick_distractors(item, catalog, rng);
    choices.push(item.meaning.clone());
    choices.shuffle(rng);
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Vec<VocabItem> {
        vec![
            VocabItem::new("A", "Day 1", "apple", "사과"),
            VocabItem::new("A", "Day 1", "banana", "바나나"),
            VocabItem::new("A", "Day 1", "cherry", "체리"),
            VocabItem::new("A", "Day 2", "grape", "포도"),
            VocabItem::new("A", "Day 2", "lemon", "레몬"),
            VocabItem::new("B", "Day 1", "dog", "개"),
            VocabItem::new("B", "Day 1", "cat", "고양이"),
        ]
    }

    #[test]
    fn distractors_exclude_correct_meaning() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let distractors = pick_distractors(&catalog[0], &catalog, &mut rng);
            assert_eq!(distractors.len(), DISTRACTOR_COUNT);
            assert!(!distractors.contains(&"사과".to_string()));
            let unique: HashSet<_> = distractors.iter().collect();
            assert_eq!(unique.len(), DISTRACTOR_COUNT);
        }
    }

    #[test]
    fn large_book_draws_from_itself() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let book_a: HashSet<&str> = catalog
            .iter()
            .filter(|c| c.book == "A")
            .map(|c| c.meaning.as_str())
            .collect();
        for _ in 0..50 {
            for d in pick_distractors(&catalog[1], &catalog, &mut rng) {
                assert!(book_a.contains(d.as_str()));
            }
        }
    }

    #[test]
    fn small_book_falls_back_to_catalog() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let dog = &catalog[5];
        let mut seen_other_book = false;
        for _ in 0..50 {
            let distractors = pick_distractors(dog, &catalog, &mut rng);
            assert_eq!(distractors.len(), DISTRACTOR_COUNT);
            seen_other_book |= distractors.iter().any(|d| d != "고양이");
        }
        assert!(seen_other_book);
    }

    #[test]
    fn tiny_catalog_uses_what_it_has() {
        let catalog = vec![
            VocabItem::new("A", "Day 1", "apple", "사과"),
            VocabItem::new("A", "Day 1", "pear", "배"),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let choices = build_choices(&catalog[0], &catalog, &mut rng);
        assert_eq!(choices.len(), 2);
        assert!(choices.contains(&"사과".to_string()));
    }

    #[test]
    fn choices_contain_correct_meaning_once() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(11);
        let choices = build_choices(&catalog[2], &catalog, &mut rng);
        assert_eq!(choices.len(), DISTRACTOR_COUNT + 1);
        assert_eq!(choices.iter().filter(|c| c.as_str() == "체리").count(), 1);
    }
}
