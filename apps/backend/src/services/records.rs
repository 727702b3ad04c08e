//! Learning log calendar and score statistics.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{CalendarEvent, LearningLogEntry, ScoreAverage, ScoreEntry, User};

const MATH_COLOR: &str = "#EF4444";
const ENGLISH_COLOR: &str = "#10B981";
const OTHER_COLOR: &str = "#3B82F6";

/// Calendar color for a subject.
pub fn subject_color(subject: &str) -> &'static str {
    if subject.contains("수학") {
        MATH_COLOR
    } else if subject.contains("영어") {
        ENGLISH_COLOR
    } else {
        OTHER_COLOR
    }
}

/// One calendar event per log entry of `student_id`.
pub fn calendar_events(logs: &[LearningLogEntry], student_id: &str) -> Vec<CalendarEvent> {
    logs.iter()
        .filter(|l| l.student_id == student_id)
        .map(|l| CalendarEvent {
            title: format!("[{}]", l.subject),
            start: l.date.clone(),
            color: subject_color(&l.subject).to_string(),
        })
        .collect()
}

/// Classes of the students that have scores, sorted.
pub fn score_classes(scores: &[ScoreEntry], users: &[User]) -> Vec<String> {
    let by_id: HashMap<&str, &User> = users.iter().map(|u| (u.id.as_str(), u)).collect();
    scores
        .iter()
        .filter_map(|s| by_id.get(s.student_id.as_str()))
        .flat_map(|u| [u.math_class.as_str(), u.eng_class.as_str()])
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("nan") && !c.eq_ignore_ascii_case("none"))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Scores whose student belongs to `class` (math or English).
pub fn filter_by_class<'a>(
    scores: &'a [ScoreEntry],
    users: &[User],
    class: &str,
) -> Vec<&'a ScoreEntry> {
    let members: BTreeSet<&str> = users
        .iter()
        .filter(|u| u.in_class(class))
        .map(|u| u.id.as_str())
        .collect();
    scores
        .iter()
        .filter(|s| members.contains(s.student_id.as_str()))
        .collect()
}

/// Mean numeric score per (exam, subject). Non-numeric scores are skipped,
/// and groups with no numeric score are left out.
pub fn score_averages<'a>(scores: impl IntoIterator<Item = &'a ScoreEntry>) -> Vec<ScoreAverage> {
    let mut groups: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for entry in scores {
        let Ok(value) = entry.score.trim().parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        let group = groups
            .entry((entry.exam_name.clone(), entry.subject.clone()))
            .or_insert((0.0, 0));
        group.0 += value;
        group.1 += 1;
    }

    groups
        .into_iter()
        .map(|((exam_name, subject), (sum, count))| ScoreAverage {
            exam_name,
            subject,
            average: sum / count as f64,
            count,
        })
        .collect()
}
