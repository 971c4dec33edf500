//! Submission grading. Pure and synchronous: case truth in, score out.
//!
//! Fields are graded per coffee according to the case's enabled questions.
//! Region/variety/process require trimmed, case-insensitive equality with the
//! truth value. Tasting notes match against a comma-separated list of
//! acceptable note strings, by exact equality or substring containment in
//! either direction; the second note is only credited when it lands on a
//! different truth token than the first.
//!
//! When case truth cannot be resolved at all, `grade_degraded` keeps the
//! endpoint available: three questions per coffee, credit for any non-empty
//! field, no truth comparison. Scores from that path are provisional.

use tracing::debug;

use crate::domain::{Coffee, CoffeeAnswer, CoffeeCase, EnabledQuestions};

const BASE_POINTS: f64 = 100.0;
const BONUS_POINTS: i64 = 50;

/// Result of grading one submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grade {
    pub score: i64,
    pub accuracy: f64,
}

impl Grade {
    const ZERO: Grade = Grade {
        score: 0,
        accuracy: 0.0,
    };
}

/// Grade `answers` against the case truth.
pub fn grade(
    case: &CoffeeCase,
    answers: &[CoffeeAnswer],
    favorite_coffee: &str,
    brewing_method: &str,
) -> Grade {
    let enabled = &case.enabled_questions;
    let questions_per_coffee = enabled.per_coffee();
    let total_questions = questions_per_coffee * answers.len();
    if total_questions == 0 {
        return Grade::ZERO;
    }

    let mut correct = 0usize;
    for answer in answers {
        // Unknown coffee ids are skipped: they contribute nothing, but the
        // denominator stays fixed, lowering achievable accuracy.
        let Some(truth) = case.coffees.iter().find(|c| c.id == answer.coffee_id) else {
            debug!(target: "scoring", coffee_id = %answer.coffee_id, "answer references unknown coffee; skipped");
            continue;
        };
        correct += grade_coffee(enabled, truth, answer);
    }

    let mut bonus = 0;
    if enabled.favorite_coffee && !favorite_coffee.is_empty() {
        bonus += BONUS_POINTS;
    }
    if enabled.brewing_method && !brewing_method.is_empty() {
        bonus += BONUS_POINTS;
    }

    let accuracy = correct as f64 / total_questions as f64;
    let score = (BASE_POINTS * accuracy * answers.len() as f64) as i64 + bonus;
    Grade { score, accuracy }
}

/// Degraded grading when no case truth is resolvable. Fixed three questions
/// per coffee (region, variety, process), correctness = field non-empty.
pub fn grade_degraded(answers: &[CoffeeAnswer]) -> Grade {
    let total_questions = answers.len() * 3;
    if total_questions == 0 {
        return Grade::ZERO;
    }

    let mut correct = 0usize;
    for answer in answers {
        correct += [&answer.region, &answer.variety, &answer.process]
            .iter()
            .filter(|f| !f.is_empty())
            .count();
    }

    let accuracy = correct as f64 / total_questions as f64;
    let score = (BASE_POINTS * accuracy * answers.len() as f64) as i64;
    Grade { score, accuracy }
}

fn grade_coffee(enabled: &EnabledQuestions, truth: &Coffee, answer: &CoffeeAnswer) -> usize {
    let mut correct = 0usize;

    if enabled.region && field_matches(&answer.region, &truth.region) {
        correct += 1;
    }
    if enabled.variety && field_matches(&answer.variety, &truth.variety) {
        correct += 1;
    }
    if enabled.process && field_matches(&answer.process, &truth.process) {
        correct += 1;
    }

    // First note records which truth token it consumed, so the second note
    // cannot earn credit for the same underlying attribute.
    let mut awarded_note: Option<String> = None;
    if enabled.taste_note1 && !answer.taste_note1.is_empty() {
        if let Some(note) = matched_tasting_note(&answer.taste_note1, &truth.tasting_notes) {
            awarded_note = Some(note);
            correct += 1;
        }
    }
    if enabled.taste_note2 && !answer.taste_note2.is_empty() {
        if let Some(note) = matched_tasting_note(&answer.taste_note2, &truth.tasting_notes) {
            if awarded_note.as_deref() != Some(note.as_str()) {
                correct += 1;
            }
        }
    }

    correct
}

/// Trimmed, case-insensitive equality; empty submissions never match.
fn field_matches(submitted: &str, truth: &str) -> bool {
    if submitted.is_empty() {
        return false;
    }
    submitted.trim().to_lowercase() == truth.trim().to_lowercase()
}

/// Return the normalized truth token matched by `submitted`, if any.
/// Truth tokens are the comma-separated entries of `truth_notes`; a match is
/// exact equality or containment in either direction after trim + lowercase.
fn matched_tasting_note(submitted: &str, truth_notes: &str) -> Option<String> {
    if submitted.is_empty() || truth_notes.is_empty() {
        return None;
    }
    let submitted = submitted.trim().to_lowercase();

    for token in truth_notes.split(',') {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            continue;
        }
        if submitted == token || submitted.contains(&token) || token.contains(&submitted) {
            return Some(token);
        }
    }
    None
}
