//! Badge derivation from cumulative user stats.
//!
//! Pure and monotonic: badges are only ever added, never revoked, even when a
//! later aggregate would no longer qualify. Recomputing with already-held
//! badges is a no-op, so the deriver is safe to call after every submission.

/// Stable badge identifiers. Display names/emoji live client-side.
pub const FIRST_CASE: &str = "first_case";
pub const ACCURACY_70: &str = "accuracy_70";
pub const ACCURACY_80: &str = "accuracy_80";
pub const POINTS_2000: &str = "points_2000";
pub const CASES_5: &str = "cases_5";

/// Return `current` extended with every badge whose threshold the aggregates
/// now cross. Existing badges are preserved unconditionally.
pub fn derive_badges(current: &[String], cases_count: u32, accuracy: f64, points: i64) -> Vec<String> {
    let mut badges: Vec<String> = current.to_vec();
    let mut earn = |id: &str, earned: bool| {
        if earned && !badges.iter().any(|b| b == id) {
            badges.push(id.to_string());
        }
    };

    earn(FIRST_CASE, cases_count >= 1);
    earn(ACCURACY_70, accuracy >= 0.70);
    earn(ACCURACY_80, accuracy >= 0.80);
    earn(POINTS_2000, points >= 2000);
    earn(CASES_5, cases_count >= 5);

    badges
}
