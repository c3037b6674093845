//! Derived journal statistics.
//!
//! Streaks and mood counts are pure functions of the entry set, so the
//! materialized `journal_stats` row can never drift: every refresh
//! recomputes from source rows inside the mutating transaction while
//! holding the user's stats row lock.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Length of the consecutive-day run ending today or, if today has no entry
/// yet, yesterday. A skipped day breaks the run.
///
/// `days` must be distinct and sorted descending. Future-dated entries are
/// ignored.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> i32 {
    let mut iter = days.iter().filter(|d| **d <= today).peekable();

    let anchor = match iter.peek() {
        Some(&&d) if d == today => today,
        _ => today - Duration::days(1),
    };

    let mut streak = 0;
    let mut check = anchor;
    for &day in iter {
        if day == check {
            streak += 1;
            check -= Duration::days(1);
        } else {
            break;
        }
    }
    streak
}

/// Longest consecutive-day run anywhere in history, independent of whether
/// it is still alive.
///
/// `days` must be distinct and sorted ascending.
pub fn longest_streak(days: &[NaiveDate]) -> i32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        run = match prev {
            Some(p) if day == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

/// Number of entries containing each mood label. A label repeated within a
/// single entry counts once.
pub fn mood_counts(entries_moods: &[Vec<String>]) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for moods in entries_moods {
        let mut seen = std::collections::HashSet::new();
        for mood in moods {
            if seen.insert(mood.as_str()) {
                *counts.entry(mood.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Recompute the user's materialized stats row from source entries, inside
/// the caller's transaction. The row lock serializes concurrent refreshes
/// for the same user.
pub async fn refresh_user_stats(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO journal_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("SELECT user_id FROM journal_stats WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

    let rows = sqlx::query_as::<_, (NaiveDate, Vec<String>)>(
        "SELECT entry_date, moods FROM journal_entries WHERE user_id = $1 ORDER BY entry_date ASC",
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    let days_asc: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
    let mut days_desc = days_asc.clone();
    days_desc.reverse();
    let moods: Vec<Vec<String>> = rows.into_iter().map(|(_, m)| m).collect();

    let today = Utc::now().date_naive();
    let current = current_streak(&days_desc, today);
    let longest = longest_streak(&days_asc);
    let top_moods =
        serde_json::to_value(mood_counts(&moods)).unwrap_or_else(|_| serde_json::json!({}));

    sqlx::query(
        r#"
        UPDATE journal_stats SET
            entries_count = $2,
            current_streak = $3,
            longest_streak = $4,
            top_moods = $5,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(days_asc.len() as i64)
    .bind(current)
    .bind(longest)
    .bind(top_moods)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn streak_counts_consecutive_days_ending_today() {
        let today = d("2026-08-06");
        // Entries on D, D-1, D-2; nothing on D-3.
        let days = vec![d("2026-08-06"), d("2026-08-05"), d("2026-08-04")];
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn streak_breaks_on_skipped_day() {
        let today = d("2026-08-06");
        // Entries on D and D-2 but not D-1: only today counts.
        let days = vec![d("2026-08-06"), d("2026-08-04")];
        assert_eq!(current_streak(&days, today), 1);
    }

    #[test]
    fn streak_survives_missing_today() {
        let today = d("2026-08-06");
        // No entry yet today; the run ending yesterday still counts.
        let days = vec![d("2026-08-05"), d("2026-08-04")];
        assert_eq!(current_streak(&days, today), 2);
    }

    #[test]
    fn streak_dead_when_gap_before_yesterday() {
        let today = d("2026-08-06");
        let days = vec![d("2026-08-03"), d("2026-08-02")];
        assert_eq!(current_streak(&days, today), 0);
    }

    #[test]
    fn streak_ignores_future_dates() {
        let today = d("2026-08-06");
        let days = vec![d("2026-08-09"), d("2026-08-06"), d("2026-08-05")];
        assert_eq!(current_streak(&days, today), 2);
    }

    #[test]
    fn empty_history_has_no_streaks() {
        assert_eq!(current_streak(&[], d("2026-08-06")), 0);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn longest_streak_is_independent_of_current_run() {
        // A 4-day run in June beats the 2-day run ending today.
        let days = vec![
            d("2026-06-01"),
            d("2026-06-02"),
            d("2026-06-03"),
            d("2026-06-04"),
            d("2026-08-05"),
            d("2026-08-06"),
        ];
        assert_eq!(longest_streak(&days), 4);
        let mut desc = days.clone();
        desc.reverse();
        assert_eq!(current_streak(&desc, d("2026-08-06")), 2);
    }

    #[test]
    fn recomputation_is_pure() {
        let days = vec![d("2026-08-06"), d("2026-08-05"), d("2026-08-02")];
        let today = d("2026-08-06");
        assert_eq!(
            current_streak(&days, today),
            current_streak(&days, today)
        );
        let moods = vec![vec!["Happy".to_string()], vec!["Happy".to_string()]];
        assert_eq!(mood_counts(&moods), mood_counts(&moods));
    }

    #[test]
    fn mood_counts_count_entries_per_label() {
        let moods = vec![
            vec!["Happy".to_string(), "Calm".to_string()],
            vec!["Happy".to_string()],
        ];
        let counts = mood_counts(&moods);
        assert_eq!(counts.get("Happy"), Some(&2));
        assert_eq!(counts.get("Calm"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn mood_repeated_within_entry_counts_once() {
        let moods = vec![vec!["Calm".to_string(), "Calm".to_string()]];
        assert_eq!(mood_counts(&moods).get("Calm"), Some(&1));
    }
}
