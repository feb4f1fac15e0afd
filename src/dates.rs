//! Date filter & confidence (C5), plus the recency sub-score used by C7.

use chrono::NaiveDate;

use crate::schema::{DateConfidence, Item};

/// `filter_by_date(items, from, to, require_date) → items`. §4.5.
///
/// An item without a date is kept when `require_date` is `false`;
/// otherwise dropped. An item with a date outside `[from, to]` is always
/// dropped, regardless of `require_date`.
pub fn filter_by_date(
    items: Vec<Item>,
    from: NaiveDate,
    to: NaiveDate,
    require_date: bool,
) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| match item.header().date {
            Some(d) => d >= from && d <= to,
            None => !require_date,
        })
        .collect()
}

/// Derive `date_confidence` from how much of the upstream date was known.
///
/// `high` when day, month, and year were all present; `medium` when only
/// year/month were known (day defaulted); `low` when no date could be
/// parsed at all.
pub fn confidence_for(has_day: bool, has_month: bool, has_year: bool) -> DateConfidence {
    if has_year && has_month && has_day {
        DateConfidence::High
    } else if has_year && has_month {
        DateConfidence::Medium
    } else {
        DateConfidence::Low
    }
}

/// Recency sub-score (§4.7): a monotone non-increasing function of
/// `today - date`. Linear decay over a 30-day window (see DESIGN.md for
/// why this window was chosen — the upstream `dates` module this was
/// ported from was not present in the retrieved source). Undated items
/// score 0.
pub fn recency_score(date: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(date) = date else {
        return 0;
    };
    let days_old = (today - date).num_days();
    if days_old < 0 {
        return 100;
    }
    let raw = 100.0 - (days_old as f64) * (100.0 / 30.0);
    raw.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn recency_is_monotone_non_increasing() {
        let today = d(2026, 7, 27);
        let mut prev = recency_score(Some(today), today);
        for days_ago in 1..60 {
            let date = today - chrono::Duration::days(days_ago);
            let score = recency_score(Some(date), today);
            assert!(score <= prev, "score should not increase as date ages");
            prev = score;
        }
    }

    #[test]
    fn recency_zero_for_undated_item() {
        assert_eq!(recency_score(None, d(2026, 7, 27)), 0);
    }

    #[test]
    fn recency_caps_at_100_for_todays_item() {
        let today = d(2026, 7, 27);
        assert_eq!(recency_score(Some(today), today), 100);
    }

    #[test]
    fn recency_floors_at_zero_past_30_days() {
        let today = d(2026, 7, 27);
        let old = today - chrono::Duration::days(45);
        assert_eq!(recency_score(Some(old), today), 0);
    }

    #[test]
    fn confidence_rules_match_spec() {
        assert_eq!(confidence_for(true, true, true), DateConfidence::High);
        assert_eq!(confidence_for(false, true, true), DateConfidence::Medium);
        assert_eq!(confidence_for(false, false, true), DateConfidence::Low);
        assert_eq!(confidence_for(false, false, false), DateConfidence::Low);
    }
}
