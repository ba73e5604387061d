use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::schedule::ScheduleEntry;

/// 6 rows x 7 columns, Sunday first.
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayCell {
    pub day: u32,
    #[schema(format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_today: bool,
}

/// Month grid for the schedule page. Slots before day 1 and after the
/// last day are `None`.
pub fn month_grid(anchor: NaiveDate) -> Vec<Option<DayCell>> {
    month_grid_on(anchor, Local::now().date_naive())
}

pub fn month_grid_on(anchor: NaiveDate, today: NaiveDate) -> Vec<Option<DayCell>> {
    let first =
        NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1).expect("first of month");
    let offset = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(anchor.year(), anchor.month()) as usize;

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for slot in 0..GRID_CELLS {
        if slot < offset || slot >= offset + days {
            cells.push(None);
            continue;
        }

        let day = (slot - offset) as u32 + 1;
        let date = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day)
            .expect("day within month");
        cells.push(Some(DayCell {
            day,
            date,
            is_today: date == today,
        }));
    }
    cells
}

/// Day 0 of the next month is the last day of this one.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    (next_first.expect("first of next month") - Duration::days(1)).day()
}

/// Entries scheduled on an exact calendar date, insertion order.
pub fn schedules_on(entries: &[ScheduleEntry], date: NaiveDate) -> Vec<&ScheduleEntry> {
    entries.iter().filter(|e| e.date == date).collect()
}

/// Presentation split for a day cell: the first `cap` entries are shown,
/// the rest become an overflow count. Nothing is dropped from the
/// underlying list.
pub fn split_visible<T>(entries: &[T], cap: usize) -> (&[T], usize) {
    let visible = entries.len().min(cap);
    (&entries[..visible], entries.len() - visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grid_always_has_42_slots() {
        for month in 1..=12 {
            assert_eq!(month_grid_on(date(2026, month, 1), date(2000, 1, 1)).len(), GRID_CELLS);
        }
    }

    #[test]
    fn leap_february_has_29_days() {
        let grid = month_grid_on(date(2024, 2, 15), date(2000, 1, 1));
        assert_eq!(grid.iter().flatten().count(), 29);
    }

    #[test]
    fn plain_february_has_28_days() {
        let grid = month_grid_on(date(2023, 2, 1), date(2000, 1, 1));
        assert_eq!(grid.iter().flatten().count(), 28);
    }

    #[test]
    fn grid_starts_at_the_weekday_offset() {
        // 2024-02-01 was a Thursday, so four leading blanks
        let grid = month_grid_on(date(2024, 2, 1), date(2000, 1, 1));
        assert!(grid[..4].iter().all(Option::is_none));
        assert_eq!(grid[4].as_ref().unwrap().day, 1);
        assert_eq!(grid[4].as_ref().unwrap().date.weekday(), Weekday::Thu);
        assert_eq!(grid[4 + 28].as_ref().unwrap().day, 29);
        assert!(grid[4 + 29..].iter().all(Option::is_none));
    }

    #[test]
    fn sunday_first_month_has_no_leading_blanks() {
        // 2025-06-01 was a Sunday
        let grid = month_grid_on(date(2025, 6, 1), date(2000, 1, 1));
        assert_eq!(grid[0].as_ref().unwrap().day, 1);
        assert_eq!(grid.iter().flatten().count(), 30);
    }

    #[test]
    fn december_rolls_into_the_next_year() {
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28); // century, not a leap year
    }

    #[test]
    fn exactly_one_today_inside_the_anchor_month() {
        let today = date(2026, 8, 7);
        let grid = month_grid_on(date(2026, 8, 1), today);

        let todays: Vec<&DayCell> = grid.iter().flatten().filter(|c| c.is_today).collect();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].day, 7);
    }

    #[test]
    fn no_today_outside_the_anchor_month() {
        let grid = month_grid_on(date(2026, 9, 1), date(2026, 8, 7));
        assert_eq!(grid.iter().flatten().filter(|c| c.is_today).count(), 0);
    }

    fn entry_on(id: &str, d: NaiveDate) -> ScheduleEntry {
        ScheduleEntry {
            id: id.into(),
            date: d,
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            truck_id: "t-1".into(),
            driver_id: "d-1".into(),
            collector_ids: vec!["c-1".into(), "c-2".into(), "c-3".into()],
            locations: vec!["Poblacion".into()],
        }
    }

    #[test]
    fn day_overlay_matches_exact_dates_in_insertion_order() {
        let entries = vec![
            entry_on("s-1", date(2026, 8, 7)),
            entry_on("s-2", date(2026, 8, 8)),
            entry_on("s-3", date(2026, 8, 7)),
        ];

        let on_the_7th = schedules_on(&entries, date(2026, 8, 7));
        let ids: Vec<&str> = on_the_7th.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["s-1", "s-3"]);
    }

    #[test]
    fn overflow_counts_everything_beyond_the_cap() {
        let entries: Vec<u32> = (0..5).collect();

        let (visible, overflow) = split_visible(&entries, 3);
        assert_eq!(visible, &[0, 1, 2]);
        assert_eq!(overflow, 2);

        let (visible, overflow) = split_visible(&entries, 10);
        assert_eq!(visible.len(), 5);
        assert_eq!(overflow, 0);
    }
}
