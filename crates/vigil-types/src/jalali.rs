//! Jalali (Persian solar) calendar arithmetic.
//!
//! Leap years follow the arithmetic 33-year cycle, the same rule the dashboard
//! has always bucketed by. Conversions go through a fixed anchor,
//! 1 Farvardin 1404 = 2025-03-21.

use chrono::{Datelike, NaiveDate};

const ANCHOR_YEAR: i32 = 1404;
const CYCLE_YEARS: i32 = 33;
const CYCLE_DAYS: i64 = 33 * 365 + 8;

const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

pub fn is_leap(year: i32) -> bool {
    matches!(year.rem_euclid(CYCLE_YEARS), 1 | 5 | 9 | 13 | 17 | 22 | 26 | 30)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    match month {
        1..=6 => Some(31),
        7..=11 => Some(30),
        12 if is_leap(year) => Some(30),
        12 => Some(29),
        _ => None,
    }
}

pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(idx).copied()
}

fn year_length(year: i32) -> i64 {
    if is_leap(year) { 366 } else { 365 }
}

/// Days from 1 Farvardin of the anchor year to 1 Farvardin of `year`.
fn days_from_anchor(year: i32) -> i64 {
    let delta = i64::from(year) - i64::from(ANCHOR_YEAR);
    let cycles = delta.div_euclid(i64::from(CYCLE_YEARS));
    let rem = delta.rem_euclid(i64::from(CYCLE_YEARS));
    let base = i64::from(ANCHOR_YEAR) + cycles * i64::from(CYCLE_YEARS);

    let mut days = cycles * CYCLE_DAYS;
    for y in base..base + rem {
        // base + rem lies between the anchor and `year`, so it fits in i32
        days += year_length(y as i32);
    }
    days
}

/// Gregorian date of 1 Farvardin of `year`.
fn year_start(year: i32) -> Option<NaiveDate> {
    let anchor = NaiveDate::from_ymd_opt(2025, 3, 21)?;
    let ce = i64::from(anchor.num_days_from_ce()) + days_from_anchor(year);
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(ce).ok()?)
}

/// Zero-based day of the year.
fn day_of_year(month: u32, day: u32) -> u32 {
    let before = if month <= 7 {
        (month - 1) * 31
    } else {
        6 * 31 + (month - 7) * 30
    };
    before + day - 1
}

impl JalaliDate {
    /// Validated constructor; `None` if the month or day does not exist.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        let dim = days_in_month(year, month)?;
        (1..=dim).contains(&day).then_some(Self { year, month, day })
    }

    pub fn from_gregorian(date: NaiveDate) -> Option<Self> {
        let mut year = date.year() - 621;
        let mut start = year_start(year)?;
        while date < start {
            year -= 1;
            start = year_start(year)?;
        }
        loop {
            let next = year_start(year + 1)?;
            if date < next {
                break;
            }
            year += 1;
            start = next;
        }

        let mut offset = u32::try_from((date - start).num_days()).ok()?;
        for month in 1..=12 {
            let dim = days_in_month(year, month)?;
            if offset < dim {
                return Some(Self { year, month, day: offset + 1 });
            }
            offset -= dim;
        }
        None
    }

    pub fn to_gregorian(&self) -> Option<NaiveDate> {
        let start = year_start(self.year)?;
        let ce = i64::from(start.num_days_from_ce()) + i64::from(day_of_year(self.month, self.day));
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(ce).ok()?)
    }

    /// Day of the week with Saturday as 0, the first column of a Persian calendar.
    pub fn weekday_offset(&self) -> Option<u32> {
        let weekday = self.to_gregorian()?.weekday();
        Some((weekday.num_days_from_monday() + 2) % 7)
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or_default()
    }
}

impl std::fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Gregorian `[start, end)` covering a whole Jalali month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let dim = days_in_month(year, month)?;
    let start = JalaliDate::new(year, month, 1)?.to_gregorian()?;
    let end = start.checked_add_days(chrono::Days::new(u64::from(dim)))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greg(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn known_new_years() {
        assert_eq!(
            JalaliDate::from_gregorian(greg(2025, 3, 21)),
            JalaliDate::new(1404, 1, 1)
        );
        assert_eq!(
            JalaliDate::from_gregorian(greg(2024, 3, 20)),
            JalaliDate::new(1403, 1, 1)
        );
        assert_eq!(
            JalaliDate::from_gregorian(greg(1979, 3, 21)),
            JalaliDate::new(1358, 1, 1)
        );
    }

    #[test]
    fn last_day_of_leap_year() {
        assert!(is_leap(1403));
        assert_eq!(days_in_month(1403, 12), Some(30));
        assert_eq!(
            JalaliDate::from_gregorian(greg(2025, 3, 20)),
            JalaliDate::new(1403, 12, 30)
        );
    }

    #[test]
    fn mid_year_date() {
        let date = JalaliDate::from_gregorian(greg(2026, 10, 16)).unwrap();
        assert_eq!(date, JalaliDate { year: 1405, month: 7, day: 24 });
        assert_eq!(date.month_name(), "مهر");
        assert_eq!(date.to_string(), "1405/07/24");
    }

    #[test]
    fn conversion_round_trips_over_a_decade() {
        let mut day = greg(2018, 1, 1);
        let mut prev: Option<JalaliDate> = None;
        while day < greg(2032, 1, 1) {
            let j = JalaliDate::from_gregorian(day).unwrap();
            assert_eq!(j.to_gregorian(), Some(day));
            if let Some(p) = prev {
                assert!(j > p);
            }
            prev = Some(j);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn invalid_dates_rejected() {
        assert!(JalaliDate::new(1404, 13, 1).is_none());
        assert!(JalaliDate::new(1404, 0, 1).is_none());
        assert!(JalaliDate::new(1404, 7, 31).is_none());
        assert!(JalaliDate::new(1404, 12, 30).is_none());
        assert!(JalaliDate::new(1404, 1, 0).is_none());
    }

    #[test]
    fn weekday_offset_starts_on_saturday() {
        // 2025-03-21 was a Friday
        assert_eq!(JalaliDate::new(1404, 1, 1).unwrap().weekday_offset(), Some(6));
        // 2025-03-22 was a Saturday
        assert_eq!(JalaliDate::new(1404, 1, 2).unwrap().weekday_offset(), Some(0));
    }

    #[test]
    fn month_range_spans_whole_month() {
        let (start, end) = month_range(1404, 12).unwrap();
        assert_eq!((end - start).num_days(), 29);
        assert_eq!(end, greg(2026, 3, 21));
        assert!(month_range(1404, 13).is_none());
    }
}
