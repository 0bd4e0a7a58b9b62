//! Year-agnostic birthday windows.
//!
//! Birthdays are compared on their month and day only. A window that starts
//! late in December wraps into January and is evaluated as two ranges joined
//! by OR; any other window is a single inclusive range.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

/// Number of calendar days covered by a window, today included.
pub const WINDOW_DAYS: u64 = 7;

/// A calendar month and day with the year stripped.
///
/// Ordering matches the `"MM-DD"` string ordering used in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
  month: u32,
  day:   u32,
}

impl MonthDay {
  pub fn of(date: NaiveDate) -> Self {
    Self { month: date.month(), day: date.day() }
  }
}

/// Zero-padded `"MM-DD"`, matching SQLite `strftime('%m-%d', …)`.
impl fmt::Display for MonthDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}-{:02}", self.month, self.day)
  }
}

/// The inclusive window `today ..= today + 6 days`, compared on month-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayWindow {
  pub start: MonthDay,
  pub end:   MonthDay,
}

impl BirthdayWindow {
  pub fn starting(today: NaiveDate) -> Self {
    let last = today
      .checked_add_days(Days::new(WINDOW_DAYS - 1))
      .unwrap_or(NaiveDate::MAX);
    Self { start: MonthDay::of(today), end: MonthDay::of(last) }
  }

  /// True when the window crosses December 31st.
  pub fn wraps(&self) -> bool { self.end < self.start }

  pub fn contains(&self, birthday: NaiveDate) -> bool {
    let md = MonthDay::of(birthday);
    if self.wraps() {
      md >= self.start || md <= self.end
    } else {
      self.start <= md && md <= self.end
    }
  }
}
