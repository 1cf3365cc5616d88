use chrono::{Datelike, Duration, NaiveDate};

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .unwrap_or(date)
}

/// Years a recent-window run must read: the run year, plus the cutoff year
/// when the window reaches back across New Year.
pub fn years_spanned(cutoff: NaiveDate, run_date: NaiveDate) -> Vec<i32> {
    if cutoff.year() == run_date.year() {
        vec![run_date.year()]
    } else {
        vec![run_date.year(), cutoff.year()]
    }
}

/// Month-end dates a recent-window run must read, newest first.
pub fn month_ends_spanned(cutoff: NaiveDate, run_date: NaiveDate) -> Vec<NaiveDate> {
    let mut ends = vec![last_day_of_month(run_date)];
    if (cutoff.year(), cutoff.month()) != (run_date.year(), run_date.month()) {
        ends.push(last_day_of_month(cutoff));
    }
    ends
}
