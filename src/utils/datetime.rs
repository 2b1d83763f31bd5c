use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};

use crate::error::{AppError, AppResult};

/// 解析预约时间 (YYYY-MM-DD HH:MM[:SS])，按本地时间处理，不带时区
pub fn parse_reservation_time(date_time: &str) -> AppResult<NaiveDateTime> {
    let iso = date_time.trim().replacen(' ', "T", 1);

    NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| AppError::InvalidTimestamp(format!("Invalid reservation time: {date_time}")))
}

/// English weekday name, e.g. "Sunday"
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// English month name, e.g. "January"
pub fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// January through December
pub fn month_names() -> impl Iterator<Item = &'static str> {
    (1u8..=12).filter_map(|m| Month::try_from(m).ok().map(|month| month.name()))
}

/// First day of the month that is `offset` months away from `date`'s month.
pub fn first_of_month(date: NaiveDate, offset: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + offset;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
