//! Dashboard analytics: turns a reservation list into chart buckets and
//! period-over-period statistics.
//!
//! The aggregation functions are pure and take `now` explicitly; only
//! `DashboardService` touches the network and the local clock.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

use crate::config::DashboardConfig;
use crate::error::AppResult;
use crate::external::ReservationApi;
use crate::models::*;
use crate::utils::{first_of_month, format_currency, month_name, month_names, parse_reservation_time, weekday_name};

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the given day
fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Computes the current period and the equally long period right before it.
pub fn period_range(period: Period, now: NaiveDateTime) -> PeriodRange {
    let today = now.date();

    match period {
        Period::Weekly => {
            // 最近 7 天（含今天），上一周期为之前的 7 天
            let current_start = start_of_day(today - Duration::days(6));
            let prev_end = end_of_day(current_start.date() - Duration::days(1));
            let prev_start = start_of_day(prev_end.date() - Duration::days(6));

            PeriodRange {
                current_start,
                current_end: now,
                prev_start,
                prev_end,
            }
        }
        Period::Monthly => {
            let month_start = first_of_month(today, 0);
            let next_month_start = first_of_month(today, 1);
            let prev_month_start = first_of_month(today, -1);

            PeriodRange {
                current_start: start_of_day(month_start),
                current_end: end_of_day(next_month_start - Duration::days(1)),
                prev_start: start_of_day(prev_month_start),
                prev_end: end_of_day(month_start - Duration::days(1)),
            }
        }
        Period::Yearly => {
            let year_start = first_of_month(today, -(today.month0() as i32));
            let next_year_start = first_of_month(year_start, 12);
            let prev_year_start = first_of_month(year_start, -12);

            PeriodRange {
                current_start: start_of_day(year_start),
                current_end: end_of_day(next_year_start - Duration::days(1)),
                prev_start: start_of_day(prev_year_start),
                prev_end: end_of_day(year_start - Duration::days(1)),
            }
        }
    }
}

/// Pre-creates the fixed chart axis. Yearly charts have no fixed axis.
pub fn initialize_buckets(period: Period, range: &PeriodRange) -> Vec<ChartBucket> {
    match period {
        Period::Weekly => (0..7)
            .map(|i| ChartBucket::empty(weekday_name(range.current_start.date() + Duration::days(i))))
            .collect(),
        Period::Monthly => month_names().map(ChartBucket::empty).collect(),
        Period::Yearly => Vec::new(),
    }
}

/// Relative change from `prev` to `curr` in percent.
///
/// A zero previous value yields 0 when nothing happened and 100 otherwise.
pub fn trend_pct(curr: u64, prev: u64) -> f64 {
    if prev == 0 {
        return if curr > 0 { 100.0 } else { 0.0 };
    }
    (curr as f64 - prev as f64) / prev as f64 * 100.0
}

/// Sorts discovered years and fills every missing year in between with an
/// empty bucket. Without any year the chart shows `fallback_year` alone.
pub fn fill_year_gaps(years: BTreeMap<i32, ChartBucket>, fallback_year: i32) -> Vec<ChartBucket> {
    let (Some(&min), Some(&max)) = (years.keys().next(), years.keys().next_back()) else {
        return vec![ChartBucket::empty(fallback_year.to_string())];
    };

    let mut years = years;
    (min..=max)
        .map(|year| {
            years
                .remove(&year)
                .unwrap_or_else(|| ChartBucket::empty(year.to_string()))
        })
        .collect()
}

enum ChartAxis {
    Labels(Vec<ChartBucket>),
    Years(BTreeMap<i32, ChartBucket>),
}

impl ChartAxis {
    fn new(period: Period, range: &PeriodRange) -> Self {
        match period {
            Period::Yearly => ChartAxis::Years(BTreeMap::new()),
            _ => ChartAxis::Labels(initialize_buckets(period, range)),
        }
    }

    // 标签轴在初始化时已包含全部标签
    fn add_label(buckets: &mut [ChartBucket], label: &str, amount: u64) {
        if let Some(bucket) = buckets.iter_mut().find(|b| b.label == label) {
            bucket.add(amount);
        }
    }

    fn record(
        &mut self,
        period: Period,
        range: &PeriodRange,
        now: NaiveDateTime,
        at: NaiveDateTime,
        amount: u64,
    ) {
        match self {
            ChartAxis::Labels(buckets) => match period {
                // 周视图只统计当前 7 天
                Period::Weekly if range.in_current(at) => {
                    Self::add_label(buckets, &weekday_name(at.date()), amount)
                }
                // 月视图展示今年的每个月，与当前月份无关
                Period::Monthly if at.year() == now.year() => {
                    Self::add_label(buckets, &month_name(at.date()), amount)
                }
                _ => {}
            },
            ChartAxis::Years(years) => years
                .entry(at.year())
                .or_insert_with(|| ChartBucket::empty(at.year().to_string()))
                .add(amount),
        }
    }

    fn into_buckets(self, now: NaiveDateTime) -> Vec<ChartBucket> {
        match self {
            ChartAxis::Labels(buckets) => buckets,
            ChartAxis::Years(years) => fill_year_gaps(years, now.year()),
        }
    }
}

#[derive(Default)]
struct PeriodTotals {
    income: u64,
    customers: u64,
}

impl PeriodTotals {
    fn add(&mut self, amount: u64) {
        self.income += amount;
        self.customers += 1;
    }
}

/// Aggregates reservations into chart points and current-vs-previous stats in a single pass.
///
/// Only completed and on-going reservations are counted. A reservation whose
/// timestamp cannot be parsed is skipped.
pub fn process_chart_data(
    reservations: &[ReservationRecord],
    period: Period,
    now: NaiveDateTime,
) -> DashboardReport {
    let range = period_range(period, now);
    let mut axis = ChartAxis::new(period, &range);
    let mut current = PeriodTotals::default();
    let mut previous = PeriodTotals::default();
    let mut eligible = 0usize;

    for reservation in reservations.iter().filter(|r| r.status.is_eligible()) {
        let at = match parse_reservation_time(&reservation.date_time) {
            Ok(at) => at,
            Err(e) => {
                log::warn!("Skipping reservation {}: {e}", reservation.id);
                continue;
            }
        };
        eligible += 1;

        if range.in_current(at) {
            current.add(reservation.amount);
        } else if range.in_previous(at) {
            previous.add(reservation.amount);
        }

        axis.record(period, &range, now, at, reservation.amount);
    }

    log::debug!(
        "Aggregated {eligible} of {} reservations for {period} dashboard",
        reservations.len()
    );

    DashboardReport {
        chart_data: axis.into_buckets(now),
        stats: DashboardStats {
            total_income: current.income,
            total_customers: current.customers,
            income_trend_pct: trend_pct(current.income, previous.income),
            customer_trend_pct: trend_pct(current.customers, previous.customers),
        },
    }
}

/// Most recent reservations still waiting for approval, newest first.
pub fn latest_waiting_reservations(
    reservations: &[ReservationRecord],
    limit: usize,
) -> Vec<ReservationRecord> {
    let mut waiting: Vec<(NaiveDateTime, &ReservationRecord)> = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::WaitingApprove)
        .filter_map(|r| match parse_reservation_time(&r.date_time) {
            Ok(at) => Some((at, r)),
            Err(e) => {
                log::warn!("Skipping reservation {}: {e}", r.id);
                None
            }
        })
        .collect();

    waiting.sort_by(|a, b| b.0.cmp(&a.0));
    waiting
        .into_iter()
        .take(limit)
        .map(|(_, r)| r.clone())
        .collect()
}

#[derive(Clone)]
pub struct DashboardService {
    reservation_api: ReservationApi,
    config: DashboardConfig,
}

impl DashboardService {
    pub fn new(reservation_api: ReservationApi, config: DashboardConfig) -> Self {
        Self {
            reservation_api,
            config,
        }
    }

    pub fn default_period(&self) -> Period {
        self.config.default_period
    }

    pub async fn get_report(&self, period: Period) -> AppResult<DashboardReport> {
        let reservations = self.reservation_api.get_reservations().await?;
        let now = Local::now().naive_local();
        let report = process_chart_data(&reservations, period, now);

        log::info!(
            "Built {period} dashboard: income {}, customers {}",
            format_currency(report.stats.total_income),
            report.stats.total_customers
        );

        Ok(report)
    }

    pub async fn get_waiting_reservations(
        &self,
        limit: Option<usize>,
    ) -> AppResult<Vec<ReservationRecord>> {
        let reservations = self.reservation_api.get_reservations().await?;
        let limit = limit.unwrap_or(self.config.waiting_limit);

        Ok(latest_waiting_reservations(&reservations, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_reservation_time(s).unwrap()
    }

    fn reservation(id: &str, date_time: &str, status: ReservationStatus, amount: u64) -> ReservationRecord {
        ReservationRecord {
            id: id.to_string(),
            customer: format!("Customer {id}"),
            invoice: format!("INV-{id}"),
            date_time: date_time.to_string(),
            status,
            amount,
        }
    }

    fn labels(report: &DashboardReport) -> Vec<&str> {
        report.chart_data.iter().map(|b| b.label.as_str()).collect()
    }

    fn bucket<'a>(report: &'a DashboardReport, label: &str) -> &'a ChartBucket {
        report
            .chart_data
            .iter()
            .find(|b| b.label == label)
            .unwrap_or_else(|| panic!("missing bucket {label}"))
    }

    #[test]
    fn test_weekly_range() {
        let now = at("2025-06-15 18:30");
        let range = period_range(Period::Weekly, now);

        assert_eq!(range.current_start, at("2025-06-09 00:00"));
        assert_eq!(range.current_end, now);
        assert_eq!(
            range.prev_end,
            at("2025-06-08 23:59:59") + Duration::milliseconds(999)
        );
        assert_eq!(range.prev_start, at("2025-06-02 00:00"));
    }

    #[test]
    fn test_monthly_range_rolls_over_year() {
        let range = period_range(Period::Monthly, at("2025-01-10 08:00"));

        assert_eq!(range.current_start, at("2025-01-01 00:00"));
        assert_eq!(
            range.current_end,
            at("2025-01-31 23:59:59") + Duration::milliseconds(999)
        );
        assert_eq!(range.prev_start, at("2024-12-01 00:00"));
        assert_eq!(
            range.prev_end,
            at("2024-12-31 23:59:59") + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_monthly_range_leap_february() {
        let range = period_range(Period::Monthly, at("2024-03-05 08:00"));
        assert_eq!(
            range.prev_end,
            at("2024-02-29 23:59:59") + Duration::milliseconds(999)
        );
        assert_eq!(range.prev_start, at("2024-02-01 00:00"));
    }

    #[test]
    fn test_yearly_range() {
        let range = period_range(Period::Yearly, at("2025-06-15 10:00"));

        assert_eq!(range.current_start, at("2025-01-01 00:00"));
        assert_eq!(
            range.current_end,
            at("2025-12-31 23:59:59") + Duration::milliseconds(999)
        );
        assert_eq!(range.prev_start, at("2024-01-01 00:00"));
        assert_eq!(
            range.prev_end,
            at("2024-12-31 23:59:59") + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_initialize_weekly_buckets_start_at_current_start() {
        let range = period_range(Period::Weekly, at("2025-06-15 10:00"));
        let buckets = initialize_buckets(Period::Weekly, &range);
        let names: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();

        assert_eq!(
            names,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert!(buckets.iter().all(|b| b.income == 0 && b.customer_count == 0));
    }

    #[test]
    fn test_initialize_monthly_and_yearly_buckets() {
        let now = at("2025-06-15 10:00");
        let monthly = initialize_buckets(Period::Monthly, &period_range(Period::Monthly, now));
        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[0].label, "January");
        assert_eq!(monthly[11].label, "December");

        assert!(initialize_buckets(Period::Yearly, &period_range(Period::Yearly, now)).is_empty());
    }

    #[test]
    fn test_trend_pct() {
        assert_eq!(trend_pct(0, 0), 0.0);
        assert_eq!(trend_pct(500, 0), 100.0);
        assert_eq!(trend_pct(100, 200), -50.0);
        assert_eq!(trend_pct(300, 200), 50.0);
        assert_eq!(trend_pct(0, 200), -100.0);
    }

    #[test]
    fn test_weekly_scenario() {
        let now = at("2025-06-15 12:00");
        let reservations = vec![
            reservation("1", "2025-06-15 10:00", ReservationStatus::Completed, 100),
            reservation("2", "2025-06-08 10:00", ReservationStatus::Completed, 50),
        ];

        let report = process_chart_data(&reservations, Period::Weekly, now);

        assert_eq!(report.chart_data.len(), 7);
        assert_eq!(labels(&report)[6], "Sunday");
        let sunday = bucket(&report, "Sunday");
        assert_eq!(sunday.income, 100);
        assert_eq!(sunday.customer_count, 1);
        assert_eq!(report.stats.total_income, 100);
        assert_eq!(report.stats.total_customers, 1);
        assert_eq!(report.stats.income_trend_pct, 100.0);
        assert_eq!(report.stats.customer_trend_pct, 0.0);
    }

    #[test]
    fn test_weekly_excludes_records_after_now() {
        let now = at("2025-06-15 09:00");
        let reservations = vec![reservation("1", "2025-06-15 10:00", ReservationStatus::OnGoing, 100)];

        let report = process_chart_data(&reservations, Period::Weekly, now);

        assert_eq!(report.stats.total_income, 0);
        assert!(report.chart_data.iter().all(|b| b.income == 0));
    }

    #[test]
    fn test_weekly_bucket_sum_matches_current_range() {
        let now = at("2025-06-15 20:00");
        let reservations = vec![
            reservation("1", "2025-06-09 00:00", ReservationStatus::Completed, 10),
            reservation("2", "2025-06-11 13:15", ReservationStatus::OnGoing, 20),
            reservation("3", "2025-06-11 17:45", ReservationStatus::Completed, 30),
            reservation("4", "2025-06-08 23:59", ReservationStatus::Completed, 40),
            reservation("5", "2025-06-14 09:00", ReservationStatus::WaitingApprove, 50),
            reservation("6", "2024-06-12 09:00", ReservationStatus::Completed, 60),
        ];

        let report = process_chart_data(&reservations, Period::Weekly, now);
        let bucket_sum: u64 = report.chart_data.iter().map(|b| b.income).sum();

        assert_eq!(bucket_sum, 60);
        assert_eq!(report.stats.total_income, 60);
        assert_eq!(bucket(&report, "Wednesday").customer_count, 2);
        assert_eq!(bucket(&report, "Monday").income, 10);
    }

    #[test]
    fn test_monthly_charts_whole_year() {
        let now = at("2025-06-15 10:00");
        let reservations = vec![
            reservation("1", "2025-06-01 10:00", ReservationStatus::Completed, 300),
            reservation("2", "2025-05-20 10:00", ReservationStatus::Completed, 150),
            reservation("3", "2025-02-03 10:00", ReservationStatus::OnGoing, 70),
            reservation("4", "2024-06-03 10:00", ReservationStatus::Completed, 999),
        ];

        let report = process_chart_data(&reservations, Period::Monthly, now);

        assert_eq!(report.chart_data.len(), 12);
        assert_eq!(bucket(&report, "June").income, 300);
        assert_eq!(bucket(&report, "May").income, 150);
        // 二月不在当前或上一周期内，但仍出现在图表中
        assert_eq!(bucket(&report, "February").income, 70);
        assert_eq!(report.stats.total_income, 300);
        assert_eq!(report.stats.income_trend_pct, 100.0);
        assert_eq!(report.stats.customer_trend_pct, 0.0);
    }

    #[test]
    fn test_monthly_previous_month_in_prior_year() {
        let now = at("2025-01-15 10:00");
        let reservations = vec![
            reservation("1", "2025-01-02 10:00", ReservationStatus::Completed, 100),
            reservation("2", "2024-12-30 10:00", ReservationStatus::Completed, 200),
        ];

        let report = process_chart_data(&reservations, Period::Monthly, now);

        assert_eq!(report.stats.income_trend_pct, -50.0);
        // 去年十二月计入上一周期，但不出现在今年的图表中
        assert_eq!(bucket(&report, "December").income, 0);
        assert_eq!(bucket(&report, "January").income, 100);
    }

    #[test]
    fn test_yearly_gap_filling() {
        let now = at("2025-06-15 10:00");
        let reservations = vec![
            reservation("1", "2023-03-01 10:00", ReservationStatus::Completed, 300),
            reservation("2", "2020-07-01 10:00", ReservationStatus::Completed, 100),
            reservation("3", "2020-08-01 10:00", ReservationStatus::OnGoing, 50),
        ];

        let report = process_chart_data(&reservations, Period::Yearly, now);

        assert_eq!(labels(&report), ["2020", "2021", "2022", "2023"]);
        assert_eq!(bucket(&report, "2020").income, 150);
        assert_eq!(bucket(&report, "2020").customer_count, 2);
        assert_eq!(bucket(&report, "2021"), &ChartBucket::empty("2021"));
        assert_eq!(bucket(&report, "2022"), &ChartBucket::empty("2022"));
        assert_eq!(bucket(&report, "2023").income, 300);
        assert_eq!(report.stats.total_income, 0);
        assert_eq!(report.stats.income_trend_pct, 0.0);
    }

    #[test]
    fn test_yearly_empty_input_shows_current_year() {
        let report = process_chart_data(&[], Period::Yearly, at("2025-06-15 10:00"));

        assert_eq!(report.chart_data, vec![ChartBucket::empty("2025")]);
        assert_eq!(report.stats.total_income, 0);
        assert_eq!(report.stats.total_customers, 0);
        assert_eq!(report.stats.income_trend_pct, 0.0);
        assert_eq!(report.stats.customer_trend_pct, 0.0);
    }

    #[test]
    fn test_yearly_trend_against_previous_year() {
        let now = at("2025-06-15 10:00");
        let reservations = vec![
            reservation("1", "2025-01-10 10:00", ReservationStatus::Completed, 100),
            reservation("2", "2024-11-10 10:00", ReservationStatus::Completed, 200),
            reservation("3", "2024-12-31 23:59", ReservationStatus::Completed, 200),
        ];

        let report = process_chart_data(&reservations, Period::Yearly, now);

        assert_eq!(report.stats.income_trend_pct, -75.0);
        assert_eq!(report.stats.customer_trend_pct, -50.0);
        assert_eq!(labels(&report), ["2024", "2025"]);
    }

    #[test]
    fn test_ineligible_status_contributes_nothing() {
        let now = at("2025-06-15 12:00");
        let statuses = [
            ReservationStatus::CanceledByUser,
            ReservationStatus::CanceledByAdmin,
            ReservationStatus::WaitingApprove,
        ];

        for status in statuses {
            let reservations = vec![reservation("1", "2025-06-15 10:00", status, 99999)];
            for period in [Period::Weekly, Period::Monthly, Period::Yearly] {
                let report = process_chart_data(&reservations, period, now);
                assert!(report.chart_data.iter().all(|b| b.income == 0 && b.customer_count == 0));
                assert_eq!(report.stats.total_income, 0);
                assert_eq!(report.stats.total_customers, 0);
            }
        }
    }

    #[test]
    fn test_malformed_timestamp_is_skipped() {
        let now = at("2025-06-15 12:00");
        let reservations = vec![
            reservation("bad", "15/06/2025 10:00", ReservationStatus::Completed, 500),
            reservation("good", "2025-06-15 10:00", ReservationStatus::Completed, 100),
        ];

        let report = process_chart_data(&reservations, Period::Yearly, now);

        assert_eq!(report.chart_data, vec![ChartBucket {
            label: "2025".to_string(),
            income: 100,
            customer_count: 1,
        }]);
        assert_eq!(report.stats.total_income, 100);
    }

    #[test]
    fn test_process_chart_data_is_deterministic() {
        let now = at("2025-06-15 12:00");
        let reservations = vec![
            reservation("1", "2025-06-10 10:00", ReservationStatus::Completed, 120),
            reservation("2", "2025-06-01 10:00", ReservationStatus::OnGoing, 80),
            reservation("3", "2022-02-01 10:00", ReservationStatus::Completed, 40),
        ];

        for period in [Period::Weekly, Period::Monthly, Period::Yearly] {
            assert_eq!(
                process_chart_data(&reservations, period, now),
                process_chart_data(&reservations, period, now)
            );
        }
    }

    #[test]
    fn test_customer_count_is_per_reservation() {
        let now = at("2025-06-15 12:00");
        let mut first = reservation("1", "2025-06-14 10:00", ReservationStatus::Completed, 10);
        let mut second = reservation("2", "2025-06-14 11:00", ReservationStatus::Completed, 10);
        first.customer = "Budi".to_string();
        second.customer = "Budi".to_string();

        let report = process_chart_data(&[first, second], Period::Weekly, now);

        assert_eq!(report.stats.total_customers, 2);
        assert_eq!(bucket(&report, "Saturday").customer_count, 2);
    }

    #[test]
    fn test_fill_year_gaps_keeps_existing_buckets() {
        let mut years = BTreeMap::new();
        let mut bucket_2019 = ChartBucket::empty("2019");
        bucket_2019.add(5);
        years.insert(2021, ChartBucket::empty("2021"));
        years.insert(2019, bucket_2019.clone());

        let filled = fill_year_gaps(years, 2030);

        assert_eq!(filled, vec![bucket_2019, ChartBucket::empty("2020"), ChartBucket::empty("2021")]);
    }

    #[test]
    fn test_latest_waiting_reservations() {
        let reservations = vec![
            reservation("1", "2025-06-10 10:00", ReservationStatus::WaitingApprove, 10),
            reservation("2", "2025-06-12 10:00", ReservationStatus::WaitingApprove, 10),
            reservation("3", "2025-06-14 10:00", ReservationStatus::Completed, 10),
            reservation("4", "2025-06-11 10:00", ReservationStatus::WaitingApprove, 10),
            reservation("5", "bogus", ReservationStatus::WaitingApprove, 10),
            reservation("6", "2025-06-09 10:00", ReservationStatus::WaitingApprove, 10),
        ];

        let latest = latest_waiting_reservations(&reservations, 3);
        let ids: Vec<_> = latest.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, ["2", "4", "1"]);
        assert!(latest_waiting_reservations(&reservations, 0).is_empty());
        assert_eq!(latest_waiting_reservations(&reservations, 10).len(), 4);
    }
}
