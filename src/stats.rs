// 📊 Statistics Engine - Time-bucketed aggregates over the record store
// Daily/weekly/monthly summaries, category totals, top-N, trend series

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::manager::RecordManager;
use crate::record::{Record, RecordType, Summary, TrendPoint};

// ============================================================================
// TREND PERIOD
// ============================================================================

/// Aggregation bucket for trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    /// One calendar day, labeled "MM-DD"
    Day,

    /// One Monday-start calendar week, labeled "MM-DD~MM-DD"
    Week,

    /// One calendar month, labeled "YYYY-MM"
    Month,
}

impl TrendPeriod {
    /// Parse a period name ("day", "week", "month").
    pub fn parse(s: &str) -> Option<TrendPeriod> {
        match s {
            "day" => Some(TrendPeriod::Day),
            "week" => Some(TrendPeriod::Week),
            "month" => Some(TrendPeriod::Month),
            _ => None,
        }
    }
}

// ============================================================================
// STATISTICS ENGINE
// ============================================================================

/// Derives aggregate views from record-manager queries. All aggregation is a
/// single in-memory pass over the fetched records; no rounding is applied
/// here (display rounding is the UI's concern).
pub struct StatisticsEngine {
    manager: RecordManager,
}

impl StatisticsEngine {
    pub fn new(manager: RecordManager) -> Self {
        StatisticsEngine { manager }
    }

    pub fn manager(&self) -> &RecordManager {
        &self.manager
    }

    // ========================================================================
    // SUMMARIES
    // ========================================================================

    /// Income/expense totals for one day (defaults to today). Bounds are
    /// [midnight, midnight + 1 day - 1 second], inclusive.
    pub fn daily_summary(&self, date: Option<NaiveDateTime>) -> Result<Summary> {
        let date = date.unwrap_or_else(|| Local::now().naive_local());

        let start = date.date().and_time(NaiveTime::MIN);
        let end = start + Duration::days(1) - Duration::seconds(1);

        let records = self.manager.get_all_records(Some(start), Some(end))?;
        Ok(calculate_summary(&records))
    }

    /// Totals for the Monday-start week containing `date` (defaults to now).
    pub fn weekly_summary(&self, date: Option<NaiveDateTime>) -> Result<Summary> {
        let date = date.unwrap_or_else(|| Local::now().naive_local());

        let monday = date.date()
            - Duration::days(date.weekday().num_days_from_monday() as i64);
        let start = monday.and_time(NaiveTime::MIN);
        let end = start + Duration::days(7) - Duration::seconds(1);

        let records = self.manager.get_all_records(Some(start), Some(end))?;
        Ok(calculate_summary(&records))
    }

    /// Totals for one calendar month; both parts default to the current
    /// year/month when either is omitted. December rolls into the next
    /// January for the upper bound.
    pub fn monthly_summary(&self, year: Option<i32>, month: Option<u32>) -> Result<Summary> {
        let (year, month) = match (year, month) {
            (Some(y), Some(m)) => (y, m),
            _ => {
                let today = Local::now().naive_local();
                (today.year(), today.month())
            }
        };

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("Invalid year/month: {}-{}", year, month))?
            .and_time(NaiveTime::MIN);

        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| anyhow!("Invalid year/month: {}-{}", next_year, next_month))?
            .and_time(NaiveTime::MIN)
            - Duration::seconds(1);

        let records = self.manager.get_all_records(Some(start), Some(end))?;
        Ok(calculate_summary(&records))
    }

    // ========================================================================
    // CATEGORY BREAKDOWN
    // ========================================================================

    /// Total expense amount per category over an optional date range.
    /// Categories with no matching records are absent from the map.
    pub fn category_expenses(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<HashMap<String, f64>> {
        let records = self.manager.get_all_records(start_date, end_date)?;

        let mut totals: HashMap<String, f64> = HashMap::new();
        for record in &records {
            if record.record_type == RecordType::Expense {
                *totals.entry(record.category.clone()).or_insert(0.0) += record.amount;
            }
        }

        Ok(totals)
    }

    /// Highest-spending categories, amount descending, truncated to `limit`.
    /// Ties break by category name so the ordering is deterministic.
    pub fn top_expenses(
        &self,
        limit: usize,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Vec<(String, f64)>> {
        let totals = self.category_expenses(start_date, end_date)?;

        let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);

        Ok(ranked)
    }

    // ========================================================================
    // TREND SERIES
    // ========================================================================

    /// Income/expense series over the last `count` periods ending at the
    /// current one, oldest first. Always exactly `count` entries; empty
    /// periods appear with zero totals.
    pub fn trend_data(&self, period: TrendPeriod, count: usize) -> Result<Vec<TrendPoint>> {
        let today = Local::now().naive_local();
        let mut trend = Vec::with_capacity(count);

        for i in (0..count).rev() {
            let (label, summary) = match period {
                TrendPeriod::Day => {
                    let date = today - Duration::days(i as i64);
                    let summary = self.daily_summary(Some(date))?;
                    (date.format("%m-%d").to_string(), summary)
                }
                TrendPeriod::Week => {
                    let week_start = today
                        - Duration::days(today.weekday().num_days_from_monday() as i64)
                        - Duration::weeks(i as i64);
                    let summary = self.weekly_summary(Some(week_start))?;
                    let week_end = week_start + Duration::days(6);
                    let label = format!(
                        "{}~{}",
                        week_start.format("%m-%d"),
                        week_end.format("%m-%d")
                    );
                    (label, summary)
                }
                TrendPeriod::Month => {
                    // Whole-month subtraction with year rollover
                    let mut month = today.month() as i32 - i as i32;
                    let mut year = today.year();
                    while month <= 0 {
                        month += 12;
                        year -= 1;
                    }
                    let summary = self.monthly_summary(Some(year), Some(month as u32))?;
                    (format!("{}-{:02}", year, month), summary)
                }
            };

            trend.push(TrendPoint {
                period: label,
                income: summary.total_income,
                expense: summary.total_expense,
            });
        }

        Ok(trend)
    }
}

/// Single linear pass: split amounts by type, balance = income - expense.
fn calculate_summary(records: &[Record]) -> Summary {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;

    for record in records {
        match record.record_type {
            RecordType::Income => total_income += record.amount,
            RecordType::Expense => total_expense += record.amount,
        }
    }

    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn temp_engine(name: &str) -> StatisticsEngine {
        let path = std::env::temp_dir().join(format!(
            "account_book_test_stats_{}_{}.db",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_file(&path);
        StatisticsEngine::new(RecordManager::new(Storage::open(&path).unwrap()))
    }

    fn add(
        engine: &StatisticsEngine,
        amount: f64,
        category: &str,
        record_type: RecordType,
        date: NaiveDateTime,
    ) {
        engine
            .manager()
            .add_record(amount, category, "", record_type, date)
            .unwrap();
    }

    #[test]
    fn test_concrete_scenario() {
        // Seed: salary 100 today, dining 50 today, transport 30 yesterday
        let engine = temp_engine("scenario");
        let today = Local::now().naive_local();
        let yesterday = today - Duration::days(1);

        add(&engine, 100.0, "salary", RecordType::Income, today);
        add(&engine, 50.0, "dining", RecordType::Expense, today);
        add(&engine, 30.0, "transport", RecordType::Expense, yesterday);

        let summary = engine.daily_summary(Some(today)).unwrap();
        assert!((summary.total_income - 100.0).abs() < 0.001);
        assert!((summary.total_expense - 50.0).abs() < 0.001);
        assert!((summary.balance - 50.0).abs() < 0.001);

        let found = engine
            .manager()
            .search_records(&crate::storage::SearchFilter {
                min_amount: Some(40.0),
                max_amount: Some(120.0),
                ..Default::default()
            })
            .unwrap();
        let amounts: Vec<f64> = found.iter().map(|r| r.amount).collect();
        assert_eq!(amounts.len(), 2);
        assert!(amounts.contains(&100.0));
        assert!(amounts.contains(&50.0));

        let top = engine.top_expenses(1, None, None).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "dining");
        assert!((top[0].1 - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_daily_summary_bounds_are_inclusive() {
        let engine = temp_engine("daily_bounds");
        let day = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_time(NaiveTime::MIN);

        // Inside: first and last second of the day
        add(&engine, 10.0, "dining", RecordType::Expense, day);
        add(
            &engine,
            20.0,
            "dining",
            RecordType::Expense,
            day + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59),
        );
        // Outside: next midnight and the second before this one
        add(&engine, 40.0, "dining", RecordType::Expense, day + Duration::days(1));
        add(&engine, 80.0, "dining", RecordType::Expense, day - Duration::seconds(1));

        let summary = engine.daily_summary(Some(day + Duration::hours(12))).unwrap();
        assert!((summary.total_expense - 30.0).abs() < 0.001);
        assert!((summary.total_income).abs() < 0.001);
    }

    #[test]
    fn test_weekly_summary_monday_start() {
        let engine = temp_engine("weekly");
        // 2024-06-12 is a Wednesday; its week is Mon 06-10 .. Sun 06-16
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let sunday_night = NaiveDate::from_ymd_opt(2024, 6, 16)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        add(&engine, 5.0, "dining", RecordType::Expense, monday);
        add(&engine, 7.0, "dining", RecordType::Expense, sunday_night);
        // Previous Sunday, outside the week
        add(
            &engine,
            100.0,
            "dining",
            RecordType::Expense,
            monday - Duration::seconds(1),
        );

        let summary = engine.weekly_summary(Some(wednesday)).unwrap();
        assert!((summary.total_expense - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_monthly_summary_december_rollover() {
        let engine = temp_engine("monthly");
        let dec_first = NaiveDate::from_ymd_opt(2023, 12, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let dec_last = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let jan_first = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);

        add(&engine, 100.0, "salary", RecordType::Income, dec_first);
        add(&engine, 40.0, "shopping", RecordType::Expense, dec_last);
        add(&engine, 999.0, "salary", RecordType::Income, jan_first);

        let summary = engine.monthly_summary(Some(2023), Some(12)).unwrap();
        assert!((summary.total_income - 100.0).abs() < 0.001);
        assert!((summary.total_expense - 40.0).abs() < 0.001);
        assert!((summary.balance - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_monthly_summary_rejects_invalid_month() {
        let engine = temp_engine("monthly_invalid");
        assert!(engine.monthly_summary(Some(2024), Some(13)).is_err());
    }

    #[test]
    fn test_summary_balance_identity() {
        let engine = temp_engine("balance");
        let today = Local::now().naive_local();

        add(&engine, 10.5, "salary", RecordType::Income, today);
        add(&engine, 3.25, "dining", RecordType::Expense, today);
        add(&engine, 2.25, "transport", RecordType::Expense, today);

        let summary = engine.daily_summary(Some(today)).unwrap();
        assert!(
            (summary.balance - (summary.total_income - summary.total_expense)).abs() < 1e-9
        );
        assert!((summary.total_income + summary.total_expense - 16.0).abs() < 0.001);
    }

    #[test]
    fn test_category_expenses_skips_income_and_empty_categories() {
        let engine = temp_engine("category_expenses");
        let today = Local::now().naive_local();

        add(&engine, 100.0, "salary", RecordType::Income, today);
        add(&engine, 20.0, "dining", RecordType::Expense, today);
        add(&engine, 15.0, "dining", RecordType::Expense, today);
        add(&engine, 8.0, "transport", RecordType::Expense, today);

        let totals = engine.category_expenses(None, None).unwrap();
        assert_eq!(totals.len(), 2);
        assert!((totals["dining"] - 35.0).abs() < 0.001);
        assert!((totals["transport"] - 8.0).abs() < 0.001);
        assert!(!totals.contains_key("salary"));
        assert!(!totals.contains_key("shopping"));
    }

    #[test]
    fn test_top_expenses_order_and_limit() {
        let engine = temp_engine("top_expenses");
        let today = Local::now().naive_local();

        add(&engine, 50.0, "dining", RecordType::Expense, today);
        add(&engine, 80.0, "housing", RecordType::Expense, today);
        add(&engine, 50.0, "transport", RecordType::Expense, today);
        add(&engine, 5.0, "communication", RecordType::Expense, today);

        let top = engine.top_expenses(3, None, None).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, "housing");
        // Tied categories rank by name
        assert_eq!(top[1].0, "dining");
        assert_eq!(top[2].0, "transport");

        let all = engine.top_expenses(10, None, None).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_trend_length_invariant_on_empty_store() {
        let engine = temp_engine("trend_empty");

        for period in [TrendPeriod::Day, TrendPeriod::Week, TrendPeriod::Month] {
            let trend = engine.trend_data(period, 6).unwrap();
            assert_eq!(trend.len(), 6);
            for point in &trend {
                assert_eq!(point.income, 0.0);
                assert_eq!(point.expense, 0.0);
                assert!(!point.period.is_empty());
            }
        }
    }

    #[test]
    fn test_trend_data_oldest_first_with_data() {
        let engine = temp_engine("trend_data");
        let today = Local::now().naive_local();

        add(&engine, 12.0, "dining", RecordType::Expense, today);
        add(&engine, 9.0, "dining", RecordType::Expense, today - Duration::days(1));

        let trend = engine.trend_data(TrendPeriod::Day, 3).unwrap();
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[2].period, today.format("%m-%d").to_string());
        assert!((trend[2].expense - 12.0).abs() < 0.001);
        assert!((trend[1].expense - 9.0).abs() < 0.001);
        assert_eq!(trend[0].expense, 0.0);
    }

    #[test]
    fn test_trend_week_labels_span_monday_to_sunday() {
        let engine = temp_engine("trend_week_labels");

        let trend = engine.trend_data(TrendPeriod::Week, 2).unwrap();
        assert_eq!(trend.len(), 2);

        let today = Local::now().naive_local();
        let monday =
            today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(6);
        let expected = format!("{}~{}", monday.format("%m-%d"), sunday.format("%m-%d"));
        assert_eq!(trend[1].period, expected);
        assert!(trend[0].period.contains('~'));
    }

    #[test]
    fn test_trend_month_rolls_over_year_boundary() {
        let engine = temp_engine("trend_month_labels");

        // 13 months back always crosses a year boundary
        let trend = engine.trend_data(TrendPeriod::Month, 13).unwrap();
        assert_eq!(trend.len(), 13);

        let today = Local::now().naive_local();
        assert_eq!(
            trend[12].period,
            format!("{}-{:02}", today.year(), today.month())
        );
        assert_eq!(
            trend[0].period,
            format!("{}-{:02}", today.year() - 1, today.month())
        );

        // Labels are unique and well-formed
        for point in &trend {
            assert_eq!(point.period.len(), 7);
            assert_eq!(&point.period[4..5], "-");
        }
    }

    #[test]
    fn test_trend_period_parse() {
        assert_eq!(TrendPeriod::parse("day"), Some(TrendPeriod::Day));
        assert_eq!(TrendPeriod::parse("week"), Some(TrendPeriod::Week));
        assert_eq!(TrendPeriod::parse("month"), Some(TrendPeriod::Month));
        assert_eq!(TrendPeriod::parse("year"), None);
    }
}
