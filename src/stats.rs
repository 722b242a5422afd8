use crate::duration::round2;
use crate::models::{DailyTotal, MonthlyAverage, SleepRecord, StatsResponse, WeeklyAverage};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;

pub const DEFAULT_ROLLING_WINDOW: NonZeroUsize = match NonZeroUsize::new(7) {
    Some(window) => window,
    None => unreachable!(),
};

pub fn build_stats(records: &[SleepRecord], window: NonZeroUsize) -> StatsResponse {
    let daily_totals = daily_totals(records);

    StatsResponse {
        window_size: window.get(),
        rolling_average: rolling_average(&daily_totals, window),
        weekly_averages: weekly_averages(&daily_totals),
        monthly_averages: monthly_averages(&daily_totals),
        overall_average: overall_average(&daily_totals),
        daily_totals,
    }
}

/// Sums durations per start date. Sessions crossing midnight count for the day they began.
pub fn daily_totals(records: &[SleepRecord]) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.start_date).or_default() += record.duration;
    }

    totals
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Trailing mean over at most `window` days, one value per daily total.
pub fn rolling_average(totals: &[DailyTotal], window: NonZeroUsize) -> Vec<f64> {
    let window = window.get();
    let mut queue = VecDeque::with_capacity(window);
    let mut sum = 0.0;
    let mut result = Vec::with_capacity(totals.len());

    for day in totals {
        queue.push_back(day.total);
        sum += day.total;
        if queue.len() > window {
            if let Some(oldest) = queue.pop_front() {
                sum -= oldest;
            }
        }
        result.push(round2(sum / queue.len() as f64));
    }

    result
}

pub fn weekly_averages(totals: &[DailyTotal]) -> Vec<WeeklyAverage> {
    bucket_means(totals, week_key)
        .into_iter()
        .map(|(week_key, average)| WeeklyAverage { week_key, average })
        .collect()
}

pub fn monthly_averages(totals: &[DailyTotal]) -> Vec<MonthlyAverage> {
    bucket_means(totals, month_key)
        .into_iter()
        .map(|(month_key, average)| MonthlyAverage { month_key, average })
        .collect()
}

pub fn overall_average(totals: &[DailyTotal]) -> f64 {
    if totals.is_empty() {
        return 0.0;
    }
    totals.iter().map(|day| day.total).sum::<f64>() / totals.len() as f64
}

/// ISO-8601 week label, e.g. `2025-W01`. The year is the ISO week-numbering year.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

// Mean over the days present in each bucket, not over calendar days in the period.
// Keys are zero-padded so string order is chronological.
fn bucket_means(totals: &[DailyTotal], key: fn(NaiveDate) -> String) -> Vec<(String, f64)> {
    let mut buckets: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for day in totals {
        let (sum, count) = buckets.entry(key(day.date)).or_default();
        *sum += day.total;
        *count += 1;
    }

    buckets
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / f64::from(count)))
        .collect()
}
