use crate::errors::RecordError;
use crate::models::{hm_time, SleepRecord, SleepRecordInput};
use chrono::{Duration, NaiveDate, NaiveTime};

/// Elapsed hours between two wall-clock moments, rounded to 2 decimals.
///
/// An end that falls before the start is read as happening one day later, which
/// covers overnight sessions entered without advancing the end date.
pub fn calculate_duration(
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_date: NaiveDate,
    end_time: NaiveTime,
) -> f64 {
    let start = start_date.and_time(start_time);
    let mut end = end_date.and_time(end_time);

    if end < start {
        end += Duration::days(1);
    }

    round2(hours(end - start))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn hours(delta: Duration) -> f64 {
    delta.num_seconds() as f64 / 3600.0
}

impl SleepRecord {
    pub fn from_input(id: i64, input: &SleepRecordInput) -> Result<Self, RecordError> {
        let start_date = parse_date("start", &input.start_date)?;
        let start_time = parse_time("start", &input.start_time)?;
        let end_date = parse_date("end", &input.end_date)?;
        let end_time = parse_time("end", &input.end_time)?;

        let duration = calculate_duration(start_date, start_time, end_date, end_time);
        if duration < 0.0 {
            return Err(RecordError::EndBeforeStart);
        }

        Ok(Self {
            id,
            start_date,
            start_time,
            end_date,
            end_time,
            duration,
            comments: input.comments.trim().to_string(),
        })
    }

    /// Checks a record that arrived already typed, e.g. from an import file.
    pub fn validate(&self) -> Result<(), RecordError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(RecordError::InvalidDuration(self.duration));
        }
        let span =
            calculate_duration(self.start_date, self.start_time, self.end_date, self.end_time);
        if span < 0.0 {
            return Err(RecordError::EndBeforeStart);
        }
        Ok(())
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RecordError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, RecordError> {
    hm_time::parse(value).map_err(|_| RecordError::InvalidTime {
        field,
        value: value.to_string(),
    })
}
