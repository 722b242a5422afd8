use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    pub id: i64,
    pub start_date: NaiveDate,
    #[serde(with = "hm_time")]
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    #[serde(with = "hm_time")]
    pub end_time: NaiveTime,
    /// Hours, rounded to 2 decimals. Always derived from the four date/time fields.
    pub duration: f64,
    #[serde(default)]
    pub comments: String,
}

/// Raw record fields as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecordInput {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub users: BTreeMap<String, Vec<SleepRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAverage {
    pub week_key: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub month_key: String,
    pub average: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub window_size: usize,
    pub daily_totals: Vec<DailyTotal>,
    pub rolling_average: Vec<f64>,
    pub weekly_averages: Vec<WeeklyAverage>,
    pub monthly_averages: Vec<MonthlyAverage>,
    pub overall_average: f64,
}

/// `HH:MM` wall-clock times. A non-zero seconds field is written as `HH:MM:SS`.
pub mod hm_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";
    const FORMAT_SECONDS: &str = "%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn format(time: &NaiveTime) -> String {
        let format = if time.second() == 0 { FORMAT } else { FORMAT_SECONDS };
        time.format(format).to_string()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, FORMAT_SECONDS))
    }
}
