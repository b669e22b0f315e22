use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named reporting window, resolved against the start of the current UTC day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "custom")]
    Custom,
}

impl Timeframe {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::NinetyDays => "90d",
            Self::ThreeMonths => "3m",
            Self::Yesterday => "yesterday",
            Self::All => "all",
            Self::Custom => "custom",
        }
    }

    /// Earliest instant included in the window.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = day_start(now.date_naive());
        match self {
            Self::SevenDays | Self::Custom => today - Duration::days(7),
            Self::ThirtyDays => today - Duration::days(30),
            Self::NinetyDays => today - Duration::days(90),
            Self::ThreeMonths => today
                .checked_sub_months(Months::new(3))
                .unwrap_or(DateTime::UNIX_EPOCH),
            Self::Yesterday => today - Duration::days(1),
            Self::All => DateTime::UNIX_EPOCH,
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "7d" => Ok(Self::SevenDays),
            "30d" => Ok(Self::ThirtyDays),
            "90d" => Ok(Self::NinetyDays),
            "3m" => Ok(Self::ThreeMonths),
            "yesterday" => Ok(Self::Yesterday),
            "all" => Ok(Self::All),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

/// Inclusive time window. An open end means "up to now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn all() -> Self {
        Self {
            start: DateTime::UNIX_EPOCH,
            end: None,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.map_or(true, |end| instant <= end)
    }
}

/// Resolves a timeframe plus optional explicit day bounds into a concrete range.
///
/// `start_date` snaps to the start of its day and `end_date` to the last
/// millisecond of its day; either one overrides the timeframe on its side.
pub fn resolve_range(
    timeframe: Timeframe,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> DateRange {
    let start = start_date
        .map(day_start)
        .unwrap_or_else(|| timeframe.cutoff(now));
    let end = end_date.map(day_end);
    DateRange { start, end }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| format!("invalid date '{value}': {error}"))
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + Duration::days(1) - Duration::milliseconds(1)
}
