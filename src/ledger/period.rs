use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Calendar interval reports group items by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Interval {
    pub const NAMES: &'static str = "daily, weekly, monthly, yearly";

    /// First day of the interval containing `date`. Weeks start on Monday.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Interval::Daily => date,
            Interval::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Interval::Monthly => date.with_day(1).unwrap_or(date),
            Interval::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Last day of the interval containing `date`.
    pub fn end_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Interval::Daily => date,
            _ => self.next_start(self.start_of(date)).pred_opt().unwrap_or(date),
        }
    }

    /// Widen `from..=till` so it covers whole intervals.
    pub fn align(self, from: NaiveDate, till: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.start_of(from), self.end_of(till))
    }

    fn next_start(self, start: NaiveDate) -> NaiveDate {
        match self {
            Interval::Daily => start + Duration::days(1),
            Interval::Weekly => start + Duration::weeks(1),
            Interval::Monthly => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
            }
            Interval::Yearly => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap_or(start),
        }
    }

    /// Start dates of every interval of the aligned range, in order.
    pub fn steps(self, from: NaiveDate, till: NaiveDate) -> Vec<NaiveDate> {
        let (from, till) = self.align(from, till);
        let mut steps = Vec::new();
        let mut current = from;
        while current <= till {
            steps.push(current);
            let next = self.next_start(current);
            if next <= current {
                break;
            }
            current = next;
        }
        steps
    }

    /// Human readable label of the interval starting at `start`.
    pub fn describe(self, start: NaiveDate) -> String {
        let pattern = match self {
            Interval::Daily => "%Y-%m-%d",
            Interval::Weekly => "wk%U %y",
            Interval::Monthly => "%b %y",
            Interval::Yearly => "%Y",
        };
        start.format(pattern).to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Weekly => write!(f, "weekly"),
            Interval::Monthly => write!(f, "monthly"),
            Interval::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for Interval {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Interval::Daily),
            "weekly" | "week" => Ok(Interval::Weekly),
            "monthly" | "month" => Ok(Interval::Monthly),
            "yearly" | "year" | "annually" => Ok(Interval::Yearly),
            _ => Err(ReportError::InvalidChoice {
                kind: "interval",
                value: s.to_string(),
                expected: Interval::NAMES,
            }),
        }
    }
}

/// A whole interval, used as grouping key. Ordered by start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

impl Period {
    pub fn containing(date: NaiveDate, interval: Interval) -> Self {
        let (start, end) = interval.align(date, date);
        Self {
            start,
            end,
            interval,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn label(&self) -> String {
        self.interval.describe(self.start)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_align_lengths() {
        let d = date("2018-03-08");
        let (from, till) = Interval::Weekly.align(d, d);
        assert_eq!(till - from, Duration::days(6));
        assert_eq!(from, date("2018-03-05"));

        let (from, till) = Interval::Monthly.align(d, d);
        assert_eq!(till - from, Duration::days(30));

        let (from, till) = Interval::Monthly.align(d, date("2018-04-01"));
        assert_eq!(till - from, Duration::days(60));

        let (from, till) = Interval::Yearly.align(d, d);
        assert_eq!(till - from, Duration::days(364));

        let (from, till) = Interval::Yearly.align(d, date("2019-02-13"));
        assert_eq!(till - from, Duration::days(729));
    }

    #[test]
    fn test_end_of_december() {
        assert_eq!(Interval::Monthly.end_of(date("2018-12-05")), date("2018-12-31"));
        assert_eq!(Interval::Monthly.end_of(date("2020-02-10")), date("2020-02-29"));
    }

    #[test]
    fn test_steps_inclusive() {
        let steps = Interval::Monthly.steps(date("2018-03-08"), date("2018-06-17"));
        assert_eq!(
            steps,
            vec![
                date("2018-03-01"),
                date("2018-04-01"),
                date("2018-05-01"),
                date("2018-06-01")
            ]
        );

        let d = date("2018-03-08");
        assert_eq!(Interval::Daily.steps(d, d), vec![d]);
        assert_eq!(Interval::Weekly.steps(d, date("2018-03-16")).len(), 2);
    }

    #[test]
    fn test_describe() {
        let d = date("2018-03-01");
        assert_eq!(Interval::Monthly.describe(d), "Mar 18");
        assert_eq!(Interval::Yearly.describe(d), "2018");
        assert_eq!(Interval::Daily.describe(d), "2018-03-01");
        assert_eq!(Interval::Weekly.describe(date("2018-03-05")), "wk09 18");
    }

    #[test]
    fn test_period_containing() {
        let p = Period::containing(date("2018-03-16"), Interval::Monthly);
        assert!(p.contains(date("2018-03-01")));
        assert!(p.contains(date("2018-03-31")));
        assert!(!p.contains(date("2018-04-01")));
        assert_eq!(p.label(), "Mar 18");
    }

    #[test]
    fn test_interval_from_str() {
        assert_eq!("Weekly".parse::<Interval>().unwrap(), Interval::Weekly);
        assert!(matches!(
            "fortnightly".parse::<Interval>(),
            Err(ReportError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("03/08/2018"),
            Err(ReportError::InvalidDate(_))
        ));
    }
}
