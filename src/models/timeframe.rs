//! Fire alert timeframe selection

use chrono::{Days, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing window used for thermal-anomaly detections.
///
/// Only [`Timeframe::Today`] enables burned-area prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "today")]
    #[value(name = "today")]
    Today,
    #[serde(rename = "past-day")]
    #[value(name = "past-day")]
    PastDay,
    #[serde(rename = "past-3-days")]
    #[value(name = "past-3-days")]
    Past3Days,
    #[serde(rename = "past-week")]
    #[value(name = "past-week")]
    PastWeek,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Today,
        Timeframe::PastDay,
        Timeframe::Past3Days,
        Timeframe::PastWeek,
    ];

    /// Days subtracted from today for the start of the alert window
    #[must_use]
    pub fn days_back(self) -> u64 {
        match self {
            Timeframe::Today => 1,
            Timeframe::PastDay => 2,
            Timeframe::Past3Days => 4,
            Timeframe::PastWeek => 8,
        }
    }

    /// First day of the alert window, which spans `days_back` days ending with `today`
    #[must_use]
    pub fn window_start(self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.days_back() - 1))
            .unwrap_or(today)
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Timeframe::Today => "today",
            Timeframe::PastDay => "past-day",
            Timeframe::Past3Days => "past-3-days",
            Timeframe::PastWeek => "past-week",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Today => "Only Today (Real-Time)",
            Timeframe::PastDay => "Past 1 Day",
            Timeframe::Past3Days => "Past 3 Days",
            Timeframe::PastWeek => "Past Week",
        }
    }

    #[must_use]
    pub fn is_real_time(self) -> bool {
        self == Timeframe::Today
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = crate::FireWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|t| t.slug() == s || t.label() == s)
            .ok_or_else(|| crate::FireWatchError::validation(format!("unknown timeframe '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Timeframe::Today, 1)]
    #[case(Timeframe::PastDay, 2)]
    #[case(Timeframe::Past3Days, 4)]
    #[case(Timeframe::PastWeek, 8)]
    fn test_days_back(#[case] timeframe: Timeframe, #[case] days: u64) {
        assert_eq!(timeframe.days_back(), days);
    }

    #[test]
    fn test_window_start() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(
            Timeframe::Past3Days.window_start(today),
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()
        );
        assert_eq!(Timeframe::Today.window_start(today), today);
    }

    #[test]
    fn test_parse_slug_and_label() {
        assert_eq!("past-week".parse::<Timeframe>().unwrap(), Timeframe::PastWeek);
        assert_eq!(
            "Only Today (Real-Time)".parse::<Timeframe>().unwrap(),
            Timeframe::Today
        );
        assert!("yesterday".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_only_today_is_real_time() {
        assert!(Timeframe::Today.is_real_time());
        assert!(!Timeframe::PastDay.is_real_time());
    }
}
