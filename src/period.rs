//! Lookback period tokens accepted from the caller

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Lookback period of one analysis run
///
/// Serialized as its token; deserialized with the same rules as [`Period::parse`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    ThreeYears,
    FourYears,
    FiveYears,
    Max,
}

impl Period {
    pub const ALL: [Period; 10] = [
        Period::OneWeek,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::ThreeYears,
        Period::FourYears,
        Period::FiveYears,
        Period::Max,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Period::OneWeek => "1W",
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::OneYear => "1Y",
            Period::TwoYears => "2Y",
            Period::ThreeYears => "3Y",
            Period::FourYears => "4Y",
            Period::FiveYears => "5Y",
            Period::Max => "MAX",
        }
    }

    /// Parse a token, case-insensitive and ignoring surrounding whitespace
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    /// Parse a token, falling back to `default` for blank or unrecognized input.
    ///
    /// Every fallback is logged.
    pub fn parse_or(token: &str, default: Period) -> Self {
        if token.trim().is_empty() {
            info!(fallback = default.token(), "no period given, using default");
            return default;
        }
        Self::parse(token).unwrap_or_else(|| {
            warn!(
                token = token.trim(),
                fallback = default.token(),
                "unrecognized period token, using default"
            );
            default
        })
    }

    /// Lookback boundary from `end`: rows strictly after it belong to the period.
    ///
    /// `None` means no bound.
    pub fn start_from(self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::OneWeek => end.checked_sub_days(Days::new(7)),
            Period::OneMonth => end.checked_sub_months(Months::new(1)),
            Period::ThreeMonths => end.checked_sub_months(Months::new(3)),
            Period::SixMonths => end.checked_sub_months(Months::new(6)),
            Period::OneYear => end.checked_sub_months(Months::new(12)),
            Period::TwoYears => end.checked_sub_months(Months::new(24)),
            Period::ThreeYears => end.checked_sub_months(Months::new(36)),
            Period::FourYears => end.checked_sub_months(Months::new(48)),
            Period::FiveYears => end.checked_sub_months(Months::new(60)),
            Period::Max => None,
        }
    }

    /// Options line shown by the interactive prompt
    pub fn options_line() -> String {
        Self::ALL
            .iter()
            .map(|p| p.token())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::parse(&token).ok_or_else(|| {
            format!(
                "unknown period '{}', expected one of {}",
                token,
                Self::options_line()
            )
        })
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.token().to_string()
    }
}
