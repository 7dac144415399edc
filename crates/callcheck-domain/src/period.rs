//! Fiscal periods, calendar quarters and reporting windows

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A company-specific fiscal period
///
/// `quarter` is 1-4 for fiscal quarters and 0 for the full fiscal year.
/// Ordering is by year, then quarter, so an annual period sorts before the
/// first quarter of the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Fiscal year
    pub year: i32,
    /// Fiscal quarter (0 = annual)
    pub quarter: u8,
}

impl FiscalPeriod {
    /// Create a fiscal period
    pub fn new(year: i32, quarter: u8) -> Self {
        Self { year, quarter }
    }

    /// Full fiscal year
    pub fn annual(year: i32) -> Self {
        Self { year, quarter: 0 }
    }

    /// Whether this is a full-year period
    pub fn is_annual(&self) -> bool {
        self.quarter == 0
    }

    /// Quarter immediately before this one (None for annual periods)
    pub fn previous_quarter(&self) -> Option<Self> {
        match self.quarter {
            0 => None,
            1 => Some(Self::new(self.year - 1, 4)),
            q => Some(Self::new(self.year, q - 1)),
        }
    }

    /// Same period one fiscal year earlier
    pub fn prior_year(&self) -> Self {
        Self::new(self.year - 1, self.quarter)
    }

    /// Canonical label ("Q3 FY2024", "FY2024")
    pub fn label(&self) -> String {
        if self.is_annual() {
            format!("FY{}", self.year)
        } else {
            format!("Q{} FY{}", self.quarter, self.year)
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A calendar quarter, derived from a statement's period-end date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarQuarter {
    /// Calendar year
    pub year: i32,
    /// Calendar quarter (1-4)
    pub quarter: u8,
}

impl CalendarQuarter {
    /// Create a calendar quarter
    pub fn new(year: i32, quarter: u8) -> Self {
        Self { year, quarter }
    }

    /// Calendar quarter containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month() - 1) / 3 + 1) as u8,
        }
    }

    /// Last day of the quarter (Mar 31, Jun 30, Sep 30, Dec 31)
    pub fn nominal_end(&self) -> Option<NaiveDate> {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            4 => (12, 31),
            _ => return None,
        };
        NaiveDate::from_ymd_opt(self.year, month, day)
    }
}

impl fmt::Display for CalendarQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQ{} {}", self.quarter, self.year)
    }
}

/// Reporting window a period label denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// One fiscal quarter
    Quarter,
    /// First half of the fiscal year (Q1 + Q2)
    HalfYear,
    /// First nine months of the fiscal year (Q1..Q3)
    NineMonths,
    /// Fiscal year to date (Q1..anchor)
    YearToDate,
    /// Trailing twelve months ending at the anchor quarter
    TrailingTwelveMonths,
    /// Full fiscal year
    FullYear,
}

impl Window {
    /// Get the window name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Quarter => "quarter",
            Window::HalfYear => "half_year",
            Window::NineMonths => "nine_months",
            Window::YearToDate => "year_to_date",
            Window::TrailingTwelveMonths => "ttm",
            Window::FullYear => "full_year",
        }
    }

    /// Parse a window name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quarter" | "q" => Some(Window::Quarter),
            "half_year" | "h1" => Some(Window::HalfYear),
            "nine_months" | "9m" => Some(Window::NineMonths),
            "year_to_date" | "ytd" => Some(Window::YearToDate),
            "ttm" | "ltm" => Some(Window::TrailingTwelveMonths),
            "full_year" | "fy" => Some(Window::FullYear),
            _ => None,
        }
    }

    /// Quarterly periods that make up the window, in ascending order
    ///
    /// `anchor` is the period the window ends at. Annual anchors are treated
    /// as ending at Q4.
    ///
    /// # Examples
    ///
    /// ```
    /// use callcheck_domain::{FiscalPeriod, Window};
    ///
    /// let ttm = Window::TrailingTwelveMonths.constituents(FiscalPeriod::new(2024, 2));
    /// assert_eq!(ttm.first(), Some(&FiscalPeriod::new(2023, 3)));
    /// assert_eq!(ttm.last(), Some(&FiscalPeriod::new(2024, 2)));
    /// ```
    pub fn constituents(&self, anchor: FiscalPeriod) -> Vec<FiscalPeriod> {
        let year = anchor.year;
        let end = if anchor.is_annual() { 4 } else { anchor.quarter };
        match self {
            Window::Quarter => vec![FiscalPeriod::new(year, end)],
            Window::HalfYear => (1..=2).map(|q| FiscalPeriod::new(year, q)).collect(),
            Window::NineMonths => (1..=3).map(|q| FiscalPeriod::new(year, q)).collect(),
            Window::YearToDate => (1..=end).map(|q| FiscalPeriod::new(year, q)).collect(),
            Window::FullYear => (1..=4).map(|q| FiscalPeriod::new(year, q)).collect(),
            Window::TrailingTwelveMonths => {
                let mut periods = vec![FiscalPeriod::new(year, end)];
                while periods.len() < 4 {
                    match periods[0].previous_quarter() {
                        Some(prev) => periods.insert(0, prev),
                        None => break,
                    }
                }
                periods
            }
        }
    }

    /// Anchor period for a window over the given fiscal year and quarter
    pub fn anchor(&self, year: i32, quarter: Option<u8>) -> FiscalPeriod {
        match self {
            Window::FullYear => FiscalPeriod::annual(year),
            Window::HalfYear => FiscalPeriod::new(year, 2),
            Window::NineMonths => FiscalPeriod::new(year, 3),
            Window::Quarter | Window::YearToDate | Window::TrailingTwelveMonths => {
                FiscalPeriod::new(year, quarter.unwrap_or(4))
            }
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
