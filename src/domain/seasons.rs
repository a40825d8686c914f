use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::pricing::round_half_up;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonTier {
    Peak,
    High,
    Mid,
    Low,
}

impl SeasonTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for SeasonTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A month/day point in the recurring yearly calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

/// An inclusive month/day span recurring every year. Spans may wrap the
/// year boundary (e.g. Dec 20 – Jan 5).
#[derive(Debug, Clone, Copy)]
pub struct SeasonSpan {
    pub from: MonthDay,
    pub to: MonthDay,
}

impl SeasonSpan {
    pub const fn new(from: MonthDay, to: MonthDay) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let md = MonthDay::of(date);
        if self.from <= self.to {
            self.from <= md && md <= self.to
        } else {
            md >= self.from || md <= self.to
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeasonBand {
    pub tier: SeasonTier,
    pub multiplier_pct: i64,
    pub spans: Vec<SeasonSpan>,
}

/// Ordered season table. Bands are evaluated front to back, so when a
/// date sits in two declared spans the earlier band wins — a fixed
/// tie-break, not an error. Dates matching no band fall back to Mid.
#[derive(Debug, Clone)]
pub struct SeasonTable {
    bands: Vec<SeasonBand>,
    mid_multiplier_pct: i64,
}

impl SeasonTable {
    pub fn new(bands: Vec<SeasonBand>, mid_multiplier_pct: i64) -> Self {
        Self {
            bands,
            mid_multiplier_pct,
        }
    }

    /// Tier and multiplier for one calendar date.
    pub fn resolve(&self, date: NaiveDate) -> (SeasonTier, i64) {
        for band in &self.bands {
            if band.spans.iter().any(|span| span.contains(date)) {
                return (band.tier, band.multiplier_pct);
            }
        }
        (SeasonTier::Mid, self.mid_multiplier_pct)
    }

    /// Nightly price for one date: base × multiplier, rounded half-up
    /// to the cent.
    pub fn nightly_price(&self, base_price_cents: i64, date: NaiveDate) -> (SeasonTier, i64) {
        let (tier, pct) = self.resolve(date);
        (tier, round_half_up(base_price_cents * pct, 100))
    }
}

impl Default for SeasonTable {
    fn default() -> Self {
        Self::new(
            vec![
                SeasonBand {
                    tier: SeasonTier::Peak,
                    multiplier_pct: 150,
                    spans: vec![
                        SeasonSpan::new(MonthDay::new(7, 1), MonthDay::new(8, 31)),
                        SeasonSpan::new(MonthDay::new(12, 20), MonthDay::new(1, 5)),
                    ],
                },
                SeasonBand {
                    tier: SeasonTier::High,
                    multiplier_pct: 120,
                    spans: vec![
                        SeasonSpan::new(MonthDay::new(6, 1), MonthDay::new(6, 30)),
                        SeasonSpan::new(MonthDay::new(9, 1), MonthDay::new(9, 30)),
                    ],
                },
                SeasonBand {
                    tier: SeasonTier::Low,
                    multiplier_pct: 80,
                    spans: vec![
                        SeasonSpan::new(MonthDay::new(11, 1), MonthDay::new(12, 19)),
                        SeasonSpan::new(MonthDay::new(1, 6), MonthDay::new(2, 28)),
                    ],
                },
            ],
            100,
        )
    }
}
