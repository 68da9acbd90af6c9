use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::statistics::quantile_sorted;

/// Four ordered buckets of annual rainwater volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotentialCategory {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl PotentialCategory {
    pub const ALL: [PotentialCategory; 4] = [
        PotentialCategory::Low,
        PotentialCategory::Medium,
        PotentialCategory::High,
        PotentialCategory::VeryHigh,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Fill color, fixed per ordinal regardless of the thresholds.
    pub fn color(self) -> &'static str {
        match self {
            PotentialCategory::Low => "#ffffcc",
            PotentialCategory::Medium => "#a1dab4",
            PotentialCategory::High => "#41b6c4",
            PotentialCategory::VeryHigh => "#253494",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            PotentialCategory::Low => (0xff, 0xff, 0xcc),
            PotentialCategory::Medium => (0xa1, 0xda, 0xb4),
            PotentialCategory::High => (0x41, 0xb6, 0xc4),
            PotentialCategory::VeryHigh => (0x25, 0x34, 0x94),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PotentialCategory::Low => "Low",
            PotentialCategory::Medium => "Medium",
            PotentialCategory::High => "High",
            PotentialCategory::VeryHigh => "Very high",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            PotentialCategory::Low => "low",
            PotentialCategory::Medium => "medium",
            PotentialCategory::High => "high",
            PotentialCategory::VeryHigh => "very_high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == s)
    }
}

impl fmt::Display for PotentialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quartile cut points of `rain_liter_per_year` over one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryThresholds {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

impl CategoryThresholds {
    pub fn new(q25: f64, q50: f64, q75: f64) -> Self {
        Self { q25, q50, q75 }
    }

    /// Linear interpolation at rank `p * (n - 1)`. An empty input gives all zeros.
    pub fn from_volumes(volumes: &[f64]) -> Self {
        if volumes.is_empty() {
            return Self::default();
        }

        let mut sorted = volumes.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            q25: quantile_sorted(&sorted, 0.25),
            q50: quantile_sorted(&sorted, 0.50),
            q75: quantile_sorted(&sorted, 0.75),
        }
    }

    /// A value equal to a threshold belongs to the bucket starting at it.
    pub fn categorize(&self, volume: f64) -> PotentialCategory {
        if volume >= self.q75 {
            PotentialCategory::VeryHigh
        } else if volume >= self.q50 {
            PotentialCategory::High
        } else if volume >= self.q25 {
            PotentialCategory::Medium
        } else {
            PotentialCategory::Low
        }
    }

    pub fn label(&self, category: PotentialCategory) -> String {
        match category {
            PotentialCategory::Low => format!("Low (<{:.0}L)", self.q25),
            PotentialCategory::Medium => format!("Medium ({:.0}-{:.0}L)", self.q25, self.q50),
            PotentialCategory::High => format!("High ({:.0}-{:.0}L)", self.q50, self.q75),
            PotentialCategory::VeryHigh => format!("Very high (≥{:.0}L)", self.q75),
        }
    }

    pub fn labels(&self) -> [String; 4] {
        PotentialCategory::ALL.map(|c| self.label(c))
    }
}

impl fmt::Display for CategoryThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "25%={:.0}L, 50%={:.0}L, 75%={:.0}L",
            self.q25, self.q50, self.q75
        )
    }
}
