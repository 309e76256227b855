use serde::{Deserialize, Serialize};

const YEAR: f64 = 1.0;
const DAY: f64 = YEAR / 365.2425;

/// Named time-axis zoom levels, each a constant span in slider units (years).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomScale {
    Millennium,
    Century,
    Decade,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl ZoomScale {
    /// All scales, coarsest first.
    pub const ALL: [ZoomScale; 9] = [
        ZoomScale::Millennium,
        ZoomScale::Century,
        ZoomScale::Decade,
        ZoomScale::Year,
        ZoomScale::Month,
        ZoomScale::Day,
        ZoomScale::Hour,
        ZoomScale::Minute,
        ZoomScale::Second,
    ];

    #[must_use]
    pub const fn span(self) -> f64 {
        match self {
            Self::Millennium => 1000.0 * YEAR,
            Self::Century => 100.0 * YEAR,
            Self::Decade => 10.0 * YEAR,
            Self::Year => YEAR,
            Self::Month => YEAR / 12.0,
            Self::Day => DAY,
            Self::Hour => DAY / 24.0,
            Self::Minute => DAY / 1440.0,
            Self::Second => DAY / 86_400.0,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Millennium => "millennium",
            Self::Century => "century",
            Self::Decade => "decade",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }

    /// Returns the named scale nearest to `span` in log distance.
    ///
    /// Scales coarser than `total_span` (the full timeline extent) are not
    /// candidates unless nothing else fits. Degenerate spans map to the finest scale.
    #[must_use]
    pub fn closest(span: f64, total_span: f64) -> ZoomScale {
        if !span.is_finite() || span <= 0.0 {
            return ZoomScale::Second;
        }
        let ceiling = if total_span.is_finite() && total_span > 0.0 {
            total_span.max(ZoomScale::Second.span())
        } else {
            f64::INFINITY
        };
        let target = span.ln();
        Self::ALL
            .iter()
            .copied()
            .filter(|scale| scale.span() <= ceiling)
            .min_by(|a, b| {
                let da = (a.span().ln() - target).abs();
                let db = (b.span().ln() - target).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(ZoomScale::Second)
    }

    /// Largest named scale strictly smaller than `span`.
    ///
    /// A century-wide view therefore steps by decades. Returns `None` when
    /// `span` is not larger than one second.
    #[must_use]
    pub fn step_for_span(span: f64) -> Option<ZoomScale> {
        if !span.is_finite() || span <= 0.0 {
            return None;
        }
        Self::ALL.iter().copied().find(|scale| scale.span() < span)
    }

    #[must_use]
    pub fn finer(self) -> Option<ZoomScale> {
        let index = Self::ALL.iter().position(|scale| *scale == self)?;
        Self::ALL.get(index + 1).copied()
    }
}
