use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Tolerance absorbing encoder rounding around the reference ratios.
pub const RATIO_TOLERANCE: f64 = 0.1;

/// Coarse orientation of a video, folded into its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectBucket {
    Landscape,
    Portrait,
    Other,
}

impl AspectBucket {
    /// Classify a width/height pair. A ratio exactly `RATIO_TOLERANCE` away from
    /// 16:9 or 9:16 is `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::from_ratio(f64::from(width) / f64::from(height))
    }

    /// Classify a width/height ratio. Non-finite ratios are `Other`.
    pub fn from_ratio(ratio: f64) -> Self {
        if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            AspectBucket::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            AspectBucket::Portrait
        } else {
            AspectBucket::Other
        }
    }

    /// Key prefix for objects of this bucket, trailing slash included.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            AspectBucket::Landscape => "landscape/",
            AspectBucket::Portrait => "portrait/",
            AspectBucket::Other => "other/",
        }
    }
}

impl Display for AspectBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AspectBucket::Landscape => write!(f, "landscape"),
            AspectBucket::Portrait => write!(f, "portrait"),
            AspectBucket::Other => write!(f, "other"),
        }
    }
}
