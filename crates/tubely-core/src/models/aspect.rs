//! Aspect-ratio buckets used to namespace remote object keys.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Coarse layout bucket derived from probed pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectClassification {
    /// Within tolerance of 16:9.
    Landscape,
    /// Within tolerance of 9:16.
    Portrait,
    Other,
}

impl AspectClassification {
    /// Bucket `width:height` against 16:9 and 9:16.
    ///
    /// `tolerance_pct` is the allowed relative deviation from the target
    /// ratio. The comparison is done on integers by cross-multiplication so
    /// the result never depends on float rounding.
    pub fn classify(width: u32, height: u32, tolerance_pct: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClassification::Other;
        }
        if ratio_within(width, height, 16, 9, tolerance_pct) {
            AspectClassification::Landscape
        } else if ratio_within(width, height, 9, 16, tolerance_pct) {
            AspectClassification::Portrait
        } else {
            AspectClassification::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClassification::Landscape => "landscape",
            AspectClassification::Portrait => "portrait",
            AspectClassification::Other => "other",
        }
    }
}

/// |w/h - a/b| <= (pct/100) * (a/b), rearranged to |w*b - h*a| * 100 <= pct * h * a.
fn ratio_within(width: u32, height: u32, a: u128, b: u128, tolerance_pct: u32) -> bool {
    let (w, h) = (u128::from(width), u128::from(height));
    let deviation = (w * b).abs_diff(h * a);
    deviation * 100 <= u128::from(tolerance_pct) * h * a
}

impl Display for AspectClassification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectClassification {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(AspectClassification::Landscape),
            "portrait" => Ok(AspectClassification::Portrait),
            "other" => Ok(AspectClassification::Other),
            _ => Err(anyhow::anyhow!("Invalid aspect classification: {}", s)),
        }
    }
}
