//! Acceptance gate: decides whether a provider's output is good enough to
//! stop the fallback chain.
//!
//! Each provider tier carries one [`AcceptancePolicy`]. A result that fails
//! its policy is treated exactly like an absent result: the orchestrator
//! moves on to the next provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which acceptance policy applies to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTier {
    /// Vision models reading an image directly.
    Vision,
    /// Models reading a whole PDF/image document natively.
    Document,
    /// Chat models translating extracted text.
    Text,
    /// Keyless public translation services.
    Free,
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderTier::Vision => "vision",
            ProviderTier::Document => "document",
            ProviderTier::Text => "text",
            ProviderTier::Free => "free",
        };
        f.write_str(s)
    }
}

/// Minimum-quality rule for a provider's output.
///
/// Lengths are measured in Unicode scalar values of the trimmed output.
/// Both bounds must hold: `len >= min_chars` and, when `min_source_ratio` is
/// set, `len >= min_source_ratio * source_len`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePolicy {
    pub min_chars: usize,
    pub min_source_ratio: Option<f64>,
}

impl AcceptancePolicy {
    /// Fixed minimum length only.
    pub const fn min_chars(min_chars: usize) -> Self {
        Self {
            min_chars,
            min_source_ratio: None,
        }
    }

    /// Minimum length plus a proportion of the source text length.
    pub const fn with_ratio(min_chars: usize, ratio: f64) -> Self {
        Self {
            min_chars,
            min_source_ratio: Some(ratio),
        }
    }

    /// Judge `output` against this policy.
    ///
    /// `source_len` is the character count of the extracted source text
    /// (zero for images, which makes the ratio bound vacuous).
    pub fn evaluate(&self, output: &str, source_len: usize) -> Verdict {
        let len = output.trim().chars().count();
        let ratio_floor = self
            .min_source_ratio
            .map(|r| ratio_floor(source_len, r))
            .unwrap_or(0);
        let required = self.min_chars.max(ratio_floor);

        if len == 0 {
            Verdict::Empty
        } else if len < required {
            Verdict::TooShort { len, required }
        } else {
            Verdict::Accepted
        }
    }
}

/// Smallest length that is at least `ratio * source_len`.
///
/// The epsilon keeps products that are whole numbers in decimal (30% of
/// 1000) from rounding up past the exact bound.
fn ratio_floor(source_len: usize, ratio: f64) -> usize {
    (source_len as f64 * ratio - 1e-9).ceil().max(0.0) as usize
}

/// Outcome of [`AcceptancePolicy::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Empty,
    TooShort { len: usize, required: usize },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("accepted"),
            Verdict::Empty => f.write_str("empty output"),
            Verdict::TooShort { len, required } => {
                write!(f, "output too short ({len} < {required} chars)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_minimum() {
        let p = AcceptancePolicy::min_chars(50);
        assert_eq!(
            p.evaluate(&"x".repeat(49), 0),
            Verdict::TooShort {
                len: 49,
                required: 50
            }
        );
        assert!(p.evaluate(&"x".repeat(50), 0).is_accepted());
    }

    #[test]
    fn ratio_scales_with_source() {
        let p = AcceptancePolicy::with_ratio(1, 0.3);
        // 30% of 1000 = 300
        assert!(!p.evaluate(&"y".repeat(299), 1000).is_accepted());
        assert!(p.evaluate(&"y".repeat(300), 1000).is_accepted());
        // empty source: any non-empty output passes
        assert!(p.evaluate("ok", 0).is_accepted());
    }

    #[test]
    fn ratio_bound_is_inclusive_at_exact_percentages() {
        let p = AcceptancePolicy::with_ratio(1, 0.3);
        assert_eq!(
            p.evaluate(&"y".repeat(29), 100),
            Verdict::TooShort {
                len: 29,
                required: 30
            }
        );
        assert!(p.evaluate(&"y".repeat(30), 100).is_accepted());
        // fractional products still round up
        assert_eq!(
            p.evaluate("y", 7),
            Verdict::TooShort {
                len: 1,
                required: 3
            }
        );
    }

    #[test]
    fn whitespace_only_is_empty() {
        let p = AcceptancePolicy::min_chars(1);
        assert_eq!(p.evaluate("   \n\t", 0), Verdict::Empty);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let p = AcceptancePolicy::min_chars(4);
        // 4 chars, 12 bytes
        assert!(p.evaluate("中文翻译", 0).is_accepted());
    }
}
