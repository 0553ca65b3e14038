//! Safe-area insets pushed by the host.
//!
//! Hosts send insets as stringly-typed numbers (`{"top": "20"}`), sometimes
//! as real numbers, and sometimes omit sides entirely. Every side is coerced
//! independently: anything that is not a finite, non-negative number becomes
//! `0`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Device padding around the usable viewport, in CSS pixels.
///
/// # Invariants
///
/// - Every side is finite and `>= 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SafeAreaInsets {
    /// Top inset (status bar, notch).
    pub top: f64,
    /// Left inset.
    pub left: f64,
    /// Right inset.
    pub right: f64,
    /// Bottom inset (home indicator).
    pub bottom: f64,
}

impl SafeAreaInsets {
    /// All sides zero.
    pub const ZERO: Self = Self { top: 0.0, left: 0.0, right: 0.0, bottom: 0.0 };

    /// Build insets from explicit values, clamping invalid sides to zero.
    pub fn new(top: f64, left: f64, right: f64, bottom: f64) -> Self {
        Self {
            top: sanitize(top),
            left: sanitize(left),
            right: sanitize(right),
            bottom: sanitize(bottom),
        }
    }

    /// Coerce insets from loosely-typed JSON.
    ///
    /// Non-object input yields [`SafeAreaInsets::ZERO`].
    pub fn from_loose(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::ZERO;
        };

        let side = |name: &str| object.get(name).map_or(0.0, coerce_side);
        Self { top: side("top"), left: side("left"), right: side("right"), bottom: side("bottom") }
    }
}

impl<'de> Deserialize<'de> for SafeAreaInsets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_loose(&value))
    }
}

fn coerce_side(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map_or(0.0, sanitize)
}

fn sanitize(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
}
