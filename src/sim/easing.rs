//! Transition curves
//!
//! A curve maps normalized transition time to an interpolation factor. The
//! factor is not clamped: overshoot and bounce curves push poses past their
//! target on purpose.
//!
//! Authored curves (presets and keyframes) hold their end values outside
//! [0, 1], like an animation curve asset does. `Custom` curves see the raw,
//! unclamped normalized time.

use serde::{Deserialize, Deserializer, Serialize};

/// A single key of an authored curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Easing curve used by pose transitions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionCurve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    /// Hermite with flat tangents at both ends (smoothstep)
    EaseInOut,
    /// Overshoots the target then settles back
    BackOut {
        #[serde(default = "default_overshoot")]
        overshoot: f32,
    },
    BounceOut,
    /// Cubic Hermite through keys sorted by time
    Keyframes {
        #[serde(deserialize_with = "sorted_keys")]
        keys: Vec<CurveKey>,
    },
    /// Arbitrary function of the raw normalized time
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

fn default_overshoot() -> f32 {
    1.70158
}

impl TransitionCurve {
    /// Curve value at normalized time `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        if let TransitionCurve::Custom(f) = self {
            return f(t);
        }

        let t = t.clamp(0.0, 1.0);
        match self {
            TransitionCurve::Linear => t,
            TransitionCurve::EaseIn => t * t,
            TransitionCurve::EaseOut => t * (2.0 - t),
            TransitionCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            TransitionCurve::BackOut { overshoot } => {
                let s = *overshoot;
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
            TransitionCurve::BounceOut => bounce_out(t),
            TransitionCurve::Keyframes { keys } => sample_keys(keys, t),
            TransitionCurve::Custom(_) => unreachable!(),
        }
    }

    /// Keyframed curve, sorting keys by time
    pub fn keyframes(mut keys: Vec<CurveKey>) -> Self {
        sort_keys(&mut keys);
        TransitionCurve::Keyframes { keys }
    }
}

fn sort_keys(keys: &mut [CurveKey]) {
    keys.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Authored files list keys in any order
fn sorted_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CurveKey>, D::Error> {
    let mut keys = Vec::<CurveKey>::deserialize(deserializer)?;
    sort_keys(&mut keys);
    Ok(keys)
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

/// Sample sorted keys with cubic Hermite segments
fn sample_keys(keys: &[CurveKey], time: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return time;
    };

    if time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    // First key strictly after `time`; guaranteed in 1..len by the checks above
    let idx = keys.partition_point(|k| k.time <= time);
    let prev = &keys[idx - 1];
    let next = &keys[idx];

    let span = next.time - prev.time;
    if span <= 0.0 {
        return prev.value;
    }
    let t = (time - prev.time) / span;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * prev.value + h10 * prev.out_tangent * span + h01 * next.value + h11 * next.in_tangent * span
}
