// extensions/easing.rs
//
// Named scalar easing curves used by keyframed influencers.
// Pure functions of progress; curves are Copy values looked up by name or id.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Easing curve. The discriminant is the stable persistence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Easing {
    /// Constant velocity (no easing).
    #[default]
    Linear = 0,
    /// Smoothstep.
    Fade = 1,
    Pow2 = 2,
    Pow2In = 3,
    Pow2Out = 4,
    Pow3 = 5,
    Pow3In = 6,
    Pow3Out = 7,
    Pow4 = 8,
    Pow4In = 9,
    Pow4Out = 10,
    Pow5 = 11,
    Pow5In = 12,
    Pow5Out = 13,
    Sine = 14,
    SineIn = 15,
    SineOut = 16,
    Exp5 = 17,
    Exp5In = 18,
    Exp5Out = 19,
    Exp10 = 20,
    Exp10In = 21,
    Exp10Out = 22,
    Circle = 23,
    CircleIn = 24,
    CircleOut = 25,
    /// Spring that overshoots around the target.
    Elastic = 26,
    ElasticIn = 27,
    ElasticOut = 28,
    /// Pulls back before moving, overshoots at the end.
    Swing = 29,
    SwingIn = 30,
    SwingOut = 31,
    Bounce = 32,
    BounceIn = 33,
    BounceOut = 34,
}

impl Easing {
    /// Every curve in id order.
    pub const ALL: [Easing; 35] = [
        Easing::Linear,
        Easing::Fade,
        Easing::Pow2,
        Easing::Pow2In,
        Easing::Pow2Out,
        Easing::Pow3,
        Easing::Pow3In,
        Easing::Pow3Out,
        Easing::Pow4,
        Easing::Pow4In,
        Easing::Pow4Out,
        Easing::Pow5,
        Easing::Pow5In,
        Easing::Pow5Out,
        Easing::Sine,
        Easing::SineIn,
        Easing::SineOut,
        Easing::Exp5,
        Easing::Exp5In,
        Easing::Exp5Out,
        Easing::Exp10,
        Easing::Exp10In,
        Easing::Exp10Out,
        Easing::Circle,
        Easing::CircleIn,
        Easing::CircleOut,
        Easing::Elastic,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::Swing,
        Easing::SwingIn,
        Easing::SwingOut,
        Easing::Bounce,
        Easing::BounceIn,
        Easing::BounceOut,
    ];

    /// Stable small-integer id.
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Fade => "fade",
            Easing::Pow2 => "pow2",
            Easing::Pow2In => "pow2In",
            Easing::Pow2Out => "pow2Out",
            Easing::Pow3 => "pow3",
            Easing::Pow3In => "pow3In",
            Easing::Pow3Out => "pow3Out",
            Easing::Pow4 => "pow4",
            Easing::Pow4In => "pow4In",
            Easing::Pow4Out => "pow4Out",
            Easing::Pow5 => "pow5",
            Easing::Pow5In => "pow5In",
            Easing::Pow5Out => "pow5Out",
            Easing::Sine => "sine",
            Easing::SineIn => "sineIn",
            Easing::SineOut => "sineOut",
            Easing::Exp5 => "exp5",
            Easing::Exp5In => "exp5In",
            Easing::Exp5Out => "exp5Out",
            Easing::Exp10 => "exp10",
            Easing::Exp10In => "exp10In",
            Easing::Exp10Out => "exp10Out",
            Easing::Circle => "circle",
            Easing::CircleIn => "circleIn",
            Easing::CircleOut => "circleOut",
            Easing::Elastic => "elastic",
            Easing::ElasticIn => "elasticIn",
            Easing::ElasticOut => "elasticOut",
            Easing::Swing => "swing",
            Easing::SwingIn => "swingIn",
            Easing::SwingOut => "swingOut",
            Easing::Bounce => "bounce",
            Easing::BounceIn => "bounceIn",
            Easing::BounceOut => "bounceOut",
        }
    }

    /// Case-sensitive lookup by catalog name (e.g. `"sineOut"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Apply the curve to a progress value `t` in [0, 1].
    /// Elastic, swing and bounce curves may leave [0, 1] slightly.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Fade => t * t * (3.0 - 2.0 * t),

            Easing::Pow2 => pow_in_out(t, 2),
            Easing::Pow2In => t.powi(2),
            Easing::Pow2Out => pow_out(t, 2),
            Easing::Pow3 => pow_in_out(t, 3),
            Easing::Pow3In => t.powi(3),
            Easing::Pow3Out => pow_out(t, 3),
            Easing::Pow4 => pow_in_out(t, 4),
            Easing::Pow4In => t.powi(4),
            Easing::Pow4Out => pow_out(t, 4),
            Easing::Pow5 => pow_in_out(t, 5),
            Easing::Pow5In => t.powi(5),
            Easing::Pow5Out => pow_out(t, 5),

            Easing::Sine => (1.0 - (t * PI).cos()) / 2.0,
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),

            Easing::Exp5 => Exp::new(2.0, 5.0).in_out(t),
            Easing::Exp5In => Exp::new(2.0, 5.0).ease_in(t),
            Easing::Exp5Out => Exp::new(2.0, 5.0).ease_out(t),
            Easing::Exp10 => Exp::new(2.0, 10.0).in_out(t),
            Easing::Exp10In => Exp::new(2.0, 10.0).ease_in(t),
            Easing::Exp10Out => Exp::new(2.0, 10.0).ease_out(t),

            Easing::Circle => {
                if t <= 0.5 {
                    let a = t * 2.0;
                    (1.0 - (1.0 - a * a).sqrt()) / 2.0
                } else {
                    let a = (t - 1.0) * 2.0;
                    ((1.0 - a * a).sqrt() + 1.0) / 2.0
                }
            }
            Easing::CircleIn => 1.0 - (1.0 - t * t).sqrt(),
            Easing::CircleOut => {
                let a = t - 1.0;
                (1.0 - a * a).sqrt()
            }

            Easing::Elastic => {
                const C5: f32 = (2.0 * PI) / 4.5;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    -(2.0_f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0
                } else {
                    2.0_f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * C5).sin() / 2.0 + 1.0
                }
            }
            Easing::ElasticIn => {
                const C4: f32 = (2.0 * PI) / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    -(2.0_f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin()
                }
            }
            Easing::ElasticOut => {
                const C4: f32 = (2.0 * PI) / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0
                }
            }

            Easing::Swing => {
                const S: f32 = 1.5 * 2.0;
                if t <= 0.5 {
                    let a = t * 2.0;
                    a * a * ((S + 1.0) * a - S) / 2.0
                } else {
                    let a = (t - 1.0) * 2.0;
                    a * a * ((S + 1.0) * a + S) / 2.0 + 1.0
                }
            }
            Easing::SwingIn => {
                const S: f32 = 2.0;
                t * t * ((S + 1.0) * t - S)
            }
            Easing::SwingOut => {
                const S: f32 = 2.0;
                let a = t - 1.0;
                a * a * ((S + 1.0) * a + S) + 1.0
            }

            Easing::Bounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
        }
    }
}

impl From<Easing> for u8 {
    fn from(easing: Easing) -> u8 {
        easing.id()
    }
}

impl TryFrom<u8> for Easing {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Easing::from_id(id).ok_or_else(|| format!("unknown easing id {id}"))
    }
}

#[inline]
fn pow_in_out(t: f32, power: i32) -> f32 {
    if t <= 0.5 {
        (t * 2.0).powi(power) / 2.0
    } else {
        let sign = if power % 2 == 0 { -2.0 } else { 2.0 };
        ((t - 1.0) * 2.0).powi(power) / sign + 1.0
    }
}

#[inline]
fn pow_out(t: f32, power: i32) -> f32 {
    let sign = if power % 2 == 0 { -1.0 } else { 1.0 };
    (t - 1.0).powi(power) * sign + 1.0
}

/// Exponential curve normalized so that it hits 0 and 1 exactly at the ends.
struct Exp {
    value: f32,
    power: f32,
    min: f32,
    scale: f32,
}

impl Exp {
    #[inline]
    fn new(value: f32, power: f32) -> Self {
        let min = value.powf(-power);
        Self {
            value,
            power,
            min,
            scale: 1.0 / (1.0 - min),
        }
    }

    #[inline]
    fn in_out(&self, t: f32) -> f32 {
        if t <= 0.5 {
            (self.value.powf(self.power * (t * 2.0 - 1.0)) - self.min) * self.scale / 2.0
        } else {
            (2.0 - (self.value.powf(-self.power * (t * 2.0 - 1.0)) - self.min) * self.scale) / 2.0
        }
    }

    #[inline]
    fn ease_in(&self, t: f32) -> f32 {
        (self.value.powf(self.power * (t - 1.0)) - self.min) * self.scale
    }

    #[inline]
    fn ease_out(&self, t: f32) -> f32 {
        1.0 - (self.value.powf(-self.power * t) - self.min) * self.scale
    }
}

#[inline]
fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

// ── Interpolation helpers ────────────────────────────────────────────────

/// Linearly interpolate between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate with easing.
#[inline]
pub fn ease(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    lerp(a, b, easing.apply(t))
}
