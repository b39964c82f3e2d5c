//! # Tweens and Easing
//!
//! Normalized-time helpers for UI fades, camera moves and keyframe tracks.
//! Every easing curve maps `0.0 -> 0.0` and `1.0 -> 1.0`; the back and
//! elastic families overshoot in between.

use std::f32::consts::{FRAC_PI_2, PI};

/// Linear interpolation from `a` to `b`.
#[inline]
#[must_use]
pub fn ease(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Easing curve applied to a normalized time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    SineIn,
    SineOut,
    SineInOut,
    CircularIn,
    CircularOut,
    CircularInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    /// Ken Perlin's smootherstep.
    PerlinInOut,
}

impl Easing {
    /// Every curve, in declaration order.
    pub const ALL: [Self; 32] = [
        Self::Linear,
        Self::QuadraticIn,
        Self::QuadraticOut,
        Self::QuadraticInOut,
        Self::CubicIn,
        Self::CubicOut,
        Self::CubicInOut,
        Self::QuarticIn,
        Self::QuarticOut,
        Self::QuarticInOut,
        Self::QuinticIn,
        Self::QuinticOut,
        Self::QuinticInOut,
        Self::SineIn,
        Self::SineOut,
        Self::SineInOut,
        Self::CircularIn,
        Self::CircularOut,
        Self::CircularInOut,
        Self::ExponentialIn,
        Self::ExponentialOut,
        Self::ExponentialInOut,
        Self::ElasticIn,
        Self::ElasticOut,
        Self::ElasticInOut,
        Self::BackIn,
        Self::BackOut,
        Self::BackInOut,
        Self::BounceIn,
        Self::BounceOut,
        Self::BounceInOut,
        Self::PerlinInOut,
    ];

    /// Maps normalized time `t` through the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => -(t * (t - 2.0)),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    (-2.0 * t * t) + (4.0 * t) - 1.0
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let f = t - 1.0;
                f * f * f + 1.0
            }
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = (2.0 * t) - 2.0;
                    0.5 * f * f * f + 1.0
                }
            }
            Self::QuarticIn => t * t * t * t,
            Self::QuarticOut => {
                let f = t - 1.0;
                f * f * f * (1.0 - t) + 1.0
            }
            Self::QuarticInOut => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    let f = t - 1.0;
                    -8.0 * f * f * f * f + 1.0
                }
            }
            Self::QuinticIn => t * t * t * t * t,
            Self::QuinticOut => {
                let f = t - 1.0;
                f * f * f * f * f + 1.0
            }
            Self::QuinticInOut => {
                if t < 0.5 {
                    16.0 * t * t * t * t * t
                } else {
                    let f = (2.0 * t) - 2.0;
                    0.5 * f * f * f * f * f + 1.0
                }
            }
            Self::SineIn => ((t - 1.0) * FRAC_PI_2).sin() + 1.0,
            Self::SineOut => (t * FRAC_PI_2).sin(),
            Self::SineInOut => 0.5 * (1.0 - (t * PI).cos()),
            Self::CircularIn => 1.0 - (1.0 - t * t).sqrt(),
            Self::CircularOut => ((2.0 - t) * t).sqrt(),
            Self::CircularInOut => {
                if t < 0.5 {
                    0.5 * (1.0 - (1.0 - 4.0 * (t * t)).sqrt())
                } else {
                    0.5 * ((-((2.0 * t) - 3.0) * ((2.0 * t) - 1.0)).sqrt() + 1.0)
                }
            }
            Self::ExponentialIn => {
                if t <= 0.0 {
                    t
                } else {
                    2f32.powf(10.0 * (t - 1.0))
                }
            }
            Self::ExponentialOut => {
                if t >= 1.0 {
                    t
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Self::ExponentialInOut => {
                if t <= 0.0 || t >= 1.0 {
                    t
                } else if t < 0.5 {
                    0.5 * 2f32.powf((20.0 * t) - 10.0)
                } else {
                    -0.5 * 2f32.powf((-20.0 * t) + 10.0) + 1.0
                }
            }
            Self::ElasticIn => (13.0 * FRAC_PI_2 * t).sin() * 2f32.powf(10.0 * (t - 1.0)),
            Self::ElasticOut => (-13.0 * FRAC_PI_2 * (t + 1.0)).sin() * 2f32.powf(-10.0 * t) + 1.0,
            Self::ElasticInOut => {
                if t < 0.5 {
                    0.5 * (13.0 * FRAC_PI_2 * (2.0 * t)).sin() * 2f32.powf(10.0 * ((2.0 * t) - 1.0))
                } else {
                    let f = 2.0 * t - 1.0;
                    0.5 * ((-13.0 * FRAC_PI_2 * (f + 1.0)).sin() * 2f32.powf(-10.0 * f) + 2.0)
                }
            }
            Self::BackIn => t * t * t - t * (t * PI).sin(),
            Self::BackOut => {
                let f = 1.0 - t;
                1.0 - (f * f * f - f * (f * PI).sin())
            }
            Self::BackInOut => {
                if t < 0.5 {
                    let f = 2.0 * t;
                    0.5 * (f * f * f - f * (f * PI).sin())
                } else {
                    let f = 1.0 - (2.0 * t - 1.0);
                    0.5 * (1.0 - (f * f * f - f * (f * PI).sin())) + 0.5
                }
            }
            Self::BounceIn => 1.0 - bounce_out(1.0 - t),
            Self::BounceOut => bounce_out(t),
            Self::BounceInOut => {
                if t < 0.5 {
                    0.5 * (1.0 - bounce_out(1.0 - t * 2.0))
                } else {
                    0.5 * bounce_out(t * 2.0 - 1.0) + 0.5
                }
            }
            Self::PerlinInOut => {
                let t3 = t * t * t;
                let t4 = t3 * t;
                let t5 = t4 * t;
                6.0 * t5 - 15.0 * t4 + 10.0 * t3
            }
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    if t < 4.0 / 11.0 {
        (121.0 * t * t) / 16.0
    } else if t < 8.0 / 11.0 {
        (363.0 / 40.0 * t * t) - (99.0 / 10.0 * t) + 17.0 / 5.0
    } else if t < 9.0 / 10.0 {
        (4356.0 / 361.0 * t * t) - (35442.0 / 1805.0 * t) + 16061.0 / 1805.0
    } else {
        (54.0 / 5.0 * t * t) - (513.0 / 25.0 * t) + 268.0 / 25.0
    }
}

/// Normalized timer running from 0 to 1 over `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    /// Normalized time. Active while below 1.
    pub t: f32,
    /// Seconds from 0 to 1.
    pub duration: f32,
    /// `1 / duration`.
    pub speed: f32,
}

impl Tween {
    /// Creates a tween lasting `duration` seconds.
    ///
    /// A tween created with `start == false` is already finished and waits
    /// for [`Tween::reset`].
    #[must_use]
    pub fn new(duration: f32, start: bool) -> Self {
        Self {
            t: if start { 0.0 } else { 1.0 },
            duration,
            speed: 1.0 / duration,
        }
    }

    /// Restarts from 0.
    pub fn reset(&mut self) {
        self.t = 0.0;
    }

    /// Advances by `dt` seconds and returns the new normalized time.
    pub fn update(&mut self, dt: f32) -> f32 {
        self.t += dt * self.speed;
        self.t
    }

    /// Checks whether the tween has not reached 1 yet.
    #[must_use]
    pub fn active(&self) -> bool {
        self.t < 1.0
    }

    /// The eased progress, clamped to `[0, 1]` before easing.
    #[must_use]
    pub fn value(&self, easing: Easing) -> f32 {
        easing.apply(self.t.clamp(0.0, 1.0))
    }
}

impl Default for Tween {
    fn default() -> Self {
        Self::new(1.0, true)
    }
}
