//! # Property Animation
//!
//! Keyframe tracks over plain values. A track samples its keyframes at the
//! animation's current time; tracks aimed at a transform property are then
//! written into the entity's [`Transform`](crate::Transform) by the
//! animation system.

use glam::{Quat, Vec3};

use crate::components::AnimationState;
use crate::tween::Easing;

/// Values a track can interpolate.
pub trait Interpolate: Copy {
    /// Blends from `self` to `other` by `alpha`.
    fn interpolate(self, other: Self, alpha: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, other: Self, alpha: f32) -> Self {
        self + (other - self) * alpha
    }
}

impl Interpolate for Vec3 {
    fn interpolate(self, other: Self, alpha: f32) -> Self {
        self.lerp(other, alpha)
    }
}

impl Interpolate for Quat {
    fn interpolate(self, other: Self, alpha: f32) -> Self {
        self.slerp(other, alpha)
    }
}

/// What a track drives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyTarget {
    /// `Transform::position` (vector tracks).
    Position,
    /// `Transform::rotation` (quaternion tracks).
    Rotation,
    /// `Transform::scale` (vector tracks).
    Scale,
    /// A gameplay value read back through [`PropertyAnimation::value`].
    Custom(String),
}

/// A value at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    /// Seconds from the start of the animation.
    pub time: f32,
    /// Value at that time.
    pub value: T,
}

/// Time-sorted keyframes for one property.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    /// What the track drives.
    pub target: PropertyTarget,
    /// Curve applied between each pair of keyframes.
    pub easing: Easing,
    keyframes: Vec<Keyframe<T>>,
    current: Option<T>,
}

impl<T: Interpolate> Track<T> {
    /// An empty linear track.
    #[must_use]
    pub fn new(target: PropertyTarget) -> Self {
        Self {
            target,
            easing: Easing::Linear,
            keyframes: Vec::new(),
            current: None,
        }
    }

    /// Sets the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Builder form of [`Track::insert`].
    #[must_use]
    pub fn key(mut self, time: f32, value: T) -> Self {
        self.insert(time, value);
        self
    }

    /// Adds a keyframe, keeping the track sorted by time. A key at the same
    /// time as an existing one goes after it.
    pub fn insert(&mut self, time: f32, value: T) {
        let at = self.keyframes.partition_point(|key| key.time <= time);
        self.keyframes.insert(at, Keyframe { time, value });
    }

    /// The keyframes, sorted by time.
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    /// Time of the last keyframe, zero for an empty track.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |key| key.time)
    }

    /// The value at `time`, or `None` for an empty track.
    ///
    /// Holds the first value before the first key and the last value after
    /// the last key.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.value);
        }
        let last = self.keyframes.last()?;
        if time >= last.time {
            return Some(last.value);
        }

        // first.time < time < last.time, so 1 <= next <= last index
        let next = self.keyframes.partition_point(|key| key.time < time);
        let from = &self.keyframes[next - 1];
        let to = &self.keyframes[next];
        let alpha = (time - from.time) / (to.time - from.time);
        Some(from.value.interpolate(to.value, self.easing.apply(alpha)))
    }

    /// Samples at `time` and stores the result as the current value.
    pub fn update(&mut self, time: f32) {
        if let Some(value) = self.sample(time) {
            self.current = Some(value);
        }
    }

    /// Value from the last [`Track::update`], if any.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.current
    }
}

/// What happens when playback reaches the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationMode {
    /// Stop and rewind.
    #[default]
    Once,
    /// Rewind and keep playing.
    Loop,
    /// Reverse direction at either end.
    PingPong,
}

/// Keyframe animation over scalar, vector and quaternion properties.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyAnimation {
    /// Scalar tracks.
    pub float_tracks: Vec<Track<f32>>,
    /// Vector tracks.
    pub vec3_tracks: Vec<Track<Vec3>>,
    /// Quaternion tracks.
    pub quat_tracks: Vec<Track<Quat>>,
    /// Playback state.
    pub state: AnimationState,
    /// End behavior.
    pub mode: AnimationMode,
    /// Elapsed seconds.
    pub time: f32,
    /// Playback speed; negative while a ping-pong runs backwards.
    pub speed: f32,
    /// Longest track, zero until computed.
    length: f32,
}

impl PropertyAnimation {
    /// An empty, stopped animation.
    #[must_use]
    pub fn new(mode: AnimationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Adds a scalar track.
    #[must_use]
    pub fn with_float_track(mut self, track: Track<f32>) -> Self {
        self.float_tracks.push(track);
        self.length = 0.0;
        self
    }

    /// Adds a vector track.
    #[must_use]
    pub fn with_vec3_track(mut self, track: Track<Vec3>) -> Self {
        self.vec3_tracks.push(track);
        self.length = 0.0;
        self
    }

    /// Adds a quaternion track.
    #[must_use]
    pub fn with_quat_track(mut self, track: Track<Quat>) -> Self {
        self.quat_tracks.push(track);
        self.length = 0.0;
        self
    }

    /// Length of the longest track.
    #[must_use]
    pub fn length(&self) -> f32 {
        let floats = self.float_tracks.iter().map(Track::length);
        let vectors = self.vec3_tracks.iter().map(Track::length);
        let rotations = self.quat_tracks.iter().map(Track::length);
        floats.chain(vectors).chain(rotations).fold(0.0, f32::max)
    }

    /// Starts or resumes playback and refreshes the cached length.
    pub fn play(&mut self) {
        self.state = AnimationState::Playing;
        self.length = self.length();
    }

    /// Freezes playback in place.
    pub fn pause(&mut self) {
        self.state = AnimationState::Paused;
    }

    /// Stops and rewinds. Tracks keep their last sampled values.
    pub fn stop(&mut self) {
        self.state = AnimationState::Stopped;
        self.time = 0.0;
    }

    /// Advances by `dt` seconds, samples every track at the new time, then
    /// applies the end behavior if an end was crossed.
    ///
    /// Does nothing unless playing.
    pub fn advance(&mut self, dt: f32) {
        if self.state != AnimationState::Playing {
            return;
        }
        self.time += dt * self.speed;

        let time = self.time;
        self.float_tracks.iter_mut().for_each(|track| track.update(time));
        self.vec3_tracks.iter_mut().for_each(|track| track.update(time));
        self.quat_tracks.iter_mut().for_each(|track| track.update(time));

        if self.length <= 0.0 {
            self.length = self.length();
        }
        if self.time >= self.length {
            match self.mode {
                AnimationMode::Once => self.stop(),
                AnimationMode::Loop => self.time = 0.0,
                AnimationMode::PingPong => {
                    self.time = self.length;
                    self.speed = -self.speed.abs();
                }
            }
        } else if self.time <= 0.0 && self.mode == AnimationMode::PingPong && self.speed < 0.0 {
            self.time = 0.0;
            self.speed = self.speed.abs();
        }
    }

    /// Current value of the scalar track named `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f32> {
        self.float_tracks
            .iter()
            .find(|track| matches!(&track.target, PropertyTarget::Custom(custom) if custom == name))
            .and_then(Track::current)
    }
}

impl Default for PropertyAnimation {
    fn default() -> Self {
        Self {
            float_tracks: Vec::new(),
            vec3_tracks: Vec::new(),
            quat_tracks: Vec::new(),
            state: AnimationState::Stopped,
            mode: AnimationMode::Once,
            time: 0.0,
            speed: 1.0,
            length: 0.0,
        }
    }
}
