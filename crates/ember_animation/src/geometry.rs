//! # Skeleton and Clip Data
//!
//! A [`Geometry`] owns everything the animation system reads for a skinned
//! mesh: the bone hierarchy, the clip table and one flat buffer of baked
//! absolute bone transforms. Frame `f` of bone `b` lives at
//! `f * bone_count + b`. Clips are sub-ranges of that buffer.
//!
//! Geometry is immutable once built and shared between entities through
//! `Arc`.

use crate::error::{AnimationError, AnimationResult};
use crate::math::Mat3x4;

/// A named range of baked frames with its own playback rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    /// Clip name, as authored.
    pub name: String,
    /// Baked frames per second.
    pub frame_rate: f32,
    /// First baked frame of the clip.
    pub start: u32,
    /// Number of frames in the clip.
    pub length: u32,
}

/// Where a playback time falls inside a clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    /// Clip-relative frame blended from.
    pub frame_a: u32,
    /// Clip-relative frame blended towards, `frame_a + 1` wrapped.
    pub frame_b: u32,
    /// Blend factor in `[0, 1)`.
    pub alpha: f32,
}

impl AnimationClip {
    /// Creates a clip.
    #[must_use]
    pub fn new(name: impl Into<String>, frame_rate: f32, start: u32, length: u32) -> Self {
        Self {
            name: name.into(),
            frame_rate,
            start,
            length,
        }
    }

    /// Locates `time` (in frames) inside the clip, looping past the end.
    ///
    /// # Panics
    ///
    /// Panics on a zero-length clip, which validation rejects.
    #[must_use]
    pub fn sample(&self, time: f32) -> FrameSample {
        assert!(self.length > 0, "clip `{}` has no frames", self.name);
        let whole = time.floor();
        let length = i64::from(self.length);
        let frame_a = (whole as i64).rem_euclid(length) as u32;
        FrameSample {
            frame_a,
            frame_b: (frame_a + 1) % self.length,
            alpha: time - whole,
        }
    }

    fn validate(&self, baked: usize) -> AnimationResult<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(AnimationError::InvalidFrameRate {
                clip: self.name.clone(),
                frame_rate: self.frame_rate,
            });
        }
        if self.length == 0 {
            return Err(AnimationError::EmptyClip(self.name.clone()));
        }
        let end = u64::from(self.start) + u64::from(self.length);
        if end > baked as u64 {
            return Err(AnimationError::ClipOutOfRange {
                clip: self.name.clone(),
                start: self.start,
                end,
                baked,
            });
        }
        Ok(())
    }
}

/// Skeleton, clips and baked frames of one skinned mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    name: String,
    /// Parent per bone, negative for roots.
    bone_parents: Vec<i32>,
    clips: Vec<AnimationClip>,
    /// `frame * bone_count + bone`.
    frames: Vec<Mat3x4>,
}

impl Geometry {
    /// Builds a skinned geometry, validating the hierarchy and every clip.
    ///
    /// # Arguments
    ///
    /// * `name` - Asset name
    /// * `bone_parents` - Parent index per bone, negative for roots
    /// * `clips` - Clip table
    /// * `frames` - Baked absolute transforms, all clips concatenated
    ///
    /// # Errors
    ///
    /// Returns an [`AnimationError`] if a parent does not precede its child,
    /// the buffer does not hold whole frames, or a clip is empty, has a bad
    /// frame rate or reaches past the baked frames.
    pub fn skinned(
        name: impl Into<String>,
        bone_parents: Vec<i32>,
        clips: Vec<AnimationClip>,
        frames: Vec<Mat3x4>,
    ) -> AnimationResult<Self> {
        for (bone, &parent) in bone_parents.iter().enumerate() {
            if parent >= 0 && parent as usize >= bone {
                return Err(AnimationError::InvalidBoneParent { bone, parent });
            }
        }

        let bones = bone_parents.len();
        let whole_frames = if bones == 0 {
            frames.is_empty()
        } else {
            frames.len() % bones == 0
        };
        if !whole_frames {
            return Err(AnimationError::MisalignedFrames {
                matrices: frames.len(),
                bones,
            });
        }

        let baked = frames.len().checked_div(bones).unwrap_or(0);
        for clip in &clips {
            clip.validate(baked)?;
        }

        Ok(Self {
            name: name.into(),
            bone_parents,
            clips,
            frames,
        })
    }

    /// A geometry with no skeleton.
    #[must_use]
    pub fn rigid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bone_parents: Vec::new(),
            clips: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Asset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bones in the skeleton.
    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bone_parents.len()
    }

    /// Parent of `bone`, or `None` for a root.
    ///
    /// # Panics
    ///
    /// Panics if `bone` is out of range.
    #[inline]
    #[must_use]
    pub fn bone_parent(&self, bone: usize) -> Option<usize> {
        usize::try_from(self.bone_parents[bone]).ok()
    }

    /// Raw parent table, negative for roots.
    #[must_use]
    pub fn bone_parents(&self) -> &[i32] {
        &self.bone_parents
    }

    /// The clip table.
    #[must_use]
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Clip `index`, if it exists.
    #[must_use]
    pub fn clip(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    /// Index of the clip called `name`.
    #[must_use]
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }

    /// Number of baked frames across all clips.
    #[must_use]
    pub fn baked_frame_count(&self) -> usize {
        self.frames.len().checked_div(self.bone_count()).unwrap_or(0)
    }

    /// Bone transforms of absolute baked frame `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not baked.
    #[inline]
    #[must_use]
    pub fn frame(&self, frame: usize) -> &[Mat3x4] {
        let bones = self.bone_count();
        &self.frames[frame * bones..(frame + 1) * bones]
    }
}
