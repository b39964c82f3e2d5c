//! # Animation Error Types
//!
//! Asset validation failures, reported when a [`Geometry`](crate::Geometry)
//! is built. Playback itself never fails: absence conditions are logged
//! no-ops and broken invariants panic.

use thiserror::Error;

/// Errors raised while validating skeleton and clip data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A bone's parent does not precede it.
    #[error("bone {bone} has parent {parent}; parents must precede their children")]
    InvalidBoneParent {
        /// The offending bone.
        bone: usize,
        /// Its declared parent.
        parent: i32,
    },

    /// The baked frame buffer does not hold whole frames.
    #[error("baked buffer of {matrices} matrices is not a multiple of {bones} bones")]
    MisalignedFrames {
        /// Matrices in the buffer.
        matrices: usize,
        /// Bones in the skeleton.
        bones: usize,
    },

    /// A clip has no frames.
    #[error("clip `{0}` has no frames")]
    EmptyClip(String),

    /// A clip reaches past the baked frames.
    #[error("clip `{clip}` covers frames {start}..{end} but only {baked} are baked")]
    ClipOutOfRange {
        /// Clip name.
        clip: String,
        /// First frame of the clip.
        start: u32,
        /// One past its last frame.
        end: u64,
        /// Frames available.
        baked: usize,
    },

    /// A clip's frame rate is zero, negative or not finite.
    #[error("clip `{clip}` has invalid frame rate {frame_rate}")]
    InvalidFrameRate {
        /// Clip name.
        clip: String,
        /// The rejected rate.
        frame_rate: f32,
    },
}

/// Result type for animation asset operations.
pub type AnimationResult<T> = Result<T, AnimationError>;
