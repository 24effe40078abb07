//! Tween tree nodes
//!
//! A [`Tween`] is either a leaf that drives an [`Effector`] or a
//! [`TweenGroup`] that redistributes progress to its children. Every node is
//! played through the same call:
//!
//! ```text
//! play(duration, start_progress, speed, ctx)
//! ```
//!
//! where `speed > 0` plays forward, `speed < 0` plays backward and
//! `speed == 0` reports the current value once without advancing time.

use crate::effector::Effector;
use crate::group::TweenGroup;
use cadence_core::{CancelToken, CancellableExt, FrameClock, RandomSource, UpdateStage};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::rc::Rc;

/// Progress changes at or below this are not reported to effectors
pub const PROGRESS_EPSILON: f32 = 1e-6;

/// Clamp a value to `[0, 1]`, mapping NaN to 0
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Boundary a tween moves toward for the given speed sign
///
/// Frozen playback counts as forward.
pub(crate) fn target_boundary(speed: f32) -> f32 {
    if speed >= 0.0 {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn boundary_reached(progress: f32, speed: f32) -> bool {
    (speed > 0.0 && progress >= 1.0) || (speed < 0.0 && progress <= 0.0)
}

/// Clock and cancel token shared by every node of one play session
#[derive(Clone)]
pub struct PlayContext {
    clock: FrameClock,
    token: CancelToken,
}

impl PlayContext {
    pub fn new(clock: FrameClock, token: CancelToken) -> Self {
        Self { clock, token }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the next frame of `stage`
    ///
    /// Returns `false` if the session was cancelled instead.
    pub async fn next_frame(&self, stage: UpdateStage) -> bool {
        self.clock
            .next_frame(stage)
            .or_cancelled(&self.token)
            .await
            .is_some()
    }

    /// Wait `seconds` of `stage` time
    ///
    /// Returns `false` if the session was cancelled instead.
    pub async fn delay(&self, stage: UpdateStage, seconds: f32) -> bool {
        self.clock
            .delay(stage, seconds)
            .or_cancelled(&self.token)
            .await
            .is_some()
    }
}

/// A node in a tween tree
#[derive(Clone, Debug)]
pub enum Tween {
    Leaf(LeafTween),
    Group(TweenGroup),
}

impl Tween {
    /// Shorthand for a leaf with a fixed duration
    pub fn leaf(duration: f32, effector: impl Effector + 'static) -> Self {
        Tween::Leaf(LeafTween::new(duration, effector))
    }

    /// Compute this node's duration for the next play
    ///
    /// Groups rebuild their per-child duration cache as a side effect.
    pub fn create_duration(&self, rng: &mut dyn RandomSource) -> f32 {
        match self {
            Tween::Leaf(leaf) => leaf.create_duration(rng),
            Tween::Group(group) => group.create_duration(rng),
        }
    }

    /// Play this node from `start` (clamped to `[0, 1]`)
    ///
    /// Completes when the boundary in the direction of `speed` is reached,
    /// immediately for frozen playback, or once `ctx` is cancelled.
    pub fn play<'a>(
        &'a self,
        duration: f32,
        start: f32,
        speed: f32,
        ctx: &'a PlayContext,
    ) -> LocalBoxFuture<'a, ()> {
        let start = clamp01(start);
        match self {
            Tween::Leaf(leaf) => leaf.play(duration, start, speed, ctx).boxed_local(),
            Tween::Group(group) => group.play(duration, start, speed, ctx),
        }
    }

    pub fn as_group(&self) -> Option<&TweenGroup> {
        match self {
            Tween::Group(group) => Some(group),
            Tween::Leaf(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Tween::Group(_))
    }
}

impl From<LeafTween> for Tween {
    fn from(leaf: LeafTween) -> Self {
        Tween::Leaf(leaf)
    }
}

impl From<TweenGroup> for Tween {
    fn from(group: TweenGroup) -> Self {
        Tween::Group(group)
    }
}

/// Leaf tween bound to an effector
#[derive(Clone)]
pub struct LeafTween {
    duration: f32,
    jitter: f32,
    stage: UpdateStage,
    effector: Rc<dyn Effector>,
}

impl LeafTween {
    pub fn new(duration: f32, effector: impl Effector + 'static) -> Self {
        Self {
            duration,
            jitter: 0.0,
            stage: UpdateStage::Update,
            effector: Rc::new(effector),
        }
    }

    /// Randomize each armed duration by up to `±jitter` seconds
    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.abs();
        self
    }

    /// Update stage this leaf advances on
    pub fn with_stage(mut self, stage: UpdateStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn base_duration(&self) -> f32 {
        self.duration
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    pub fn stage(&self) -> UpdateStage {
        self.stage
    }

    /// Base duration plus jitter, never negative
    ///
    /// The random source is only consumed when jitter is non-zero.
    pub fn create_duration(&self, rng: &mut dyn RandomSource) -> f32 {
        let offset = if self.jitter > 0.0 {
            rng.range(-self.jitter, self.jitter)
        } else {
            0.0
        };
        (self.duration + offset).max(0.0)
    }

    /// Drive the effector from `start` until a boundary or cancellation
    pub async fn play(&self, duration: f32, start: f32, speed: f32, ctx: &PlayContext) {
        if ctx.is_cancelled() {
            return;
        }

        let mut progress = clamp01(start);

        // Frozen: communicate the value, never complete a boundary
        if speed == 0.0 {
            self.effector.on_progress(progress);
            return;
        }

        // Instantaneous snap
        if duration <= 0.0 {
            self.effector.on_progress(target_boundary(speed));
            return;
        }

        // Starting on the target boundary is already complete
        if boundary_reached(progress, speed) {
            return;
        }

        self.effector.on_progress(progress);
        let mut reported = progress;

        while !boundary_reached(progress, speed) {
            if !ctx.next_frame(self.stage).await {
                return;
            }

            let delta = ctx.clock().delta_time(self.stage);
            progress = clamp01(progress + delta * speed / duration);

            if (progress - reported).abs() > PROGRESS_EPSILON {
                self.effector.on_progress(progress);
                reported = progress;
            }
        }
    }
}

impl std::fmt::Debug for LeafTween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafTween")
            .field("duration", &self.duration)
            .field("jitter", &self.jitter)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}
