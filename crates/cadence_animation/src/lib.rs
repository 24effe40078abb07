//! Cadence Animation System
//!
//! Tween trees, composition, and root playback.
//!
//! # Features
//!
//! - **Leaf Tweens**: Drive an [`Effector`] with progress over a (jittered) duration
//! - **Tween Groups**: Sequential and parallel composition with per-play duration caches
//! - **Scrubbing**: Start any tree from an arbitrary progress, forward, backward or frozen
//! - **Flattening**: [`ParallelMerger`] collapses redundant nested groups
//! - **Root Playback**: [`TweenPlayer`] adds looping, yoyo and cancellation
//!
//! # Example
//!
//! ```rust
//! use cadence_animation::{Tween, TweenGroup, TweenPlayer};
//! use cadence_core::Runtime;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut runtime = Runtime::new();
//! let value = Rc::new(Cell::new(0.0));
//!
//! let sink = value.clone();
//! let tree = TweenGroup::sequential()
//!     .with(Tween::leaf(1.0, |_: f32| {}))
//!     .with(Tween::leaf(1.0, move |p: f32| sink.set(p)));
//!
//! let player = TweenPlayer::new(runtime.handle());
//! player.set_tween(tree);
//!
//! let mut task = player.start().unwrap();
//! for _ in 0..8 {
//!     runtime.tick(0.5);
//! }
//! assert_eq!(task.try_take(), Some(true));
//! assert_eq!(value.get(), 1.0);
//! ```

pub mod compose;
pub mod config;
pub mod easing;
pub mod effector;
pub mod error;
pub mod group;
pub mod merge;
pub mod player;
pub mod tween;

#[cfg(test)]
mod tests;

pub use compose::{aggregate_duration, locate_sequential, plan_parallel, ParallelEntry, SequentialStart};
pub use config::PlayerConfig;
pub use easing::Easing;
pub use effector::{Effector, Interpolate, Interpolated};
pub use error::{AnimationError, Result};
pub use group::{GroupMode, TweenGroup};
pub use merge::ParallelMerger;
pub use player::{TweenPlayer, YoyoMode};
pub use tween::{clamp01, LeafTween, PlayContext, Tween, PROGRESS_EPSILON};
