//! Cadence Core Runtime
//!
//! This crate provides the cooperative scheduling primitives the Cadence
//! tween engine is built on:
//!
//! - **Frame Clock**: Per-stage delta time and "resume on next tick" suspension
//! - **Cancellation**: Cooperative cancel tokens that wake every waiter
//! - **Runtime**: A single-threaded executor advanced by an external `tick`
//! - **Random Sources**: Injectable, seedable generators for duration jitter
//!
//! Nothing here is `Send`. A runtime and everything spawned on it live on the
//! thread that drives `tick`.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Runtime, UpdateStage};
//!
//! let mut runtime = Runtime::new();
//! let clock = runtime.clock().clone();
//!
//! let mut task = runtime
//!     .spawn(async move {
//!         clock.next_frame(UpdateStage::Update).await;
//!         clock.delta_time(UpdateStage::Update)
//!     })
//!     .unwrap();
//!
//! runtime.run_until_stalled();
//! assert_eq!(task.try_take(), None);
//!
//! runtime.tick(0.5);
//! assert_eq!(task.try_take(), Some(0.5));
//! ```

pub mod cancel;
pub mod clock;
pub mod error;
pub mod executor;
pub mod random;

pub use cancel::{CancelToken, CancellableExt, Cancelled, OrCancelled};
pub use clock::{Delay, FrameClock, NextFrame, UpdateStage};
pub use error::{CoreError, Result};
pub use executor::{Runtime, RuntimeHandle, TaskHandle};
pub use random::{Midpoint, RandomSource, SplitMix64};
