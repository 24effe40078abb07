//! Root playback driver
//!
//! [`TweenPlayer`] owns a tween tree and plays it as a whole: it arms the
//! tree's duration, runs one pass at a time, and decides between stopping,
//! rebounding (yoyo) and looping when a pass reaches a boundary.
//!
//! Each call to [`TweenPlayer::play`] opens a session with its own
//! [`CancelToken`]. Opening a session, changing speed or progress, or calling
//! [`TweenPlayer::stop`] cancels the previous one, which then resolves to
//! `false`.
//!
//! While a pass runs, a detached tracker task advances the player's
//! `progress` at the same rate as the tree so it can be observed (e.g. by a
//! scrubber). Trackers are tagged with the pass version and exit as soon as
//! a newer pass starts.

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::tween::{boundary_reached, clamp01, target_boundary, PlayContext, Tween};
use cadence_core::{
    CancelToken, CancellableExt, FrameClock, RandomSource, RuntimeHandle, SplitMix64, TaskHandle,
    UpdateStage,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

/// Which boundary makes the player reverse direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YoyoMode {
    #[default]
    None,
    /// Rebound when reaching progress 0 while playing backward
    Start,
    /// Rebound when reaching progress 1 while playing forward
    End,
}

/// What happens after a pass reaches its boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassOutcome {
    Complete,
    Continue,
}

struct PlayerState {
    tween: Option<Rc<Tween>>,
    duration: Option<f32>,
    progress: f32,
    speed: f32,
    yoyo: YoyoMode,
    looping: bool,
    invert_next_play: bool,
    version: u64,
    session: Option<CancelToken>,
    rng: Box<dyn RandomSource>,
}

impl PlayerState {
    /// Resolve the tree duration, reusing an armed one unless `rearm` is set
    fn arm(&mut self, rearm: bool) -> Option<(Rc<Tween>, f32)> {
        let tween = self.tween.clone()?;
        let duration = match self.duration {
            Some(duration) if !rearm => duration,
            _ => {
                let duration = tween.create_duration(&mut *self.rng);
                self.duration = Some(duration);
                duration
            }
        };
        Some((tween, duration))
    }
}

struct PlayerInner {
    runtime: RuntimeHandle,
    config: PlayerConfig,
    state: RefCell<PlayerState>,
}

/// Plays a tween tree with looping, yoyo and cancellation
///
/// Cheap to clone; clones drive the same state.
#[derive(Clone)]
pub struct TweenPlayer {
    inner: Rc<PlayerInner>,
}

impl TweenPlayer {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self::with_config(runtime, PlayerConfig::default())
    }

    pub fn with_config(runtime: RuntimeHandle, config: PlayerConfig) -> Self {
        let state = PlayerState {
            tween: None,
            duration: None,
            progress: 0.0,
            speed: config.speed,
            yoyo: config.yoyo,
            looping: config.looping,
            invert_next_play: false,
            version: 0,
            session: None,
            rng: Box::new(SplitMix64::new(config.seed)),
        };

        Self {
            inner: Rc::new(PlayerInner {
                runtime,
                config,
                state: RefCell::new(state),
            }),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Replace the random source used for duration jitter
    pub fn set_random(&self, rng: impl RandomSource + 'static) {
        self.inner.state.borrow_mut().rng = Box::new(rng);
    }

    /// Assign the tree to play
    ///
    /// Cancels the running session. The new tree is armed on its next play
    /// or preview.
    pub fn set_tween(&self, tween: impl Into<Tween>) {
        self.stop();
        let mut state = self.inner.state.borrow_mut();
        state.tween = Some(Rc::new(tween.into()));
        state.duration = None;
    }

    pub fn tween(&self) -> Option<Rc<Tween>> {
        self.inner.state.borrow().tween.clone()
    }

    /// Duration resolved by the last arming, if any
    pub fn duration(&self) -> Option<f32> {
        self.inner.state.borrow().duration
    }

    /// Re-resolve the tree duration now
    ///
    /// Cancels the running session, since group caches are rebuilt.
    pub fn refresh_duration(&self) -> Option<f32> {
        self.stop();
        let armed = self.inner.state.borrow_mut().arm(true);
        armed.map(|(_, duration)| duration)
    }

    pub fn progress(&self) -> f32 {
        self.inner.state.borrow().progress
    }

    /// Jump to `progress` (clamped to `[0, 1]`)
    ///
    /// Cancels the running session. With `preview_scrub` enabled the tree is
    /// immediately re-applied at the new progress through a frozen pass.
    pub fn set_progress(&self, progress: f32) {
        self.stop();
        let progress = clamp01(progress);
        self.inner.state.borrow_mut().progress = progress;

        if self.inner.config.preview_scrub {
            self.preview(progress);
        }
    }

    pub fn speed(&self) -> f32 {
        self.inner.state.borrow().speed
    }

    /// Change the signed playback rate, cancelling the running session
    pub fn set_speed(&self, speed: f32) {
        self.stop();
        self.inner.state.borrow_mut().speed = speed;
    }

    pub fn yoyo(&self) -> YoyoMode {
        self.inner.state.borrow().yoyo
    }

    /// Takes effect at the next boundary of a running session
    pub fn set_yoyo(&self, yoyo: YoyoMode) {
        self.inner.state.borrow_mut().yoyo = yoyo;
    }

    pub fn is_looping(&self) -> bool {
        self.inner.state.borrow().looping
    }

    /// Takes effect at the next boundary of a running session
    pub fn set_looping(&self, looping: bool) {
        self.inner.state.borrow_mut().looping = looping;
    }

    /// Negate the speed when the next session starts
    pub fn invert_next_play(&self) {
        self.inner.state.borrow_mut().invert_next_play = true;
    }

    /// Whether a session is open and not cancelled
    pub fn is_playing(&self) -> bool {
        self.inner
            .state
            .borrow()
            .session
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Version of the most recent pass
    pub fn version(&self) -> u64 {
        self.inner.state.borrow().version
    }

    /// Cancel the running session, if any
    pub fn stop(&self) {
        let session = self.inner.state.borrow_mut().session.take();
        if let Some(token) = session {
            token.cancel();
        }
    }

    /// Play the tree until it completes or is cancelled
    ///
    /// Resolves to `true` on completion and `false` on cancellation. The
    /// session opens when the future is first polled. A player without a
    /// tree completes immediately.
    pub fn play(&self) -> impl Future<Output = bool> + 'static {
        let player = self.clone();
        async move { player.run().await }
    }

    /// Spawn [`play`](Self::play) on the runtime
    pub fn start(&self) -> Result<TaskHandle<bool>> {
        Ok(self.inner.runtime.spawn(self.play())?)
    }

    async fn run(&self) -> bool {
        let Some((tween, duration, token)) = self.open_session() else {
            tracing::debug!("TweenPlayer: nothing to play");
            return true;
        };
        let _session = SessionGuard {
            player: self,
            token: token.clone(),
        };

        let clock = self.inner.runtime.clock().clone();
        let ctx = PlayContext::new(clock.clone(), token.clone());
        let stage = self.inner.config.tracker_stage;

        let completed = loop {
            let frames_before = frames_elapsed(&clock);
            let (progress, speed) = self.begin_pass(&token, duration);

            tween.play(duration, progress, speed, &ctx).await;

            if token.is_cancelled() {
                break false;
            }
            if speed == 0.0 {
                break true;
            }
            if self.finish_pass(speed) == PassOutcome::Complete {
                break true;
            }

            // A pass that took no time must not repeat within the same frame
            if frames_elapsed(&clock) == frames_before && !ctx.next_frame(stage).await {
                break false;
            }
        };

        if completed {
            tracing::debug!("TweenPlayer: session completed");
        } else {
            tracing::debug!("TweenPlayer: session cancelled");
        }
        completed
    }

    /// Cancel any previous session, arm the tree and apply a pending inversion
    fn open_session(&self) -> Option<(Rc<Tween>, f32, CancelToken)> {
        self.stop();

        let mut state = self.inner.state.borrow_mut();
        let (tween, duration) = state.arm(self.inner.config.recompute_duration)?;

        if state.invert_next_play {
            state.invert_next_play = false;
            state.speed = -state.speed;
        }

        let token = CancelToken::new();
        state.session = Some(token.clone());

        tracing::debug!(
            "TweenPlayer: session started (duration={:.3}, progress={:.3}, speed={})",
            duration,
            state.progress,
            state.speed
        );
        Some((tween, duration, token))
    }

    fn begin_pass(&self, token: &CancelToken, duration: f32) -> (f32, f32) {
        let (version, progress, speed) = {
            let mut state = self.inner.state.borrow_mut();
            state.version += 1;
            (state.version, state.progress, state.speed)
        };

        tracing::trace!(
            "TweenPlayer: pass {} from {:.3} at speed {}",
            version,
            progress,
            speed
        );

        if speed != 0.0 && duration > 0.0 {
            self.spawn_tracker(version, token.clone(), duration, speed);
        }
        (progress, speed)
    }

    /// Snap to the reached boundary and decide between rebound, loop and stop
    fn finish_pass(&self, speed: f32) -> PassOutcome {
        let mut state = self.inner.state.borrow_mut();
        let forward = speed > 0.0;
        state.progress = target_boundary(speed);

        let rebound = match state.yoyo {
            YoyoMode::End => forward,
            YoyoMode::Start => !forward,
            YoyoMode::None => false,
        };
        if rebound {
            state.speed = -speed;
            return PassOutcome::Continue;
        }

        if !state.looping {
            return PassOutcome::Complete;
        }

        if forward {
            if state.yoyo == YoyoMode::Start {
                state.speed = -speed;
            } else {
                state.progress = 0.0;
            }
        } else if state.yoyo == YoyoMode::End {
            state.speed = -speed;
        } else {
            state.progress = 1.0;
        }
        PassOutcome::Continue
    }

    fn spawn_tracker(&self, version: u64, token: CancelToken, duration: f32, speed: f32) {
        let player = Rc::downgrade(&self.inner);
        let clock = self.inner.runtime.clock().clone();
        let stage = self.inner.config.tracker_stage;

        let tracker = track_progress(player, clock, stage, version, token, duration, speed);
        if let Err(err) = self.inner.runtime.spawn_detached(tracker) {
            tracing::warn!("TweenPlayer: failed to spawn progress tracker: {}", err);
        }
    }

    /// Apply the tree once at `progress` without advancing time
    fn preview(&self, progress: f32) {
        let armed = self.inner.state.borrow_mut().arm(false);
        let Some((tween, duration)) = armed else {
            return;
        };

        let ctx = PlayContext::new(self.inner.runtime.clock().clone(), CancelToken::new());
        if tween.play(duration, progress, 0.0, &ctx).now_or_never().is_none() {
            tracing::warn!("TweenPlayer: preview at {:.3} did not settle", progress);
        }
    }
}

impl std::fmt::Debug for TweenPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("TweenPlayer")
            .field("progress", &state.progress)
            .field("speed", &state.speed)
            .field("yoyo", &state.yoyo)
            .field("looping", &state.looping)
            .field("duration", &state.duration)
            .field("version", &state.version)
            .finish_non_exhaustive()
    }
}

/// Releases the session slot when a play future ends or is dropped
struct SessionGuard<'a> {
    player: &'a TweenPlayer,
    token: CancelToken,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.token.cancel();
        let Ok(mut state) = self.player.inner.state.try_borrow_mut() else {
            return;
        };
        if state
            .session
            .as_ref()
            .is_some_and(|session| session.same_as(&self.token))
        {
            state.session = None;
        }
    }
}

fn frames_elapsed(clock: &FrameClock) -> u64 {
    UpdateStage::ALL.iter().map(|stage| clock.frame(*stage)).sum()
}

async fn track_progress(
    player: Weak<PlayerInner>,
    clock: FrameClock,
    stage: UpdateStage,
    version: u64,
    token: CancelToken,
    duration: f32,
    speed: f32,
) {
    loop {
        if clock.next_frame(stage).or_cancelled(&token).await.is_none() {
            tracing::trace!("TweenPlayer: tracker {} cancelled", version);
            return;
        }
        let Some(inner) = player.upgrade() else {
            return;
        };

        let mut state = inner.state.borrow_mut();
        if state.version != version {
            tracing::trace!("TweenPlayer: tracker {} superseded", version);
            return;
        }

        let progress = clamp01(state.progress + clock.delta_time(stage) * speed / duration);
        state.progress = progress;
        if boundary_reached(progress, speed) {
            return;
        }
    }
}
