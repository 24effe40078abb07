//! Frame clock
//!
//! The time source consumed by tweens. The host advances one stage at a time
//! with a delta in seconds; tasks suspended on [`NextFrame`] for that stage
//! are woken exactly once per advance.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Slack used when comparing accumulated delay time against its target
const DELAY_TOLERANCE: f32 = 1e-5;

/// Update stage a task resumes on
///
/// Each stage keeps its own delta time and frame counter, so a task waiting
/// on `LateUpdate` is not woken by an `Update` advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStage {
    #[default]
    Update,
    LateUpdate,
}

impl UpdateStage {
    /// All stages, in the order a full tick advances them
    pub const ALL: [UpdateStage; 2] = [UpdateStage::Update, UpdateStage::LateUpdate];

    fn index(self) -> usize {
        match self {
            UpdateStage::Update => 0,
            UpdateStage::LateUpdate => 1,
        }
    }
}

#[derive(Default)]
struct StageState {
    delta: f32,
    frame: u64,
    waiters: Vec<Waker>,
}

#[derive(Default)]
struct ClockInner {
    stages: [StageState; 2],
}

/// Shared, cheaply clonable frame clock
#[derive(Clone, Default)]
pub struct FrameClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta time (seconds) of the most recent advance of `stage`
    pub fn delta_time(&self, stage: UpdateStage) -> f32 {
        self.inner.borrow().stages[stage.index()].delta
    }

    /// Number of times `stage` has been advanced
    pub fn frame(&self, stage: UpdateStage) -> u64 {
        self.inner.borrow().stages[stage.index()].frame
    }

    /// Advance `stage` by `delta` seconds and wake every task waiting on it
    ///
    /// Negative deltas are clamped to zero.
    pub fn advance(&self, stage: UpdateStage, delta: f32) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            let state = &mut inner.stages[stage.index()];
            state.delta = delta.max(0.0);
            state.frame += 1;
            std::mem::take(&mut state.waiters)
        };

        for waker in waiters {
            waker.wake();
        }
    }

    /// Suspend until the next advance of `stage`
    pub fn next_frame(&self, stage: UpdateStage) -> NextFrame {
        NextFrame {
            clock: self.clone(),
            stage,
            target: self.frame(stage) + 1,
        }
    }

    /// Suspend until at least `seconds` of `stage` delta time have elapsed
    ///
    /// A non-positive delay completes without suspending.
    pub fn delay(&self, stage: UpdateStage, seconds: f32) -> Delay {
        Delay {
            clock: self.clone(),
            stage,
            remaining: seconds,
            pending: None,
        }
    }

    fn register(&self, stage: UpdateStage, waker: &Waker) {
        let mut inner = self.inner.borrow_mut();
        let waiters = &mut inner.stages[stage.index()].waiters;
        if !waiters.iter().any(|w| w.will_wake(waker)) {
            waiters.push(waker.clone());
        }
    }
}

/// Future returned by [`FrameClock::next_frame`]
pub struct NextFrame {
    clock: FrameClock,
    stage: UpdateStage,
    target: u64,
}

impl Future for NextFrame {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.frame(self.stage) >= self.target {
            return Poll::Ready(());
        }
        self.clock.register(self.stage, cx.waker());
        Poll::Pending
    }
}

/// Future returned by [`FrameClock::delay`]
pub struct Delay {
    clock: FrameClock,
    stage: UpdateStage,
    remaining: f32,
    pending: Option<NextFrame>,
}

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = &mut *self;
        loop {
            if this.remaining <= DELAY_TOLERANCE {
                return Poll::Ready(());
            }

            let frame = this
                .pending
                .get_or_insert_with(|| this.clock.next_frame(this.stage));
            match Pin::new(frame).poll(cx) {
                Poll::Ready(()) => {
                    this.pending = None;
                    this.remaining -= this.clock.delta_time(this.stage);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
