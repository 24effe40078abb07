//! Cooperative cancellation
//!
//! A [`CancelToken`] is shared between the owner of a play session and every
//! task the session drives. Cancelling wakes all tasks currently parked on
//! [`Cancelled`], so they observe the cancellation on their next poll instead
//! of waiting for another frame.

use pin_project_lite::pin_project;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct TokenState {
    cancelled: bool,
    waiters: Vec<Waker>,
}

/// Cancellation handle (cheap to clone, clones share state)
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Rc<RefCell<TokenState>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter
    ///
    /// Cancelling twice is a no-op.
    pub fn cancel(&self) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.waiters)
        };

        tracing::trace!("CancelToken: cancelled, waking {} waiters", waiters.len());
        for waker in waiters {
            waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Future that resolves once the token is cancelled
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
        }
    }

    /// Whether both handles refer to the same token
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancelToken::cancelled`]
pub struct Cancelled {
    token: CancelToken,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.token.state.borrow_mut();
        if state.cancelled {
            return Poll::Ready(());
        }
        if !state.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            state.waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

pin_project! {
    /// Races a future against a [`CancelToken`]
    ///
    /// Resolves to `Some(output)` if the inner future finishes first and to
    /// `None` once the token is cancelled.
    pub struct OrCancelled<F> {
        #[pin]
        future: F,
        cancelled: Cancelled,
    }
}

impl<F: Future> Future for OrCancelled<F> {
    type Output = Option<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if this.cancelled.token.is_cancelled() {
            return Poll::Ready(None);
        }
        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(Some(output));
        }
        match Pin::new(this.cancelled).poll(cx) {
            Poll::Ready(()) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Extension for racing any future against a cancel token
pub trait CancellableExt: Future + Sized {
    fn or_cancelled(self, token: &CancelToken) -> OrCancelled<Self> {
        OrCancelled {
            future: self,
            cancelled: token.cancelled(),
        }
    }
}

impl<F: Future> CancellableExt for F {}
