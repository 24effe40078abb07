//! Tick-driven local executor
//!
//! Wraps a [`LocalPool`] together with the [`FrameClock`] its tasks wait on.
//! The host calls [`Runtime::tick`] once per frame: every stage is advanced in
//! order and the pool runs until no task can make further progress. All
//! interleaving happens inside that call; there is no background thread.

use crate::clock::{FrameClock, UpdateStage};
use crate::error::Result;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::future::Future;

/// Owns the task pool and the clock
pub struct Runtime {
    pool: LocalPool,
    handle: RuntimeHandle,
}

impl Runtime {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let handle = RuntimeHandle {
            spawner: pool.spawner(),
            clock: FrameClock::new(),
        };
        Self { pool, handle }
    }

    /// Get a handle for spawning tasks and reading the clock
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.handle.clock
    }

    /// Advance every stage by `delta` seconds, running tasks after each stage
    pub fn tick(&mut self, delta: f32) {
        for stage in UpdateStage::ALL {
            self.tick_stage(stage, delta);
        }
    }

    /// Advance a single stage and run the tasks it woke
    pub fn tick_stage(&mut self, stage: UpdateStage, delta: f32) {
        self.handle.clock.advance(stage, delta);
        tracing::trace!(
            "Runtime: {:?} frame {} (dt={:.4})",
            stage,
            self.handle.clock.frame(stage),
            delta
        );
        self.pool.run_until_stalled();
    }

    /// Poll every ready task without advancing time
    ///
    /// Newly spawned tasks run up to their first suspension point.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    pub fn spawn<F>(&self, future: F) -> Result<TaskHandle<F::Output>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.handle.spawn(future)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Clonable handle to a [`Runtime`]
///
/// Spawning through a handle whose runtime has been dropped fails with
/// [`CoreError::Spawn`](crate::CoreError::Spawn).
#[derive(Clone)]
pub struct RuntimeHandle {
    spawner: LocalSpawner,
    clock: FrameClock,
}

impl RuntimeHandle {
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Spawn a task and keep a handle to its output
    pub fn spawn<F>(&self, future: F) -> Result<TaskHandle<F::Output>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let remote = self.spawner.spawn_local_with_handle(future)?;
        Ok(TaskHandle {
            remote: Some(remote),
        })
    }

    /// Spawn a fire-and-forget task
    pub fn spawn_detached<F>(&self, future: F) -> Result<()>
    where
        F: Future<Output = ()> + 'static,
    {
        self.spawner.spawn_local(future)?;
        Ok(())
    }
}

/// Handle to the output of a spawned task
///
/// Dropping the handle aborts the task. Use [`TaskHandle::detach`] to let it
/// run to completion unobserved.
pub struct TaskHandle<T> {
    remote: Option<RemoteHandle<T>>,
}

impl<T: 'static> TaskHandle<T> {
    /// Take the task's output if it has finished
    ///
    /// Returns `None` while the task is still running and after the output
    /// has already been taken.
    pub fn try_take(&mut self) -> Option<T> {
        let remote = self.remote.as_mut()?;
        let output = remote.now_or_never()?;
        self.remote = None;
        Some(output)
    }

    /// Let the task keep running after the handle is dropped
    pub fn detach(mut self) {
        if let Some(remote) = self.remote.take() {
            remote.forget();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_spawned_task_runs_on_tick() {
        let mut runtime = Runtime::new();
        let clock = runtime.clock().clone();
        let frames = Rc::new(Cell::new(0));

        let counter = frames.clone();
        let mut task = runtime
            .spawn(async move {
                for _ in 0..3 {
                    clock.next_frame(UpdateStage::Update).await;
                    counter.set(counter.get() + 1);
                }
                "done"
            })
            .unwrap();

        runtime.run_until_stalled();
        assert_eq!(frames.get(), 0);

        runtime.tick(0.1);
        runtime.tick(0.1);
        assert_eq!(frames.get(), 2);
        assert_eq!(task.try_take(), None);

        runtime.tick(0.1);
        assert_eq!(task.try_take(), Some("done"));
        assert_eq!(task.try_take(), None);
    }

    #[test]
    fn test_dropping_handle_aborts_task() {
        let mut runtime = Runtime::new();
        let clock = runtime.clock().clone();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        let task = runtime
            .spawn(async move {
                clock.next_frame(UpdateStage::Update).await;
                flag.set(true);
            })
            .unwrap();
        runtime.run_until_stalled();
        drop(task);

        runtime.tick(0.1);
        assert!(!ran.get());
    }

    #[test]
    fn test_detached_task_keeps_running() {
        let mut runtime = Runtime::new();
        let clock = runtime.clock().clone();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        runtime
            .spawn(async move {
                clock.next_frame(UpdateStage::LateUpdate).await;
                flag.set(true);
            })
            .unwrap()
            .detach();

        runtime.tick_stage(UpdateStage::Update, 0.1);
        assert!(!ran.get());
        runtime.tick_stage(UpdateStage::LateUpdate, 0.1);
        assert!(ran.get());
    }

    #[test]
    fn test_spawn_after_runtime_dropped_fails() {
        let handle = Runtime::new().handle();
        assert!(handle.spawn_detached(async {}).is_err());
    }
}
