//! Composition algorithms
//!
//! Stateless functions that map a group's global progress onto its children.
//! Given the per-child durations of a group and a global start progress `p`,
//! the global start time is `t = p * D` where `D` is the aggregate duration:
//!
//! - **Sequential**: `D` is the sum of child durations. The child whose span
//!   contains `t` starts mid-way; the walk then continues in the direction of
//!   travel.
//! - **Parallel**: `D` is the longest child. Each child is planned on its own
//!   against `t` and all of them run concurrently.

use crate::group::GroupMode;
use crate::tween::{clamp01, target_boundary, PlayContext, Tween};
use cadence_core::UpdateStage;
use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use smallvec::SmallVec;

/// Per-child durations of one group, in child order
pub type DurationCache = SmallVec<[f32; 8]>;

/// Aggregate duration of a group's children
///
/// Negative entries count as zero.
pub fn aggregate_duration(mode: GroupMode, durations: &[f32]) -> f32 {
    match mode {
        GroupMode::Sequential => durations.iter().fold(0.0, |sum, d| sum + d.max(0.0)),
        GroupMode::Parallel => durations.iter().fold(0.0, |max, d| max.max(*d)),
    }
}

/// Rescale child durations so they aggregate to `duration`
///
/// Durations that already aggregate to `duration` are returned unchanged.
/// A group with no length stays at zero.
pub(crate) fn scale_durations(
    mode: GroupMode,
    mut durations: DurationCache,
    duration: f32,
) -> DurationCache {
    let natural = aggregate_duration(mode, &durations);
    if natural <= 0.0 {
        return durations;
    }

    let scale = duration.max(0.0) / natural;
    for d in durations.iter_mut() {
        *d = d.max(0.0) * scale;
    }
    durations
}

/// Where a sequential group starts playing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequentialStart {
    /// Index of the child containing the start time
    pub index: usize,
    /// Progress within that child
    pub local_progress: f32,
}

/// Find the child of a sequential group that contains `time`
///
/// Child spans are inclusive at both ends and the first match wins, so a
/// time exactly on a boundary resolves to the earlier child. A zero-length
/// child starts at the boundary implied by `speed`.
pub fn locate_sequential(durations: &[f32], time: f32, speed: f32) -> Option<SequentialStart> {
    let mut before = 0.0;
    for (index, &duration) in durations.iter().enumerate() {
        let duration = duration.max(0.0);
        let after = before + duration;

        if time >= before && time <= after {
            let local_progress = if duration > 0.0 {
                clamp01((time - before) / duration)
            } else {
                target_boundary(speed)
            };
            return Some(SequentialStart {
                index,
                local_progress,
            });
        }

        before = after;
    }

    // Drift past the end lands on the last child's end
    durations.len().checked_sub(1).map(|index| SequentialStart {
        index,
        local_progress: 1.0,
    })
}

/// How one parallel child takes part in a play
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParallelEntry {
    /// Play from the given local progress
    Play { local_progress: f32 },
    /// Already at its end state in forward time; nothing to do
    Skip,
    /// Idle for `wait` seconds, then play backward from 1
    Delay { wait: f32 },
}

/// Plan every child of a parallel group against global time `time`
pub fn plan_parallel(durations: &[f32], time: f32, speed: f32) -> Vec<ParallelEntry> {
    durations
        .iter()
        .map(|&duration| {
            let duration = duration.max(0.0);
            if time <= duration {
                let local_progress = if duration > 0.0 {
                    clamp01(time / duration)
                } else {
                    target_boundary(speed)
                };
                ParallelEntry::Play { local_progress }
            } else if speed > 0.0 {
                ParallelEntry::Skip
            } else if speed < 0.0 {
                ParallelEntry::Delay {
                    wait: time - duration,
                }
            } else {
                ParallelEntry::Play {
                    local_progress: 1.0,
                }
            }
        })
        .collect()
}

async fn play_slot(
    children: &[Option<Tween>],
    durations: &[f32],
    index: usize,
    local_progress: f32,
    speed: f32,
    ctx: &PlayContext,
) {
    if let Some(child) = &children[index] {
        child
            .play(durations[index], local_progress, speed, ctx)
            .await;
    }
}

/// Play a sequential group from global progress `start`
pub(crate) async fn play_sequential(
    children: &[Option<Tween>],
    durations: DurationCache,
    start: f32,
    speed: f32,
    ctx: &PlayContext,
) {
    let total = aggregate_duration(GroupMode::Sequential, &durations);
    let time = start * total;
    let Some(origin) = locate_sequential(&durations, time, speed) else {
        return;
    };

    tracing::trace!(
        "Sequential: start child {} at {:.4} (t={:.4}/{:.4}, speed={})",
        origin.index,
        origin.local_progress,
        time,
        total,
        speed
    );

    play_slot(
        children,
        &durations,
        origin.index,
        origin.local_progress,
        speed,
        ctx,
    )
    .await;

    if speed == 0.0 {
        // Frozen scrub: give every other child a consistent snapshot
        for index in 0..children.len() {
            if index == origin.index {
                continue;
            }
            let local_progress = if index > origin.index { 0.0 } else { 1.0 };
            play_slot(children, &durations, index, local_progress, 0.0, ctx).await;
        }
    } else if speed > 0.0 {
        for index in origin.index + 1..children.len() {
            if ctx.is_cancelled() {
                return;
            }
            play_slot(children, &durations, index, 0.0, speed, ctx).await;
        }
    } else {
        for index in (0..origin.index).rev() {
            if ctx.is_cancelled() {
                return;
            }
            play_slot(children, &durations, index, 1.0, speed, ctx).await;
        }
    }
}

/// Play a parallel group from global progress `start`
///
/// Completes once every participating child has finished or observed
/// cancellation.
pub(crate) async fn play_parallel(
    children: &[Option<Tween>],
    durations: DurationCache,
    stage: UpdateStage,
    start: f32,
    speed: f32,
    ctx: &PlayContext,
) {
    let total = aggregate_duration(GroupMode::Parallel, &durations);
    let time = start * total;
    let plan = plan_parallel(&durations, time, speed);

    let tasks: Vec<LocalBoxFuture<'_, ()>> = children
        .iter()
        .zip(durations.iter().copied())
        .zip(plan)
        .filter_map(|((slot, duration), entry)| {
            let child = slot.as_ref()?;
            match entry {
                ParallelEntry::Skip => None,
                ParallelEntry::Play { local_progress } => {
                    Some(child.play(duration, local_progress, speed, ctx))
                }
                ParallelEntry::Delay { wait } => {
                    // Idle time is not scaled by speed
                    Some(
                        async move {
                            if ctx.delay(stage, wait).await {
                                child.play(duration, 1.0, speed, ctx).await;
                            }
                        }
                        .boxed_local(),
                    )
                }
            }
        })
        .collect();

    tracing::trace!(
        "Parallel: {} of {} children active (t={:.4}/{:.4}, speed={})",
        tasks.len(),
        children.len(),
        time,
        total,
        speed
    );

    join_all(tasks).await;
}
