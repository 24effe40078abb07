//! Tween groups
//!
//! A [`TweenGroup`] composes child tweens either back to back
//! ([`GroupMode::Sequential`]) or all at once ([`GroupMode::Parallel`]).
//!
//! Child durations are resolved once per arming by
//! [`TweenGroup::create_duration`] and cached until the next call, so a
//! jittered tree keeps the same timing while it is being scrubbed.

use crate::compose::{self, DurationCache};
use crate::tween::{clamp01, PlayContext, Tween};
use cadence_core::{Midpoint, RandomSource, UpdateStage};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// How a group schedules its children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Children play one after another in insertion order
    #[default]
    Sequential,
    /// Children play concurrently; the group ends with its longest child
    Parallel,
}

/// Composite tween
///
/// Children are stored as slots. An empty slot behaves like a finished
/// zero-length child: it adds nothing to the duration and is skipped during
/// play.
#[derive(Clone, Debug, Default)]
pub struct TweenGroup {
    mode: GroupMode,
    children: Vec<Option<Tween>>,
    stage: UpdateStage,
    durations: RefCell<DurationCache>,
}

impl TweenGroup {
    pub fn new(mode: GroupMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn sequential() -> Self {
        Self::new(GroupMode::Sequential)
    }

    pub fn parallel() -> Self {
        Self::new(GroupMode::Parallel)
    }

    /// Create a group from existing slots
    pub fn with_children<I>(mode: GroupMode, children: I) -> Self
    where
        I: IntoIterator<Item = Option<Tween>>,
    {
        Self {
            mode,
            children: children.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, tween: impl Into<Tween>) -> Self {
        self.push(tween);
        self
    }

    /// Update stage used when a parallel child waits before playing backward
    pub fn with_stage(mut self, stage: UpdateStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn push(&mut self, tween: impl Into<Tween>) {
        self.children.push(Some(tween.into()));
    }

    /// Append a slot that may be empty
    pub fn push_slot(&mut self, slot: Option<Tween>) {
        self.children.push(slot);
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupMode) {
        self.mode = mode;
    }

    pub fn stage(&self) -> UpdateStage {
        self.stage
    }

    pub fn children(&self) -> &[Option<Tween>] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Option<Tween>> {
        self.children
    }

    /// Number of occupied slots
    pub fn child_count(&self) -> usize {
        self.children.iter().flatten().count()
    }

    /// Whether the group has no occupied slots
    pub fn is_empty(&self) -> bool {
        self.child_count() == 0
    }

    /// Per-child durations resolved by the last [`create_duration`](Self::create_duration)
    pub fn cached_durations(&self) -> Vec<f32> {
        self.durations.borrow().to_vec()
    }

    /// Resolve every child's duration and return the aggregate
    ///
    /// The cache is rebuilt in full and swapped in only once every child has
    /// been resolved.
    pub fn create_duration(&self, rng: &mut dyn RandomSource) -> f32 {
        let durations: DurationCache = self
            .children
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .map_or(0.0, |child| child.create_duration(rng).max(0.0))
            })
            .collect();
        let total = compose::aggregate_duration(self.mode, &durations);
        *self.durations.borrow_mut() = durations;
        total
    }

    /// Play the group over `duration` seconds from `start` (clamped to `[0, 1]`)
    ///
    /// Cached child durations are scaled when `duration` differs from the
    /// aggregate they add up to.
    pub fn play<'a>(
        &'a self,
        duration: f32,
        start: f32,
        speed: f32,
        ctx: &'a PlayContext,
    ) -> LocalBoxFuture<'a, ()> {
        let start = clamp01(start);
        let durations = self.armed_durations();
        let durations = compose::scale_durations(self.mode, durations, duration);

        match self.mode {
            GroupMode::Sequential => {
                compose::play_sequential(&self.children, durations, start, speed, ctx).boxed_local()
            }
            GroupMode::Parallel => compose::play_parallel(
                &self.children,
                durations,
                self.stage,
                start,
                speed,
                ctx,
            )
            .boxed_local(),
        }
    }

    fn armed_durations(&self) -> DurationCache {
        if self.durations.borrow().len() != self.children.len() {
            tracing::warn!(
                "TweenGroup: played before create_duration ({} children), resolving without jitter",
                self.children.len()
            );
            self.create_duration(&mut Midpoint);
        }
        self.durations.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::SplitMix64;

    fn noop(duration: f32) -> Tween {
        Tween::leaf(duration, |_: f32| {})
    }

    #[test]
    fn test_sequential_duration_sums() {
        let group = TweenGroup::sequential()
            .with(noop(2.0))
            .with(noop(3.0))
            .with(noop(5.0));

        assert_eq!(group.create_duration(&mut Midpoint), 10.0);
        assert_eq!(group.cached_durations(), vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_parallel_duration_is_max() {
        let group = TweenGroup::parallel().with(noop(1.0)).with(noop(5.0));
        assert_eq!(group.create_duration(&mut Midpoint), 5.0);
    }

    #[test]
    fn test_empty_slots_contribute_nothing() {
        let mut group = TweenGroup::sequential();
        group.push_slot(None);
        group.push(noop(1.5));
        group.push_slot(None);

        assert_eq!(group.child_count(), 1);
        assert!(!group.is_empty());
        assert_eq!(group.create_duration(&mut Midpoint), 1.5);
        assert_eq!(group.cached_durations(), vec![0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_negative_child_durations_clamped() {
        let group = TweenGroup::sequential().with(noop(-2.0)).with(noop(1.0));
        assert_eq!(group.create_duration(&mut Midpoint), 1.0);
        assert_eq!(group.cached_durations(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_cache_rebuilt_on_each_create_duration() {
        let jittery = |d: f32| -> Tween {
            crate::tween::LeafTween::new(d, |_: f32| {})
                .with_jitter(0.5)
                .into()
        };
        let group = TweenGroup::sequential().with(jittery(1.0)).with(jittery(2.0));
        let mut rng = SplitMix64::new(99);

        let first_total = group.create_duration(&mut rng);
        let first = group.cached_durations();
        let second_total = group.create_duration(&mut rng);
        let second = group.cached_durations();

        assert_eq!(first.iter().sum::<f32>(), first_total);
        assert_eq!(second.iter().sum::<f32>(), second_total);
        assert_ne!(first, second);
    }

    #[test]
    fn test_nested_group_duration() {
        let inner = TweenGroup::parallel().with(noop(1.0)).with(noop(4.0));
        let outer = TweenGroup::sequential().with(noop(2.0)).with(inner);

        assert_eq!(outer.create_duration(&mut Midpoint), 6.0);
        let inner = outer.children()[1].as_ref().and_then(Tween::as_group).unwrap();
        assert_eq!(inner.cached_durations(), vec![1.0, 4.0]);
    }
}
