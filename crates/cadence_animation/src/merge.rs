//! Parallel merge builder
//!
//! Collects tweens meant to run at the same time into the smallest tree that
//! plays them. The destination after every absorption is one of:
//!
//! - nothing, when only empty input has been absorbed
//! - the single absorbed tween
//! - a [`GroupMode::Parallel`] group whose direct children are neither empty
//!   groups nor parallel groups

use crate::group::{GroupMode, TweenGroup};
use crate::tween::Tween;
use cadence_core::UpdateStage;

/// Builder that merges tweens into one parallel destination
///
/// ```rust
/// use cadence_animation::{ParallelMerger, Tween, TweenGroup};
///
/// let mut merger = ParallelMerger::new();
/// merger.push(Tween::leaf(1.0, |_: f32| {}));
/// merger.push(TweenGroup::parallel().with(Tween::leaf(2.0, |_: f32| {})));
///
/// let merged = merger.finish().unwrap();
/// assert_eq!(merged.as_group().map(|g| g.child_count()), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct ParallelMerger {
    destination: Option<Tween>,
}

impl ParallelMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `tween` into the destination
    ///
    /// `None` and empty groups leave the destination untouched.
    pub fn absorb(&mut self, tween: Option<Tween>) -> &mut Self {
        let Some(tween) = tween else {
            return self;
        };

        let mut members = Vec::new();
        let mut stage = None;
        if let Some(destination) = self.destination.take() {
            collect(destination, &mut members, &mut stage);
        }
        collect(tween, &mut members, &mut stage);

        self.destination = match members.len() {
            0 | 1 => members.pop(),
            _ => {
                let group = TweenGroup::with_children(
                    GroupMode::Parallel,
                    members.into_iter().map(Some),
                )
                .with_stage(stage.unwrap_or_default());
                Some(group.into())
            }
        };

        tracing::trace!(
            "ParallelMerger: destination now {}",
            match &self.destination {
                None => "empty".to_string(),
                Some(Tween::Leaf(_)) => "a leaf".to_string(),
                Some(Tween::Group(group)) => format!("a group of {}", group.child_count()),
            }
        );
        self
    }

    /// Shorthand for absorbing a tween that is always present
    pub fn push(&mut self, tween: impl Into<Tween>) -> &mut Self {
        self.absorb(Some(tween.into()))
    }

    pub fn destination(&self) -> Option<&Tween> {
        self.destination.as_ref()
    }

    pub fn finish(self) -> Option<Tween> {
        self.destination
    }
}

impl FromIterator<Tween> for ParallelMerger {
    fn from_iter<I: IntoIterator<Item = Tween>>(iter: I) -> Self {
        let mut merger = Self::new();
        for tween in iter {
            merger.push(tween);
        }
        merger
    }
}

/// Flatten `tween` into parallel members
///
/// The first spliced parallel group donates its update stage.
fn collect(tween: Tween, members: &mut Vec<Tween>, stage: &mut Option<UpdateStage>) {
    match simplify(tween) {
        None => {}
        Some(Tween::Group(group)) if group.mode() == GroupMode::Parallel => {
            stage.get_or_insert(group.stage());
            for child in group.into_children().into_iter().flatten() {
                collect(child, members, stage);
            }
        }
        Some(tween) => members.push(tween),
    }
}

/// Drop empty groups and unwrap single-child sequential groups
fn simplify(tween: Tween) -> Option<Tween> {
    match tween {
        Tween::Leaf(_) => Some(tween),
        Tween::Group(group) if group.is_empty() => None,
        Tween::Group(group) if group.mode() == GroupMode::Sequential && group.child_count() == 1 => {
            group.into_children().into_iter().flatten().next().and_then(simplify)
        }
        Tween::Group(group) => Some(group.into()),
    }
}
