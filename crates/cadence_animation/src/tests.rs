//! End-to-end playback scenarios over nested trees

use crate::{
    LeafTween, ParallelMerger, PlayerConfig, Tween, TweenGroup, TweenPlayer, YoyoMode,
};
use cadence_core::{Runtime, SplitMix64};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Recorder {
    log: Rc<RefCell<Vec<(&'static str, f32)>>>,
}

impl Recorder {
    fn leaf(&self, name: &'static str, duration: f32) -> Tween {
        let log = self.log.clone();
        Tween::leaf(duration, move |p: f32| log.borrow_mut().push((name, p)))
    }

    /// Names in the order they were first notified
    fn activation_order(&self) -> Vec<&'static str> {
        let mut order = Vec::new();
        for (name, _) in self.log.borrow().iter() {
            if !order.contains(name) {
                order.push(*name);
            }
        }
        order
    }

    /// Last reported value per name
    fn latest(&self) -> HashMap<&'static str, f32> {
        self.log.borrow().iter().copied().collect()
    }

    fn position(&self, entry: (&'static str, f32)) -> Option<usize> {
        self.log.borrow().iter().position(|e| *e == entry)
    }

    fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

/// a(1) -> [b(1) | c(2)] -> d(1), four seconds long
fn nested_tree(recorder: &Recorder) -> TweenGroup {
    TweenGroup::sequential()
        .with(recorder.leaf("a", 1.0))
        .with(
            TweenGroup::parallel()
                .with(recorder.leaf("b", 1.0))
                .with(recorder.leaf("c", 2.0)),
        )
        .with(recorder.leaf("d", 1.0))
}

#[test]
fn test_nested_tree_forward() {
    let mut runtime = Runtime::new();
    let recorder = Recorder::default();
    let player = TweenPlayer::new(runtime.handle());
    player.set_tween(nested_tree(&recorder));

    let mut task = player.start().unwrap();
    runtime.run_until_stalled();
    assert_eq!(player.duration(), Some(4.0));

    for _ in 0..7 {
        runtime.tick(0.5);
    }
    assert_eq!(task.try_take(), None);
    runtime.tick(0.5);
    assert_eq!(task.try_take(), Some(true));

    assert_eq!(recorder.activation_order(), vec!["a", "b", "c", "d"]);
    let latest = recorder.latest();
    for name in ["a", "b", "c", "d"] {
        assert_eq!(latest[name], 1.0, "{name}");
    }

    // Both parallel children start in the poll that finishes a
    let a_done = recorder.position(("a", 1.0)).unwrap();
    assert_eq!(recorder.position(("b", 0.0)), Some(a_done + 1));
    assert_eq!(recorder.position(("c", 0.0)), Some(a_done + 2));
}

#[test]
fn test_round_trip_reverses_activation_order() {
    let mut runtime = Runtime::new();
    let recorder = Recorder::default();
    let player = TweenPlayer::new(runtime.handle());
    player.set_tween(nested_tree(&recorder));

    let _forward = player.start().unwrap();
    runtime.run_until_stalled();
    for _ in 0..8 {
        runtime.tick(0.5);
    }
    assert_eq!(player.progress(), 1.0);
    recorder.clear();

    player.set_speed(-1.0);
    let mut backward = player.start().unwrap();
    runtime.run_until_stalled();
    for _ in 0..8 {
        runtime.tick(0.5);
    }
    assert_eq!(backward.try_take(), Some(true));
    assert_eq!(player.progress(), 0.0);

    assert_eq!(recorder.activation_order(), vec!["d", "c", "b", "a"]);
    let latest = recorder.latest();
    for name in ["a", "b", "c", "d"] {
        assert_eq!(latest[name], 0.0, "{name}");
    }

    // b idles for one second of the parallel span before rewinding
    let b_start = recorder.position(("b", 1.0)).unwrap();
    let log = recorder.log.borrow();
    let before_b = &log[..b_start];
    assert!(before_b.contains(&("c", 0.75)));
    assert!(!before_b.contains(&("c", 0.25)));
}

#[test]
fn test_seek_back_from_mid_timeline() {
    let mut runtime = Runtime::new();
    let recorder = Recorder::default();
    let player = TweenPlayer::new(runtime.handle());
    player.set_tween(nested_tree(&recorder));

    // Two of four seconds: a done, b done, c halfway
    let mut forward = player.start().unwrap();
    runtime.run_until_stalled();
    for _ in 0..4 {
        runtime.tick(0.5);
    }
    player.set_speed(-1.0);
    runtime.run_until_stalled();
    assert_eq!(forward.try_take(), Some(false));
    assert_eq!(player.progress(), 0.5);

    let left_at = recorder.latest();
    assert_eq!(left_at["a"], 1.0);
    assert_eq!(left_at["b"], 1.0);
    assert_eq!(left_at["c"], 0.5);
    assert!(!left_at.contains_key("d"));
    recorder.clear();

    let mut backward = player.start().unwrap();
    runtime.run_until_stalled();
    for _ in 0..4 {
        runtime.tick(0.5);
    }
    assert_eq!(backward.try_take(), Some(true));
    assert_eq!(player.progress(), 0.0);

    assert_eq!(recorder.activation_order(), vec!["b", "c", "a"]);
    for name in ["a", "b", "c"] {
        let first = recorder
            .log
            .borrow()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p);
        assert_eq!(first, Some(left_at[name]), "{name}");
    }
    assert!(recorder.latest().values().all(|p| *p == 0.0));
}

#[test]
fn test_preview_snapshot_of_nested_tree() {
    let runtime = Runtime::new();
    let recorder = Recorder::default();
    let config = PlayerConfig {
        preview_scrub: true,
        ..Default::default()
    };
    let player = TweenPlayer::with_config(runtime.handle(), config);
    player.set_tween(nested_tree(&recorder));

    player.set_progress(0.5);
    let latest = recorder.latest();
    assert_eq!(latest["a"], 1.0);
    assert_eq!(latest["b"], 1.0);
    assert_eq!(latest["c"], 0.5);
    assert_eq!(latest["d"], 0.0);
    assert_eq!(recorder.log.borrow().len(), 4);

    player.set_progress(0.125);
    let latest = recorder.latest();
    assert_eq!(latest["a"], 0.5);
    assert_eq!(latest["b"], 0.0);
    assert_eq!(latest["c"], 0.0);
    assert_eq!(latest["d"], 0.0);
}

#[test]
fn test_yoyo_round_trip_on_nested_tree() {
    let mut runtime = Runtime::new();
    let recorder = Recorder::default();
    let player = TweenPlayer::new(runtime.handle());
    player.set_tween(nested_tree(&recorder));
    player.set_yoyo(YoyoMode::End);

    let mut task = player.start().unwrap();
    runtime.run_until_stalled();
    for _ in 0..16 {
        runtime.tick(0.5);
    }

    assert_eq!(task.try_take(), Some(true));
    assert_eq!(player.progress(), 0.0);
    assert!(recorder.latest().values().all(|p| *p == 0.0));
}

#[test]
fn test_equal_seeds_arm_equal_durations() {
    let jittered = || -> TweenGroup {
        TweenGroup::sequential()
            .with(LeafTween::new(1.0, |_: f32| {}).with_jitter(0.25))
            .with(LeafTween::new(2.0, |_: f32| {}).with_jitter(0.5))
    };
    let runtime = Runtime::new();

    let first = TweenPlayer::new(runtime.handle());
    first.set_random(SplitMix64::new(7));
    first.set_tween(jittered());

    let second = TweenPlayer::new(runtime.handle());
    second.set_random(SplitMix64::new(7));
    second.set_tween(jittered());

    for _ in 0..4 {
        let a = first.refresh_duration().unwrap();
        let b = second.refresh_duration().unwrap();
        assert_eq!(a, b);
        assert!((2.25..=3.75).contains(&a));
    }
}

#[test]
fn test_merged_tree_plays_for_longest_member() {
    let mut runtime = Runtime::new();
    let recorder = Recorder::default();

    let mut merger = ParallelMerger::new();
    merger
        .push(recorder.leaf("a", 1.0))
        .push(
            TweenGroup::parallel()
                .with(recorder.leaf("b", 2.0))
                .with(recorder.leaf("c", 0.5)),
        )
        .absorb(None);
    let merged = merger.finish().unwrap();
    assert_eq!(merged.as_group().map(TweenGroup::child_count), Some(3));

    let player = TweenPlayer::new(runtime.handle());
    player.set_tween(merged);

    let mut task = player.start().unwrap();
    runtime.run_until_stalled();
    assert_eq!(player.duration(), Some(2.0));

    for _ in 0..3 {
        runtime.tick(0.5);
    }
    assert_eq!(task.try_take(), None);
    runtime.tick(0.5);
    assert_eq!(task.try_take(), Some(true));
    assert!(recorder.latest().values().all(|p| *p == 1.0));
}
