//! Progress sinks
//!
//! An [`Effector`] receives the progress of a leaf tween and applies it to
//! whatever it animates. The tween engine never inspects what an effector
//! does with the value.

use crate::easing::Easing;

/// Consumer of leaf progress in `[0, 1]`
pub trait Effector {
    fn on_progress(&self, progress: f32);
}

impl<F: Fn(f32)> Effector for F {
    fn on_progress(&self, progress: f32) {
        self(progress)
    }
}

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for [f32; 2] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [self[0].lerp(&other[0], t), self[1].lerp(&other[1], t)]
    }
}

impl Interpolate for [f32; 3] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [
            self[0].lerp(&other[0], t),
            self[1].lerp(&other[1], t),
            self[2].lerp(&other[2], t),
        ]
    }
}

impl Interpolate for [f32; 4] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [
            self[0].lerp(&other[0], t),
            self[1].lerp(&other[1], t),
            self[2].lerp(&other[2], t),
            self[3].lerp(&other[3], t),
        ]
    }
}

/// Effector that eases progress and forwards the interpolated value
///
/// ```rust
/// use cadence_animation::{Easing, Effector, Interpolated};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let opacity = Rc::new(Cell::new(0.0));
/// let sink = opacity.clone();
/// let fade = Interpolated::new(0.0, 1.0, move |v: f32| sink.set(v)).with_easing(Easing::Linear);
///
/// fade.on_progress(0.25);
/// assert_eq!(opacity.get(), 0.25);
/// ```
pub struct Interpolated<T, S> {
    from: T,
    to: T,
    easing: Easing,
    sink: S,
}

impl<T: Interpolate, S: Fn(T)> Interpolated<T, S> {
    pub fn new(from: T, to: T, sink: S) -> Self {
        Self {
            from,
            to,
            easing: Easing::Linear,
            sink,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

impl<T: Interpolate, S: Fn(T)> Effector for Interpolated<T, S> {
    fn on_progress(&self, progress: f32) {
        let t = self.easing.apply(progress);
        (self.sink)(self.from.lerp(&self.to, t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_closure_effector() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let effector = move |p: f32| log.borrow_mut().push(p);

        effector.on_progress(0.0);
        effector.on_progress(0.5);
        assert_eq!(*seen.borrow(), vec![0.0, 0.5]);
    }

    #[test]
    fn test_interpolated_applies_easing() {
        let value = Rc::new(Cell::new(0.0));
        let sink = value.clone();
        let effector =
            Interpolated::new(10.0, 20.0, move |v: f32| sink.set(v)).with_easing(Easing::EaseInQuad);

        effector.on_progress(0.5);
        assert_eq!(value.get(), 12.5);
        effector.on_progress(1.0);
        assert_eq!(value.get(), 20.0);
    }

    #[test]
    fn test_interpolated_color() {
        let color = Rc::new(Cell::new([0.0; 4]));
        let sink = color.clone();
        let effector = Interpolated::new([0.0, 0.0, 0.0, 1.0], [1.0, 0.5, 0.0, 1.0], move |c: [f32; 4]| {
            sink.set(c)
        });

        effector.on_progress(0.5);
        assert_eq!(color.get(), [0.5, 0.25, 0.0, 1.0]);
    }
}
