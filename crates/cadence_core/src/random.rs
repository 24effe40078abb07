//! Injectable random sources
//!
//! Tween durations may carry random jitter. The generator is always passed in
//! explicitly so tests and replays can seed it.

/// A source of uniformly distributed random numbers
pub trait RandomSource {
    /// Next raw 64-bit value
    fn next_u64(&mut self) -> u64;

    /// Next value in `[0, 1)`
    fn next_f32(&mut self) -> f32 {
        // Top 24 bits fit the f32 mantissa exactly
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Next value in `[min, max)`, or `min` when the range is empty
    fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f32()
    }
}

/// SplitMix64 generator
///
/// Small, fast and fully determined by its seed.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RandomSource for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Always yields the midpoint of the requested range
///
/// Symmetric jitter drawn from this source is zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Midpoint;

impl RandomSource for Midpoint {
    fn next_u64(&mut self) -> u64 {
        1 << 63
    }

    fn next_f32(&mut self) -> f32 {
        0.5
    }
}
