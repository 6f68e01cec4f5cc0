//! Variable-rate frame timing.
//!
//! The animation integrates with the real frame delta, so there is no fixed
//! step or accumulator. Long stalls (window drags, breakpoints) are clamped
//! so a single frame cannot jump the orbit.

use std::time::Instant;

use tracing::warn;

pub struct FrameClock {
    previous: Instant,
    max_dt: f32,
    frame_count: u64,
    elapsed: f64,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            previous: Instant::now(),
            max_dt,
            frame_count: 0,
            elapsed: 0.0,
        }
    }

    /// Seconds since the previous tick, clamped to `max_dt`.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.advance_by(raw)
    }

    /// Account for a frame of `raw` seconds and return the clamped delta.
    pub fn advance_by(&mut self, raw: f64) -> f32 {
        let mut dt = raw.max(0.0) as f32;
        if dt > self.max_dt {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                dt * 1000.0,
                self.max_dt * 1000.0
            );
            dt = self.max_dt;
        }
        self.frame_count += 1;
        self.elapsed += f64::from(dt);
        dt
    }

    /// Forget time spent outside the loop, e.g. during setup.
    pub fn reset(&mut self) {
        self.previous = Instant::now();
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of clamped deltas.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_frames_pass_through() {
        let mut clock = FrameClock::new(0.25);
        let dt = clock.advance_by(1.0 / 60.0);
        assert!((dt - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new(0.25);
        assert_eq!(clock.advance_by(2.0), 0.25);
        assert!((clock.elapsed() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_negative_frame_is_zero() {
        let mut clock = FrameClock::new(0.25);
        assert_eq!(clock.advance_by(-1.0), 0.0);
    }

    #[test]
    fn test_elapsed_accumulates() {
        let mut clock = FrameClock::new(0.25);
        for _ in 0..10 {
            clock.advance_by(0.1);
        }
        assert_eq!(clock.frame_count(), 10);
        assert!((clock.elapsed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tick_is_bounded() {
        let mut clock = FrameClock::new(0.25);
        let dt = clock.tick();
        assert!((0.0..=0.25).contains(&dt));
    }
}
