//! Frame timing.
//!
//! Produces the per-frame delta fed to the environment: wall-clock time
//! when running live, or a fixed step when headless.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Target frames per second
    target_fps: u32,
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Maximum delta time so one stall cannot skip hours of simulated time
    max_dt: f32,
    /// Fixed delta returned every frame when headless
    fixed_dt: Option<f32>,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameTiming {
    /// Create a wall-clock frame timer.
    ///
    /// # Arguments
    /// * `target_fps` - Target frames per second for frame limiting
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            last_frame: Instant::now(),
            max_dt: 0.25,
            fixed_dt: None,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Create a timer that returns exactly `1 / target_fps` every frame.
    #[must_use]
    pub fn headless(target_fps: u32) -> Self {
        let mut timing = Self::new(target_fps);
        timing.fixed_dt = Some(1.0 / timing.target_fps as f32);
        timing
    }

    /// Whether deltas are fixed.
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.fixed_dt.is_some()
    }

    /// Delta time for this frame, in seconds.
    /// Also stores the frame time for FPS calculation.
    pub fn delta_time(&mut self) -> f32 {
        let dt = match self.fixed_dt {
            Some(fixed) => fixed,
            None => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;
                dt.min(self.max_dt)
            },
        };

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        dt
    }

    /// Sleep for the remainder of the frame budget. No-op when headless.
    pub fn sleep_remainder(&self) {
        if self.is_headless() {
            return;
        }

        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        let average = self.average_frame_time();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    /// Get the average frame time in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        self.average_frame_time() * 1000.0
    }

    /// Get the target FPS.
    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Reset timing (call after pause or loading).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.frame_times.clear();
    }

    fn average_frame_time(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_delta_is_fixed() {
        let mut timing = FrameTiming::headless(50);
        assert!(timing.is_headless());
        for _ in 0..3 {
            assert!((timing.delta_time() - 0.02).abs() < f32::EPSILON);
        }
        assert!((timing.current_fps() - 50.0).abs() < 0.01);
        assert!((timing.average_frame_time_ms() - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_wall_clock_delta_is_clamped() {
        let mut timing = FrameTiming::new(60);
        let dt = timing.delta_time();
        assert!((0.0..=0.25).contains(&dt));
        assert!(!timing.is_headless());
    }

    #[test]
    fn test_zero_fps_is_raised() {
        let timing = FrameTiming::headless(0);
        assert_eq!(timing.target_fps(), 1);
    }

    #[test]
    fn test_reset_clears_samples() {
        let mut timing = FrameTiming::headless(30);
        timing.delta_time();
        timing.reset();
        assert!(timing.current_fps().abs() < f32::EPSILON);
    }
}
