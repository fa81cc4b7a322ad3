//! Frame clock
//!
//! Driven by the host's frame callback (requestAnimationFrame on the web, a
//! paced loop natively). Each call to [`FrameClock::advance`] while running
//! yields one [`FrameTick`]. There is no back-pressure: a tick is produced
//! every frame whether or not the previous round trip finished.

use crate::consts::{FPS_WINDOW, NATIVE_FRAME_DT};

/// One frame of the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// 1-based frame number
    pub frame: u64,
    /// Host timestamp (ms)
    pub time_ms: f64,
    /// Seconds since the previous frame
    pub dt: f32,
}

/// Frame counter with FPS tracking
#[derive(Debug, Clone)]
pub struct FrameClock {
    running: bool,
    frame: u64,
    last_time: Option<f64>,
    // FPS tracking
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    fps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            running: false,
            frame: 0,
            last_time: None,
            frame_times: [f64::NAN; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
        }
    }

    /// Start producing ticks. Must be the last startup step.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            log::info!("Frame clock started");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Frames per second over the last `FPS_WINDOW` frames
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Advance one frame. Returns `None` until the clock is started.
    pub fn advance(&mut self, time_ms: f64) -> Option<FrameTick> {
        if !self.running {
            return None;
        }

        let dt = match self.last_time {
            Some(last) => (((time_ms - last) / 1000.0) as f32).max(0.0),
            None => NATIVE_FRAME_DT,
        };
        self.last_time = Some(time_ms);
        self.frame += 1;

        // Oldest sample in the ring is the one about to be overwritten
        let oldest_time = self.frame_times[self.frame_index];
        self.frame_times[self.frame_index] = time_ms;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        if !oldest_time.is_nan() {
            let elapsed = time_ms - oldest_time;
            if elapsed > 0.0 {
                self.fps = (FPS_WINDOW as f64 * 1000.0 / elapsed).round() as u32;
            }
        }

        Some(FrameTick {
            frame: self.frame,
            time_ms,
            dt,
        })
    }
}
