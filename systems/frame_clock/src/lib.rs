#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame clock system that turns wall-clock frame time into bounded world
//! ticks.
//!
//! Long frames are split into several [`Command::Tick`] commands so a single
//! update never moves a vehicle far enough to skip over the hero.

use std::time::Duration;

use river_crossing_core::{Command, MAX_FRAME_STEP};

/// Configuration parameters required to construct the frame clock.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    max_step: Duration,
}

impl Config {
    /// Creates a configuration that caps every tick at `max_step`.
    ///
    /// A zero step disables splitting.
    #[must_use]
    pub const fn new(max_step: Duration) -> Self {
        Self { max_step }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(MAX_FRAME_STEP)
    }
}

/// Pure system emitting tick commands for elapsed frame time.
#[derive(Debug)]
pub struct FrameClock {
    max_step: Duration,
    total: Duration,
    frames: u64,
}

impl FrameClock {
    /// Creates a new frame clock using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            max_step: config.max_step,
            total: Duration::ZERO,
            frames: 0,
        }
    }

    /// Emits ticks covering `elapsed`, none longer than the configured step.
    pub fn handle(&mut self, elapsed: Duration, out: &mut Vec<Command>) {
        self.frames = self.frames.saturating_add(1);
        if elapsed.is_zero() {
            return;
        }
        self.total = self.total.saturating_add(elapsed);

        if self.max_step.is_zero() {
            out.push(Command::Tick { dt: elapsed });
            return;
        }

        let mut remaining = elapsed;
        while remaining > self.max_step {
            out.push(Command::Tick { dt: self.max_step });
            remaining -= self.max_step;
        }
        out.push(Command::Tick { dt: remaining });
    }

    /// Frame time observed so far.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Number of frames handled so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}
