//! Frame pacing for the present stage

use std::time::{Duration, Instant};

/// Enforces a minimum interval between successive frame presentations.
///
/// Best-effort pacing, not a hard real-time clock: each call to
/// [`pace`](Self::pace) sleeps away whatever remains of the target interval
/// since the previous call. If the stage is already late (the upstream or the
/// sink took longer than the interval), `pace` returns immediately — late
/// frames are not dropped, they just play out as fast as they arrive.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl FramePacer {
    /// Create a pacer with the given target interval (e.g. 42 ms for ~24 fps).
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// The target interval between presentations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the target interval since the previous call has elapsed.
    ///
    /// The first call never sleeps; it only starts the clock.
    pub fn pace(&mut self) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last_tick = Some(Instant::now());
    }
}
