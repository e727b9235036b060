use log::trace;
use std::time::Duration;

/// The delay and sound timers. they count down at a fixed rate (60Hz on the
/// VIP) no matter how fast instructions are going; the interpreter feeds in
/// wall-clock time and we work out how many ticks that was
#[derive(Debug, Clone)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
    interval: Duration,
    accumulated: Duration,
}

impl Timers {
    pub fn new(hz: u32) -> Self {
        Timers {
            delay: 0,
            sound: 0,
            // no shorter than a nanosecond, or advance() would never finish
            interval: (Duration::from_secs(1) / hz.max(1)).max(Duration::from_nanos(1)),
            accumulated: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// account for `elapsed` time, decrementing both timers once per whole
    /// interval. any remainder is carried into the next call. returns the
    /// number of ticks that happened
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            self.tick();
            ticks += 1;
        }
        if ticks > 0 {
            trace!("{} timer tick(s): delay={} sound={}", ticks, self.delay, self.sound);
        }
        ticks
    }

    /// one 60Hz tick
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// forget any partial interval, e.g. after blocking for a key
    pub fn discard_pending(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

impl Default for Timers {
    fn default() -> Self {
        Timers::new(60)
    }
}
