//! Per-question countdown driven by a cancellable tokio task.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerBand {
    Calm,
    Warning,
    Danger,
}

/// One step of the countdown. Remaining time is counted in whole ticks, never wall-clock deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_ticks: u32,
    pub total_ticks: u32,
    pub interval: Duration,
}

impl CountdownTick {
    /// The reading shown before the first tick.
    pub fn full(duration: Duration, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let total_ticks = total_ticks(duration, interval);
        Self {
            remaining_ticks: total_ticks,
            total_ticks,
            interval,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.interval * self.remaining_ticks
    }

    pub fn fraction_remaining(&self) -> f64 {
        if self.total_ticks == 0 {
            return 0.0;
        }
        f64::from(self.remaining_ticks) / f64::from(self.total_ticks)
    }

    /// Danger at or below 30% remaining, warning at or below 60%.
    pub fn band(&self) -> TimerBand {
        let remaining = u64::from(self.remaining_ticks) * 10;
        let total = u64::from(self.total_ticks);
        if remaining <= total * 3 {
            TimerBand::Danger
        } else if remaining <= total * 6 {
            TimerBand::Warning
        } else {
            TimerBand::Calm
        }
    }
}

#[derive(Default)]
pub struct Countdown {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh countdown under [`Countdown::next_generation`], cancelling any previous one.
    ///
    /// `on_tick` runs once per `interval` with the decremented remaining time and `on_expire`
    /// runs exactly once after the final tick. Both are dropped without running if the
    /// countdown is stopped first.
    pub fn start<T, E>(
        &mut self,
        duration: Duration,
        interval: Duration,
        mut on_tick: T,
        on_expire: E,
    ) where
        T: FnMut(CountdownTick) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.stop();
        self.generation += 1;

        let CountdownTick {
            total_ticks,
            interval,
            ..
        } = CountdownTick::full(duration, interval);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut remaining_ticks = total_ticks;
            while remaining_ticks > 0 {
                ticker.tick().await;
                remaining_ticks -= 1;
                on_tick(CountdownTick {
                    remaining_ticks,
                    total_ticks,
                    interval,
                });
            }
            on_expire();
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The generation the next `start` will hand out, so callbacks can be tagged before starting.
    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    /// True while `generation` names the countdown that was started last and not stopped since.
    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && self.generation == generation
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

fn total_ticks(duration: Duration, interval: Duration) -> u32 {
    let ticks = duration.as_micros() / interval.as_micros().max(1);
    u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
#[path = "tests/countdown_tests.rs"]
mod tests;
