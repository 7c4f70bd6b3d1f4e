use stratus_core::config::WorkerConfig;

/// Throttle for worker submissions: at most `batch_size` requests per batch,
/// never more than `max_in_flight` outstanding, and a pause of
/// `interval` scene seconds after each non-empty batch.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    max_in_flight: usize,
    interval: f32,
    cooldown: f32,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, max_in_flight: usize, interval: f32) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_in_flight: max_in_flight.max(1),
            interval: interval.max(0.0),
            cooldown: 0.0,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            config.batch_size as usize,
            config.max_in_flight as usize,
            config.batch_interval_secs,
        )
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt.max(0.0)).max(0.0);
    }

    /// Requests that may be submitted right now.
    pub fn capacity(&self, in_flight: usize) -> usize {
        if self.cooldown > 0.0 {
            return 0;
        }
        self.batch_size
            .min(self.max_in_flight.saturating_sub(in_flight))
    }

    pub fn record_batch(&mut self, submitted: usize) {
        if submitted > 0 {
            self.cooldown = self.interval;
        }
    }

    pub fn cooling_down(&self) -> bool {
        self.cooldown > 0.0
    }
}
