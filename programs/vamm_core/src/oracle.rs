/// Rate Oracle Module
///
/// This module maintains a ring buffer of (timestamp, tick-cumulative)
/// samples for each vamm, from which consumers derive time-weighted average
/// fixed rates over arbitrary trailing windows. The cumulative is extended
/// with the tick that prevailed *before* each state change, so a single
/// large swap cannot instantaneously move the average it reports.
///
/// The buffer starts at cardinality one and is grown explicitly via `grow`;
/// ring slots past the live cardinality stay uninitialized until the write
/// index wraps into them.
use crate::constants::MAX_OBSERVATIONS;
use crate::errors::{Result, VammError};

/// A single oracle sample.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Timestamp at which the sample was recorded.
    pub block_timestamp: i64,
    /// Running sum of tick * elapsed seconds since the vamm was created.
    pub tick_cumulative: i64,
    /// Whether the slot has ever been written.
    pub initialized: bool,
}

impl Observation {
    /// Extends this observation to `timestamp`, accumulating `tick` over the
    /// elapsed interval.
    fn transform(&self, timestamp: i64, tick: i32) -> Observation {
        let delta = timestamp - self.block_timestamp;
        Observation {
            block_timestamp: timestamp,
            tick_cumulative: self.tick_cumulative + tick as i64 * delta,
            initialized: true,
        }
    }
}

/// Ring buffer of observations for one vamm.
#[derive(Debug)]
pub struct Oracle {
    observations: Vec<Observation>,
    /// Index of the most recently written observation.
    index: usize,
    /// Number of live slots in the ring.
    cardinality: usize,
    /// Target cardinality; the ring expands into it as writes wrap.
    cardinality_next: usize,
}

impl Oracle {
    /// Creates the oracle with a single genesis observation at `timestamp`.
    pub fn new(timestamp: i64) -> Self {
        Self {
            observations: vec![Observation {
                block_timestamp: timestamp,
                tick_cumulative: 0,
                initialized: true,
            }],
            index: 0,
            cardinality: 1,
            cardinality_next: 1,
        }
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn cardinality_next(&self) -> usize {
        self.cardinality_next
    }

    /// The most recently written observation.
    fn newest(&self) -> &Observation {
        &self.observations[self.index]
    }

    /// The oldest initialized observation in the ring.
    fn oldest(&self) -> &Observation {
        let candidate = &self.observations[(self.index + 1) % self.cardinality];
        if candidate.initialized {
            candidate
        } else {
            // Ring not yet wrapped; slot 0 is the genesis observation.
            &self.observations[0]
        }
    }

    /// Records a sample at `timestamp` with the tick that prevailed up to
    /// that moment.
    ///
    /// At most one observation is stored per timestamp: repeated writes in
    /// the same second are no-ops, so the first state change in a second
    /// fixes the sample. A pending cardinality increase takes effect when
    /// the write index reaches the end of the live ring.
    pub fn write(&mut self, timestamp: i64, tick: i32) {
        let last = *self.newest();
        if last.block_timestamp == timestamp {
            return;
        }

        let cardinality_updated =
            if self.cardinality_next > self.cardinality && self.index == self.cardinality - 1 {
                self.cardinality_next
            } else {
                self.cardinality
            };

        let index_updated = (self.index + 1) % cardinality_updated;
        self.observations[index_updated] = last.transform(timestamp, tick);
        self.index = index_updated;
        self.cardinality = cardinality_updated;
    }

    /// Raises the target cardinality of the ring.
    ///
    /// Growth is monotone: a request at or below the current target is a
    /// no-op. Requests above `MAX_OBSERVATIONS` (or of zero) are rejected.
    pub fn grow(&mut self, cardinality_next: usize) -> Result<usize> {
        if cardinality_next == 0 || cardinality_next > MAX_OBSERVATIONS {
            return Err(VammError::InvalidObservationCardinality {
                requested: cardinality_next,
            });
        }
        if cardinality_next <= self.cardinality_next {
            return Ok(self.cardinality_next);
        }

        self.observations
            .resize(cardinality_next, Observation::default());
        self.cardinality_next = cardinality_next;
        Ok(cardinality_next)
    }

    /// Returns the tick-cumulative as of `seconds_ago` before `timestamp`.
    ///
    /// Three cases: the target is at or after the newest sample (extend the
    /// newest sample with the current tick), it lands exactly on a stored
    /// sample, or it falls between two samples and is linearly interpolated.
    ///
    /// # Arguments
    /// * `timestamp` - The current time
    /// * `tick` - The vamm's current tick
    /// * `seconds_ago` - How far back to read; zero reads the present
    pub fn observe_single(&self, timestamp: i64, tick: i32, seconds_ago: u64) -> Result<i64> {
        let target = timestamp - seconds_ago as i64;

        let newest = *self.newest();
        if target >= newest.block_timestamp {
            return if target == newest.block_timestamp {
                Ok(newest.tick_cumulative)
            } else {
                Ok(newest.transform(target, tick).tick_cumulative)
            };
        }

        if target < self.oldest().block_timestamp {
            return Err(VammError::OracleInsufficientData);
        }

        let (before, after) = self.surrounding_observations(target);
        if before.block_timestamp == target {
            return Ok(before.tick_cumulative);
        }
        if after.block_timestamp == target {
            return Ok(after.tick_cumulative);
        }

        // Linear interpolation between the two surrounding samples.
        let window = after.block_timestamp - before.block_timestamp;
        let delta = after.tick_cumulative - before.tick_cumulative;
        let elapsed = target - before.block_timestamp;
        Ok(before.tick_cumulative + (delta.div_euclid(window)) * elapsed)
    }

    /// Batch form of `observe_single`.
    pub fn observe(&self, timestamp: i64, tick: i32, seconds_agos: &[u64]) -> Result<Vec<i64>> {
        seconds_agos
            .iter()
            .map(|&s| self.observe_single(timestamp, tick, s))
            .collect()
    }

    /// Time-weighted average tick over the trailing `window` seconds,
    /// floored toward negative infinity.
    pub fn time_weighted_mean_tick(
        &self,
        timestamp: i64,
        tick: i32,
        window: u64,
    ) -> Result<i32> {
        if window == 0 {
            return Ok(tick);
        }
        let older = self.observe_single(timestamp, tick, window)?;
        let newer = self.observe_single(timestamp, tick, 0)?;
        Ok((newer - older).div_euclid(window as i64) as i32)
    }

    /// Binary search over the ring for the initialized observations
    /// straddling `target`. Callers guarantee the target lies strictly
    /// between the oldest and newest timestamps.
    fn surrounding_observations(&self, target: i64) -> (&Observation, &Observation) {
        // Oldest live slot comes right after the write index in ring order.
        let mut lo = self.index + 1;
        let mut hi = lo + self.cardinality - 1;

        loop {
            let mid = (lo + hi) / 2;
            let before = &self.observations[mid % self.cardinality];
            if !before.initialized {
                // Uninitialized stretch below the genesis slot; move up.
                lo = mid + 1;
                continue;
            }
            let after = &self.observations[(mid + 1) % self.cardinality];

            if before.block_timestamp <= target && target <= after.block_timestamp {
                return (before, after);
            }
            if before.block_timestamp > target {
                hi = mid - 1;
            } else {
                lo = mid + 1;
            }
        }
    }
}
