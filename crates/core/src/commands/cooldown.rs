//! Cooldown ledger - per command, per invoker usage timestamps
//!
//! Entries map `(command, invoker)` to the instant the cooldown runs out.
//! A use is recorded right before the handler runs, so a slow handler
//! cannot be entered twice by the same invoker, and is rolled back if the
//! handler fails.
//!
//! Expired entries are dropped when they are read. The whole ledger is
//! swept once every recorded cooldown has run out, once it doubles in size,
//! or when [`SWEEP_INTERVAL`] passes.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::registry::CommandKey;

/// Longest time between two sweeps of expired entries
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Ledger size below which sweeping on growth is skipped
const MIN_SWEEP_SIZE: usize = 64;

#[derive(Debug)]
struct Sweep {
    /// Size that triggers the next sweep
    threshold: usize,
    last: Instant,
    /// Latest expiry ever recorded
    latest: Instant,
}

/// Concurrent cooldown store
///
/// Every operation locks only the shard holding its key.
#[derive(Debug)]
pub struct CooldownLedger {
    entries: DashMap<(CommandKey, u64), Instant>,
    sweep: Mutex<Sweep>,
}

impl Default for CooldownLedger {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            sweep: Mutex::new(Sweep {
                threshold: MIN_SWEEP_SIZE,
                last: Instant::now(),
                latest: Instant::now(),
            }),
        }
    }
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time until `invoker` may use `command` again, zero if usable now
    pub fn remaining(&self, command: CommandKey, invoker: u64) -> Duration {
        let now = Instant::now();
        let remaining = self
            .entries
            .get(&(command, invoker))
            .map(|expires| expires.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO);

        if remaining.is_zero() {
            self.entries.remove_if(&(command, invoker), |_, expires| *expires <= now);
        }
        remaining
    }

    /// Record a use starting now
    pub fn start(&self, command: CommandKey, cooldown: Duration, invoker: u64) {
        let now = Instant::now();
        self.entries.insert((command, invoker), now + cooldown);
        self.recorded(now, now + cooldown);
    }

    /// Check and record a use in one step
    ///
    /// Returns the remaining time without recording anything if the
    /// cooldown has not run out yet.
    pub fn try_start(&self, command: CommandKey, cooldown: Duration, invoker: u64) -> Result<(), Duration> {
        let now = Instant::now();
        match self.entries.entry((command, invoker)) {
            Entry::Occupied(mut entry) => {
                let remaining = entry.get().saturating_duration_since(now);
                if !remaining.is_zero() {
                    return Err(remaining);
                }
                entry.insert(now + cooldown);
            }
            Entry::Vacant(entry) => {
                entry.insert(now + cooldown);
            }
        }

        // Entry guard is released here; sweeping locks every shard
        self.recorded(now, now + cooldown);
        Ok(())
    }

    fn recorded(&self, now: Instant, expires: Instant) {
        let mut sweep = self.sweep.lock();
        let all_expired = now >= sweep.latest;
        sweep.latest = sweep.latest.max(expires);

        let len = self.entries.len();
        let due = (all_expired && len > 1)
            || len >= sweep.threshold
            || now.saturating_duration_since(sweep.last) >= SWEEP_INTERVAL;
        if !due {
            return;
        }

        let removed = self.purge_expired();
        let len = self.entries.len();
        sweep.threshold = (len * 2).max(MIN_SWEEP_SIZE);
        sweep.last = Instant::now();

        if removed > 0 {
            tracing::debug!("Swept {} expired cooldowns, {} remaining", removed, len);
        }
    }

    /// Remove the record of the last use
    ///
    /// Returns true if there was one.
    pub fn cancel(&self, command: CommandKey, invoker: u64) -> bool {
        self.entries.remove(&(command, invoker)).is_some()
    }

    /// Drop entries whose cooldown has run out
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires| *expires > now);
        before.saturating_sub(self.entries.len())
    }

    /// Forget every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of tracked entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
