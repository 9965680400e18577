use dashmap::DashMap;
use erp_gateway_types::{RecoveryError, RecoveryKind};

/// Per-credential attempt counter for one recovery kind.
///
/// Counters survive across requests and only go back to zero on an explicit
/// [`reset`](Self::reset), which each service performs after a success.
#[derive(Debug)]
pub struct AttemptCounter {
    kind: RecoveryKind,
    max: u32,
    counts: DashMap<String, u32>,
}

impl AttemptCounter {
    pub fn new(kind: RecoveryKind, max: u32) -> Self {
        Self { kind, max, counts: DashMap::new() }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Check the ceiling and count one attempt under a single shard lock.
    ///
    /// Returns the attempt number (1-based) or `MaxAttemptsExceeded` when the
    /// credential already used every attempt.
    pub fn try_begin(&self, credential: &str) -> Result<u32, RecoveryError> {
        self.try_begin_within(credential, self.max)
    }

    /// Same as [`try_begin`](Self::try_begin) with a per-call ceiling.
    pub fn try_begin_within(&self, credential: &str, max: u32) -> Result<u32, RecoveryError> {
        let mut count = self.counts.entry(credential.to_string()).or_insert(0);
        if *count >= max {
            return Err(RecoveryError::MaxAttemptsExceeded { kind: self.kind, max });
        }
        *count += 1;
        Ok(*count)
    }

    /// Attempts used so far.
    pub fn peek(&self, credential: &str) -> u32 {
        self.counts.get(credential).map_or(0, |c| *c)
    }

    pub fn reset(&self, credential: &str) {
        self.counts.remove(credential);
    }
}
