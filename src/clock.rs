use super::*;
use std::time::Duration;
use std::time::SystemTime;

/// Source of wall-clock time. Injected so tests can freeze it.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A deadline that must be delivered back into the serialized lobby queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub purpose: Purpose,
    pub vote: u64,
}

/// Fires an [`Expiry`] after a delay. Implementations never touch session
/// state directly; they only post the expiry back to its owner.
pub trait Scheduler: Send + Sync {
    fn after(&self, delay: Duration, expiry: Expiry);
}
