use super::*;
use std::time::Duration;
use std::time::SystemTime;

/// Kinds of strikes tracked per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Counter {
    NoShow,
    Sub,
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoShow => write!(f, "no-show"),
            Self::Sub => write!(f, "sub"),
        }
    }
}

impl TryFrom<&str> for Counter {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "noshow" | "no-show" | "noshows" => Ok(Self::NoShow),
            "sub" | "subs" => Ok(Self::Sub),
            _ => Err(anyhow::anyhow!("unknown counter: {}", s)),
        }
    }
}

/// Persistent penalty bookkeeping. Counters survive across sessions.
#[async_trait::async_trait]
pub trait PenaltyLedger: Send + Sync {
    async fn count(&self, name: &Name, counter: Counter) -> anyhow::Result<u32>;
    /// Adds `by` strikes and returns the new total.
    async fn increment(&self, name: &Name, counter: Counter, by: u32) -> anyhow::Result<u32>;
    /// Removes one strike (saturating) and returns the new total.
    async fn decrement(&self, name: &Name, counter: Counter) -> anyhow::Result<u32>;
    async fn reset(&self, name: &Name, counter: Counter) -> anyhow::Result<()>;
    /// Expiry of the player's active pickup ban, if one was ever issued.
    async fn ban_expiry(&self, name: &Name) -> anyhow::Result<Option<SystemTime>>;
}

/// Issues and lifts pickup bans.
#[async_trait::async_trait]
pub trait BanIssuer: Send + Sync {
    async fn ban(&self, name: &Name, duration: Duration) -> anyhow::Result<()>;
    /// Returns false when there was no ban to lift.
    async fn unban(&self, name: &Name) -> anyhow::Result<bool>;
}
