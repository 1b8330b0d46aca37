//! Pickup-game lifecycle manager.
//!
//! Players queue through chat commands, two teams are formed by captain
//! draft or by exhaustive skill balancing, and the running match tracks
//! substitutions, no-shows and abuse penalties. A timed majority vote
//! confirms rebalancing suggestions before they are applied.
//!
//! ## Architecture
//!
//! - [`Lobby`] — Serialized actor owning the one [`PickupSession`] per server
//! - [`LobbyHandle`] — Cloneable entry point used by every transport
//! - [`PickupGateway`] — Command parsing, authorization, reply formatting
//! - [`TeamBalancer`] — Minimum-imbalance partition search
//! - [`VoteBoard`] — One pending [`VoteSession`] per purpose
//! - [`EligibilityGuard`] / [`PenaltyEnforcer`] — Admission and punishment
//!
//! ## Collaborators
//!
//! - [`RosterStore`], [`PenaltyLedger`], [`BanIssuer`], [`ChatOutput`],
//!   [`Clock`], [`Scheduler`] — injected at construction; in-memory
//!   implementations live in [`memory`].

mod balance;
mod chat;
mod clock;
mod config;
mod draft;
mod error;
mod gateway;
mod guard;
mod ledger;
mod lineup;
mod lobby;
mod notice;
mod penalty;
mod player;
mod roster;
mod session;
mod vote;

pub mod memory;

pub use balance::*;
pub use chat::*;
pub use clock::*;
pub use config::*;
pub use draft::*;
pub use error::*;
pub use gateway::*;
pub use guard::*;
pub use ledger::*;
pub use lineup::*;
pub use lobby::*;
pub use notice::*;
pub use penalty::*;
pub use player::*;
pub use roster::*;
pub use session::*;
pub use vote::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Per-mode skill rating (Elo-like).
pub type Skill = i32;
/// Absolute difference between team skill sums.
pub type Imbalance = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Random instance generation for testing and benchmarking.
pub trait Arbitrary {
    /// Generate a uniformly random instance.
    fn random() -> Self;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

// ============================================================================
// SESSION PARAMETERS
// ============================================================================
/// Smallest allowed team.
pub const MIN_TEAM_SIZE: usize = 2;
/// Largest allowed team. Keeps the balancer search at C(16, 8) subsets.
pub const MAX_TEAM_SIZE: usize = 8;
/// Team size used when none is configured.
pub const DEFAULT_TEAM_SIZE: usize = 4;
/// Length of a team-suggestion vote (seconds).
pub const VOTE_SECONDS: u64 = 30;
/// Longest vote a configuration may ask for (seconds).
pub const MAX_VOTE_SECONDS: u64 = 600;
/// No-shows this soon after the match starts count double (seconds).
pub const EGREGIOUS_SECONDS: u64 = 120;
/// Widest egregious window a configuration may ask for (seconds).
pub const MAX_EGREGIOUS_SECONDS: u64 = 60 * 60;
/// Longest ban a configuration may ask for (seconds).
pub const MAX_BAN_SECONDS: u64 = 60 * 60 * 24 * 365;
/// Ledger total of no-shows a player may carry before being banned.
pub const MAX_NO_SHOWS: u32 = 2;
/// Ledger total of sub requests a player may carry before being banned.
pub const MAX_SUBS: u32 = 3;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        println!();
        log::warn!("interrupt received, exiting immediately");
        std::process::exit(0);
    });
}
