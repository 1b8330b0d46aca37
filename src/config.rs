use super::*;
use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl Unit {
    fn seconds(&self) -> u64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 60 * 60 * 24,
            Self::Weeks => 60 * 60 * 24 * 7,
        }
    }
}

/// How long a penalty ban lasts, in human units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanLength {
    pub amount: u64,
    pub unit: Unit,
}

impl BanLength {
    /// None if the length does not fit in a `Duration` of whole seconds.
    pub fn duration(&self) -> Option<Duration> {
        self.amount
            .checked_mul(self.unit.seconds())
            .map(Duration::from_secs)
    }
}

impl std::fmt::Display for BanLength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let unit = match self.unit {
            Unit::Minutes => "minute",
            Unit::Hours => "hour",
            Unit::Days => "day",
            Unit::Weeks => "week",
        };
        match self.amount {
            1 => write!(f, "1 {}", unit),
            n => write!(f, "{} {}s", n, unit),
        }
    }
}

/// Pickup module settings. Passed by value into the lobby and replaced
/// wholesale through [`LobbyHandle::configure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub team_size: usize,
    pub captain_draft: bool,
    pub vote_seconds: u64,
    pub egregious_seconds: u64,
    pub max_no_shows: Option<u32>,
    pub max_subs: Option<u32>,
    pub no_show_ban: BanLength,
    pub sub_ban: BanLength,
    pub unrated_skill: Option<Skill>,
    pub admins: Vec<Name>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            team_size: DEFAULT_TEAM_SIZE,
            captain_draft: false,
            vote_seconds: VOTE_SECONDS,
            egregious_seconds: EGREGIOUS_SECONDS,
            max_no_shows: Some(MAX_NO_SHOWS),
            max_subs: Some(MAX_SUBS),
            no_show_ban: BanLength {
                amount: 1,
                unit: Unit::Days,
            },
            sub_ban: BanLength {
                amount: 6,
                unit: Unit::Hours,
            },
            unrated_skill: None,
            admins: Vec::new(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let config = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validate {}", path.display()))?;
        Ok(config)
    }
    /// Every timing value must stay small enough to add to a wall-clock time.
    pub fn validate(&self) -> Result<(), PickupError> {
        Self::check_team_size(self.team_size)?;
        Self::check_range("vote_seconds", self.vote_seconds, 1..=MAX_VOTE_SECONDS)?;
        Self::check_range(
            "egregious_seconds",
            self.egregious_seconds,
            0..=MAX_EGREGIOUS_SECONDS,
        )?;
        for (setting, length) in [("no_show_ban", self.no_show_ban), ("sub_ban", self.sub_ban)] {
            let seconds = length.duration().map_or(u64::MAX, |d| d.as_secs());
            Self::check_range(setting, seconds, 1..=MAX_BAN_SECONDS)?;
        }
        Ok(())
    }
    fn check_range(
        setting: &'static str,
        value: u64,
        range: std::ops::RangeInclusive<u64>,
    ) -> Result<(), PickupError> {
        match range.contains(&value) {
            true => Ok(()),
            false => Err(Invalid::Setting { setting, value }.into()),
        }
    }
    pub fn check_team_size(size: usize) -> Result<(), PickupError> {
        match size {
            MIN_TEAM_SIZE..=MAX_TEAM_SIZE => Ok(()),
            n => Err(Invalid::TeamSize(n).into()),
        }
    }
    pub fn vote_length(&self) -> Duration {
        Duration::from_secs(self.vote_seconds)
    }
    pub fn egregious_window(&self) -> Duration {
        Duration::from_secs(self.egregious_seconds)
    }
    pub fn threshold(&self, counter: Counter) -> Option<u32> {
        match counter {
            Counter::NoShow => self.max_no_shows,
            Counter::Sub => self.max_subs,
        }
    }
    pub fn ban_length(&self, counter: Counter) -> BanLength {
        match counter {
            Counter::NoShow => self.no_show_ban,
            Counter::Sub => self.sub_ban,
        }
    }
}
