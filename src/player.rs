use super::*;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::time::SystemTime;

/// Player identity as seen by the game server and IRC.
/// Names compare case-insensitively; the first spelling seen is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}
impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Name {}
impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn other(&self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "RED"),
            Self::Blue => write!(f, "BLUE"),
        }
    }
}

/// Game modes the server can run. Skill ratings are tracked per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Ffa,
    Duel,
    Tdm,
    Ca,
    Ctf,
    Ft,
    Race,
}

impl GameMode {
    /// Pickups only make sense when the server splits players into two teams.
    pub fn is_team(&self) -> bool {
        matches!(self, Self::Tdm | Self::Ca | Self::Ctf | Self::Ft)
    }
}

impl TryFrom<&str> for GameMode {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "ffa" => Ok(Self::Ffa),
            "duel" => Ok(Self::Duel),
            "tdm" => Ok(Self::Tdm),
            "ca" => Ok(Self::Ca),
            "ctf" => Ok(Self::Ctf),
            "ft" | "freezetag" => Ok(Self::Ft),
            "race" => Ok(Self::Race),
            _ => Err(anyhow::anyhow!("unknown game mode: {}", s)),
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Ffa => write!(f, "ffa"),
            Self::Duel => write!(f, "duel"),
            Self::Tdm => write!(f, "tdm"),
            Self::Ca => write!(f, "ca"),
            Self::Ctf => write!(f, "ctf"),
            Self::Ft => write!(f, "ft"),
            Self::Race => write!(f, "race"),
        }
    }
}

/// A player taking part in the current pickup.
/// Penalty counters mirror the ledger at signup time; the
/// authoritative values stay in the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct PickupPlayer {
    name: Name,
    skills: HashMap<GameMode, Skill>,
    #[serde(skip)]
    signup: SystemTime,
    no_shows: u32,
    subs: u32,
    captain: bool,
}

impl PickupPlayer {
    pub fn new(name: Name, skills: HashMap<GameMode, Skill>, signup: SystemTime) -> Self {
        Self {
            name,
            skills,
            signup,
            no_shows: 0,
            subs: 0,
            captain: false,
        }
    }
    pub fn with_counts(mut self, no_shows: u32, subs: u32) -> Self {
        self.no_shows = no_shows;
        self.subs = subs;
        self
    }
    pub fn name(&self) -> &Name {
        &self.name
    }
    pub fn skill(&self, mode: GameMode) -> Option<Skill> {
        self.skills.get(&mode).copied()
    }
    /// Fill in a rating for a mode the player has never been rated in.
    pub fn assume(&mut self, mode: GameMode, skill: Skill) {
        self.skills.entry(mode).or_insert(skill);
    }
    pub fn signup(&self) -> SystemTime {
        self.signup
    }
    pub fn no_shows(&self) -> u32 {
        self.no_shows
    }
    pub fn subs(&self) -> u32 {
        self.subs
    }
    pub fn is_captain(&self) -> bool {
        self.captain
    }
    pub fn set_captain(&mut self, captain: bool) {
        self.captain = captain;
    }
}

impl std::fmt::Display for PickupPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.captain {
            true => write!(f, "{} (C)", self.name),
            false => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn names_ignore_case() {
        assert_eq!(Name::from("Klesk"), Name::from("klesk"));
        assert!(Name::from("anarki") < Name::from("Bitterman"));
        assert_eq!(Name::from("  Xaero ").to_string(), "Xaero");
    }
    #[test]
    fn team_modes() {
        assert!(GameMode::Ctf.is_team());
        assert!(GameMode::Ca.is_team());
        assert!(!GameMode::Duel.is_team());
        assert!(!GameMode::Ffa.is_team());
        assert_eq!(GameMode::try_from("CTF").unwrap(), GameMode::Ctf);
        assert!(GameMode::try_from("soccer").is_err());
    }
    #[test]
    fn assume_keeps_existing_rating() {
        let mut player = PickupPlayer::new(
            Name::from("sarge"),
            HashMap::from([(GameMode::Ctf, 1500)]),
            SystemTime::UNIX_EPOCH,
        );
        player.assume(GameMode::Ctf, 1000);
        player.assume(GameMode::Tdm, 1000);
        assert_eq!(player.skill(GameMode::Ctf), Some(1500));
        assert_eq!(player.skill(GameMode::Tdm), Some(1000));
    }
}
