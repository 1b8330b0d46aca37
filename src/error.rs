use super::*;

/// Requests that are malformed or impossible in the current configuration.
/// Rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalid {
    TeamSize(usize),
    NotTeamMode(GameMode),
    QueueFull(usize),
    Unrated(Name),
    WrongState(State),
    TeamsNotFull,
    NotOnTeam(Name),
    NotQueued(Name),
    NoPenaltyConfigured,
    Setting { setting: &'static str, value: u64 },
}

/// Actor is not allowed to do what they asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    Banned(Name),
    AlreadyEnlisted(Name),
    NotConnected(Name),
    NotCaptain(Name),
    WrongTurn { captain: Name, turn: Name },
    NotBanned(Name),
    Unauthorized(Name),
    Benched(Name),
}

/// Request collides with something already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    SessionActive,
    VotePending(Purpose),
    AlreadyBalanced,
}

/// Collaborator that could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Roster,
    Ledger,
    Bans,
    Lobby,
}

/// Every failure the pickup subsystem reports to a requester.
/// None of them are fatal; the session is left in a valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickupError {
    Validation(Invalid),
    Eligibility(Ineligible),
    Conflict(Conflict),
    Dependency(Dependency),
}

impl PickupError {
    /// Only collaborator outages are worth trying again unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Dependency(_))
    }
    /// Logs the underlying cause and maps it into a reportable failure.
    pub fn unavailable(dependency: Dependency, cause: anyhow::Error) -> Self {
        log::error!("[pickup] {:?} unavailable: {:#}", dependency, cause);
        Self::Dependency(dependency)
    }
}

impl From<Invalid> for PickupError {
    fn from(e: Invalid) -> Self {
        Self::Validation(e)
    }
}
impl From<Ineligible> for PickupError {
    fn from(e: Ineligible) -> Self {
        Self::Eligibility(e)
    }
}
impl From<Conflict> for PickupError {
    fn from(e: Conflict) -> Self {
        Self::Conflict(e)
    }
}

impl From<Unbalanceable> for PickupError {
    fn from(e: Unbalanceable) -> Self {
        match e {
            Unbalanceable::Unrated(name) => Invalid::Unrated(name).into(),
            Unbalanceable::Duplicate(name) => Ineligible::AlreadyEnlisted(name).into(),
            Unbalanceable::TooLarge(n) => Invalid::TeamSize(n).into(),
            Unbalanceable::WrongSize { .. } => Invalid::TeamsNotFull.into(),
        }
    }
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TeamSize(n) => write!(
                f,
                "team size {} is outside {}..={}",
                n, MIN_TEAM_SIZE, MAX_TEAM_SIZE
            ),
            Self::NotTeamMode(mode) => write!(f, "{} is not a team game mode", mode),
            Self::QueueFull(n) => write!(f, "the queue already holds {} players", n),
            Self::Unrated(name) => write!(f, "{} has no skill rating", name),
            Self::WrongState(state) => write!(f, "not allowed while {}", state),
            Self::TeamsNotFull => write!(f, "both teams must be full"),
            Self::NotOnTeam(name) => write!(f, "{} is not on a team", name),
            Self::NotQueued(name) => write!(f, "{} is not available to pick", name),
            Self::NoPenaltyConfigured => write!(f, "that penalty is disabled"),
            Self::Setting { setting, value } => write!(f, "{} = {} is out of range", setting, value),
        }
    }
}

impl std::fmt::Display for Ineligible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Banned(name) => write!(f, "{} is banned from pickups", name),
            Self::AlreadyEnlisted(name) => write!(f, "{} is already in the pickup", name),
            Self::NotConnected(name) => write!(f, "{} is not on the server", name),
            Self::NotCaptain(name) => write!(f, "{} is not a captain", name),
            Self::WrongTurn { captain, turn } => {
                write!(f, "{} cannot pick, it is {}'s turn", captain, turn)
            }
            Self::NotBanned(name) => write!(f, "{} is not banned", name),
            Self::Unauthorized(name) => write!(f, "{} may not do that", name),
            Self::Benched(name) => write!(f, "{} was already replaced in this pickup", name),
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionActive => write!(f, "a pickup is already running"),
            Self::VotePending(purpose) => write!(f, "a {} vote is already pending", purpose),
            Self::AlreadyBalanced => write!(f, "teams are already balanced"),
        }
    }
}

impl std::fmt::Display for PickupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "invalid request: {}", e),
            Self::Eligibility(e) => write!(f, "not eligible: {}", e),
            Self::Conflict(e) => write!(f, "conflict: {}", e),
            Self::Dependency(_) => write!(f, "pickup service temporarily unavailable, try again"),
        }
    }
}

impl std::error::Error for PickupError {}
