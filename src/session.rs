use super::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

/// Lifecycle of the one pickup a server runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Idle,
    Accepting,
    CaptainSelection,
    InProgress,
    Completed,
    Cancelled,
}

impl State {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Accepting | Self::CaptainSelection | Self::InProgress
        )
    }
    /// Transition table.
    pub fn can_become(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Accepting)
                | (Self::Accepting, Self::CaptainSelection)
                | (Self::Accepting, Self::InProgress)
                | (Self::Accepting, Self::Cancelled)
                | (Self::CaptainSelection, Self::InProgress)
                | (Self::CaptainSelection, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
                | (Self::Completed, Self::Idle)
                | (Self::Cancelled, Self::Idle)
        )
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Accepting => write!(f, "accepting players"),
            Self::CaptainSelection => write!(f, "captains picking"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Operations the session accepts. Built by transports, executed in order
/// by the lobby.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Start {
        team_size: Option<usize>,
        captain_draft: Option<bool>,
    },
    SignUp(Name),
    Remove(Name),
    Pick {
        captain: Name,
        target: Name,
    },
    RequestSub(Name),
    NoShow(Name),
    Volunteer(Name),
    Suggest(Name),
    Vote(Name, Choice),
    Stop,
    Reset,
    Complete,
    Unban(Name),
    Pardon(Name, Counter),
    RetryPenalties,
    Status,
}

/// Snapshot of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub state: State,
    pub mode: Option<GameMode>,
    pub team_size: usize,
    pub captain_draft: bool,
    pub queue: Vec<Name>,
    pub red: Vec<Name>,
    pub blue: Vec<Name>,
    pub subs: Vec<Name>,
    pub vacancies: Vec<Team>,
    pub captains: Option<(Name, Name)>,
    pub turn: Option<Name>,
    pub vote: Option<Tally>,
    pub vote_closes_in: Option<u64>,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let join = |names: &[Name]| {
            names
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "{}", self.state)?;
        if let Some(mode) = self.mode {
            write!(f, " {}v{} {}", self.team_size, self.team_size, mode)?;
        }
        if !self.queue.is_empty() {
            write!(
                f,
                " | queue [{}/{}]: {}",
                self.queue.len(),
                2 * self.team_size,
                join(&self.queue)
            )?;
        }
        if !self.red.is_empty() || !self.blue.is_empty() {
            write!(f, " | RED: {} | BLUE: {}", join(&self.red), join(&self.blue))?;
        }
        if !self.subs.is_empty() {
            write!(f, " | subs: {}", join(&self.subs))?;
        }
        if !self.vacancies.is_empty() {
            write!(f, " | {} open seat(s)", self.vacancies.len())?;
        }
        if let Some(turn) = &self.turn {
            write!(f, " | {} to pick", turn)?;
        }
        if let Some(tally) = &self.vote {
            write!(f, " | vote: {}", tally)?;
        }
        if let Some(seconds) = self.vote_closes_in {
            write!(f, " ({}s left)", seconds)?;
        }
        Ok(())
    }
}

/// External collaborators shared by the session and its helpers.
#[derive(Clone)]
pub struct Services {
    pub roster: Arc<dyn RosterStore>,
    pub ledger: Arc<dyn PenaltyLedger>,
    pub bans: Arc<dyn BanIssuer>,
    pub chat: Arc<dyn ChatOutput>,
    pub clock: Arc<dyn Clock>,
}

/// The pickup state machine.
///
/// Owns the queue, both teams, the sub bench and any pending vote. Every
/// method runs to completion before the next request is looked at; the
/// [`Lobby`] guarantees that. Fallible operations validate and query
/// collaborators before mutating, and undo the one mutation they made if a
/// later step fails.
pub struct PickupSession {
    id: ID<Self>,
    config: Config,
    state: State,
    team_size: usize,
    captain_draft: bool,
    mode: GameMode,
    started: Option<SystemTime>,
    lineup: Lineup,
    draft: Option<Draft>,
    votes: VoteBoard<BalanceResult>,
    accounting: Accounting,
    guard: EligibilityGuard,
    enforcer: PenaltyEnforcer,
    services: Services,
    scheduler: Arc<dyn Scheduler>,
}

impl PickupSession {
    pub fn new(config: Config, services: Services, scheduler: Arc<dyn Scheduler>) -> Self {
        let id = ID::default();
        Self {
            id,
            state: State::Idle,
            team_size: config.team_size,
            captain_draft: config.captain_draft,
            mode: GameMode::Ctf,
            started: None,
            lineup: Lineup::default(),
            draft: None,
            votes: VoteBoard::default(),
            accounting: Accounting::new(id),
            guard: EligibilityGuard::new(
                services.roster.clone(),
                services.ledger.clone(),
                services.clock.clone(),
            ),
            enforcer: PenaltyEnforcer::new(
                config.clone(),
                services.ledger.clone(),
                services.bans.clone(),
            ),
            config,
            services,
            scheduler,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }
    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }
    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn enforcer(&self) -> &PenaltyEnforcer {
        &self.enforcer
    }
    /// New settings apply to the next session; a running one keeps its
    /// team size and formation mode. Invalid settings leave the current
    /// ones in place.
    pub fn configure(&mut self, config: Config) -> Result<(), PickupError> {
        config.validate()?;
        log::info!("[session] configuration replaced");
        self.enforcer.configure(config.clone());
        self.config = config;
        Ok(())
    }

    pub async fn handle(&mut self, request: Request) -> Result<Reply, PickupError> {
        match request {
            Request::Start {
                team_size,
                captain_draft,
            } => self.start(team_size, captain_draft),
            Request::SignUp(name) => self.sign_up(&name).await,
            Request::Remove(name) => self.remove(&name),
            Request::Pick { captain, target } => self.pick(&captain, &target),
            Request::RequestSub(name) => self.request_sub(&name),
            Request::NoShow(name) => self.report_no_show(&name),
            Request::Volunteer(name) => self.volunteer(&name).await,
            Request::Suggest(name) => self.suggest(&name),
            Request::Vote(name, choice) => Ok(self.vote(&name, choice)),
            Request::Stop => self.stop(),
            Request::Reset => self.reset(),
            Request::Complete => self.complete().await,
            Request::Unban(name) => self.unban(&name).await,
            Request::Pardon(name, counter) => self.pardon(&name, counter).await,
            Request::RetryPenalties => Ok(self.retry_penalties().await),
            Request::Status => Ok(Reply::Status(self.status())),
        }
    }

    /// Opens a new queue. Defaults come from the configuration.
    pub fn start(
        &mut self,
        team_size: Option<usize>,
        captain_draft: Option<bool>,
    ) -> Result<Reply, PickupError> {
        if self.state != State::Idle {
            return Err(Conflict::SessionActive.into());
        }
        let team_size = team_size.unwrap_or(self.config.team_size);
        Config::check_team_size(team_size)?;
        let mode = self
            .services
            .roster
            .game_mode()
            .map_err(|e| PickupError::unavailable(Dependency::Roster, e))?;
        if !mode.is_team() {
            return Err(Invalid::NotTeamMode(mode).into());
        }
        let captain_draft = captain_draft.unwrap_or(self.config.captain_draft);
        self.id = ID::default();
        self.accounting = Accounting::new(self.id);
        self.lineup.clear();
        self.draft = None;
        self.started = None;
        self.team_size = team_size;
        self.captain_draft = captain_draft;
        self.mode = mode;
        self.transition(State::Accepting);
        self.announce(Notice::Opened {
            team_size,
            mode,
            captain_draft,
        });
        Ok(Reply::Started {
            team_size,
            captain_draft,
            mode,
        })
    }

    /// Adds a player to the queue. The sign-up that fills the queue forms
    /// the teams; if that fails the sign-up is withdrawn.
    pub async fn sign_up(&mut self, name: &Name) -> Result<Reply, PickupError> {
        match self.state {
            State::Accepting => {}
            State::CaptainSelection | State::InProgress => {
                return Err(Invalid::QueueFull(self.capacity()).into());
            }
            state => return Err(Invalid::WrongState(state).into()),
        }
        let admission = self.guard.can_join_queue(name, &self.lineup).await?;
        let player = self.enlist(name, admission, true)?;
        self.lineup.admit(Slot::Queue, player);
        let count = self.lineup.queue().len();
        let capacity = self.capacity();
        self.announce(Notice::Joined {
            name: name.clone(),
            count,
            capacity,
        });
        if count < capacity {
            return Ok(Reply::Queued {
                name: name.clone(),
                count,
                capacity,
            });
        }
        match self.form().await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                log::warn!("[session] teams not formed, withdrawing {}: {}", name, e);
                self.lineup.release(name);
                self.announce(Notice::Left {
                    name: name.clone(),
                    count: count - 1,
                    capacity,
                });
                Err(e)
            }
        }
    }

    pub fn remove(&mut self, name: &Name) -> Result<Reply, PickupError> {
        match (self.state, self.lineup.locate(name)) {
            (State::Accepting, Some(Slot::Queue)) => {
                self.lineup.release(name);
                self.announce(Notice::Left {
                    name: name.clone(),
                    count: self.lineup.queue().len(),
                    capacity: self.capacity(),
                });
                Ok(Reply::Removed { name: name.clone() })
            }
            (State::CaptainSelection | State::InProgress, Some(Slot::Sub)) => {
                self.lineup.release(name);
                Ok(Reply::Removed { name: name.clone() })
            }
            (State::Accepting | State::CaptainSelection | State::InProgress, None) => {
                Ok(Reply::Absent { name: name.clone() })
            }
            (state, _) => Err(Invalid::WrongState(state).into()),
        }
    }

    pub fn pick(&mut self, captain: &Name, target: &Name) -> Result<Reply, PickupError> {
        let team = match (self.state, &self.draft) {
            (State::CaptainSelection, Some(draft)) => draft.authorize(captain)?,
            (state, _) => return Err(Invalid::WrongState(state).into()),
        };
        if self.lineup.draft(target, team).is_none() {
            return Err(Invalid::NotQueued(target.clone()).into());
        }
        self.announce(Notice::Picked {
            captain: captain.clone(),
            target: target.clone(),
            team,
        });
        if self.lineup.is_full(self.team_size) {
            self.begin_match();
            self.announce(Notice::Teams {
                red: self.names(Team::Red),
                blue: self.names(Team::Blue),
                imbalance: self.current_gap(),
            });
            return Ok(Reply::Picked {
                target: target.clone(),
                team,
                next: None,
            });
        }
        let next = self.draft.as_mut().map(|draft| {
            draft.advance();
            draft.picker().clone()
        });
        if let Some(captain) = &next {
            self.announce(Notice::Turn {
                captain: captain.clone(),
                available: self.available(),
            });
        }
        Ok(Reply::Picked {
            target: target.clone(),
            team,
            next,
        })
    }

    pub fn request_sub(&mut self, name: &Name) -> Result<Reply, PickupError> {
        self.require(State::InProgress)?;
        self.replace(name, Counter::Sub, 1)
    }

    /// No-shows inside the egregious window after the match started count double.
    pub fn report_no_show(&mut self, name: &Name) -> Result<Reply, PickupError> {
        self.require(State::InProgress)?;
        let now = self.services.clock.now();
        let weight = match self.started {
            Some(at) if now.duration_since(at).unwrap_or_default() < self.config.egregious_window() => 2,
            _ => 1,
        };
        self.replace(name, Counter::NoShow, weight)
    }

    /// Offers to sub in. Takes the oldest open seat if there is one.
    /// Players already taken off a team in this pickup cannot come back.
    pub async fn volunteer(&mut self, name: &Name) -> Result<Reply, PickupError> {
        match self.state {
            State::CaptainSelection | State::InProgress => {}
            state => return Err(Invalid::WrongState(state).into()),
        }
        if self.accounting.strikes(name) != Strikes::default() {
            return Err(Ineligible::Benched(name.clone()).into());
        }
        let admission = self.guard.can_join_queue(name, &self.lineup).await?;
        let player = self.enlist(name, admission, false)?;
        self.lineup.admit(Slot::Sub, player);
        let seated = self.lineup.fill_vacancy();
        if let Some((team, sub)) = &seated {
            self.announce(Notice::Seated {
                name: sub.clone(),
                team: *team,
            });
        }
        Ok(Reply::Volunteered {
            name: name.clone(),
            seated: seated.map(|(team, _)| team),
        })
    }

    /// Puts the minimum-imbalance split of the current players to a vote.
    pub fn suggest(&mut self, name: &Name) -> Result<Reply, PickupError> {
        self.require(State::InProgress)?;
        if !self.lineup.is_full(self.team_size) {
            return Err(Invalid::TeamsNotFull.into());
        }
        if !matches!(self.lineup.locate(name), Some(Slot::Team(_))) {
            return Err(Invalid::NotOnTeam(name.clone()).into());
        }
        if self.votes.is_pending(Purpose::TeamSuggestion) {
            return Err(Conflict::VotePending(Purpose::TeamSuggestion).into());
        }
        let suggestion = self.balanced(self.lineup.fielded())?;
        let current = self.current_gap().unwrap_or_default();
        let suggested = suggestion.imbalance();
        if suggested >= current {
            return Err(Conflict::AlreadyBalanced.into());
        }
        let eligible = self
            .lineup
            .fielded()
            .map(|p| p.name().clone())
            .collect::<HashSet<_>>();
        let notice = Notice::Suggestion {
            red: suggestion.names(Team::Red),
            blue: suggestion.names(Team::Blue),
            current,
            suggested,
            seconds: self.config.vote_seconds,
        };
        self.votes.open(
            Purpose::TeamSuggestion,
            eligible,
            self.services.clock.now(),
            self.config.vote_length(),
            suggestion,
            self.scheduler.as_ref(),
        )?;
        log::info!("[session] {} suggested rebalancing {} -> {}", name, current, suggested);
        self.announce(notice);
        Ok(Reply::Suggested { current, suggested })
    }

    pub fn vote(&mut self, name: &Name, choice: Choice) -> Reply {
        let cast = self.votes.cast(Purpose::TeamSuggestion, name, choice);
        let tally = self
            .votes
            .pending(Purpose::TeamSuggestion)
            .map(|vote| vote.tally());
        Reply::Voted { cast, tally }
    }

    /// A vote deadline arrived. Stale or cancelled votes are ignored.
    pub fn expire(&mut self, expiry: Expiry) {
        let Some(resolution) = self.votes.resolve(expiry) else {
            return;
        };
        match resolution.purpose {
            Purpose::TeamSuggestion => self.settle(resolution.tally, resolution.payload),
        }
    }

    pub fn stop(&mut self) -> Result<Reply, PickupError> {
        self.cancel(false)
    }

    pub fn reset(&mut self) -> Result<Reply, PickupError> {
        self.cancel(true)
    }

    /// Ends the match normally and settles penalties. Ban failures are
    /// logged and parked; they never keep the session from closing.
    pub async fn complete(&mut self) -> Result<Reply, PickupError> {
        self.require(State::InProgress)?;
        self.votes.cancel_all();
        self.transition(State::Completed);
        let report = self
            .enforcer
            .apply_end_of_session_penalties(&mut self.accounting)
            .await;
        if report.failed > 0 {
            log::warn!(
                "[session] {} penalty steps of {} await retry",
                report.failed,
                self.id
            );
        }
        self.announce(Notice::Completed {
            banned: report
                .banned
                .iter()
                .map(|(name, _, length)| (name.clone(), *length))
                .collect(),
        });
        self.clear();
        self.transition(State::Idle);
        Ok(Reply::Completed(report))
    }

    pub async fn unban(&mut self, name: &Name) -> Result<Reply, PickupError> {
        match self.services.bans.unban(name).await {
            Ok(true) => {
                log::info!("[session] unbanned {}", name);
                Ok(Reply::Unbanned { name: name.clone() })
            }
            Ok(false) => Err(Ineligible::NotBanned(name.clone()).into()),
            Err(e) => Err(PickupError::unavailable(Dependency::Bans, e)),
        }
    }

    /// Forgives one strike from the persistent ledger.
    pub async fn pardon(&mut self, name: &Name, counter: Counter) -> Result<Reply, PickupError> {
        if self.config.threshold(counter).is_none() {
            return Err(Invalid::NoPenaltyConfigured.into());
        }
        let total = self
            .services
            .ledger
            .decrement(name, counter)
            .await
            .map_err(|e| PickupError::unavailable(Dependency::Ledger, e))?;
        log::info!("[session] pardoned one {} of {}", counter, name);
        Ok(Reply::Pardoned {
            name: name.clone(),
            counter,
            total,
        })
    }

    pub async fn retry_penalties(&mut self) -> Reply {
        Reply::Retried(self.enforcer.retry().await)
    }

    pub fn status(&self) -> Status {
        let now = self.services.clock.now();
        let names = |players: &[PickupPlayer]| {
            players
                .iter()
                .map(|p| p.name().clone())
                .collect::<Vec<_>>()
        };
        Status {
            state: self.state,
            mode: self.state.is_active().then_some(self.mode),
            team_size: self.team_size,
            captain_draft: self.captain_draft,
            queue: names(self.lineup.queue()),
            red: names(self.lineup.team(Team::Red)),
            blue: names(self.lineup.team(Team::Blue)),
            subs: names(self.lineup.subs()),
            vacancies: self.lineup.vacancies().iter().copied().collect(),
            captains: self.draft.as_ref().map(|draft| {
                (
                    draft.captain(Team::Red).clone(),
                    draft.captain(Team::Blue).clone(),
                )
            }),
            turn: self.draft.as_ref().map(|draft| draft.picker().clone()),
            vote: self
                .votes
                .pending(Purpose::TeamSuggestion)
                .map(|vote| vote.tally()),
            vote_closes_in: self
                .votes
                .pending(Purpose::TeamSuggestion)
                .map(|vote| vote.deadline().duration_since(now).unwrap_or_default().as_secs()),
        }
    }

    fn capacity(&self) -> usize {
        2 * self.team_size
    }

    fn require(&self, state: State) -> Result<(), PickupError> {
        match self.state == state {
            true => Ok(()),
            false => Err(Invalid::WrongState(self.state).into()),
        }
    }

    fn transition(&mut self, next: State) {
        debug_assert!(self.state.can_become(next), "{} -> {}", self.state, next);
        log::info!("[session] {} -> {}", self.state, next);
        self.state = next;
    }

    fn announce(&self, notice: Notice) {
        self.services.chat.say(&notice.to_string());
    }

    fn whisper(&self, name: &Name, notice: Notice) {
        self.services.chat.tell(name, &notice.to_string());
    }

    /// Builds the session-local player record. Queued players need a
    /// rating, either their own or the configured fallback, so a draft
    /// without two eligible captains can still be balanced.
    fn enlist(
        &self,
        name: &Name,
        admission: Admission,
        rated: bool,
    ) -> Result<PickupPlayer, PickupError> {
        let mut player = PickupPlayer::new(
            name.clone(),
            admission.presence.skills,
            self.services.clock.now(),
        )
        .with_counts(admission.no_shows, admission.subs);
        if player.skill(self.mode).is_none() {
            if let Some(skill) = self.config.unrated_skill {
                log::info!("[session] {} unrated in {}, assuming {}", name, self.mode, skill);
                player.assume(self.mode, skill);
            }
        }
        if rated {
            EligibilityGuard::can_be_balanced(&player, self.mode)?;
        }
        Ok(player)
    }

    async fn form(&mut self) -> Result<Reply, PickupError> {
        if self.captain_draft {
            match self.elect().await? {
                Some((red, blue)) => return Ok(self.begin_draft(red, blue)),
                None => log::warn!("[session] fewer than two eligible captains, balancing instead"),
            }
        }
        let result = self.balanced(self.lineup.queue().iter())?;
        Ok(self.field(result))
    }

    /// The two most senior players who may captain, best first.
    async fn elect(&self) -> Result<Option<(Name, Name)>, PickupError> {
        let mut elected = Vec::with_capacity(2);
        for player in Draft::seniority(self.lineup.queue(), self.mode) {
            match self.guard.can_be_captain(player.name()).await {
                Ok(()) => elected.push(player.name().clone()),
                Err(e) if e.retryable() => return Err(e),
                Err(e) => log::info!("[session] {} passed over as captain: {}", player.name(), e),
            }
            if elected.len() == 2 {
                break;
            }
        }
        Ok(match elected.as_slice() {
            [red, blue] => Some((red.clone(), blue.clone())),
            _ => None,
        })
    }

    fn begin_draft(&mut self, red: Name, blue: Name) -> Reply {
        for (captain, team) in [(&red, Team::Red), (&blue, Team::Blue)] {
            self.lineup.set_captain(captain, true);
            self.lineup.draft(captain, team);
        }
        let draft = Draft::new(red.clone(), blue.clone());
        let picker = draft.picker().clone();
        self.draft = Some(draft);
        self.transition(State::CaptainSelection);
        self.announce(Notice::Captains {
            red: red.clone(),
            blue: blue.clone(),
        });
        self.announce(Notice::Turn {
            captain: picker,
            available: self.available(),
        });
        Reply::Drafting { red, blue }
    }

    fn balanced<'a>(
        &self,
        players: impl Iterator<Item = &'a PickupPlayer>,
    ) -> Result<BalanceResult, PickupError> {
        let rated = players
            .map(|p| {
                EligibilityGuard::can_be_balanced(p, self.mode)
                    .map(|skill| Rated::new(p.name().clone(), Some(skill)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TeamBalancer::balance(&rated, self.team_size)?)
    }

    fn field(&mut self, result: BalanceResult) -> Reply {
        let red = result.names(Team::Red);
        let blue = result.names(Team::Blue);
        self.lineup.assign(&red, &blue);
        self.begin_match();
        self.announce(Notice::Teams {
            red: red.clone(),
            blue: blue.clone(),
            imbalance: Some(result.imbalance()),
        });
        Reply::Formed {
            red,
            blue,
            imbalance: result.imbalance(),
        }
    }

    fn begin_match(&mut self) {
        self.draft = None;
        self.started = Some(self.services.clock.now());
        self.transition(State::InProgress);
    }

    /// Takes a player off their team, records the strike and seats the
    /// longest-waiting volunteer if there is one.
    fn replace(&mut self, name: &Name, counter: Counter, by: u32) -> Result<Reply, PickupError> {
        let team = match self.lineup.locate(name) {
            Some(Slot::Team(team)) => team,
            _ => return Err(Invalid::NotOnTeam(name.clone()).into()),
        };
        let (_, player) = self
            .lineup
            .release(name)
            .ok_or_else(|| Invalid::NotOnTeam(name.clone()))?;
        self.accounting.record(name, counter, by);
        self.warn(&player, counter);
        self.lineup.open_vacancy(team);
        let replacement = self.lineup.fill_vacancy().map(|(_, sub)| sub);
        log::info!("[session] {} off {} ({} x{})", name, team, counter, by);
        self.announce(Notice::Replaced {
            out: name.clone(),
            replacement: replacement.clone(),
            team,
            counter,
        });
        Ok(Reply::Substituted {
            out: name.clone(),
            team,
            replacement,
        })
    }

    /// Tells a player when their next strike bans them, or when they
    /// already crossed the line.
    fn warn(&self, player: &PickupPlayer, counter: Counter) {
        let Some(max) = self.config.threshold(counter) else {
            return;
        };
        let prior = match counter {
            Counter::NoShow => player.no_shows(),
            Counter::Sub => player.subs(),
        };
        let total = prior + self.accounting.strikes(player.name()).get(counter);
        if total >= max {
            self.whisper(
                player.name(),
                Notice::Warning {
                    counter,
                    total,
                    max,
                },
            );
        }
    }

    /// Applies a passed suggestion if the same players are still fielded.
    fn settle(&mut self, tally: Tally, suggestion: BalanceResult) {
        if !tally.passed() {
            self.announce(Notice::VoteFailed(tally));
            return;
        }
        let fielded = self
            .lineup
            .fielded()
            .map(|p| p.name().clone())
            .collect::<HashSet<_>>();
        let proposed = suggestion
            .red()
            .iter()
            .chain(suggestion.blue())
            .map(|(name, _)| name.clone())
            .collect::<HashSet<_>>();
        if self.state != State::InProgress || fielded != proposed {
            log::info!("[session] suggestion no longer matches the teams");
            self.announce(Notice::VoteStale);
            return;
        }
        let red = suggestion.names(Team::Red);
        let blue = suggestion.names(Team::Blue);
        self.lineup.assign(&red, &blue);
        self.announce(Notice::VotePassed(tally));
        self.announce(Notice::Teams {
            red,
            blue,
            imbalance: Some(suggestion.imbalance()),
        });
    }

    fn cancel(&mut self, reset: bool) -> Result<Reply, PickupError> {
        if !self.state.is_active() {
            return Err(Invalid::WrongState(self.state).into());
        }
        self.votes.cancel_all();
        if !self.accounting.is_empty() {
            log::info!("[session] discarding strikes of cancelled session {}", self.id);
        }
        self.transition(State::Cancelled);
        self.clear();
        self.transition(State::Idle);
        self.announce(Notice::Cancelled { reset });
        Ok(Reply::Cancelled { reset })
    }

    fn clear(&mut self) {
        self.lineup.clear();
        self.draft = None;
        self.started = None;
    }

    fn names(&self, team: Team) -> Vec<Name> {
        self.lineup
            .team(team)
            .iter()
            .map(|p| p.name().clone())
            .collect()
    }

    fn available(&self) -> Vec<Name> {
        self.lineup
            .queue()
            .iter()
            .map(|p| p.name().clone())
            .collect()
    }

    /// Skill gap between the fielded teams, if everyone on them is rated.
    fn current_gap(&self) -> Option<Imbalance> {
        let sum = |team: Team| {
            self.lineup
                .team(team)
                .iter()
                .map(|p| p.skill(self.mode).map(i64::from))
                .sum::<Option<i64>>()
        };
        Some((sum(Team::Red)? - sum(Team::Blue)?).unsigned_abs())
    }
}
