use super::*;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;
use std::time::SystemTime;

/// What a vote is deciding. At most one vote per purpose is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    TeamSuggestion,
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::TeamSuggestion => write!(f, "team suggestion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

impl TryFrom<&str> for Choice {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "yes" | "y" | "1" | "f1" => Ok(Self::Yes),
            "no" | "n" | "2" | "f2" => Ok(Self::No),
            _ => Err(anyhow::anyhow!("not a vote: {}", s)),
        }
    }
}

/// Outcome of a single ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Accepted,
    AlreadyVoted,
    NotEligible,
    NoSessionOpen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Tally {
    pub yes: usize,
    pub no: usize,
}

impl Tally {
    /// Strict majority of cast ballots. Ties and empty votes fail.
    pub fn passed(&self) -> bool {
        self.yes > self.no
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} yes, {} no", self.yes, self.no)
    }
}

/// A timed yes/no confirmation over a fixed electorate.
/// Counts are derived from the ballots, never stored separately.
#[derive(Debug)]
pub struct VoteSession<T> {
    id: u64,
    purpose: Purpose,
    eligible: HashSet<Name>,
    ballots: HashMap<Name, Choice>,
    deadline: SystemTime,
    payload: T,
}

impl<T> VoteSession<T> {
    pub fn open(
        id: u64,
        purpose: Purpose,
        eligible: HashSet<Name>,
        deadline: SystemTime,
        payload: T,
    ) -> Self {
        Self {
            id,
            purpose,
            eligible,
            ballots: HashMap::new(),
            deadline,
            payload,
        }
    }
    pub fn cast(&mut self, voter: &Name, choice: Choice) -> Cast {
        if !self.eligible.contains(voter) {
            return Cast::NotEligible;
        }
        if self.ballots.contains_key(voter) {
            return Cast::AlreadyVoted;
        }
        self.ballots.insert(voter.clone(), choice);
        Cast::Accepted
    }
    pub fn tally(&self) -> Tally {
        self.ballots
            .values()
            .fold(Tally::default(), |mut tally, choice| {
                match choice {
                    Choice::Yes => tally.yes += 1,
                    Choice::No => tally.no += 1,
                }
                tally
            })
    }
    pub fn expiry(&self) -> Expiry {
        Expiry {
            purpose: self.purpose,
            vote: self.id,
        }
    }
    pub fn deadline(&self) -> SystemTime {
        self.deadline
    }
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

/// A vote that ran to its deadline.
#[derive(Debug)]
pub struct Resolution<T> {
    pub purpose: Purpose,
    pub tally: Tally,
    pub payload: T,
}

/// Pending votes, one slot per purpose.
///
/// Deadlines come back as [`Expiry`] messages through the owner's queue.
/// An expiry whose vote was cancelled or replaced finds no match and is
/// dropped, so a cancelled vote never resolves.
#[derive(Debug)]
pub struct VoteBoard<T> {
    pending: HashMap<Purpose, VoteSession<T>>,
    sequence: u64,
}

impl<T> Default for VoteBoard<T> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            sequence: 0,
        }
    }
}

impl<T> VoteBoard<T> {
    pub fn open(
        &mut self,
        purpose: Purpose,
        eligible: HashSet<Name>,
        now: SystemTime,
        length: Duration,
        payload: T,
        scheduler: &dyn Scheduler,
    ) -> Result<Expiry, PickupError> {
        if self.pending.contains_key(&purpose) {
            return Err(Conflict::VotePending(purpose).into());
        }
        let deadline = now.checked_add(length).ok_or(Invalid::Setting {
            setting: "vote_seconds",
            value: length.as_secs(),
        })?;
        self.sequence += 1;
        let vote = VoteSession::open(self.sequence, purpose, eligible, deadline, payload);
        let expiry = vote.expiry();
        self.pending.insert(purpose, vote);
        scheduler.after(length, expiry);
        log::info!("[vote] opened {} #{} for {:?}", purpose, expiry.vote, length);
        Ok(expiry)
    }
    pub fn cast(&mut self, purpose: Purpose, voter: &Name, choice: Choice) -> Cast {
        match self.pending.get_mut(&purpose) {
            None => Cast::NoSessionOpen,
            Some(vote) => {
                let cast = vote.cast(voter, choice);
                log::debug!("[vote] {} voted {:?}: {:?}", voter, choice, cast);
                cast
            }
        }
    }
    /// Closes the vote named by the expiry. Returns None if it is no longer pending.
    pub fn resolve(&mut self, expiry: Expiry) -> Option<Resolution<T>> {
        match self.pending.get(&expiry.purpose) {
            Some(vote) if vote.id == expiry.vote => {}
            _ => {
                log::debug!("[vote] stale expiry #{}", expiry.vote);
                return None;
            }
        }
        let vote = self.pending.remove(&expiry.purpose)?;
        let tally = vote.tally();
        log::info!("[vote] closed {} #{}: {}", vote.purpose, vote.id, tally);
        Some(Resolution {
            purpose: vote.purpose,
            tally,
            payload: vote.payload,
        })
    }
    pub fn cancel(&mut self, purpose: Purpose) -> bool {
        self.pending
            .remove(&purpose)
            .inspect(|vote| log::info!("[vote] cancelled {} #{}", purpose, vote.id))
            .is_some()
    }
    pub fn cancel_all(&mut self) {
        let purposes = self.pending.keys().copied().collect::<Vec<_>>();
        for purpose in purposes {
            self.cancel(purpose);
        }
    }
    pub fn pending(&self, purpose: Purpose) -> Option<&VoteSession<T>> {
        self.pending.get(&purpose)
    }
    pub fn is_pending(&self, purpose: Purpose) -> bool {
        self.pending.contains_key(&purpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ManualScheduler;

    fn voters(names: &[&str]) -> HashSet<Name> {
        names.iter().map(|n| Name::from(*n)).collect()
    }

    fn board(scheduler: &ManualScheduler) -> (VoteBoard<&'static str>, Expiry) {
        let mut board = VoteBoard::default();
        let expiry = board
            .open(
                Purpose::TeamSuggestion,
                voters(&["a", "b", "c"]),
                SystemTime::UNIX_EPOCH,
                Duration::from_secs(30),
                "swap",
                scheduler,
            )
            .unwrap();
        (board, expiry)
    }

    #[test]
    fn second_ballot_changes_nothing() {
        let scheduler = ManualScheduler::default();
        let (mut board, _) = board(&scheduler);
        let a = Name::from("a");
        let purpose = Purpose::TeamSuggestion;
        assert_eq!(board.cast(purpose, &a, Choice::Yes), Cast::Accepted);
        let before = board.pending(purpose).unwrap().tally();
        assert_eq!(board.cast(purpose, &a, Choice::No), Cast::AlreadyVoted);
        assert_eq!(board.cast(purpose, &a, Choice::Yes), Cast::AlreadyVoted);
        assert_eq!(board.pending(purpose).unwrap().tally(), before);
        assert_eq!(before, Tally { yes: 1, no: 0 });
    }
    #[test]
    fn outsiders_and_closed_votes() {
        let scheduler = ManualScheduler::default();
        let (mut board, _) = board(&scheduler);
        let purpose = Purpose::TeamSuggestion;
        assert_eq!(
            board.cast(purpose, &Name::from("z"), Choice::Yes),
            Cast::NotEligible
        );
        board.cancel(purpose);
        assert_eq!(
            board.cast(purpose, &Name::from("a"), Choice::Yes),
            Cast::NoSessionOpen
        );
    }
    #[test]
    fn second_open_conflicts() {
        let scheduler = ManualScheduler::default();
        let (mut board, first) = board(&scheduler);
        let again = board.open(
            Purpose::TeamSuggestion,
            voters(&["a"]),
            SystemTime::UNIX_EPOCH,
            Duration::from_secs(30),
            "other",
            &scheduler,
        );
        assert_eq!(
            again.unwrap_err(),
            PickupError::Conflict(Conflict::VotePending(Purpose::TeamSuggestion))
        );
        assert_eq!(*board.pending(Purpose::TeamSuggestion).unwrap().payload(), "swap");
        assert_eq!(board.pending(Purpose::TeamSuggestion).unwrap().expiry(), first);
    }
    #[test]
    fn resolves_exactly_once() {
        let scheduler = ManualScheduler::default();
        let (mut board, expiry) = board(&scheduler);
        board.cast(Purpose::TeamSuggestion, &Name::from("a"), Choice::Yes);
        board.cast(Purpose::TeamSuggestion, &Name::from("b"), Choice::Yes);
        board.cast(Purpose::TeamSuggestion, &Name::from("c"), Choice::No);
        assert_eq!(scheduler.fire(), vec![expiry]);
        let resolution = board.resolve(expiry).unwrap();
        assert!(resolution.tally.passed());
        assert_eq!(resolution.payload, "swap");
        assert!(board.resolve(expiry).is_none());
    }
    #[test]
    fn cancel_suppresses_resolution() {
        let scheduler = ManualScheduler::default();
        let (mut board, expiry) = board(&scheduler);
        board.cast(Purpose::TeamSuggestion, &Name::from("a"), Choice::Yes);
        assert!(board.cancel(Purpose::TeamSuggestion));
        assert!(scheduler.fire().into_iter().all(|e| board.resolve(e).is_none()));
        assert!(board.resolve(expiry).is_none());
    }
    #[test]
    fn stale_expiry_ignored_by_newer_vote() {
        let scheduler = ManualScheduler::default();
        let (mut board, old) = board(&scheduler);
        board.cancel_all();
        let new = board
            .open(
                Purpose::TeamSuggestion,
                voters(&["a"]),
                SystemTime::UNIX_EPOCH,
                Duration::from_secs(30),
                "fresh",
                &scheduler,
            )
            .unwrap();
        assert_ne!(old, new);
        assert!(board.resolve(old).is_none());
        assert!(board.is_pending(Purpose::TeamSuggestion));
        assert_eq!(board.resolve(new).unwrap().payload, "fresh");
    }
    #[test]
    fn unreachable_deadline_opens_nothing() {
        let scheduler = ManualScheduler::default();
        let mut board = VoteBoard::<&str>::default();
        let opened = board.open(
            Purpose::TeamSuggestion,
            voters(&["a"]),
            SystemTime::UNIX_EPOCH,
            Duration::from_secs(u64::MAX),
            "swap",
            &scheduler,
        );
        assert!(matches!(
            opened,
            Err(PickupError::Validation(Invalid::Setting { .. }))
        ));
        assert!(!board.is_pending(Purpose::TeamSuggestion));
        assert!(scheduler.armed().is_empty());
    }
    #[test]
    fn ties_fail() {
        assert!(!Tally { yes: 0, no: 0 }.passed());
        assert!(!Tally { yes: 2, no: 2 }.passed());
        assert!(Tally { yes: 3, no: 2 }.passed());
    }
}
