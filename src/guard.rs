use super::*;
use std::sync::Arc;

/// Everything the guard learned while admitting a player.
#[derive(Debug, Clone)]
pub struct Admission {
    pub presence: Presence,
    pub no_shows: u32,
    pub subs: u32,
}

/// Admission checks for the queue, the sub bench and captaincy.
///
/// Read-only. Fails closed: when the roster or the ledger cannot be read
/// the player is refused with a retryable [`PickupError::Dependency`].
pub struct EligibilityGuard {
    roster: Arc<dyn RosterStore>,
    ledger: Arc<dyn PenaltyLedger>,
    clock: Arc<dyn Clock>,
}

impl EligibilityGuard {
    pub fn new(
        roster: Arc<dyn RosterStore>,
        ledger: Arc<dyn PenaltyLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            roster,
            ledger,
            clock,
        }
    }

    /// May this player enter the queue or volunteer as a sub?
    pub async fn can_join_queue(
        &self,
        name: &Name,
        lineup: &Lineup,
    ) -> Result<Admission, PickupError> {
        if lineup.contains(name) {
            return Err(Ineligible::AlreadyEnlisted(name.clone()).into());
        }
        let presence = self.connected(name)?;
        self.unbanned(name).await?;
        let no_shows = self
            .ledger
            .count(name, Counter::NoShow)
            .await
            .map_err(|e| PickupError::unavailable(Dependency::Ledger, e))?;
        let subs = self
            .ledger
            .count(name, Counter::Sub)
            .await
            .map_err(|e| PickupError::unavailable(Dependency::Ledger, e))?;
        log::debug!("[guard] admitted {}", name);
        Ok(Admission {
            presence,
            no_shows,
            subs,
        })
    }

    /// May this queued player lead a team?
    pub async fn can_be_captain(&self, name: &Name) -> Result<(), PickupError> {
        self.connected(name)?;
        self.unbanned(name).await
    }

    /// Rating the balancer will use for this player.
    pub fn can_be_balanced(player: &PickupPlayer, mode: GameMode) -> Result<Skill, PickupError> {
        player
            .skill(mode)
            .ok_or_else(|| Invalid::Unrated(player.name().clone()).into())
    }

    fn connected(&self, name: &Name) -> Result<Presence, PickupError> {
        self.roster
            .presence(name)
            .map_err(|e| PickupError::unavailable(Dependency::Roster, e))?
            .ok_or_else(|| Ineligible::NotConnected(name.clone()).into())
    }

    async fn unbanned(&self, name: &Name) -> Result<(), PickupError> {
        let expiry = self
            .ledger
            .ban_expiry(name)
            .await
            .map_err(|e| PickupError::unavailable(Dependency::Ledger, e))?;
        match expiry {
            Some(until) if until > self.clock.now() => {
                log::debug!("[guard] {} is banned", name);
                Err(Ineligible::Banned(name.clone()).into())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::*;
    use std::time::Duration;

    fn guard(roster: &Arc<MemoryRoster>, ledger: &Arc<MemoryLedger>) -> EligibilityGuard {
        EligibilityGuard::new(roster.clone(), ledger.clone(), Arc::new(FixedClock::epoch()))
    }

    #[tokio::test]
    async fn admits_connected_players() {
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        roster.connect("visor", 1400);
        ledger.increment(&Name::from("visor"), Counter::Sub, 2).await.unwrap();
        let admission = guard(&roster, &ledger)
            .can_join_queue(&Name::from("visor"), &Lineup::default())
            .await
            .unwrap();
        assert_eq!(admission.subs, 2);
        assert_eq!(admission.no_shows, 0);
        assert_eq!(admission.presence.skills[&GameMode::Ctf], 1400);
    }
    #[tokio::test]
    async fn rejects_strangers_duplicates_and_banned() {
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        roster.connect("orbb", 1200);
        roster.connect("hunter", 1300);
        ledger.ban(&Name::from("hunter"), Duration::from_secs(60)).await.unwrap();
        let guard = guard(&roster, &ledger);
        let mut lineup = Lineup::default();
        assert_eq!(
            guard.can_join_queue(&Name::from("ghost"), &lineup).await.unwrap_err(),
            PickupError::Eligibility(Ineligible::NotConnected(Name::from("ghost")))
        );
        assert_eq!(
            guard.can_join_queue(&Name::from("hunter"), &lineup).await.unwrap_err(),
            PickupError::Eligibility(Ineligible::Banned(Name::from("hunter")))
        );
        assert!(guard.can_be_captain(&Name::from("hunter")).await.is_err());
        let admission = guard.can_join_queue(&Name::from("orbb"), &lineup).await.unwrap();
        lineup.admit(
            Slot::Queue,
            PickupPlayer::new(
                Name::from("orbb"),
                admission.presence.skills,
                std::time::SystemTime::UNIX_EPOCH,
            ),
        );
        assert_eq!(
            guard.can_join_queue(&Name::from("orbb"), &lineup).await.unwrap_err(),
            PickupError::Eligibility(Ineligible::AlreadyEnlisted(Name::from("orbb")))
        );
    }
    #[tokio::test]
    async fn expired_bans_do_not_count() {
        let clock = Arc::new(FixedClock::epoch());
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(clock.clone()));
        roster.connect("major", 1600);
        ledger.ban(&Name::from("major"), Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(61));
        let guard = EligibilityGuard::new(roster, ledger, clock);
        assert!(guard.can_be_captain(&Name::from("major")).await.is_ok());
    }
    #[tokio::test]
    async fn fails_closed_when_ledger_is_down() {
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        roster.connect("tankjr", 1500);
        ledger.outage(true);
        let error = guard(&roster, &ledger)
            .can_join_queue(&Name::from("tankjr"), &Lineup::default())
            .await
            .unwrap_err();
        assert_eq!(error, PickupError::Dependency(Dependency::Ledger));
        assert!(error.retryable());
    }
    #[test]
    fn unrated_players_cannot_be_balanced() {
        let player = PickupPlayer::new(
            Name::from("uriel"),
            Default::default(),
            std::time::SystemTime::UNIX_EPOCH,
        );
        assert_eq!(
            EligibilityGuard::can_be_balanced(&player, GameMode::Ctf),
            Err(PickupError::Validation(Invalid::Unrated(Name::from("uriel"))))
        );
    }
}
