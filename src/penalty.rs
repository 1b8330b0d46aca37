use super::*;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Strikes a player collected during one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strikes {
    pub no_shows: u32,
    pub subs: u32,
}

impl Strikes {
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::NoShow => self.no_shows,
            Counter::Sub => self.subs,
        }
    }
    fn add(&mut self, counter: Counter, by: u32) {
        match counter {
            Counter::NoShow => self.no_shows += by,
            Counter::Sub => self.subs += by,
        }
    }
}

/// Penalty bookkeeping for one session, settled once at its end.
#[derive(Debug)]
pub struct Accounting {
    session: ID<PickupSession>,
    strikes: BTreeMap<Name, Strikes>,
    processed: bool,
}

impl Accounting {
    pub fn new(session: ID<PickupSession>) -> Self {
        Self {
            session,
            strikes: BTreeMap::new(),
            processed: false,
        }
    }
    pub fn record(&mut self, name: &Name, counter: Counter, by: u32) {
        self.strikes.entry(name.clone()).or_default().add(counter, by);
    }
    pub fn strikes(&self, name: &Name) -> Strikes {
        self.strikes.get(name).copied().unwrap_or_default()
    }
    pub fn processed(&self) -> bool {
        self.processed
    }
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}

/// One unit of penalty work. Failed steps wait in the backlog for a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Record { name: Name, counter: Counter, by: u32 },
    Ban { name: Name, counter: Counter, length: BanLength },
    Reset { name: Name, counter: Counter },
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Record { name, counter, by } => write!(f, "record {} {} for {}", by, counter, name),
            Self::Ban { name, length, .. } => write!(f, "ban {} for {}", name, length),
            Self::Reset { name, counter } => write!(f, "reset {} count of {}", counter, name),
        }
    }
}

/// What a settlement pass achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PenaltyReport {
    pub banned: Vec<(Name, Counter, BanLength)>,
    pub failed: usize,
    pub skipped: bool,
}

/// Turns session strikes into ledger totals and bans.
///
/// A ban is issued when the ledger total after recording exceeds the
/// configured maximum; the counter is then reset. Ledger or ban failures
/// never block completion: the step is logged and parked in a backlog
/// that [`PenaltyEnforcer::retry`] replays.
pub struct PenaltyEnforcer {
    config: Config,
    ledger: Arc<dyn PenaltyLedger>,
    bans: Arc<dyn BanIssuer>,
    backlog: Vec<Step>,
}

impl PenaltyEnforcer {
    pub fn new(config: Config, ledger: Arc<dyn PenaltyLedger>, bans: Arc<dyn BanIssuer>) -> Self {
        Self {
            config,
            ledger,
            bans,
            backlog: Vec::new(),
        }
    }
    pub fn configure(&mut self, config: Config) {
        self.config = config;
    }
    pub fn backlog(&self) -> &[Step] {
        &self.backlog
    }

    pub async fn apply_end_of_session_penalties(
        &mut self,
        accounting: &mut Accounting,
    ) -> PenaltyReport {
        if accounting.processed {
            log::warn!("[penalty] session {} already settled", accounting.session);
            return PenaltyReport {
                skipped: true,
                ..PenaltyReport::default()
            };
        }
        accounting.processed = true;
        let steps = accounting
            .strikes
            .iter()
            .flat_map(|(name, strikes)| {
                [Counter::NoShow, Counter::Sub]
                    .into_iter()
                    .filter(move |c| strikes.get(*c) > 0)
                    .map(move |counter| Step::Record {
                        name: name.clone(),
                        counter,
                        by: strikes.get(counter),
                    })
            })
            .collect::<VecDeque<_>>();
        log::info!(
            "[penalty] settling session {} ({} steps)",
            accounting.session,
            steps.len()
        );
        self.run(steps).await
    }

    /// Replays every parked step.
    pub async fn retry(&mut self) -> PenaltyReport {
        let steps = std::mem::take(&mut self.backlog).into_iter().collect();
        self.run(steps).await
    }

    async fn run(&mut self, mut steps: VecDeque<Step>) -> PenaltyReport {
        let mut report = PenaltyReport::default();
        while let Some(step) = steps.pop_front() {
            match self.execute(&step).await {
                Ok(Some(next)) => {
                    if let Step::Reset { name, counter } = &next {
                        if let Step::Ban { length, .. } = &step {
                            report.banned.push((name.clone(), *counter, *length));
                        }
                    }
                    steps.push_front(next);
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("[penalty] failed to {}: {:#}", step, e);
                    report.failed += 1;
                    self.backlog.push(step);
                }
            }
        }
        report
    }

    /// Performs one step and returns its follow-up, if any.
    async fn execute(&self, step: &Step) -> anyhow::Result<Option<Step>> {
        match step {
            Step::Record { name, counter, by } => {
                let total = self.ledger.increment(name, *counter, *by).await?;
                log::debug!("[penalty] {} now has {} {}", name, total, counter);
                Ok(self
                    .config
                    .threshold(*counter)
                    .filter(|max| total > *max)
                    .map(|_| Step::Ban {
                        name: name.clone(),
                        counter: *counter,
                        length: self.config.ban_length(*counter),
                    }))
            }
            Step::Ban {
                name,
                counter,
                length,
            } => {
                let duration = length
                    .duration()
                    .ok_or_else(|| anyhow::anyhow!("ban of {} is too long", length))?;
                self.bans.ban(name, duration).await?;
                log::info!("[penalty] banned {} for {} ({})", name, length, counter);
                Ok(Some(Step::Reset {
                    name: name.clone(),
                    counter: *counter,
                }))
            }
            Step::Reset { name, counter } => {
                self.ledger.reset(name, *counter).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::*;

    fn setup() -> (Arc<MemoryLedger>, PenaltyEnforcer) {
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        let config = Config {
            max_no_shows: Some(3),
            max_subs: Some(1),
            ..Config::default()
        };
        let enforcer = PenaltyEnforcer::new(config, ledger.clone(), ledger.clone());
        (ledger, enforcer)
    }

    #[tokio::test]
    async fn bans_once_past_threshold_and_resets() {
        let (ledger, mut enforcer) = setup();
        let visor = Name::from("visor");
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&visor, Counter::NoShow, 4);
        let report = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert_eq!(
            report.banned,
            vec![(visor.clone(), Counter::NoShow, Config::default().no_show_ban)]
        );
        assert_eq!(ledger.bans_issued(&visor), 1);
        assert_eq!(ledger.count(&visor, Counter::NoShow).await.unwrap(), 0);
        assert_eq!(
            ledger.last_ban(&visor),
            Config::default().no_show_ban.duration()
        );
    }
    #[tokio::test]
    async fn at_threshold_is_not_over_it() {
        let (ledger, mut enforcer) = setup();
        let xaero = Name::from("xaero");
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&xaero, Counter::NoShow, 3);
        accounting.record(&xaero, Counter::Sub, 1);
        let report = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert!(report.banned.is_empty());
        assert_eq!(ledger.count(&xaero, Counter::NoShow).await.unwrap(), 3);
        assert_eq!(ledger.count(&xaero, Counter::Sub).await.unwrap(), 1);
        assert_eq!(ledger.bans_issued(&xaero), 0);
    }
    #[tokio::test]
    async fn totals_accumulate_across_sessions() {
        let (ledger, mut enforcer) = setup();
        let slash = Name::from("slash");
        let mut first = Accounting::new(ID::default());
        first.record(&slash, Counter::Sub, 1);
        enforcer.apply_end_of_session_penalties(&mut first).await;
        let mut second = Accounting::new(ID::default());
        second.record(&slash, Counter::Sub, 1);
        let report = enforcer.apply_end_of_session_penalties(&mut second).await;
        assert_eq!(report.banned.len(), 1);
        assert_eq!(ledger.bans_issued(&slash), 1);
    }
    #[tokio::test]
    async fn settling_twice_is_a_no_op() {
        let (ledger, mut enforcer) = setup();
        let visor = Name::from("visor");
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&visor, Counter::NoShow, 5);
        enforcer.apply_end_of_session_penalties(&mut accounting).await;
        let again = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert!(again.skipped);
        assert_eq!(ledger.bans_issued(&visor), 1);
    }
    #[tokio::test]
    async fn oversized_ban_is_parked_not_fatal() {
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        let config = Config {
            max_subs: Some(0),
            sub_ban: BanLength {
                amount: u64::MAX,
                unit: Unit::Weeks,
            },
            ..Config::default()
        };
        let mut enforcer = PenaltyEnforcer::new(config, ledger.clone(), ledger.clone());
        let slash = Name::from("slash");
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&slash, Counter::Sub, 1);
        let report = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert_eq!(report.failed, 1);
        assert!(report.banned.is_empty());
        assert!(matches!(enforcer.backlog(), [Step::Ban { .. }]));
        assert_eq!(ledger.bans_issued(&slash), 0);
    }
    #[tokio::test]
    async fn failed_bans_wait_for_retry() {
        let (ledger, mut enforcer) = setup();
        let visor = Name::from("visor");
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&visor, Counter::NoShow, 4);
        ledger.ban_outage(true);
        let report = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert_eq!(report.failed, 1);
        assert!(report.banned.is_empty());
        assert!(matches!(enforcer.backlog(), [Step::Ban { .. }]));
        assert_eq!(ledger.count(&visor, Counter::NoShow).await.unwrap(), 4);
        ledger.ban_outage(false);
        let report = enforcer.retry().await;
        assert_eq!(report.banned.len(), 1);
        assert!(enforcer.backlog().is_empty());
        assert_eq!(ledger.bans_issued(&visor), 1);
        assert_eq!(ledger.count(&visor, Counter::NoShow).await.unwrap(), 0);
    }
    #[tokio::test]
    async fn disabled_thresholds_never_ban() {
        let ledger = Arc::new(MemoryLedger::new(Arc::new(FixedClock::epoch())));
        let config = Config {
            max_no_shows: None,
            ..Config::default()
        };
        let mut enforcer = PenaltyEnforcer::new(config, ledger.clone(), ledger.clone());
        let mut accounting = Accounting::new(ID::default());
        accounting.record(&Name::from("doom"), Counter::NoShow, 10);
        let report = enforcer.apply_end_of_session_penalties(&mut accounting).await;
        assert!(report.banned.is_empty());
        assert_eq!(ledger.bans_issued(&Name::from("doom")), 0);
    }
}
