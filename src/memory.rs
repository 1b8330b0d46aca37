//! In-process collaborators.
//!
//! Used by the console binary and by tests. Each store can be switched
//! into an outage to exercise the dependency-failure paths.
use super::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn check(down: &AtomicBool, what: &str) -> anyhow::Result<()> {
    match down.load(Ordering::SeqCst) {
        true => Err(anyhow::anyhow!("{} offline", what)),
        false => Ok(()),
    }
}

/// Connected players keyed by name.
pub struct MemoryRoster {
    mode: Mutex<GameMode>,
    players: Mutex<HashMap<Name, Presence>>,
    down: AtomicBool,
}

impl MemoryRoster {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            players: Mutex::new(HashMap::new()),
            down: AtomicBool::new(false),
        }
    }
    /// Connects a player rated `skill` in the current mode.
    pub fn connect(&self, name: &str, skill: Skill) {
        let mode = *lock(&self.mode);
        self.join(name, HashMap::from([(mode, skill)]));
    }
    /// Connects a player with no rating at all.
    pub fn connect_unrated(&self, name: &str) {
        self.join(name, HashMap::new());
    }
    pub fn join(&self, name: &str, skills: HashMap<GameMode, Skill>) {
        lock(&self.players).insert(Name::from(name), Presence { skills });
    }
    pub fn disconnect(&self, name: &str) -> bool {
        lock(&self.players).remove(&Name::from(name)).is_some()
    }
    pub fn set_mode(&self, mode: GameMode) {
        *lock(&self.mode) = mode;
    }
    pub fn outage(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl RosterStore for MemoryRoster {
    fn current_players(&self) -> anyhow::Result<HashMap<Name, Presence>> {
        check(&self.down, "roster")?;
        Ok(lock(&self.players).clone())
    }
    fn game_mode(&self) -> anyhow::Result<GameMode> {
        check(&self.down, "roster")?;
        Ok(*lock(&self.mode))
    }
    fn presence(&self, name: &Name) -> anyhow::Result<Option<Presence>> {
        check(&self.down, "roster")?;
        Ok(lock(&self.players).get(name).cloned())
    }
}

/// Penalty counters and ban expiries.
/// Implements both [`PenaltyLedger`] and [`BanIssuer`].
pub struct MemoryLedger {
    clock: Arc<dyn Clock>,
    counts: Mutex<HashMap<(Name, Counter), u32>>,
    expiries: Mutex<HashMap<Name, SystemTime>>,
    issued: Mutex<HashMap<Name, Vec<Duration>>>,
    down: AtomicBool,
    bans_down: AtomicBool,
}

impl MemoryLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counts: Mutex::new(HashMap::new()),
            expiries: Mutex::new(HashMap::new()),
            issued: Mutex::new(HashMap::new()),
            down: AtomicBool::new(false),
            bans_down: AtomicBool::new(false),
        }
    }
    /// Fails every ledger and ban operation.
    pub fn outage(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
    /// Fails only ban and unban.
    pub fn ban_outage(&self, down: bool) {
        self.bans_down.store(down, Ordering::SeqCst);
    }
    pub fn bans_issued(&self, name: &Name) -> usize {
        lock(&self.issued).get(name).map_or(0, |bans| bans.len())
    }
    pub fn last_ban(&self, name: &Name) -> Option<Duration> {
        lock(&self.issued)
            .get(name)
            .and_then(|bans| bans.last().copied())
    }
}

#[async_trait::async_trait]
impl PenaltyLedger for MemoryLedger {
    async fn count(&self, name: &Name, counter: Counter) -> anyhow::Result<u32> {
        check(&self.down, "ledger")?;
        Ok(lock(&self.counts)
            .get(&(name.clone(), counter))
            .copied()
            .unwrap_or(0))
    }
    async fn increment(&self, name: &Name, counter: Counter, by: u32) -> anyhow::Result<u32> {
        check(&self.down, "ledger")?;
        let mut counts = lock(&self.counts);
        let total = counts.entry((name.clone(), counter)).or_insert(0);
        *total += by;
        Ok(*total)
    }
    async fn decrement(&self, name: &Name, counter: Counter) -> anyhow::Result<u32> {
        check(&self.down, "ledger")?;
        let mut counts = lock(&self.counts);
        let total = counts.entry((name.clone(), counter)).or_insert(0);
        *total = total.saturating_sub(1);
        Ok(*total)
    }
    async fn reset(&self, name: &Name, counter: Counter) -> anyhow::Result<()> {
        check(&self.down, "ledger")?;
        lock(&self.counts).remove(&(name.clone(), counter));
        Ok(())
    }
    async fn ban_expiry(&self, name: &Name) -> anyhow::Result<Option<SystemTime>> {
        check(&self.down, "ledger")?;
        Ok(lock(&self.expiries).get(name).copied())
    }
}

#[async_trait::async_trait]
impl BanIssuer for MemoryLedger {
    async fn ban(&self, name: &Name, duration: Duration) -> anyhow::Result<()> {
        check(&self.down, "ledger")?;
        check(&self.bans_down, "ban service")?;
        let until = self
            .clock
            .now()
            .checked_add(duration)
            .ok_or_else(|| anyhow::anyhow!("ban of {:?} runs past the clock", duration))?;
        lock(&self.expiries).insert(name.clone(), until);
        lock(&self.issued)
            .entry(name.clone())
            .or_default()
            .push(duration);
        Ok(())
    }
    async fn unban(&self, name: &Name) -> anyhow::Result<bool> {
        check(&self.down, "ledger")?;
        check(&self.bans_down, "ban service")?;
        let now = self.clock.now();
        Ok(lock(&self.expiries)
            .remove(name)
            .is_some_and(|until| until > now))
    }
}

/// One line of recorded chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Said(String),
    Told(Name, String),
}

/// Chat output that keeps everything it was asked to send.
#[derive(Default)]
pub struct Transcript {
    lines: Mutex<Vec<Line>>,
}

impl Transcript {
    pub fn said(&self) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .filter_map(|line| match line {
                Line::Said(text) => Some(text.clone()),
                Line::Told(..) => None,
            })
            .collect()
    }
    pub fn told(&self, name: &Name) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .filter_map(|line| match line {
                Line::Told(to, text) if to == name => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl ChatOutput for Transcript {
    fn say(&self, text: &str) {
        lock(&self.lines).push(Line::Said(text.to_string()));
    }
    fn tell(&self, name: &Name, text: &str) {
        lock(&self.lines).push(Line::Told(name.clone(), text.to_string()));
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<SystemTime>,
}

impl FixedClock {
    pub fn epoch() -> Self {
        Self::at(SystemTime::UNIX_EPOCH)
    }
    pub fn at(now: SystemTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }
    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        *lock(&self.now)
    }
}

/// Records expiries instead of arming timers; [`ManualScheduler::fire`]
/// hands them back as if every deadline had passed.
#[derive(Default)]
pub struct ManualScheduler {
    armed: Mutex<Vec<(Duration, Expiry)>>,
}

impl ManualScheduler {
    pub fn armed(&self) -> Vec<(Duration, Expiry)> {
        lock(&self.armed).clone()
    }
    pub fn fire(&self) -> Vec<Expiry> {
        lock(&self.armed).drain(..).map(|(_, expiry)| expiry).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, expiry: Expiry) {
        lock(&self.armed).push((delay, expiry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_saturate_and_reset() {
        let ledger = MemoryLedger::new(Arc::new(FixedClock::epoch()));
        let name = Name::from("bones");
        assert_eq!(ledger.decrement(&name, Counter::Sub).await.unwrap(), 0);
        assert_eq!(ledger.increment(&name, Counter::Sub, 2).await.unwrap(), 2);
        assert_eq!(ledger.decrement(&name, Counter::Sub).await.unwrap(), 1);
        ledger.reset(&name, Counter::Sub).await.unwrap();
        assert_eq!(ledger.count(&name, Counter::Sub).await.unwrap(), 0);
    }
    #[tokio::test]
    async fn unban_reports_active_bans_only() {
        let clock = Arc::new(FixedClock::epoch());
        let ledger = MemoryLedger::new(clock.clone());
        let name = Name::from("grunt");
        assert!(!ledger.unban(&name).await.unwrap());
        ledger.ban(&name, Duration::from_secs(60)).await.unwrap();
        assert!(ledger.unban(&name).await.unwrap());
        ledger.ban(&name, Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(120));
        assert!(!ledger.unban(&name).await.unwrap());
        assert_eq!(ledger.bans_issued(&name), 2);
    }
    #[test]
    fn roster_outage_is_an_error() {
        let roster = MemoryRoster::new(GameMode::Ca);
        roster.connect("phobos", 1000);
        assert!(roster.presence(&Name::from("PHOBOS")).unwrap().is_some());
        roster.outage(true);
        assert!(roster.current_players().is_err());
        assert!(roster.game_mode().is_err());
    }
}
