use super::*;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

type Outcome = Result<Reply, PickupError>;

/// Everything the lobby task reacts to, in arrival order.
#[derive(Debug)]
pub enum Message {
    Request(Request, oneshot::Sender<Outcome>),
    Expire(Expiry),
    Configure(Config),
    Shutdown,
}

/// Arms vote deadlines on the tokio timer and posts them back into the
/// lobby queue, so deadlines are handled in line with player commands.
pub struct TokioScheduler {
    tx: UnboundedSender<Message>,
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, expiry: Expiry) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Message::Expire(expiry)).is_err() {
                log::debug!("[lobby] closed before vote #{} expired", expiry.vote);
            }
        });
    }
}

/// Single writer for the server's pickup.
/// Game chat, IRC and timers all funnel through one queue.
pub struct Lobby {
    session: PickupSession,
    rx: UnboundedReceiver<Message>,
}

impl Lobby {
    /// Spawns the lobby task and returns a handle to it.
    pub fn spawn(config: Config, services: Services) -> LobbyHandle {
        let (tx, rx) = unbounded_channel();
        let scheduler = std::sync::Arc::new(TokioScheduler { tx: tx.clone() });
        let session = PickupSession::new(config, services, scheduler);
        let lobby = Self { session, rx };
        tokio::spawn(lobby.run());
        LobbyHandle { tx }
    }

    pub async fn run(mut self) {
        log::info!("[lobby] open");
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Request(request, reply) => {
                    log::debug!("[lobby] {:?}", request);
                    let outcome = self.session.handle(request).await;
                    if let Err(e) = &outcome {
                        log::debug!("[lobby] rejected: {}", e);
                    }
                    if reply.send(outcome).is_err() {
                        log::debug!("[lobby] requester went away");
                    }
                }
                Message::Expire(expiry) => self.session.expire(expiry),
                Message::Configure(config) => {
                    if let Err(e) = self.session.configure(config) {
                        log::warn!("[lobby] configuration ignored: {}", e);
                    }
                }
                Message::Shutdown => break,
            }
        }
        if self.session.state().is_active() {
            let _ = self.session.stop();
        }
        log::info!("[lobby] closed");
    }
}

/// Cloneable front door to the lobby task.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    tx: UnboundedSender<Message>,
}

impl LobbyHandle {
    /// Queues a request and waits for its outcome.
    pub async fn send(&self, request: Request) -> Outcome {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Message::Request(request, tx))
            .map_err(|_| PickupError::Dependency(Dependency::Lobby))?;
        rx.await
            .map_err(|_| PickupError::Dependency(Dependency::Lobby))?
    }
    /// Replaces the settings used from the next session on.
    pub fn configure(&self, config: Config) -> Result<(), PickupError> {
        config.validate()?;
        self.tx
            .send(Message::Configure(config))
            .map_err(|_| PickupError::Dependency(Dependency::Lobby))
    }
    /// Cancels any running pickup and stops the task.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn start(&self, team_size: Option<usize>, captain_draft: Option<bool>) -> Outcome {
        self.send(Request::Start {
            team_size,
            captain_draft,
        })
        .await
    }
    pub async fn sign_up(&self, name: Name) -> Outcome {
        self.send(Request::SignUp(name)).await
    }
    pub async fn remove(&self, name: Name) -> Outcome {
        self.send(Request::Remove(name)).await
    }
    pub async fn pick(&self, captain: Name, target: Name) -> Outcome {
        self.send(Request::Pick { captain, target }).await
    }
    pub async fn request_sub(&self, name: Name) -> Outcome {
        self.send(Request::RequestSub(name)).await
    }
    pub async fn report_no_show(&self, name: Name) -> Outcome {
        self.send(Request::NoShow(name)).await
    }
    pub async fn volunteer(&self, name: Name) -> Outcome {
        self.send(Request::Volunteer(name)).await
    }
    pub async fn suggest(&self, name: Name) -> Outcome {
        self.send(Request::Suggest(name)).await
    }
    pub async fn vote(&self, name: Name, choice: Choice) -> Outcome {
        self.send(Request::Vote(name, choice)).await
    }
    pub async fn stop(&self) -> Outcome {
        self.send(Request::Stop).await
    }
    pub async fn reset(&self) -> Outcome {
        self.send(Request::Reset).await
    }
    pub async fn complete(&self) -> Outcome {
        self.send(Request::Complete).await
    }
    pub async fn unban(&self, name: Name) -> Outcome {
        self.send(Request::Unban(name)).await
    }
    pub async fn status(&self) -> Result<Status, PickupError> {
        match self.send(Request::Status).await? {
            Reply::Status(status) => Ok(status),
            other => unreachable!("status answered with {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::*;
    use std::sync::Arc;

    struct Setup {
        roster: Arc<MemoryRoster>,
        chat: Arc<Transcript>,
        handle: LobbyHandle,
    }

    fn setup(config: Config) -> Setup {
        let clock = Arc::new(FixedClock::epoch());
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(clock.clone()));
        let chat = Arc::new(Transcript::default());
        let services = Services {
            roster: roster.clone(),
            ledger: ledger.clone(),
            bans: ledger,
            chat: chat.clone(),
            clock,
        };
        let handle = Lobby::spawn(config, services);
        Setup {
            roster,
            chat,
            handle,
        }
    }

    fn name(s: &str) -> Name {
        Name::from(s)
    }

    #[tokio::test]
    async fn concurrent_signups_are_serialized() {
        let Setup { roster, handle, .. } = setup(Config::default());
        handle.start(Some(4), Some(false)).await.unwrap();
        let names = (0..12).map(|i| format!("p{:02}", i)).collect::<Vec<_>>();
        for (i, n) in names.iter().enumerate() {
            roster.connect(n, 1000 + 10 * i as Skill);
        }
        let tasks = names
            .iter()
            .map(|n| {
                let handle = handle.clone();
                let n = name(n);
                tokio::spawn(async move { handle.sign_up(n).await })
            })
            .collect::<Vec<_>>();
        let mut accepted = 0;
        let mut full = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(PickupError::Validation(Invalid::QueueFull(8))) => full += 1,
                Err(e) => panic!("unexpected {}", e),
            }
        }
        assert_eq!((accepted, full), (8, 4));
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, State::InProgress);
        assert_eq!(status.red.len(), 4);
        assert_eq!(status.blue.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn vote_deadline_arrives_through_the_queue() {
        let Setup {
            roster,
            chat,
            handle,
        } = setup(Config::default());
        handle.start(Some(2), Some(true)).await.unwrap();
        for (n, skill) in [("a", 100), ("b", 90), ("c", 10), ("d", 5)] {
            roster.connect(n, skill);
            handle.sign_up(name(n)).await.unwrap();
        }
        handle.pick(name("a"), name("c")).await.unwrap();
        handle.pick(name("b"), name("d")).await.unwrap();
        handle.suggest(name("d")).await.unwrap();
        for voter in ["a", "b", "d"] {
            handle.vote(name(voter), Choice::Yes).await.unwrap();
        }
        assert!(handle.status().await.unwrap().vote.is_some());
        tokio::time::sleep(Duration::from_secs(VOTE_SECONDS + 1)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.vote, None);
        assert_eq!(status.red, vec![name("a"), name("d")]);
        assert!(chat.said().iter().any(|line| line.starts_with("Vote passed")));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_before_the_deadline_suppresses_the_vote() {
        let Setup {
            roster,
            chat,
            handle,
        } = setup(Config::default());
        handle.start(Some(2), Some(true)).await.unwrap();
        for (n, skill) in [("a", 100), ("b", 90), ("c", 10), ("d", 5)] {
            roster.connect(n, skill);
            handle.sign_up(name(n)).await.unwrap();
        }
        handle.pick(name("a"), name("c")).await.unwrap();
        handle.pick(name("b"), name("d")).await.unwrap();
        handle.suggest(name("a")).await.unwrap();
        handle.vote(name("a"), Choice::Yes).await.unwrap();
        handle.reset().await.unwrap();
        tokio::time::sleep(Duration::from_secs(VOTE_SECONDS + 1)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, State::Idle);
        assert!(!chat.said().iter().any(|line| line.starts_with("Vote")));
    }

    #[tokio::test]
    async fn configuration_applies_to_the_next_session() {
        let Setup { handle, .. } = setup(Config::default());
        handle
            .configure(Config {
                team_size: 3,
                ..Config::default()
            })
            .unwrap();
        handle.start(None, None).await.unwrap();
        assert_eq!(handle.status().await.unwrap().team_size, 3);
    }

    #[tokio::test]
    async fn out_of_range_settings_are_refused() {
        let Setup { handle, .. } = setup(Config::default());
        let refused = handle.configure(Config {
            vote_seconds: u64::MAX,
            ..Config::default()
        });
        assert!(matches!(
            refused,
            Err(PickupError::Validation(Invalid::Setting { .. }))
        ));
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, State::Idle);
    }

    #[tokio::test]
    async fn endless_vote_leaves_the_lobby_running() {
        let Setup { roster, handle, .. } = setup(Config {
            vote_seconds: u64::MAX,
            ..Config::default()
        });
        handle.start(Some(2), Some(true)).await.unwrap();
        for (n, skill) in [("a", 100), ("b", 90), ("c", 10), ("d", 5)] {
            roster.connect(n, skill);
            handle.sign_up(name(n)).await.unwrap();
        }
        handle.pick(name("a"), name("c")).await.unwrap();
        handle.pick(name("b"), name("d")).await.unwrap();
        assert!(matches!(
            handle.suggest(name("a")).await,
            Err(PickupError::Validation(Invalid::Setting { .. }))
        ));
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, State::InProgress);
        assert!(!handle.is_closed());
    }

    #[tokio::test]
    async fn shutdown_closes_the_handle() {
        let Setup { handle, .. } = setup(Config::default());
        handle.start(None, None).await.unwrap();
        handle.shutdown();
        let error = handle.status().await.unwrap_err();
        assert_eq!(error, PickupError::Dependency(Dependency::Lobby));
        assert!(handle.is_closed());
    }
}
