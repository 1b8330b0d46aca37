use super::*;
use clap::Parser;
use std::collections::HashSet;
use std::sync::Arc;

/// Decides who may run privileged pickup commands.
pub trait Authority: Send + Sync {
    fn is_privileged(&self, name: &Name) -> bool;
}

/// Admins listed in the configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigAuthority {
    admins: HashSet<Name>,
}

impl ConfigAuthority {
    pub fn new(config: &Config) -> Self {
        Self {
            admins: config.admins.iter().cloned().collect(),
        }
    }
}

impl Authority for ConfigAuthority {
    fn is_privileged(&self, name: &Name) -> bool {
        self.admins.contains(name)
    }
}

#[derive(Parser, Debug, PartialEq)]
#[command(name = "pickup", about = "Pickup game commands", disable_version_flag = true)]
pub enum Command {
    #[command(about = "Join the pickup queue", alias = "join")]
    Add,
    #[command(about = "Leave the queue or the sub list", alias = "leave")]
    Remove {
        player: Option<String>,
    },
    #[command(about = "Pick a queued player for your team (captains)", alias = "p")]
    Pick {
        #[arg(required = true)]
        player: String,
    },
    #[command(about = "Ask to be replaced by a sub")]
    Sub,
    #[command(about = "Offer to sub in", alias = "vol")]
    Volunteer,
    #[command(name = "noshow", about = "Report a player who did not show up", alias = "ns")]
    NoShow {
        #[arg(required = true)]
        player: String,
    },
    #[command(about = "Open a pickup queue")]
    Start {
        size: Option<usize>,
        #[arg(long, conflicts_with = "balanced")]
        captains: bool,
        #[arg(long)]
        balanced: bool,
    },
    #[command(about = "Cancel the current pickup")]
    Stop,
    #[command(about = "Clear the current pickup")]
    Reset,
    #[command(about = "Mark the match finished and apply penalties", alias = "complete")]
    End,
    #[command(about = "Lift a pickup ban")]
    Unban {
        #[arg(required = true)]
        player: String,
    },
    #[command(about = "Forgive one no-show or sub strike")]
    Pardon {
        #[arg(required = true)]
        player: String,
        #[arg(required = true)]
        counter: String,
    },
    #[command(about = "Propose balanced teams and open a vote", alias = "balance")]
    Suggest,
    #[command(about = "Vote on the team suggestion")]
    Vote {
        #[arg(required = true)]
        choice: String,
    },
    #[command(about = "Show the pickup", alias = "who")]
    Status,
    #[command(about = "Retry failed penalty steps")]
    Retry,
}

impl Command {
    pub fn privileged(&self) -> bool {
        matches!(
            self,
            Self::NoShow { .. }
                | Self::Start { .. }
                | Self::Stop
                | Self::Reset
                | Self::End
                | Self::Unban { .. }
                | Self::Pardon { .. }
                | Self::Retry
        )
    }
}

/// Turns chat lines into lobby requests and replies to the sender.
///
/// Lines may carry a leading `!`. Parse failures, authorization failures
/// and session errors are all answered privately; broadcasts come from
/// the session itself.
pub struct PickupGateway {
    lobby: LobbyHandle,
    authority: Arc<dyn Authority>,
    chat: Arc<dyn ChatOutput>,
}

impl PickupGateway {
    pub fn new(lobby: LobbyHandle, authority: Arc<dyn Authority>, chat: Arc<dyn ChatOutput>) -> Self {
        Self {
            lobby,
            authority,
            chat,
        }
    }

    /// Handles one chat line from `actor` and returns what was told to them.
    pub async fn handle(&self, actor: &Name, line: &str) -> String {
        let text = match self.dispatch(actor, line).await {
            Ok(reply) => reply.to_string(),
            Err(e) => e,
        };
        self.chat.tell(actor, &text);
        text
    }

    async fn dispatch(&self, actor: &Name, line: &str) -> Result<Reply, String> {
        let line = line.trim().trim_start_matches('!');
        let command = Command::try_parse_from(std::iter::once("!").chain(line.split_whitespace()))
            .map_err(|e| match e.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    e.render().to_string()
                }
                _ => e
                    .render()
                    .to_string()
                    .lines()
                    .next()
                    .unwrap_or("unknown command")
                    .trim_start_matches("error: ")
                    .to_string(),
            })?;
        let request = self.authorize(actor, command)?;
        log::debug!("[gateway] {} -> {:?}", actor, request);
        self.lobby.send(request).await.map_err(|e| e.to_string())
    }

    fn authorize(&self, actor: &Name, command: Command) -> Result<Request, String> {
        let elevated = self.authority.is_privileged(actor);
        if command.privileged() && !elevated {
            log::info!("[gateway] {} denied {:?}", actor, command);
            return Err(PickupError::from(Ineligible::Unauthorized(actor.clone())).to_string());
        }
        Ok(match command {
            Command::Add => Request::SignUp(actor.clone()),
            Command::Remove { player: None } => Request::Remove(actor.clone()),
            Command::Remove {
                player: Some(player),
            } => {
                let target = Name::from(player);
                if &target != actor && !elevated {
                    return Err(PickupError::from(Ineligible::Unauthorized(actor.clone())).to_string());
                }
                Request::Remove(target)
            }
            Command::Pick { player } => Request::Pick {
                captain: actor.clone(),
                target: Name::from(player),
            },
            Command::Sub => Request::RequestSub(actor.clone()),
            Command::Volunteer => Request::Volunteer(actor.clone()),
            Command::NoShow { player } => Request::NoShow(Name::from(player)),
            Command::Start {
                size,
                captains,
                balanced,
            } => Request::Start {
                team_size: size,
                captain_draft: match (captains, balanced) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            },
            Command::Stop => Request::Stop,
            Command::Reset => Request::Reset,
            Command::End => Request::Complete,
            Command::Unban { player } => Request::Unban(Name::from(player)),
            Command::Pardon { player, counter } => Request::Pardon(
                Name::from(player),
                Counter::try_from(counter.as_str()).map_err(|e| e.to_string())?,
            ),
            Command::Suggest => Request::Suggest(actor.clone()),
            Command::Vote { choice } => Request::Vote(
                actor.clone(),
                Choice::try_from(choice.as_str()).map_err(|e| e.to_string())?,
            ),
            Command::Status => Request::Status,
            Command::Retry => Request::RetryPenalties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::*;

    fn parse(line: &str) -> Command {
        Command::try_parse_from(std::iter::once("!").chain(line.split_whitespace())).unwrap()
    }

    fn gateway() -> (Arc<MemoryRoster>, Arc<Transcript>, PickupGateway) {
        let clock = Arc::new(FixedClock::epoch());
        let roster = Arc::new(MemoryRoster::new(GameMode::Ctf));
        let ledger = Arc::new(MemoryLedger::new(clock.clone()));
        let chat = Arc::new(Transcript::default());
        let config = Config {
            admins: vec![Name::from("Admin")],
            ..Config::default()
        };
        let services = Services {
            roster: roster.clone(),
            ledger: ledger.clone(),
            bans: ledger,
            chat: chat.clone(),
            clock,
        };
        let authority = Arc::new(ConfigAuthority::new(&config));
        let lobby = Lobby::spawn(config, services);
        let gateway = PickupGateway::new(lobby, authority, chat.clone());
        (roster, chat, gateway)
    }

    #[test]
    fn grammar() {
        assert_eq!(
            parse("start 3 --captains"),
            Command::Start {
                size: Some(3),
                captains: true,
                balanced: false,
            }
        );
        assert_eq!(parse("join"), Command::Add);
        assert_eq!(
            parse("ns visor"),
            Command::NoShow {
                player: "visor".to_string()
            }
        );
        assert!(parse("end").privileged());
        assert!(!parse("vote yes").privileged());
        assert!(Command::try_parse_from(["!", "start", "--captains", "--balanced"]).is_err());
    }

    #[tokio::test]
    async fn privileged_commands_need_an_admin() {
        let (_, chat, gateway) = gateway();
        let doom = Name::from("doom");
        let text = gateway.handle(&doom, "!start 2").await;
        assert!(text.contains("may not"));
        assert_eq!(chat.told(&doom), vec![text]);
        let text = gateway.handle(&Name::from("admin"), "!start 2").await;
        assert_eq!(text, "started a 2v2 ctf pickup");
    }

    #[tokio::test]
    async fn players_join_and_leave_themselves_only() {
        let (roster, _, gateway) = gateway();
        gateway.handle(&Name::from("admin"), "start 2").await;
        roster.connect("sarge", 1500);
        roster.connect("keel", 1400);
        let sarge = Name::from("sarge");
        assert_eq!(gateway.handle(&sarge, "!add").await, "you are in [1/4]");
        assert!(gateway.handle(&sarge, "!add").await.contains("already in the pickup"));
        gateway.handle(&Name::from("keel"), "add").await;
        assert!(gateway.handle(&sarge, "remove keel").await.contains("may not"));
        assert_eq!(gateway.handle(&Name::from("admin"), "remove keel").await, "keel removed");
        assert_eq!(gateway.handle(&sarge, "leave").await, "sarge removed");
    }

    #[tokio::test]
    async fn bad_input_is_explained() {
        let (_, _, gateway) = gateway();
        let someone = Name::from("someone");
        assert!(!gateway.handle(&someone, "!dance").await.is_empty());
        assert_eq!(gateway.handle(&someone, "vote maybe").await, "not a vote: maybe");
        assert_eq!(
            gateway.handle(&someone, "vote yes").await,
            "there is no vote in progress"
        );
        assert!(gateway.handle(&someone, "status").await.starts_with("idle"));
    }
}
