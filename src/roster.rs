use super::*;
use std::collections::HashMap;

/// What the game server knows about a connected player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presence {
    pub skills: HashMap<GameMode, Skill>,
}

/// Read-only view of the players currently connected to the game server.
/// Implementations may be backed by a remote rating service; any failure
/// is reported rather than answered with an empty roster.
pub trait RosterStore: Send + Sync {
    /// Snapshot of every connected player.
    fn current_players(&self) -> anyhow::Result<HashMap<Name, Presence>>;
    /// Game mode the server is currently running.
    fn game_mode(&self) -> anyhow::Result<GameMode>;
    /// Single-player lookup; defaults to filtering the full snapshot.
    fn presence(&self, name: &Name) -> anyhow::Result<Option<Presence>> {
        Ok(self.current_players()?.remove(name))
    }
}
