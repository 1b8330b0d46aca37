use super::*;

/// Outbound text. Every player-facing message goes through here so the
/// core never touches a transport.
pub trait ChatOutput: Send + Sync {
    /// Broadcast to everyone following the pickup.
    fn say(&self, text: &str);
    /// Private message to one player.
    fn tell(&self, name: &Name, text: &str);
}
