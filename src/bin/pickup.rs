//! Pickup Console Binary
//!
//! Runs the pickup lobby against in-memory collaborators and reads
//! chat lines from stdin, one per line:
//!
//! - `name: !command args` — a chat command from `name`
//! - `+name [skill]` / `-name` — connect or disconnect a player
//! - `mode <mode>` — switch the server's game mode

use clap::Parser;
use colored::Colorize;
use pickup::memory::*;
use pickup::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Game mode the simulated server starts in
    #[arg(long, default_value = "ctf")]
    mode: String,
}

/// Prints broadcasts and private messages to the terminal.
struct Console;

impl ChatOutput for Console {
    fn say(&self, text: &str) {
        println!("{} {}", "[pickup]".green().bold(), text);
    }
    fn tell(&self, name: &Name, text: &str) {
        println!("{} {}", format!("[-> {}]", name).cyan(), text.dimmed());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    kys();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let clock = Arc::new(SystemClock);
    let roster = Arc::new(MemoryRoster::new(GameMode::try_from(args.mode.as_str())?));
    let ledger = Arc::new(MemoryLedger::new(clock.clone()));
    let chat = Arc::new(Console);
    let services = Services {
        roster: roster.clone(),
        ledger: ledger.clone(),
        bans: ledger,
        chat: chat.clone(),
        clock,
    };
    let authority = Arc::new(ConfigAuthority::new(&config));
    let lobby = Lobby::spawn(config, services);
    let gateway = PickupGateway::new(lobby.clone(), authority, chat);
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            _ => {}
        }
        if let Some(rest) = line.strip_prefix('+') {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next().map(str::parse::<Skill>)) {
                (Some(name), Some(Ok(skill))) => roster.connect(name, skill),
                (Some(name), None) => roster.connect_unrated(name),
                _ => eprintln!("usage: +name [skill]"),
            }
        } else if let Some(name) = line.strip_prefix('-') {
            if !roster.disconnect(name.trim()) {
                eprintln!("{} is not connected", name.trim());
            }
        } else if let Some(mode) = line.strip_prefix("mode ") {
            match GameMode::try_from(mode.trim()) {
                Ok(mode) => roster.set_mode(mode),
                Err(e) => eprintln!("{}", e),
            }
        } else if let Some((name, text)) = line.split_once(':') {
            gateway.handle(&Name::from(name), text).await;
        } else {
            eprintln!("expected `name: command`");
        }
    }
    lobby.shutdown();
    Ok(())
}
