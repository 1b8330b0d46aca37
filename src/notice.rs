use super::*;

fn list(names: &[Name]) -> String {
    match names.is_empty() {
        true => "-".to_string(),
        false => names
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Announcements the session makes to everyone following the pickup,
/// plus the occasional private warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Opened {
        team_size: usize,
        mode: GameMode,
        captain_draft: bool,
    },
    Joined {
        name: Name,
        count: usize,
        capacity: usize,
    },
    Left {
        name: Name,
        count: usize,
        capacity: usize,
    },
    Teams {
        red: Vec<Name>,
        blue: Vec<Name>,
        imbalance: Option<Imbalance>,
    },
    Captains {
        red: Name,
        blue: Name,
    },
    Turn {
        captain: Name,
        available: Vec<Name>,
    },
    Picked {
        captain: Name,
        target: Name,
        team: Team,
    },
    Replaced {
        out: Name,
        replacement: Option<Name>,
        team: Team,
        counter: Counter,
    },
    Seated {
        name: Name,
        team: Team,
    },
    Suggestion {
        red: Vec<Name>,
        blue: Vec<Name>,
        current: Imbalance,
        suggested: Imbalance,
        seconds: u64,
    },
    VotePassed(Tally),
    VoteFailed(Tally),
    VoteStale,
    Cancelled {
        reset: bool,
    },
    Completed {
        banned: Vec<(Name, BanLength)>,
    },
    Warning {
        counter: Counter,
        total: u32,
        max: u32,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Opened {
                team_size,
                mode,
                captain_draft,
            } => write!(
                f,
                "Pickup open: {}v{} {} ({}). Type !add to join.",
                team_size,
                team_size,
                mode,
                match captain_draft {
                    true => "captains pick",
                    false => "auto-balanced",
                }
            ),
            Self::Joined {
                name,
                count,
                capacity,
            } => write!(f, "{} joined the pickup [{}/{}]", name, count, capacity),
            Self::Left {
                name,
                count,
                capacity,
            } => write!(f, "{} left the pickup [{}/{}]", name, count, capacity),
            Self::Teams {
                red,
                blue,
                imbalance,
            } => {
                write!(f, "Teams set. RED: {} | BLUE: {}", list(red), list(blue))?;
                match imbalance {
                    Some(gap) => write!(f, " (skill gap {})", gap),
                    None => Ok(()),
                }
            }
            Self::Captains { red, blue } => {
                write!(f, "Captains: {} (RED) and {} (BLUE)", red, blue)
            }
            Self::Turn { captain, available } => {
                write!(f, "{} to pick: {}", captain, list(available))
            }
            Self::Picked {
                captain,
                target,
                team,
            } => write!(f, "{} picked {} for {}", captain, target, team),
            Self::Replaced {
                out,
                replacement: Some(sub),
                team,
                counter,
            } => write!(f, "{} ({}) replaced by {} on {}", out, counter, sub, team),
            Self::Replaced {
                out,
                replacement: None,
                team,
                counter,
            } => write!(
                f,
                "{} ({}) left {}; a sub is needed, type !volunteer",
                out, counter, team
            ),
            Self::Seated { name, team } => write!(f, "{} subs in for {}", name, team),
            Self::Suggestion {
                red,
                blue,
                current,
                suggested,
                seconds,
            } => write!(
                f,
                "Suggested teams RED: {} | BLUE: {} (gap {} -> {}). !vote yes/no within {}s",
                list(red),
                list(blue),
                current,
                suggested,
                seconds
            ),
            Self::VotePassed(tally) => write!(f, "Vote passed ({}); teams updated", tally),
            Self::VoteFailed(tally) => write!(f, "Vote failed ({}); teams unchanged", tally),
            Self::VoteStale => write!(f, "Vote passed but the teams changed; suggestion dropped"),
            Self::Cancelled { reset: true } => write!(f, "Pickup reset"),
            Self::Cancelled { reset: false } => write!(f, "Pickup stopped"),
            Self::Completed { banned } if banned.is_empty() => write!(f, "Pickup finished. GG!"),
            Self::Completed { banned } => write!(
                f,
                "Pickup finished. Banned: {}",
                banned
                    .iter()
                    .map(|(n, l)| format!("{} ({})", n, l))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Warning {
                counter,
                total,
                max,
            } if total > max => write!(
                f,
                "You are over the {} limit ({}/{}) and will be banned when this pickup ends",
                counter, total, max
            ),
            Self::Warning {
                counter,
                total,
                max,
            } => write!(
                f,
                "Warning: {}/{} {}s; one more and you are banned from pickups",
                total, max, counter
            ),
        }
    }
}

/// Successful results handed back to whoever issued a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Started {
        team_size: usize,
        captain_draft: bool,
        mode: GameMode,
    },
    Queued {
        name: Name,
        count: usize,
        capacity: usize,
    },
    Formed {
        red: Vec<Name>,
        blue: Vec<Name>,
        imbalance: Imbalance,
    },
    Drafting {
        red: Name,
        blue: Name,
    },
    Removed {
        name: Name,
    },
    Absent {
        name: Name,
    },
    Picked {
        target: Name,
        team: Team,
        next: Option<Name>,
    },
    Substituted {
        out: Name,
        team: Team,
        replacement: Option<Name>,
    },
    Volunteered {
        name: Name,
        seated: Option<Team>,
    },
    Suggested {
        current: Imbalance,
        suggested: Imbalance,
    },
    Voted {
        cast: Cast,
        tally: Option<Tally>,
    },
    Cancelled {
        reset: bool,
    },
    Completed(PenaltyReport),
    Unbanned {
        name: Name,
    },
    Pardoned {
        name: Name,
        counter: Counter,
        total: u32,
    },
    Retried(PenaltyReport),
    Status(Status),
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Started {
                team_size, mode, ..
            } => write!(f, "started a {}v{} {} pickup", team_size, team_size, mode),
            Self::Queued {
                count, capacity, ..
            } => write!(f, "you are in [{}/{}]", count, capacity),
            Self::Formed {
                red,
                blue,
                imbalance,
            } => write!(
                f,
                "teams formed. RED: {} | BLUE: {} (gap {})",
                list(red),
                list(blue),
                imbalance
            ),
            Self::Drafting { red, blue } => {
                write!(f, "queue full; {} and {} are captains", red, blue)
            }
            Self::Removed { name } => write!(f, "{} removed", name),
            Self::Absent { name } => write!(f, "{} was not signed up", name),
            Self::Picked {
                target,
                team,
                next: Some(next),
            } => write!(f, "{} goes to {}; {} picks next", target, team, next),
            Self::Picked {
                target,
                team,
                next: None,
            } => write!(f, "{} goes to {}; teams are full", target, team),
            Self::Substituted {
                out,
                team,
                replacement: Some(sub),
            } => write!(f, "{} replaced by {} on {}", out, sub, team),
            Self::Substituted {
                out,
                team,
                replacement: None,
            } => write!(f, "{} removed from {}; waiting for a sub", out, team),
            Self::Volunteered {
                seated: Some(team), ..
            } => write!(f, "you are now playing for {}", team),
            Self::Volunteered { seated: None, .. } => write!(f, "you are on the sub list"),
            Self::Suggested { current, suggested } => {
                write!(f, "vote opened (gap {} -> {})", current, suggested)
            }
            Self::Voted {
                cast: Cast::Accepted,
                tally: Some(tally),
            } => write!(f, "vote counted ({})", tally),
            Self::Voted {
                cast: Cast::Accepted,
                tally: None,
            } => write!(f, "vote counted"),
            Self::Voted {
                cast: Cast::AlreadyVoted,
                ..
            } => write!(f, "you already voted"),
            Self::Voted {
                cast: Cast::NotEligible,
                ..
            } => write!(f, "only players on a team may vote"),
            Self::Voted {
                cast: Cast::NoSessionOpen,
                ..
            } => write!(f, "there is no vote in progress"),
            Self::Cancelled { reset: true } => write!(f, "pickup reset"),
            Self::Cancelled { reset: false } => write!(f, "pickup stopped"),
            Self::Completed(report) => write!(
                f,
                "pickup completed; {} banned, {} penalty steps failed",
                report.banned.len(),
                report.failed
            ),
            Self::Unbanned { name } => write!(f, "{} unbanned", name),
            Self::Pardoned {
                name,
                counter,
                total,
            } => write!(f, "{} now has {} {}s", name, total, counter),
            Self::Retried(report) => write!(
                f,
                "retried penalties; {} banned, {} still failing",
                report.banned.len(),
                report.failed
            ),
            Self::Status(status) => write!(f, "{}", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn teams_render() {
        let notice = Notice::Teams {
            red: vec![Name::from("a"), Name::from("d")],
            blue: vec![Name::from("b"), Name::from("c")],
            imbalance: Some(0),
        };
        assert_eq!(
            notice.to_string(),
            "Teams set. RED: a, d | BLUE: b, c (skill gap 0)"
        );
    }
    #[test]
    fn warnings_escalate() {
        let near = Notice::Warning {
            counter: Counter::Sub,
            total: 3,
            max: 3,
        };
        let over = Notice::Warning {
            counter: Counter::Sub,
            total: 4,
            max: 3,
        };
        assert!(near.to_string().contains("one more"));
        assert!(over.to_string().contains("will be banned"));
    }
}
