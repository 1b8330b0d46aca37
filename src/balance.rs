use super::*;

/// Balancer input: a player and their rating for the active mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rated {
    pub name: Name,
    pub skill: Option<Skill>,
}

impl Rated {
    pub fn new(name: Name, skill: Option<Skill>) -> Self {
        Self { name, skill }
    }
}

impl From<(&str, Skill)> for Rated {
    fn from((name, skill): (&str, Skill)) -> Self {
        Self::new(Name::from(name), Some(skill))
    }
}

impl Arbitrary for Rated {
    fn random() -> Self {
        Self::new(
            Name::from(format!("p{:08x}", rand::random::<u32>())),
            Some(rand::random_range(800..2400)),
        )
    }
}

/// Precondition violations. The balancer never guesses a missing rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unbalanceable {
    WrongSize { expected: usize, found: usize },
    TooLarge(usize),
    Unrated(Name),
    Duplicate(Name),
}

impl std::fmt::Display for Unbalanceable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::WrongSize { expected, found } => {
                write!(f, "need {} players to balance, found {}", expected, found)
            }
            Self::TooLarge(n) => write!(f, "teams of {} are too large to search", n),
            Self::Unrated(name) => write!(f, "{} has no rating", name),
            Self::Duplicate(name) => write!(f, "{} appears twice", name),
        }
    }
}

impl std::error::Error for Unbalanceable {}

/// Two equal-size teams and the skill gap between them.
/// Both sides are sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceResult {
    red: Vec<(Name, Skill)>,
    blue: Vec<(Name, Skill)>,
    imbalance: Imbalance,
}

impl BalanceResult {
    pub fn red(&self) -> &[(Name, Skill)] {
        &self.red
    }
    pub fn blue(&self) -> &[(Name, Skill)] {
        &self.blue
    }
    pub fn side(&self, team: Team) -> &[(Name, Skill)] {
        match team {
            Team::Red => self.red(),
            Team::Blue => self.blue(),
        }
    }
    pub fn imbalance(&self) -> Imbalance {
        self.imbalance
    }
    pub fn sum(&self, team: Team) -> i64 {
        self.side(team).iter().map(|(_, s)| *s as i64).sum()
    }
    pub fn names(&self, team: Team) -> Vec<Name> {
        self.side(team).iter().map(|(n, _)| n.clone()).collect()
    }
    pub fn team_of(&self, name: &Name) -> Option<Team> {
        [Team::Red, Team::Blue]
            .into_iter()
            .find(|t| self.side(*t).iter().any(|(n, _)| n == name))
    }
}

/// Exhaustive minimum-imbalance partitioner.
///
/// With at most 16 players there are at most C(16, 8) = 12870 candidate red
/// teams, so every equal-size split is scored and the true optimum is
/// returned. Among optimal splits the one whose sorted red name list is
/// lexicographically smallest wins, which makes the answer canonical and
/// independent of input order.
pub struct TeamBalancer;

impl TeamBalancer {
    pub fn balance(players: &[Rated], team_size: usize) -> Result<BalanceResult, Unbalanceable> {
        if team_size > MAX_TEAM_SIZE {
            return Err(Unbalanceable::TooLarge(team_size));
        }
        if players.len() != 2 * team_size || team_size == 0 {
            return Err(Unbalanceable::WrongSize {
                expected: 2 * team_size,
                found: players.len(),
            });
        }
        let mut rated = players
            .iter()
            .map(|p| match p.skill {
                Some(skill) => Ok((p.name.clone(), skill)),
                None => Err(Unbalanceable::Unrated(p.name.clone())),
            })
            .collect::<Result<Vec<(Name, Skill)>, _>>()?;
        rated.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = rated.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(Unbalanceable::Duplicate(pair[0].0.clone()));
        }
        let total = rated.iter().map(|(_, s)| *s as i64).sum::<i64>();
        let best = Subsets::new(rated.len(), team_size)
            .map(|mask| (Self::gap(&rated, mask, total), mask))
            .reduce(|best, next| match next.0.cmp(&best.0) {
                std::cmp::Ordering::Less => next,
                std::cmp::Ordering::Greater => best,
                std::cmp::Ordering::Equal if Self::precedes(next.1, best.1) => next,
                std::cmp::Ordering::Equal => best,
            })
            .map(|(_, mask)| mask)
            .expect("at least one subset");
        let (red, blue) = rated
            .into_iter()
            .enumerate()
            .partition::<Vec<_>, _>(|(i, _)| best & (1 << i) != 0);
        let red = red.into_iter().map(|(_, p)| p).collect::<Vec<_>>();
        let blue = blue.into_iter().map(|(_, p)| p).collect::<Vec<_>>();
        let imbalance = Self::gap_of(&red, &blue);
        log::debug!(
            "[balance] {} vs {} (gap {})",
            red.iter().map(|(n, _)| n.to_string()).collect::<Vec<_>>().join(","),
            blue.iter().map(|(n, _)| n.to_string()).collect::<Vec<_>>().join(","),
            imbalance
        );
        Ok(BalanceResult {
            red,
            blue,
            imbalance,
        })
    }

    /// |sum(red) - sum(blue)| where red is the masked subset.
    fn gap(rated: &[(Name, Skill)], mask: u32, total: i64) -> Imbalance {
        let red = rated
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, (_, s))| *s as i64)
            .sum::<i64>();
        (2 * red - total).unsigned_abs()
    }

    fn gap_of(red: &[(Name, Skill)], blue: &[(Name, Skill)]) -> Imbalance {
        let r = red.iter().map(|(_, s)| *s as i64).sum::<i64>();
        let b = blue.iter().map(|(_, s)| *s as i64).sum::<i64>();
        (r - b).unsigned_abs()
    }

    /// Lexicographic comparison of the index lists encoded by two masks.
    /// Indices follow name order, so this orders the red name lists.
    fn precedes(a: u32, b: u32) -> bool {
        Bits(a).lt(Bits(b))
    }
}

/// Ascending positions of the set bits of a mask.
struct Bits(u32);

impl Iterator for Bits {
    type Item = u32;
    fn next(&mut self) -> Option<u32> {
        match self.0 {
            0 => None,
            m => {
                let i = m.trailing_zeros();
                self.0 = m & (m - 1);
                Some(i)
            }
        }
    }
}

/// Every k-element subset of {0..n} as a bitmask (Gosper's hack).
struct Subsets {
    next: Option<u32>,
    limit: u32,
}

impl Subsets {
    fn new(n: usize, k: usize) -> Self {
        Self {
            next: Some((1u32 << k) - 1),
            limit: 1u32 << n,
        }
    }
}

impl Iterator for Subsets {
    type Item = u32;
    fn next(&mut self) -> Option<u32> {
        let mask = self.next.filter(|m| *m < self.limit)?;
        let low = mask & mask.wrapping_neg();
        let ripple = mask + low;
        self.next = Some((((ripple ^ mask) >> 2) / low) | ripple);
        Some(mask)
    }
}
