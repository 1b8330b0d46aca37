use super::*;

/// Captain pick order for a draft.
///
/// Captains are the two highest-rated eligible players (earliest signup
/// breaks ties). The higher one captains red and picks first; turns then
/// alternate strictly until both teams are full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    red: Name,
    blue: Name,
    turn: Team,
}

impl Draft {
    /// Orders candidates best first: rating descending, unrated last,
    /// then earliest signup.
    pub fn seniority(players: &[PickupPlayer], mode: GameMode) -> Vec<&PickupPlayer> {
        let mut ranked = players.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| {
            b.skill(mode)
                .cmp(&a.skill(mode))
                .then_with(|| a.signup().cmp(&b.signup()))
                .then_with(|| a.name().cmp(b.name()))
        });
        ranked
    }
    pub fn new(red: Name, blue: Name) -> Self {
        Self {
            red,
            blue,
            turn: Team::Red,
        }
    }
    pub fn captain(&self, team: Team) -> &Name {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
    pub fn turn(&self) -> Team {
        self.turn
    }
    /// Captain whose pick it is.
    pub fn picker(&self) -> &Name {
        self.captain(self.turn)
    }
    pub fn team_of(&self, captain: &Name) -> Option<Team> {
        match captain {
            c if c == &self.red => Some(Team::Red),
            c if c == &self.blue => Some(Team::Blue),
            _ => None,
        }
    }
    /// Checks that `captain` may pick now.
    pub fn authorize(&self, captain: &Name) -> Result<Team, PickupError> {
        match self.team_of(captain) {
            None => Err(Ineligible::NotCaptain(captain.clone()).into()),
            Some(team) if team != self.turn => Err(Ineligible::WrongTurn {
                captain: captain.clone(),
                turn: self.picker().clone(),
            }
            .into()),
            Some(team) => Ok(team),
        }
    }
    pub fn advance(&mut self) {
        self.turn = self.turn.other();
    }
}
