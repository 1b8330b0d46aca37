use super::*;
use std::collections::VecDeque;

/// Where a player currently sits in the pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Queue,
    Team(Team),
    Sub,
}

/// The four disjoint player sets of a pickup, plus open team seats.
///
/// A name appears in at most one of queue, red, blue and subs; every
/// insertion goes through [`Lineup::admit`] which refuses duplicates.
#[derive(Debug, Clone, Default)]
pub struct Lineup {
    queue: Vec<PickupPlayer>,
    red: Vec<PickupPlayer>,
    blue: Vec<PickupPlayer>,
    subs: Vec<PickupPlayer>,
    vacancies: VecDeque<Team>,
}

impl Lineup {
    pub fn locate(&self, name: &Name) -> Option<Slot> {
        let has = |set: &[PickupPlayer]| set.iter().any(|p| p.name() == name);
        [
            (Slot::Queue, &self.queue),
            (Slot::Team(Team::Red), &self.red),
            (Slot::Team(Team::Blue), &self.blue),
            (Slot::Sub, &self.subs),
        ]
        .into_iter()
        .find(|(_, set)| has(set.as_slice()))
        .map(|(slot, _)| slot)
    }
    pub fn contains(&self, name: &Name) -> bool {
        self.locate(name).is_some()
    }
    pub fn queue(&self) -> &[PickupPlayer] {
        &self.queue
    }
    pub fn team(&self, team: Team) -> &[PickupPlayer] {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
    pub fn subs(&self) -> &[PickupPlayer] {
        &self.subs
    }
    pub fn vacancies(&self) -> &VecDeque<Team> {
        &self.vacancies
    }
    pub fn player(&self, name: &Name) -> Option<&PickupPlayer> {
        self.queue
            .iter()
            .chain(self.red.iter())
            .chain(self.blue.iter())
            .chain(self.subs.iter())
            .find(|p| p.name() == name)
    }
    pub fn captain(&self, team: Team) -> Option<&PickupPlayer> {
        self.team(team).iter().find(|p| p.is_captain())
    }
    /// Everyone currently on red or blue.
    pub fn fielded(&self) -> impl Iterator<Item = &PickupPlayer> {
        self.red.iter().chain(self.blue.iter())
    }
    pub fn is_full(&self, team_size: usize) -> bool {
        self.red.len() == team_size && self.blue.len() == team_size
    }

    /// Inserts a player into a set. Refuses names already present anywhere.
    pub fn admit(&mut self, slot: Slot, player: PickupPlayer) -> bool {
        if self.contains(player.name()) {
            log::warn!("[lineup] refused duplicate {}", player.name());
            return false;
        }
        self.set_mut(slot).push(player);
        true
    }
    /// Removes a player from whichever set holds them.
    pub fn release(&mut self, name: &Name) -> Option<(Slot, PickupPlayer)> {
        let slot = self.locate(name)?;
        let set = self.set_mut(slot);
        let index = set.iter().position(|p| p.name() == name)?;
        Some((slot, set.remove(index)))
    }
    /// Moves a queued player onto a team.
    pub fn draft(&mut self, name: &Name, team: Team) -> Option<&PickupPlayer> {
        match self.locate(name) {
            Some(Slot::Queue) => {
                let (_, player) = self.release(name)?;
                self.set_mut(Slot::Team(team)).push(player);
                self.team(team).last()
            }
            _ => None,
        }
    }
    /// Replaces both teams, pulling players from wherever they are now.
    /// Names that are not in the lineup are ignored.
    pub fn assign(&mut self, red: &[Name], blue: &[Name]) {
        for (team, names) in [(Team::Red, red), (Team::Blue, blue)] {
            for name in names {
                if let Some((_, mut player)) = self.release(name) {
                    player.set_captain(false);
                    self.set_mut(Slot::Team(team)).push(player);
                }
            }
        }
    }
    pub fn set_captain(&mut self, name: &Name, captain: bool) {
        for set in [&mut self.queue, &mut self.red, &mut self.blue] {
            set.iter_mut()
                .filter(|p| p.name() == name)
                .for_each(|p| p.set_captain(captain));
        }
    }
    pub fn open_vacancy(&mut self, team: Team) {
        self.vacancies.push_back(team);
    }
    /// Seats the longest-waiting substitute in the oldest vacancy.
    pub fn fill_vacancy(&mut self) -> Option<(Team, Name)> {
        if self.subs.is_empty() {
            return None;
        }
        let team = self.vacancies.pop_front()?;
        let player = self.subs.remove(0);
        let name = player.name().clone();
        self.set_mut(Slot::Team(team)).push(player);
        Some((team, name))
    }
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_mut(&mut self, slot: Slot) -> &mut Vec<PickupPlayer> {
        match slot {
            Slot::Queue => &mut self.queue,
            Slot::Team(Team::Red) => &mut self.red,
            Slot::Team(Team::Blue) => &mut self.blue,
            Slot::Sub => &mut self.subs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::SystemTime;

    fn player(name: &str) -> PickupPlayer {
        PickupPlayer::new(Name::from(name), HashMap::new(), SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn sets_stay_disjoint() {
        let mut lineup = Lineup::default();
        assert!(lineup.admit(Slot::Queue, player("a")));
        assert!(!lineup.admit(Slot::Sub, player("A")));
        assert!(lineup.draft(&Name::from("a"), Team::Red).is_some());
        assert_eq!(lineup.locate(&Name::from("a")), Some(Slot::Team(Team::Red)));
        assert!(lineup.queue().is_empty());
        assert!(!lineup.admit(Slot::Queue, player("a")));
    }
    #[test]
    fn draft_requires_queue() {
        let mut lineup = Lineup::default();
        lineup.admit(Slot::Sub, player("s"));
        assert!(lineup.draft(&Name::from("s"), Team::Blue).is_none());
        assert!(lineup.draft(&Name::from("ghost"), Team::Blue).is_none());
        assert_eq!(lineup.locate(&Name::from("s")), Some(Slot::Sub));
    }
    #[test]
    fn vacancies_fill_in_order() {
        let mut lineup = Lineup::default();
        lineup.open_vacancy(Team::Blue);
        lineup.open_vacancy(Team::Red);
        assert_eq!(lineup.fill_vacancy(), None);
        assert_eq!(lineup.vacancies().len(), 2);
        lineup.admit(Slot::Sub, player("s1"));
        lineup.admit(Slot::Sub, player("s2"));
        assert_eq!(lineup.fill_vacancy(), Some((Team::Blue, Name::from("s1"))));
        assert_eq!(lineup.fill_vacancy(), Some((Team::Red, Name::from("s2"))));
        assert_eq!(lineup.fill_vacancy(), None);
    }
    #[test]
    fn assign_moves_and_clears_captains() {
        let mut lineup = Lineup::default();
        for name in ["a", "b", "c", "d"] {
            lineup.admit(Slot::Queue, player(name));
        }
        lineup.set_captain(&Name::from("a"), true);
        lineup.draft(&Name::from("a"), Team::Red);
        lineup.draft(&Name::from("b"), Team::Red);
        lineup.draft(&Name::from("c"), Team::Blue);
        lineup.draft(&Name::from("d"), Team::Blue);
        lineup.assign(
            &[Name::from("a"), Name::from("c")],
            &[Name::from("b"), Name::from("d")],
        );
        assert_eq!(lineup.locate(&Name::from("c")), Some(Slot::Team(Team::Red)));
        assert_eq!(lineup.locate(&Name::from("b")), Some(Slot::Team(Team::Blue)));
        assert!(lineup.captain(Team::Red).is_none());
        assert!(lineup.is_full(2));
    }
}
