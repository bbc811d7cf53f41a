use std::collections::{HashMap, HashSet};

use teloxide::types::UserId;

use super::types::{Gender, Participant, Registration, SeatNumber, SessionError};

/// Participants of one evening, split into halves and numbered.
///
/// Both halves always have the same, nonzero, length.
#[derive(Debug, Clone)]
pub struct Roster {
    women: Vec<Participant>,
    men: Vec<Participant>,
    by_identity: HashMap<UserId, (Gender, usize)>,
    by_seat: HashMap<SeatNumber, UserId>,
}

/// Result of [`Roster::build`].
#[derive(Debug, Clone)]
pub struct RosterBuild {
    pub roster: Roster,
    /// Registrations that didn't get a seat because their half had more
    /// people than the other one. In registration order.
    pub unseated: Vec<Registration>,
    /// Distinct people per half, counting the unseated ones.
    pub women: usize,
    pub men: usize,
}

/// Distinct women and men among `registrations`, the way
/// [`Roster::build`] counts them.
#[must_use]
pub fn count_halves(registrations: &[Registration]) -> (usize, usize) {
    let mut seen = HashSet::new();
    registrations
        .iter()
        .filter(|r| seen.insert(r.identity))
        .fold((0, 0), |(women, men), r| match r.gender {
            Gender::Woman => (women + 1, men),
            Gender::Man => (women, men + 1),
        })
}

impl Roster {
    /// Seat the registrations: the `i`-th woman gets seat `2i+1`, the `i`-th
    /// man gets seat `2i+2`, in registration order.
    ///
    /// If one half is larger, its extra people (the ones who registered
    /// last) are not seated and returned in [`RosterBuild::unseated`].
    /// Repeated registrations of the same person are ignored.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if either half ends up empty.
    pub fn build(
        registrations: impl IntoIterator<Item = Registration>,
    ) -> Result<RosterBuild, SessionError> {
        let mut women = Vec::new();
        let mut men = Vec::new();
        let mut seen = HashSet::new();

        for registration in registrations {
            if !seen.insert(registration.identity) {
                log::debug!(
                    "Skipping repeated registration of user {}",
                    registration.identity
                );
                continue;
            }
            match registration.gender {
                Gender::Woman => women.push(registration),
                Gender::Man => men.push(registration),
            }
        }

        let (women_count, men_count) = (women.len(), men.len());
        let pairs = women_count.min(men_count);
        if pairs == 0 {
            return Err(SessionError::NoParticipants);
        }

        let extra_women = women.split_off(pairs);
        let extra_men = men.split_off(pairs);

        let mut roster = Roster {
            women: Vec::with_capacity(pairs),
            men: Vec::with_capacity(pairs),
            by_identity: HashMap::with_capacity(pairs * 2),
            by_seat: HashMap::with_capacity(pairs * 2),
        };

        for (index, (woman, man)) in women.into_iter().zip(men).enumerate() {
            roster.seat(woman, index);
            roster.seat(man, index);
        }

        let mut unseated = extra_women;
        unseated.extend(extra_men);

        Ok(RosterBuild {
            roster,
            unseated,
            women: women_count,
            men: men_count,
        })
    }

    fn seat(&mut self, registration: Registration, index: usize) {
        let gender = registration.gender;
        let seat = SeatNumber::for_index(gender, index);

        self.by_identity
            .insert(registration.identity, (gender, index));
        self.by_seat.insert(seat, registration.identity);

        let participant = Participant::seated(registration, seat);
        match gender {
            Gender::Woman => self.women.push(participant),
            Gender::Man => self.men.push(participant),
        }
    }

    /// Amount of pairs, i.e. length of either half.
    #[must_use]
    pub fn pairs(&self) -> usize {
        self.women.len()
    }

    /// Total amount of seated participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.women.len() + self.men.len()
    }

    #[must_use]
    pub fn half(&self, gender: Gender) -> &[Participant] {
        match gender {
            Gender::Woman => &self.women,
            Gender::Man => &self.men,
        }
    }

    #[must_use]
    pub fn get(&self, identity: UserId) -> Option<&Participant> {
        let (gender, index) = self.position(identity)?;
        self.half(gender).get(index)
    }

    #[must_use]
    pub fn by_seat(&self, seat: SeatNumber) -> Option<&Participant> {
        self.by_seat
            .get(&seat)
            .and_then(|identity| self.get(*identity))
    }

    /// Half and index within that half of a seated participant.
    #[must_use]
    pub fn position(&self, identity: UserId) -> Option<(Gender, usize)> {
        self.by_identity.get(&identity).copied()
    }

    /// Everyone, in seat number order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.women
            .iter()
            .zip(&self.men)
            .flat_map(|(woman, man)| [woman, man])
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    /// Makes a registration with user id `id`, named like "W100" or "M200".
    pub fn registration(id: u64, gender: Gender) -> Registration {
        Registration {
            identity: UserId(id),
            gender,
            display_name: format!("{}{id}", gender.letter()),
            contact_handle: Some(format!("user{id}")),
        }
    }

    /// `women` women with ids 100.., `men` men with ids 200.., registered
    /// alternately as long as both halves last.
    pub fn registrations(women: u64, men: u64) -> Vec<Registration> {
        let mut output = Vec::new();
        for i in 0..women.max(men) {
            if i < women {
                output.push(registration(100 + i, Gender::Woman));
            }
            if i < men {
                output.push(registration(200 + i, Gender::Man));
            }
        }
        output
    }

    fn seats_of(roster: &Roster) -> Vec<(u64, u32)> {
        roster
            .iter()
            .map(|p| (p.identity().0, p.seat_number().0))
            .collect()
    }

    #[test]
    fn seats_follow_registration_order() {
        // Men registered first and out of id order; seats don't care.
        let registrations = vec![
            registration(203, Gender::Man),
            registration(201, Gender::Man),
            registration(102, Gender::Woman),
            registration(101, Gender::Woman),
        ];

        let first = Roster::build(registrations.clone()).unwrap();
        let second = Roster::build(registrations).unwrap();

        let expected = vec![(102, 1), (203, 2), (101, 3), (201, 4)];
        assert_eq!(seats_of(&first.roster), expected);
        assert_eq!(seats_of(&second.roster), expected);
        assert!(first.unseated.is_empty());
    }

    #[test]
    fn lookups_agree() {
        let RosterBuild { roster, .. } = Roster::build(registrations(3, 3)).unwrap();
        assert_eq!(roster.pairs(), 3);
        assert_eq!(roster.len(), 6);

        for participant in roster.iter() {
            let by_seat = roster.by_seat(participant.seat_number()).unwrap();
            assert_eq!(by_seat, participant);
            let by_identity = roster.get(participant.identity()).unwrap();
            assert_eq!(by_identity, participant);
            assert_eq!(participant.seat_number().gender(), participant.gender());
        }

        assert!(roster.by_seat(SeatNumber(7)).is_none());
        assert!(roster.get(UserId(999)).is_none());
    }

    #[test]
    fn excess_is_left_unseated() {
        let RosterBuild {
            roster,
            unseated,
            women,
            men,
        } = Roster::build(registrations(4, 2)).unwrap();

        assert_eq!((women, men), (4, 2));

        assert_eq!(roster.pairs(), 2);
        assert_eq!(seats_of(&roster), vec![(100, 1), (200, 2), (101, 3), (201, 4)]);

        // The two women who registered last.
        let unseated: Vec<u64> = unseated.iter().map(|r| r.identity.0).collect();
        assert_eq!(unseated, vec![102, 103]);
    }

    #[test]
    fn repeated_registrations_count_once() {
        let mut registrations = registrations(2, 2);
        registrations.push(registration(100, Gender::Woman));
        let build = Roster::build(registrations).unwrap();
        assert_eq!(build.roster.len(), 4);
        assert!(build.unseated.is_empty());
        assert_eq!((build.women, build.men), (2, 2));
    }

    #[test]
    fn halves_are_counted_once_per_person() {
        let mut registrations = registrations(3, 1);
        registrations.push(registration(200, Gender::Man));
        registrations.push(registration(102, Gender::Woman));
        assert_eq!(count_halves(&registrations), (3, 1));
        assert_eq!(count_halves(&[]), (0, 0));
    }

    #[test]
    fn degenerate_rosters_are_refused() {
        assert_eq!(
            Roster::build(Vec::new()).unwrap_err(),
            SessionError::NoParticipants
        );
        assert_eq!(
            Roster::build(registrations(3, 0)).unwrap_err(),
            SessionError::NoParticipants
        );
        assert_eq!(
            Roster::build(registrations(0, 1)).unwrap_err(),
            SessionError::NoParticipants
        );
    }
}
