use std::collections::BTreeSet;

use teloxide::types::UserId;

use super::{
    ledger::VoteLedger,
    matching,
    roster::Roster,
    schedule,
    types::{Match, Pairing, Participant, SeatNumber, SessionError},
};

/// One live speed dating evening: who sits where, which round it is, who
/// liked whom, and which matches were already announced.
///
/// Made fresh for every roster load; nothing carries over between evenings.
#[derive(Debug, Clone)]
pub struct DatingSession {
    event_id: i64,
    roster: Roster,
    /// 0 until the first round is started.
    round: u32,
    ledger: VoteLedger,
    announced: BTreeSet<(SeatNumber, SeatNumber)>,
}

/// Seating of one round.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub round: u32,
    pub pairings: Vec<Pairing>,
    /// No rounds after this one would bring new people together.
    pub is_last: bool,
}

/// Result of [`DatingSession::advance_round`].
#[derive(Debug, Clone)]
pub enum RoundAdvance {
    Started(RoundPlan),
    /// Everyone has already met everyone; nothing was changed.
    Finished { last_round: u32 },
}

/// Result of [`DatingSession::resolve_matches`].
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Every mutual like as of now.
    pub matches: Vec<Match>,
    /// The part of `matches` that wasn't announced by a previous resolution.
    pub newly_announced: Vec<Match>,
}

impl DatingSession {
    #[must_use]
    pub fn new(event_id: i64, roster: Roster) -> Self {
        DatingSession {
            event_id,
            roster,
            round: 0,
            ledger: VoteLedger::default(),
            announced: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn event_id(&self) -> i64 {
        self.event_id
    }
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    /// Current round, or 0 if the first one wasn't started.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// True once every woman has sat with every man.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.round > 0 && schedule::is_finished(self.round, self.roster.pairs())
    }

    fn plan(&self) -> RoundPlan {
        RoundPlan {
            round: self.round,
            pairings: schedule::pairings(&self.roster, self.round),
            is_last: self.is_finished(),
        }
    }

    /// (Re)start from round 1, where everyone sits with their seat neighbour.
    pub fn start_first_round(&mut self) -> RoundPlan {
        self.round = 1;
        self.plan()
    }

    /// Move the men one table over.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if the first round wasn't started.
    pub fn advance_round(&mut self) -> Result<RoundAdvance, SessionError> {
        if self.round == 0 {
            return Err(SessionError::NoParticipants);
        }

        if self.is_finished() {
            return Ok(RoundAdvance::Finished {
                last_round: self.round,
            });
        }

        self.round += 1;
        Ok(RoundAdvance::Started(self.plan()))
    }

    /// Who `identity` sits with right now, if the rounds have started.
    #[must_use]
    pub fn partner_of(&self, identity: UserId) -> Option<&Participant> {
        if self.round == 0 {
            return None;
        }
        schedule::partner_of(&self.roster, self.round, identity)
    }

    /// Flip whether `voter` likes the person on `seat`. Returns `true` if
    /// they do now.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownParticipant`] if the voter isn't seated,
    /// [`SessionError::InvalidTarget`] if nobody sits on `seat` or that
    /// person is in the voter's own half.
    pub fn toggle_like(&mut self, voter: UserId, seat: SeatNumber) -> Result<bool, SessionError> {
        let voter_gender = self
            .roster
            .get(voter)
            .ok_or(SessionError::UnknownParticipant)?
            .gender;

        let target = self
            .roster
            .by_seat(seat)
            .ok_or(SessionError::InvalidTarget)?;

        if target.gender != voter_gender.opposite() {
            return Err(SessionError::InvalidTarget);
        }

        Ok(self.ledger.toggle(voter, seat))
    }

    /// Seats `voter` likes, in order. Empty for strangers.
    #[must_use]
    pub fn likes(&self, voter: UserId) -> Vec<SeatNumber> {
        self.ledger.likes(voter).collect()
    }

    /// People `voter` could like: the other half, in seat order.
    #[must_use]
    pub fn candidates_for(&self, voter: UserId) -> &[Participant] {
        match self.roster.position(voter) {
            Some((gender, _)) => self.roster.half(gender.opposite()),
            None => &[],
        }
    }

    /// Find mutual likes and remember them as announced.
    pub fn resolve_matches(&mut self) -> MatchOutcome {
        let matches = matching::resolve(&self.roster, &self.ledger);

        let newly_announced = matches
            .iter()
            .filter(|found| self.announced.insert(found.seats()))
            .cloned()
            .collect();

        MatchOutcome {
            matches,
            newly_announced,
        }
    }
}
