use std::collections::BTreeSet;

use super::{ledger::VoteLedger, roster::Roster, types::Match};

/// Find all pairs who liked each other. Each pair is reported once, in order
/// of the lower seat number.
///
/// Likes pointing at seats nobody sits on, or at someone of the voter's own
/// half, are ignored.
#[must_use]
pub fn resolve(roster: &Roster, ledger: &VoteLedger) -> Vec<Match> {
    let mut emitted = BTreeSet::new();
    let mut matches = Vec::new();

    if ledger.is_empty() {
        return matches;
    }

    for voter in roster.iter() {
        for seat in ledger.likes(voter.identity()) {
            let Some(target) = roster.by_seat(seat) else {
                log::warn!("Seat {seat} is liked by seat {}, but nobody sits there", voter.seat);
                continue;
            };

            if target.gender == voter.gender {
                log::warn!("Seat {} likes seat {seat} of the same half", voter.seat);
                continue;
            }

            if !ledger.does_like(target.identity(), voter.seat) {
                continue;
            }

            let found = Match::new(voter, target);
            if emitted.insert(found.seats()) {
                matches.push(found);
            }
        }
    }

    matches
}
