use std::collections::{BTreeSet, HashMap};

use teloxide::types::UserId;

use super::types::SeatNumber;

/// Who liked which seats. Doesn't know anything about the roster; checking
/// that votes make sense is up to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    likes: HashMap<UserId, BTreeSet<SeatNumber>>,
}

impl VoteLedger {
    /// Like `seat` on behalf of `voter`, or take the like back if it's
    /// already there. Returns `true` if the seat is liked now.
    ///
    /// Toggling the same thing twice leaves the ledger exactly as it was.
    pub fn toggle(&mut self, voter: UserId, seat: SeatNumber) -> bool {
        let liked = self.likes.entry(voter).or_default();

        if liked.remove(&seat) {
            if liked.is_empty() {
                self.likes.remove(&voter);
            }
            false
        } else {
            liked.insert(seat);
            true
        }
    }

    /// Seats `voter` likes, in seat order.
    pub fn likes(&self, voter: UserId) -> impl Iterator<Item = SeatNumber> + '_ {
        self.likes.get(&voter).into_iter().flatten().copied()
    }

    #[must_use]
    pub fn does_like(&self, voter: UserId, seat: SeatNumber) -> bool {
        self.likes
            .get(&voter)
            .is_some_and(|liked| liked.contains(&seat))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.likes.is_empty()
    }
}
