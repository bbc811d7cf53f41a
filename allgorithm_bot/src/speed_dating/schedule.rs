//! Round-robin seating: women stay at their tables, men move one table over
//! each round. With `n` pairs, rounds `1..=n` seat every woman with every man
//! exactly once.

use teloxide::types::UserId;

use super::{
    roster::Roster,
    types::{Gender, Pairing, Participant},
};

/// Index of the man sitting with the woman of index `woman` in `round`.
/// `round` starts at 1, `pairs` must be nonzero.
#[must_use]
pub fn man_for_woman(woman: usize, round: u32, pairs: usize) -> usize {
    (woman + shift(round, pairs)) % pairs
}

/// Inverse of [`man_for_woman`].
#[must_use]
pub fn woman_for_man(man: usize, round: u32, pairs: usize) -> usize {
    (man + pairs - shift(round, pairs)) % pairs
}

fn shift(round: u32, pairs: usize) -> usize {
    let round = usize::try_from(round).unwrap_or(usize::MAX);
    round.saturating_sub(1) % pairs
}

/// True once `round` is the last round that brings new people together.
#[must_use]
pub fn is_finished(round: u32, pairs: usize) -> bool {
    usize::try_from(round).is_ok_and(|round| round >= pairs)
}

/// Everyone's table and partner in `round` (from 1), ordered by table.
#[must_use]
pub fn pairings(roster: &Roster, round: u32) -> Vec<Pairing> {
    let pairs = roster.pairs();
    let women = roster.half(Gender::Woman);
    let men = roster.half(Gender::Man);

    women
        .iter()
        .enumerate()
        .map(|(index, woman)| Pairing {
            table: u32::try_from(index + 1).expect("There are never billions of tables"),
            woman: woman.clone(),
            man: men[man_for_woman(index, round, pairs)].clone(),
        })
        .collect()
}

/// Who `identity` sits with in `round` (from 1).
#[must_use]
pub fn partner_of(roster: &Roster, round: u32, identity: UserId) -> Option<&Participant> {
    let (gender, index) = roster.position(identity)?;
    let pairs = roster.pairs();

    let partner_index = match gender {
        Gender::Woman => man_for_woman(index, round, pairs),
        Gender::Man => woman_for_man(index, round, pairs),
    };

    roster.half(gender.opposite()).get(partner_index)
}
