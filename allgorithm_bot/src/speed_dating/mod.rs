//! The speed dating engine: seat the paid participants of an event, rotate
//! them between tables round after round, collect who liked whom and tell
//! mutual likes about each other.
//!
//! Women keep their tables for the whole evening and men move one table over
//! each round, so with `n` pairs everyone meets everyone in `n` rounds.

mod host;
mod ledger;
mod matching;
mod roster;
mod schedule;
mod session;
mod topics;
mod types;

pub use host::{DatingHost, LikesEditor, LoadReport, SessionSnapshot};
pub use roster::count_halves;
pub use session::{MatchOutcome, RoundAdvance, RoundPlan};
pub use topics::{RandomTopics, TopicSource};
pub use types::{Gender, Match, Pairing, Participant, Registration, SeatNumber, SessionError};
