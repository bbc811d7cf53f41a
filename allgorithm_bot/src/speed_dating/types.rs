use std::fmt::Display;

use teloxide::types::UserId;

/// Which half of the room a participant is in. Women keep their tables,
/// men move between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Woman,
    Man,
}

impl Gender {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Gender::Woman => Gender::Man,
            Gender::Man => Gender::Woman,
        }
    }

    /// Recognise a gender the way it's stored in user profiles.
    ///
    /// Profiles made by the questionnaire store words like "Мужчина" and
    /// "Женщина", profiles made by this bot store [`Gender::as_profile_str`].
    /// Returns [`None`] if the value makes no sense.
    #[must_use]
    pub fn from_profile(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();

        if value.contains("жен") || matches!(value.as_str(), "female" | "woman" | "f" | "w") {
            Some(Gender::Woman)
        } else if value.contains("муж") || matches!(value.as_str(), "male" | "man" | "m") {
            Some(Gender::Man)
        } else {
            None
        }
    }

    /// The value to store in a user profile.
    #[must_use]
    pub fn as_profile_str(self) -> &'static str {
        match self {
            Gender::Woman => "female",
            Gender::Man => "male",
        }
    }

    /// Single letter for cramped keyboard buttons.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Gender::Woman => 'W',
            Gender::Man => 'M',
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Woman => write!(f, "woman"),
            Gender::Man => write!(f, "man"),
        }
    }
}

/// A participant's number for the evening. Women sit on odd numbers,
/// men on even numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatNumber(pub u32);

impl SeatNumber {
    /// Seat of the `index`-th (from 0) participant of the given half.
    #[must_use]
    pub fn for_index(gender: Gender, index: usize) -> Self {
        let index = u32::try_from(index).expect("There are never billions of participants");
        match gender {
            Gender::Woman => SeatNumber(index * 2 + 1),
            Gender::Man => SeatNumber(index * 2 + 2),
        }
    }

    /// Which half sits on this seat.
    #[must_use]
    pub fn gender(self) -> Gender {
        if self.0 % 2 == 1 {
            Gender::Woman
        } else {
            Gender::Man
        }
    }
}

impl Display for SeatNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A paid booking for an event, resolved to the person who made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: UserId,
    pub gender: Gender,
    pub display_name: String,
    /// Telegram username, without the `@`.
    pub contact_handle: Option<String>,
}

/// A seated participant of the current evening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub(super) identity: UserId,
    pub(super) seat: SeatNumber,
    pub(super) gender: Gender,
    pub(super) display_name: String,
    pub(super) contact_handle: Option<String>,
}

impl Participant {
    pub(super) fn seated(registration: Registration, seat: SeatNumber) -> Self {
        Participant {
            identity: registration.identity,
            seat,
            gender: registration.gender,
            display_name: registration.display_name,
            contact_handle: registration.contact_handle,
        }
    }

    #[must_use]
    pub fn identity(&self) -> UserId {
        self.identity
    }
    #[must_use]
    pub fn seat_number(&self) -> SeatNumber {
        self.seat
    }
    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    #[must_use]
    pub fn contact_handle(&self) -> Option<&str> {
        self.contact_handle.as_deref()
    }
}

/// Who sits with whom at which table in some round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    /// Table number, from 1. Same as the woman's position in her half.
    pub table: u32,
    pub woman: Participant,
    pub man: Participant,
}

/// Two participants who liked each other. `first` has the lower seat number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub first: Participant,
    pub second: Participant,
}

impl Match {
    #[must_use]
    pub fn new(a: &Participant, b: &Participant) -> Self {
        let (first, second) = if a.seat <= b.seat { (a, b) } else { (b, a) };
        Match {
            first: first.clone(),
            second: second.clone(),
        }
    }

    /// Seats of both sides, lower first. Identifies the pair.
    #[must_use]
    pub fn seats(&self) -> (SeatNumber, SeatNumber) {
        (self.first.seat, self.second.seat)
    }
}

/// Reasons an operation on the speed dating session was refused.
/// None of these change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Nobody is loaded, one of the halves is empty, or the rounds
    /// haven't been started yet.
    NoParticipants,
    /// The voter isn't seated this evening.
    UnknownParticipant,
    /// The liked seat doesn't exist or is in the voter's own half.
    InvalidTarget,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NoParticipants => write!(f, "no participants are loaded"),
            SessionError::UnknownParticipant => write!(f, "this person is not seated tonight"),
            SessionError::InvalidTarget => write!(f, "that seat can't be liked by this person"),
        }
    }
}

impl std::error::Error for SessionError {}
