use html_escape::encode_text;
use teloxide::types::UserId;
use tokio::sync::Mutex;

use crate::notify::Notifier;

use super::{
    roster::{Roster, RosterBuild},
    session::{DatingSession, MatchOutcome, RoundAdvance, RoundPlan},
    topics::TopicSource,
    types::{Match, Participant, Registration, SeatNumber, SessionError},
};

/// Keeps the one speed dating session of this bot and tells participants
/// what happens to it.
pub struct DatingHost {
    session: Mutex<Option<DatingSession>>,
    notifier: Box<dyn Notifier>,
    topics: Box<dyn TopicSource>,
}

/// What happened when a roster was loaded.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub event_id: i64,
    pub pairs: usize,
    /// Distinct people per half before anyone was left out.
    pub women: usize,
    pub men: usize,
    pub unseated: Vec<Registration>,
}

impl LoadReport {
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.women == self.men
    }
}

/// Read-only view of the session for drawing the admin panel.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub event_id: i64,
    pub round: u32,
    pub is_finished: bool,
    /// In seat order.
    pub participants: Vec<Participant>,
}

/// Everything needed to show whom a voter likes.
#[derive(Debug, Clone)]
pub struct LikesEditor {
    pub voter: Participant,
    /// The other half, in seat order, and whether the voter likes them.
    pub candidates: Vec<(Participant, bool)>,
}

impl DatingHost {
    #[must_use]
    pub fn new(notifier: Box<dyn Notifier>, topics: Box<dyn TopicSource>) -> Self {
        DatingHost {
            session: Mutex::new(None),
            notifier,
            topics,
        }
    }

    /// Replace the current session with a fresh one made of `registrations`,
    /// and tell everyone seated their number.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if either half is empty. The current
    /// session, if any, is kept in that case.
    pub async fn load(
        &self,
        event_id: i64,
        registrations: Vec<Registration>,
    ) -> Result<LoadReport, SessionError> {
        let RosterBuild {
            roster,
            unseated,
            women,
            men,
        } = Roster::build(registrations)?;

        for participant in roster.iter() {
            self.notifier
                .send(participant.identity(), seat_message(participant));
        }

        let report = LoadReport {
            event_id,
            pairs: roster.pairs(),
            women,
            men,
            unseated,
        };

        log::info!(
            "Loaded event {event_id}: {} people in {} pairs, {} left without a seat",
            roster.len(),
            report.pairs,
            report.unseated.len()
        );

        *self.session.lock().await = Some(DatingSession::new(event_id, roster));

        Ok(report)
    }

    /// Start (or restart) the first round and send everyone their table.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if nothing is loaded.
    pub async fn start_first_round(&self) -> Result<RoundPlan, SessionError> {
        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or(SessionError::NoParticipants)?;

        let plan = session.start_first_round();
        self.announce(&plan);
        Ok(plan)
    }

    /// Move to the next round and send everyone their new partner.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if nothing is loaded or the first
    /// round wasn't started.
    pub async fn advance_round(&self) -> Result<RoundAdvance, SessionError> {
        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or(SessionError::NoParticipants)?;

        let advance = session.advance_round()?;
        match &advance {
            RoundAdvance::Started(plan) => self.announce(plan),
            RoundAdvance::Finished { last_round } => {
                log::debug!("Asked to advance past the last round {last_round}");
            }
        }
        Ok(advance)
    }

    fn announce(&self, plan: &RoundPlan) {
        log::info!("Starting round {}", plan.round);
        let topic = self.topics.pick();

        for pairing in &plan.pairings {
            let text = round_message(plan.round, pairing.table, pairing.woman.seat_number(), &topic);
            let text_for = |partner: &Participant| {
                format!("{text}\nYour partner: <b>participant №{}</b>", partner.seat_number())
            };
            self.notifier
                .send(pairing.woman.identity(), text_for(&pairing.man));
            self.notifier
                .send(pairing.man.identity(), text_for(&pairing.woman));
        }
    }

    /// Flip whether `voter` likes whoever sits on `seat`. Returns `true` if
    /// they do now.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if nothing is loaded, otherwise see
    /// [`DatingSession::toggle_like`].
    pub async fn toggle_like(&self, voter: UserId, seat: SeatNumber) -> Result<bool, SessionError> {
        let mut session = self.session.lock().await;
        session
            .as_mut()
            .ok_or(SessionError::NoParticipants)?
            .toggle_like(voter, seat)
    }

    /// Seats `voter` likes. Empty if nothing is loaded.
    pub async fn likes(&self, voter: UserId) -> Vec<SeatNumber> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.likes(voter))
            .unwrap_or_default()
    }

    /// Find all matches and tell both sides of every match that wasn't
    /// announced yet. With nothing loaded there are simply no matches.
    pub async fn resolve_matches(&self) -> MatchOutcome {
        let mut session = self.session.lock().await;
        let Some(session) = session.as_mut() else {
            return MatchOutcome::default();
        };

        let outcome = session.resolve_matches();

        for found in &outcome.newly_announced {
            self.notify_match(found);
        }

        log::info!(
            "Resolved {} matches, {} of them new",
            outcome.matches.len(),
            outcome.newly_announced.len()
        );

        outcome
    }

    fn notify_match(&self, found: &Match) {
        self.notifier
            .send(found.first.identity(), match_message(&found.second));
        self.notifier
            .send(found.second.identity(), match_message(&found.first));
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let session = self.session.lock().await;
        let session = session.as_ref()?;

        Some(SessionSnapshot {
            event_id: session.event_id(),
            round: session.round(),
            is_finished: session.is_finished(),
            participants: session.roster().iter().cloned().collect(),
        })
    }

    /// `None` if nothing is loaded or `voter` isn't seated.
    pub async fn likes_editor(&self, voter: UserId) -> Option<LikesEditor> {
        let session = self.session.lock().await;
        let session = session.as_ref()?;

        let voter_participant = session.roster().get(voter)?.clone();
        let liked = session.likes(voter);

        let candidates = session
            .candidates_for(voter)
            .iter()
            .map(|candidate| {
                let is_liked = liked.contains(&candidate.seat_number());
                (candidate.clone(), is_liked)
            })
            .collect();

        Some(LikesEditor {
            voter: voter_participant,
            candidates,
        })
    }

    /// Send a fresh conversation prompt to `identity` and whoever sits with
    /// them this round. Returns that partner.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoParticipants`] if nothing is loaded or the rounds
    /// haven't started, [`SessionError::UnknownParticipant`] if `identity`
    /// isn't seated.
    pub async fn send_new_topic(&self, identity: UserId) -> Result<Participant, SessionError> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(SessionError::NoParticipants)?;

        if session.roster().get(identity).is_none() {
            return Err(SessionError::UnknownParticipant);
        }

        let partner = session
            .partner_of(identity)
            .ok_or(SessionError::NoParticipants)?
            .clone();

        let text = format!(
            "🎲 <b>A secret topic just for your table:</b>\n\n{}",
            encode_text(&self.topics.pick())
        );
        self.notifier.send(identity, text.clone());
        self.notifier.send(partner.identity(), text);

        Ok(partner)
    }
}

fn seat_message(participant: &Participant) -> String {
    format!(
        "🎫 Your number for tonight is <b>{}</b>\nRemember it!",
        participant.seat_number()
    )
}

fn round_message(round: u32, table: u32, starts: SeatNumber, topic: &str) -> String {
    let place = match round {
        1 => format!("Take a seat at <b>table №{table}</b>."),
        _ => format!("This round you're at <b>table №{table}</b>."),
    };
    format!(
        "🔄 <b>ROUND №{round}</b>\n\n{place}\n<b>Topic:</b> {}\n<i>Participant №{starts} starts!</i>",
        encode_text(topic)
    )
}

/// Tell someone they matched with `other`.
#[must_use]
pub fn match_message(other: &Participant) -> String {
    let contact = match other.contact_handle() {
        Some(handle) => format!("@{}", encode_text(handle)),
        None => "not set".to_string(),
    };
    format!(
        "💖 <b>It's a match!</b> You and <b>№{} {}</b> liked each other!\nTheir Telegram: {contact}",
        other.seat_number(),
        encode_text(other.display_name())
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        notify::tests::RecordingNotifier,
        speed_dating::{
            roster::tests::{registration, registrations},
            types::Gender,
            topics::tests::FixedTopic,
        },
    };

    fn host() -> (DatingHost, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let host = DatingHost::new(
            Box::new(notifier.clone()),
            Box::new(FixedTopic("Cats or dogs?")),
        );
        (host, notifier)
    }

    fn sent_to(sent: &[(UserId, String)], id: u64) -> Vec<&str> {
        sent.iter()
            .filter(|(to, _)| *to == UserId(id))
            .map(|(_, text)| text.as_str())
            .collect()
    }

    #[tokio::test]
    async fn loading_tells_everyone_their_seat() {
        let (host, notifier) = host();
        let report = host.load(3, registrations(4, 2)).await.unwrap();

        assert_eq!(report.pairs, 2);
        assert_eq!((report.women, report.men), (4, 2));
        assert!(!report.is_balanced());
        assert_eq!(report.unseated.len(), 2);

        let sent = notifier.take();
        assert_eq!(sent.len(), 4);
        assert!(sent_to(&sent, 101)[0].contains("<b>3</b>"));
        assert!(sent_to(&sent, 201)[0].contains("<b>4</b>"));
        // Unseated people hear nothing.
        assert!(sent_to(&sent, 102).is_empty());

        let snapshot = host.snapshot().await.unwrap();
        assert_eq!(snapshot.event_id, 3);
        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.participants.len(), 4);
    }

    #[tokio::test]
    async fn booking_twice_is_not_an_imbalance() {
        let (host, notifier) = host();
        let mut twice = registrations(2, 2);
        twice.push(registration(100, Gender::Woman));

        let report = host.load(1, twice).await.unwrap();
        assert_eq!((report.women, report.men), (2, 2));
        assert!(report.is_balanced());
        assert!(report.unseated.is_empty());
        // One seat message each.
        assert_eq!(notifier.take().len(), 4);
    }

    #[tokio::test]
    async fn failed_load_keeps_the_evening() {
        let (host, notifier) = host();
        host.load(1, registrations(2, 2)).await.unwrap();
        host.start_first_round().await.unwrap();
        host.toggle_like(UserId(100), SeatNumber(2)).await.unwrap();
        notifier.take();

        assert_eq!(
            host.load(2, registrations(3, 0)).await.unwrap_err(),
            SessionError::NoParticipants
        );
        assert!(notifier.take().is_empty());

        let snapshot = host.snapshot().await.unwrap();
        assert_eq!(snapshot.event_id, 1);
        assert_eq!(snapshot.round, 1);
        assert_eq!(host.likes(UserId(100)).await, vec![SeatNumber(2)]);
    }

    #[tokio::test]
    async fn reloading_starts_over() {
        let (host, _) = host();
        host.load(1, registrations(2, 2)).await.unwrap();
        host.start_first_round().await.unwrap();
        host.toggle_like(UserId(100), SeatNumber(2)).await.unwrap();

        host.load(1, registrations(2, 2)).await.unwrap();
        assert_eq!(host.snapshot().await.unwrap().round, 0);
        assert!(host.likes(UserId(100)).await.is_empty());
    }

    #[tokio::test]
    async fn rounds_are_announced() {
        let (host, notifier) = host();
        host.load(1, registrations(3, 3)).await.unwrap();
        notifier.take();

        host.start_first_round().await.unwrap();
        let sent = notifier.take();
        assert_eq!(sent.len(), 6);

        let woman = sent_to(&sent, 101)[0];
        assert!(woman.contains("ROUND №1"));
        assert!(woman.contains("table №2"));
        assert!(woman.contains("participant №4"));
        assert!(woman.contains("Cats or dogs?"));
        assert!(woman.contains("Participant №3 starts"));

        let RoundAdvance::Started(plan) = host.advance_round().await.unwrap() else {
            panic!("Round 2 should start");
        };
        assert_eq!(plan.round, 2);
        let sent = notifier.take();
        // Man with seat 2 moved to the third table, to seat 5.
        let man = sent_to(&sent, 200)[0];
        assert!(man.contains("ROUND №2"));
        assert!(man.contains("table №3"));
        assert!(man.contains("participant №5"));

        host.advance_round().await.unwrap();
        notifier.take();
        assert!(matches!(
            host.advance_round().await,
            Ok(RoundAdvance::Finished { last_round: 3 })
        ));
        assert!(notifier.take().is_empty());
        assert!(host.snapshot().await.unwrap().is_finished);
    }

    #[tokio::test]
    async fn nothing_loaded_nothing_happens() {
        let (host, notifier) = host();

        assert_eq!(
            host.start_first_round().await.unwrap_err(),
            SessionError::NoParticipants
        );
        assert_eq!(
            host.advance_round().await.unwrap_err(),
            SessionError::NoParticipants
        );
        assert_eq!(
            host.toggle_like(UserId(100), SeatNumber(2)).await,
            Err(SessionError::NoParticipants)
        );
        assert_eq!(
            host.send_new_topic(UserId(100)).await.unwrap_err(),
            SessionError::NoParticipants
        );
        assert!(host.likes(UserId(100)).await.is_empty());
        assert!(host.resolve_matches().await.matches.is_empty());
        assert!(host.snapshot().await.is_none());
        assert!(host.likes_editor(UserId(100)).await.is_none());
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn matches_are_announced_once() {
        let (host, notifier) = host();
        host.load(1, registrations(2, 2)).await.unwrap();
        notifier.take();

        // W100 is on seat 1, M200 on seat 2.
        host.toggle_like(UserId(100), SeatNumber(2)).await.unwrap();
        host.toggle_like(UserId(200), SeatNumber(1)).await.unwrap();
        host.toggle_like(UserId(101), SeatNumber(2)).await.unwrap();

        let outcome = host.resolve_matches().await;
        assert_eq!(outcome.matches.len(), 1);

        let sent = notifier.take();
        assert_eq!(sent.len(), 2);
        let to_woman = sent_to(&sent, 100)[0];
        assert!(to_woman.contains("№2 M200"));
        assert!(to_woman.contains("@user200"));
        assert!(sent_to(&sent, 200)[0].contains("№1 W100"));

        let again = host.resolve_matches().await;
        assert_eq!(again.matches.len(), 1);
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn likes_editor_marks_likes() {
        let (host, _) = host();
        host.load(1, registrations(3, 3)).await.unwrap();
        host.toggle_like(UserId(200), SeatNumber(3)).await.unwrap();

        let editor = host.likes_editor(UserId(200)).await.unwrap();
        assert_eq!(editor.voter.seat_number(), SeatNumber(2));
        let marks: Vec<(u32, bool)> = editor
            .candidates
            .iter()
            .map(|(p, liked)| (p.seat_number().0, *liked))
            .collect();
        assert_eq!(marks, vec![(1, false), (3, true), (5, false)]);

        assert!(host.likes_editor(UserId(999)).await.is_none());
    }

    #[tokio::test]
    async fn new_topic_goes_to_the_table() {
        let (host, notifier) = host();
        host.load(1, registrations(2, 2)).await.unwrap();

        // Not started yet, nobody has a partner.
        assert_eq!(
            host.send_new_topic(UserId(100)).await.unwrap_err(),
            SessionError::NoParticipants
        );

        host.start_first_round().await.unwrap();
        host.advance_round().await.unwrap();
        notifier.take();

        // Round 2: seat 4 (M201) sits with seat 1 (W100).
        let partner = host.send_new_topic(UserId(201)).await.unwrap();
        assert_eq!(partner.identity(), UserId(100));

        let sent = notifier.take();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent_to(&sent, 201), sent_to(&sent, 100));
        assert!(sent[0].1.contains("Cats or dogs?"));

        assert_eq!(
            host.send_new_topic(UserId(5)).await.unwrap_err(),
            SessionError::UnknownParticipant
        );
    }

    #[test]
    fn names_are_escaped() {
        let registration = Registration {
            identity: UserId(1),
            gender: Gender::Man,
            display_name: "<b>Bobby</b> & co".to_string(),
            contact_handle: None,
        };
        let participant = Participant::seated(registration, SeatNumber(2));
        let text = match_message(&participant);
        assert!(text.contains("&lt;b&gt;Bobby&lt;/b&gt; &amp; co"));
        assert!(text.contains("not set"));
    }
}
