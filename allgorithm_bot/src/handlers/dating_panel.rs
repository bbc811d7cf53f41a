//! The admin's Fast Dates control panel: one message with buttons that gets
//! edited in place as the evening goes.

use std::fmt::Write;

use club_bot_commons::useful_methods::{buttons_in_rows, BotStuff};
use html_escape::encode_text;
use teloxide::{
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, UserId},
    Bot, RequestError,
};

use crate::{
    database::{Database, PaidRegistrations},
    speed_dating::{
        count_halves, DatingHost, LikesEditor, LoadReport, MatchOutcome, SessionError,
        SessionSnapshot,
    },
};

use super::callbacks::CallbackAction;

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

/// Short explanation of a refused operation, for the admin.
pub fn session_error_text(error: SessionError) -> &'static str {
    match error {
        SessionError::NoParticipants => {
            "Nobody is loaded, or the rounds haven't started yet. Load with /load_dating."
        }
        SessionError::UnknownParticipant => "That person isn't seated tonight.",
        SessionError::InvalidTarget => "Nobody from the other half sits on that seat.",
    }
}

pub fn render_panel(snapshot: Option<&SessionSnapshot>) -> (String, InlineKeyboardMarkup) {
    let Some(snapshot) = snapshot else {
        return (
            "❌ No participants are loaded. Use <code>/load_dating &lt;event id&gt;</code>."
                .to_string(),
            InlineKeyboardMarkup::new(Vec::<Vec<InlineKeyboardButton>>::new()),
        );
    };

    let mut text = String::from("<b>Fast Dates control panel</b>\n\n");
    let _ = writeln!(text, "Event: <b>№{}</b>", snapshot.event_id);
    match snapshot.round {
        0 => text.push_str("Round: <b>not started</b>\n"),
        round => {
            let _ = writeln!(text, "Round: <b>{round}</b>");
        }
    }
    let _ = writeln!(text, "Participants: <b>{}</b>", snapshot.participants.len());
    if snapshot.is_finished {
        text.push_str("🏁 <b>Everyone has met everyone!</b> Time to key in the likes.\n");
    }
    text.push_str("\nPick a participant to key in their likes, or an action:");

    let participants = snapshot
        .participants
        .iter()
        .map(|p| {
            button(
                format!("№{} ({})", p.seat_number(), p.gender().letter()),
                CallbackAction::EditLikes(p.identity()),
            )
        })
        .collect();

    let mut rows = buttons_in_rows(participants, 4);
    if snapshot.round == 0 {
        rows.push(vec![button("🚀 Start round 1", CallbackAction::StartRounds)]);
    }
    if !snapshot.is_finished {
        rows.push(vec![button("🔄 Next round", CallbackAction::NextRound)]);
    }
    rows.push(vec![button("💖 Resolve matches", CallbackAction::ResolveMatches)]);
    rows.push(vec![button("♻️ Refresh", CallbackAction::Panel)]);

    (text, InlineKeyboardMarkup::new(rows))
}

pub fn render_likes_editor(editor: &LikesEditor) -> (String, InlineKeyboardMarkup) {
    let voter = &editor.voter;
    let text = format!(
        "Who did <b>№{} {}</b> ({}) like?",
        voter.seat_number(),
        encode_text(voter.display_name()),
        voter.gender()
    );

    let candidates = editor
        .candidates
        .iter()
        .map(|(candidate, liked)| {
            let mark = if *liked { "✅" } else { "▫️" };
            button(
                format!(
                    "{mark} №{} {}",
                    candidate.seat_number(),
                    candidate.display_name()
                ),
                CallbackAction::ToggleLike(voter.identity(), candidate.seat_number()),
            )
        })
        .collect();

    let mut rows = buttons_in_rows(candidates, 2);
    rows.push(vec![button("💾 Save and go back", CallbackAction::Panel)]);

    (text, InlineKeyboardMarkup::new(rows))
}

pub fn render_load_report(
    report: &LoadReport,
    paid: &PaidRegistrations,
    event_description: Option<&str>,
) -> String {
    let mut text = format!("✅ <b>Event №{} is loaded!</b>\n", report.event_id);
    if let Some(description) = event_description {
        let _ = writeln!(text, "<i>{}</i>", encode_text(description));
    }
    let _ = writeln!(
        text,
        "Seated: <b>{}</b> participants, {} pairs. Everyone got their number.",
        report.pairs * 2,
        report.pairs
    );

    if !report.is_balanced() {
        let _ = write!(
            text,
            "\n🚨 <b>Gender imbalance!</b>\nWomen: {}, men: {}.\n",
            report.women, report.men
        );
    }

    if !report.unseated.is_empty() {
        text.push_str("\nNot seated, because the other half ran out:\n");
        for registration in &report.unseated {
            let _ = writeln!(
                text,
                "• {} ({})",
                encode_text(&registration.display_name),
                registration.gender
            );
        }
    }

    if !paid.unknown_gender.is_empty() {
        text.push_str("\nSkipped, no idea if they're a man or a woman:\n");
        for name in &paid.unknown_gender {
            let _ = writeln!(text, "• {}", encode_text(name));
        }
    }

    text
}

pub fn render_matches(outcome: &MatchOutcome) -> String {
    if outcome.matches.is_empty() {
        return "🏁 No matches yet.".to_string();
    }

    let mut text = format!(
        "🏁 <b>Matches: {}</b>, new: {}\n\n",
        outcome.matches.len(),
        outcome.newly_announced.len()
    );
    for found in &outcome.matches {
        let is_new = outcome.newly_announced.contains(found);
        let _ = writeln!(
            text,
            "№{} {} 💖 №{} {}{}",
            found.first.seat_number(),
            encode_text(found.first.display_name()),
            found.second.seat_number(),
            encode_text(found.second.display_name()),
            if is_new { " 🆕" } else { "" }
        );
    }
    text
}

pub async fn send_panel(bot: &Bot, chat_id: ChatId, host: &DatingHost) -> Result<(), RequestError> {
    let snapshot = host.snapshot().await;
    let (text, keyboard) = render_panel(snapshot.as_ref());
    bot.send_html_with_keyboard(chat_id, &text, keyboard)
        .await?;
    Ok(())
}

pub async fn edit_into_panel(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    host: &DatingHost,
) -> Result<(), RequestError> {
    let snapshot = host.snapshot().await;
    let (text, keyboard) = render_panel(snapshot.as_ref());
    bot.edit_html_with_keyboard(chat_id, message_id, &text, keyboard)
        .await
}

/// Returns `false` if the voter isn't seated anymore.
pub async fn edit_into_likes_editor(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    host: &DatingHost,
    voter: UserId,
) -> Result<bool, RequestError> {
    let Some(editor) = host.likes_editor(voter).await else {
        return Ok(false);
    };
    let (text, keyboard) = render_likes_editor(&editor);
    bot.edit_html_with_keyboard(chat_id, message_id, &text, keyboard)
        .await?;
    Ok(true)
}

/// `/load_dating <event id>`
pub async fn load_dating(
    bot: &Bot,
    chat_id: ChatId,
    params: &str,
    database: &Database,
    host: &DatingHost,
) -> Result<(), RequestError> {
    let Ok(event_id) = params.trim().parse::<i64>() else {
        bot.send_html(chat_id, "Usage: <code>/load_dating &lt;event id&gt;</code>")
            .await?;
        return Ok(());
    };

    let event = match database.get_event(event_id).await {
        Ok(event) => event,
        Err(e) => {
            log::error!("Failed to look up event {event_id}: {e}");
            bot.send_html(chat_id, "❌ Database error, see the logs.")
                .await?;
            return Ok(());
        }
    };

    let Some(event) = event else {
        bot.send_html(chat_id, &format!("❌ There's no event №{event_id}."))
            .await?;
        return Ok(());
    };

    if !event.is_active {
        log::warn!("Loading inactive event {event_id}");
    }

    let paid = match database.paid_registrations(event_id).await {
        Ok(paid) => paid,
        Err(e) => {
            log::error!("Failed to get registrations for event {event_id}: {e}");
            bot.send_html(chat_id, "❌ Database error, see the logs.")
                .await?;
            return Ok(());
        }
    };

    let (women, men) = count_halves(&paid.registrations);

    match host.load(event_id, paid.registrations.clone()).await {
        Ok(report) => {
            let text = render_load_report(&report, &paid, event.description.as_deref());
            bot.send_html(chat_id, &text).await?;
            send_panel(bot, chat_id, host).await?;
        }
        Err(e) => {
            let text = format!(
                "❌ Can't seat event №{event_id}: {}\nPaid women: {women}, paid men: {men}, unknown: {}.",
                session_error_text(e),
                paid.unknown_gender.len()
            );
            bot.send_html(chat_id, &text).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        notify::tests::RecordingNotifier,
        speed_dating::{Gender, RandomTopics, Registration, SeatNumber},
    };

    fn registration(id: u64, gender: Gender, name: &str) -> Registration {
        Registration {
            identity: UserId(id),
            gender,
            display_name: name.to_string(),
            contact_handle: None,
        }
    }

    async fn loaded_host() -> DatingHost {
        let host = DatingHost::new(
            Box::new(RecordingNotifier::default()),
            Box::new(RandomTopics),
        );
        host.load(
            9,
            vec![
                registration(1, Gender::Woman, "Ann"),
                registration(2, Gender::Man, "<Bob>"),
                registration(3, Gender::Woman, "Cleo"),
                registration(4, Gender::Man, "Dan"),
            ],
        )
        .await
        .unwrap();
        host
    }

    fn callbacks(keyboard: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        keyboard
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| match &b.kind {
                        teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                            data.clone()
                        }
                        _ => panic!("Not a callback button"),
                    })
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn panel_lists_everyone() {
        let host = loaded_host().await;
        let snapshot = host.snapshot().await.unwrap();
        let (text, keyboard) = render_panel(Some(&snapshot));

        assert!(text.contains("Event: <b>№9</b>"));
        assert!(text.contains("not started"));
        assert!(text.contains("Participants: <b>4</b>"));

        let rows = callbacks(&keyboard);
        assert_eq!(rows[0], vec!["fd_edit 1", "fd_edit 2", "fd_edit 3", "fd_edit 4"]);
        assert_eq!(rows[1], vec!["fd_start"]);
        assert_eq!(rows[2], vec!["fd_next"]);
        assert_eq!(rows[3], vec!["fd_calc"]);

        host.start_first_round().await.unwrap();
        let snapshot = host.snapshot().await.unwrap();
        let (text, keyboard) = render_panel(Some(&snapshot));
        assert!(text.contains("Round: <b>1</b>"));
        // No going back to round 1 by accident.
        let rows = callbacks(&keyboard);
        assert_eq!(rows[1], vec!["fd_next"]);
        assert!(rows.iter().flatten().all(|data| data != "fd_start"));

        let (text, keyboard) = render_panel(None);
        assert!(text.contains("/load_dating"));
        assert!(keyboard.inline_keyboard.is_empty());
    }

    #[tokio::test]
    async fn editor_marks_likes() {
        let host = loaded_host().await;
        host.toggle_like(UserId(1), SeatNumber(4)).await.unwrap();

        let editor = host.likes_editor(UserId(1)).await.unwrap();
        let (text, keyboard) = render_likes_editor(&editor);
        assert!(text.contains("№1 Ann"));

        assert_eq!(keyboard.inline_keyboard[0][0].text, "▫️ №2 <Bob>");
        assert_eq!(keyboard.inline_keyboard[0][1].text, "✅ №4 Dan");
        let rows = callbacks(&keyboard);
        assert_eq!(rows[0], vec!["fd_tog 1 2", "fd_tog 1 4"]);
        assert_eq!(rows[1], vec!["fd_panel"]);
    }

    #[tokio::test]
    async fn matches_summary_escapes_names() {
        let host = loaded_host().await;
        host.toggle_like(UserId(1), SeatNumber(2)).await.unwrap();
        host.toggle_like(UserId(2), SeatNumber(1)).await.unwrap();

        let summary = render_matches(&host.resolve_matches().await);
        assert!(summary.contains("№1 Ann 💖 №2 &lt;Bob&gt; 🆕"));

        let summary = render_matches(&host.resolve_matches().await);
        assert!(!summary.contains("🆕"));

        assert_eq!(render_matches(&MatchOutcome::default()), "🏁 No matches yet.");
    }

    #[test]
    fn load_report_mentions_everyone_left_out() {
        let report = LoadReport {
            event_id: 3,
            pairs: 1,
            women: 3,
            men: 1,
            unseated: vec![
                registration(5, Gender::Woman, "Eve"),
                registration(6, Gender::Woman, "Fay"),
            ],
        };
        let paid = PaidRegistrations {
            registrations: Vec::new(),
            unknown_gender: vec!["Gus & co".to_string()],
        };

        let text = render_load_report(&report, &paid, Some("Friday dates"));
        assert!(text.contains("Event №3"));
        assert!(text.contains("Friday dates"));
        assert!(text.contains("Women: 3, men: 1."));
        assert!(text.contains("• Eve (woman)"));
        assert!(text.contains("• Fay (woman)"));
        assert!(text.contains("• Gus &amp; co"));
    }
}
