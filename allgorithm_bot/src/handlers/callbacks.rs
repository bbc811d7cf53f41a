use std::{fmt::Display, str::FromStr, sync::Arc};

use club_bot_commons::useful_methods::BotStuff;
use teloxide::{
    payloads::AnswerCallbackQuerySetters,
    requests::Requester,
    types::{CallbackQuery, ChatId, UserId},
    Bot, RequestError,
};

use crate::{
    database::Database,
    speed_dating::{DatingHost, Gender, RoundAdvance, SeatNumber},
};

use super::{dating_panel, AdminId};

/// What a button press asks for. Stored in the button as space separated
/// words, well under Telegram's 64 byte limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show the panel again.
    Panel,
    StartRounds,
    NextRound,
    ResolveMatches,
    /// Open the likes editor of this participant.
    EditLikes(UserId),
    /// Flip whether this participant likes this seat.
    ToggleLike(UserId, SeatNumber),
    /// A participant telling the bot their gender.
    SetGender(Gender),
}

impl CallbackAction {
    /// Only the admin may press this.
    pub fn is_admin_only(self) -> bool {
        !matches!(self, CallbackAction::SetGender(_))
    }

    /// Does something to the evening, as opposed to just showing it.
    pub fn changes_session(self) -> bool {
        matches!(
            self,
            CallbackAction::StartRounds
                | CallbackAction::NextRound
                | CallbackAction::ResolveMatches
                | CallbackAction::ToggleLike(..)
        )
    }
}

impl Display for CallbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackAction::Panel => write!(f, "fd_panel"),
            CallbackAction::StartRounds => write!(f, "fd_start"),
            CallbackAction::NextRound => write!(f, "fd_next"),
            CallbackAction::ResolveMatches => write!(f, "fd_calc"),
            CallbackAction::EditLikes(voter) => write!(f, "fd_edit {voter}"),
            CallbackAction::ToggleLike(voter, seat) => write!(f, "fd_tog {voter} {seat}"),
            CallbackAction::SetGender(gender) => write!(f, "gender {}", gender.as_profile_str()),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut words = value.split_ascii_whitespace();
        let Some(action) = words.next() else {
            return Err("Empty callback data");
        };

        let parsed = match action {
            "fd_panel" => CallbackAction::Panel,
            "fd_start" => CallbackAction::StartRounds,
            "fd_next" => CallbackAction::NextRound,
            "fd_calc" => CallbackAction::ResolveMatches,
            "fd_edit" => CallbackAction::EditLikes(parse_user(words.next())?),
            "fd_tog" => {
                let voter = parse_user(words.next())?;
                let seat = words
                    .next()
                    .and_then(|x| x.parse::<u32>().ok())
                    .ok_or("Bad seat number")?;
                CallbackAction::ToggleLike(voter, SeatNumber(seat))
            }
            "gender" => {
                let gender = words
                    .next()
                    .and_then(Gender::from_profile)
                    .ok_or("Bad gender")?;
                CallbackAction::SetGender(gender)
            }
            _ => return Err("Unknown action"),
        };

        if words.next().is_some() {
            return Err("Extraneous data in callback");
        }

        Ok(parsed)
    }
}

fn parse_user(word: Option<&str>) -> Result<UserId, &'static str> {
    word.and_then(|x| x.parse::<u64>().ok())
        .map(UserId)
        .ok_or("Bad user ID")
}

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    database: Arc<Database>,
    host: Arc<DatingHost>,
    admin: AdminId,
) -> Result<(), RequestError> {
    macro_rules! goodbye {
        ($text:expr) => {
            bot.answer_callback_query(query.id.clone()).text($text).await?;
            return Ok(());
        };
        () => {
            bot.answer_callback_query(query.id.clone()).await?;
            return Ok(());
        };
    }

    let Some(data) = query.data.as_deref() else {
        goodbye!("No query data.");
    };

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            log::debug!("Weird callback data {data:?}: {e}");
            goodbye!(format!("Invalid query data: {e}"));
        }
    };

    let user = &query.from;

    if action.is_admin_only() && user.id != admin.0 {
        log::info!("Non-admin {} pressed {action}", user.id);
        goodbye!("Access denied.");
    }

    if let CallbackAction::SetGender(gender) = action {
        let text = match database.set_gender(user.id, gender).await {
            Ok(true) => format!("Got it, you're a {gender}!"),
            Ok(false) => "Please send /start first.".to_string(),
            Err(e) => {
                log::error!("Failed to set gender of {}: {e}", user.id);
                "Something broke, try again later.".to_string()
            }
        };
        goodbye!(text);
    }

    let Some(message) = query.regular_message() else {
        // Too old to edit. Whatever was pressed on it may be long outdated.
        dating_panel::send_panel(&bot, ChatId::from(user.id), &host).await?;
        if action.changes_session() {
            log::info!("Ignored {action} pressed on an inaccessible message");
            goodbye!("That panel is too old, nothing was done. Here's a fresh one.");
        }
        goodbye!();
    };
    let (chat_id, message_id) = (message.chat.id, message.id);

    match action {
        CallbackAction::Panel => {
            dating_panel::edit_into_panel(&bot, chat_id, message_id, &host).await?;
            goodbye!();
        }
        CallbackAction::StartRounds => {
            let text = match host.start_first_round().await {
                Ok(plan) => format!("Round {} started, {} tables.", plan.round, plan.pairings.len()),
                Err(e) => dating_panel::session_error_text(e).to_string(),
            };
            dating_panel::edit_into_panel(&bot, chat_id, message_id, &host).await?;
            goodbye!(text);
        }
        CallbackAction::NextRound => {
            let text = match host.advance_round().await {
                Ok(RoundAdvance::Started(plan)) => match plan.is_last {
                    true => format!("Round {} started. It's the last one!", plan.round),
                    false => format!("Round {} started.", plan.round),
                },
                Ok(RoundAdvance::Finished { last_round }) => format!(
                    "All {last_round} rounds are done, everyone has met everyone. Time for likes!"
                ),
                Err(e) => dating_panel::session_error_text(e).to_string(),
            };
            dating_panel::edit_into_panel(&bot, chat_id, message_id, &host).await?;
            goodbye!(text);
        }
        CallbackAction::ResolveMatches => {
            let outcome = host.resolve_matches().await;
            bot.send_html(chat_id, &dating_panel::render_matches(&outcome))
                .await?;
            goodbye!(format!("Found {} matches.", outcome.matches.len()));
        }
        CallbackAction::EditLikes(voter) => {
            if !dating_panel::edit_into_likes_editor(&bot, chat_id, message_id, &host, voter)
                .await?
            {
                dating_panel::edit_into_panel(&bot, chat_id, message_id, &host).await?;
                goodbye!("Participant not found!");
            }
            goodbye!();
        }
        CallbackAction::ToggleLike(voter, seat) => {
            let text = match host.toggle_like(voter, seat).await {
                Ok(true) => format!("Liked №{seat}."),
                Ok(false) => format!("Unliked №{seat}."),
                Err(e) => dating_panel::session_error_text(e).to_string(),
            };
            if !dating_panel::edit_into_likes_editor(&bot, chat_id, message_id, &host, voter)
                .await?
            {
                dating_panel::edit_into_panel(&bot, chat_id, message_id, &host).await?;
            }
            goodbye!(text);
        }
        CallbackAction::SetGender(_) => {
            goodbye!();
        }
    }
}
