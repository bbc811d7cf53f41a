pub mod callbacks;
pub mod commands;
pub mod dating_panel;

use std::sync::Arc;

use club_bot_commons::useful_methods::BotStuff;
use teloxide::{
    prelude::*,
    sugar::request::RequestReplyExt,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, Me, UserId},
    RequestError,
};

use crate::{
    database::Database,
    speed_dating::{DatingHost, Gender, SessionError},
};

use self::{
    callbacks::CallbackAction,
    commands::{Command, CommandKind},
};

pub use self::callbacks::handle_callback_query;

/// Telegram user who runs the events and may use the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminId(pub UserId);

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    database: Arc<Database>,
    host: Arc<DatingHost>,
    admin: AdminId,
) -> Result<(), RequestError> {
    // Everything here happens in private messages.
    if !message.chat.is_private() {
        return Ok(());
    }

    let Some(user) = message.from.as_ref() else {
        return Ok(());
    };

    // Get text of the message.
    let Some(text) = message.text() else {
        return Ok(());
    };
    // Check if it starts with "/", like how a command should.
    if !text.starts_with('/') {
        return Ok(());
    }
    // Get first word in the message, the command itself.
    let Some(command) = text.split_whitespace().next() else {
        return Ok(());
    };

    let command_full_len = command.len();

    // Trim the bot's username from the command and convert to lowercase.
    let username = format!("@{}", me.username());
    let command = command.trim_end_matches(username.as_str()).to_lowercase();
    let params = text[command_full_len..].trim_start();

    let is_admin = user.id == admin.0;

    let kind = match Command::find(&command) {
        Some(command) if command.is_admin_only() && !is_admin => {
            log::info!("Non-admin {} tried {}", user.id, command.callname);
            None
        }
        Some(command) => Some(command.kind),
        None => None,
    };

    let Some(kind) = kind else {
        bot.send_html(message.chat.id, &Command::generate_help(is_admin))
            .await?;
        return Ok(());
    };

    match kind {
        CommandKind::Start => {
            if let Err(e) = database.upsert_user(user).await {
                log::error!("Failed to save user {}: {e}", user.id);
            }

            let keyboard = InlineKeyboardMarkup::new([[
                InlineKeyboardButton::callback(
                    "👩 Woman",
                    CallbackAction::SetGender(Gender::Woman).to_string(),
                ),
                InlineKeyboardButton::callback(
                    "👨 Man",
                    CallbackAction::SetGender(Gender::Man).to_string(),
                ),
            ]]);

            bot.send_html_with_keyboard(
                message.chat.id,
                concat!(
                    "Hi! This is the bot of the <b>Allgorithm</b> club.\n\n",
                    "For Fast Dates we need to know who sits where. ",
                    "Who are you?"
                ),
                keyboard,
            )
            .await?;
        }
        CommandKind::Help => {
            bot.send_html(message.chat.id, &Command::generate_help(is_admin))
                .await?;
        }
        CommandKind::NewTopic => {
            let response = match host.send_new_topic(user.id).await {
                Ok(_) => "✅ A new topic was sent to you and your partner!",
                Err(SessionError::UnknownParticipant) => {
                    "❌ You're not taking part in tonight's Fast Dates."
                }
                Err(_) => "❌ Fast Dates aren't running right now.",
            };
            bot.send_message(message.chat.id, response)
                .reply_to(message.id)
                .await?;
        }
        CommandKind::LoadDating => {
            dating_panel::load_dating(&bot, message.chat.id, params, &database, &host).await?;
        }
        CommandKind::DatingPanel => {
            dating_panel::send_panel(&bot, message.chat.id, &host).await?;
        }
    }

    Ok(())
}
