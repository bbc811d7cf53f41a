use std::future::Future;

use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    requests::Requester,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageId, ParseMode},
    ApiError, Bot, RequestError,
};

use crate::teloxide_retry;

/// Lay out buttons into rows of at most `per_row` buttons each, in order.
///
/// `per_row` of 0 is treated as 1.
#[must_use]
pub fn buttons_in_rows(
    buttons: Vec<InlineKeyboardButton>,
    per_row: usize,
) -> Vec<Vec<InlineKeyboardButton>> {
    let per_row = per_row.max(1);
    let mut rows = Vec::with_capacity(buttons.len().div_ceil(per_row));
    let mut row = Vec::with_capacity(per_row);

    for button in buttons {
        row.push(button);
        if row.len() == per_row {
            rows.push(std::mem::replace(&mut row, Vec::with_capacity(per_row)));
        }
    }

    if !row.is_empty() {
        rows.push(row);
    }

    rows
}

pub trait BotStuff {
    /// Send an HTML formatted message, waiting out flood control if needed.
    fn send_html(
        &self,
        to: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Same as [`BotStuff::send_html`], but with an inline keyboard attached.
    fn send_html_with_keyboard(
        &self,
        to: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Edit a message into HTML formatted text with this keyboard.
    ///
    /// Editing a message into exactly what it already is counts as success.
    fn edit_html_with_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn send_html(&self, to: ChatId, text: &str) -> Result<Message, RequestError> {
        teloxide_retry!(
            self.send_message(to, text)
                .parse_mode(ParseMode::Html)
                .await
        )
    }

    async fn send_html_with_keyboard(
        &self,
        to: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<Message, RequestError> {
        teloxide_retry!(
            self.send_message(to, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard.clone())
                .await
        )
    }

    async fn edit_html_with_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), RequestError> {
        let result = teloxide_retry!(
            self.edit_message_text(chat_id, message_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard.clone())
                .await
        );

        match result {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
