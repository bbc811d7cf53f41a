//! Best-effort delivery of messages to participants.

use std::future::Future;

use club_bot_commons::useful_methods::BotStuff;
use teloxide::{
    types::{ChatId, UserId},
    Bot, RequestError,
};
use tokio::sync::mpsc;

/// Sends a message to a person. Never fails from the caller's point of view:
/// a message that couldn't be delivered is logged and forgotten.
pub trait Notifier: Send + Sync {
    /// `text` is HTML formatted.
    fn send(&self, to: UserId, text: String);
}

/// Sends messages in private chats through a Telegram bot.
///
/// Messages are queued and delivered one by one, in the order they were
/// sent, so a flood control pause can't make round 2 arrive before round 1.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    queue: mpsc::UnboundedSender<(UserId, String)>,
}

impl TelegramNotifier {
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self::with_delivery(move |to, text| {
            let bot = bot.clone();
            async move {
                bot.send_html(ChatId::from(to), &text).await?;
                Ok(())
            }
        })
    }

    fn with_delivery<F, Fut>(deliver: F) -> Self
    where
        F: Fn(UserId, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RequestError>> + Send + 'static,
    {
        let (queue, mut receiver) = mpsc::unbounded_channel::<(UserId, String)>();

        tokio::spawn(async move {
            while let Some((to, text)) = receiver.recv().await {
                if let Err(e) = deliver(to, text).await {
                    // Usually means they never started the bot or blocked it.
                    log::warn!("Couldn't notify user {to}: {e}");
                }
            }
            log::debug!("Notification queue closed");
        });

        TelegramNotifier { queue }
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, to: UserId, text: String) {
        if self.queue.send((to, text)).is_err() {
            log::error!("Notification queue is gone, dropped a message to {to}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Remembers everything it was asked to send.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(UserId, String)>>,
    }

    impl RecordingNotifier {
        /// Everything sent so far, emptying the record.
        pub fn take(&self) -> Vec<(UserId, String)> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, to: UserId, text: String) {
            self.sent.lock().unwrap().push((to, text));
        }
    }

    impl Notifier for std::sync::Arc<RecordingNotifier> {
        fn send(&self, to: UserId, text: String) {
            self.as_ref().send(to, text);
        }
    }

    #[tokio::test]
    async fn slow_messages_dont_get_overtaken() {
        let (delivered, mut received) = mpsc::unbounded_channel();
        let notifier = TelegramNotifier::with_delivery(move |to, text| {
            let delivered = delivered.clone();
            async move {
                if text == "round 1" {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
                let _ = delivered.send((to, text));
                Ok::<_, RequestError>(())
            }
        });

        for text in ["round 1", "round 2", "round 3"] {
            notifier.send(UserId(7), text.to_string());
        }

        for expected in ["round 1", "round 2", "round 3"] {
            let (to, text) = received.recv().await.unwrap();
            assert_eq!(to, UserId(7));
            assert_eq!(text, expected);
        }
    }
}
