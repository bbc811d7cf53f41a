use std::{fs, sync::Arc};
use teloxide::{dptree::deps, prelude::*, types::UserId};

use crate::{
    database::Database,
    handlers::{commands::Command, handle_callback_query, handle_message, AdminId},
    notify::TelegramNotifier,
    speed_dating::{DatingHost, RandomTopics},
};

/// # Panics
///
/// Panics if there's no key file, `ADMIN_ID` isn't a Telegram user ID, or
/// the database can't be opened.
pub async fn entry() {
    log::info!("ASYNC WOOOO");
    let key = fs::read_to_string(match cfg!(debug_assertions) {
        true => "key_debug",
        false => "key",
    })
    .expect("Could not load bot key file!");

    let admin = std::env::var("ADMIN_ID")
        .ok()
        .and_then(|x| x.trim().parse::<u64>().ok())
        .map(|x| AdminId(UserId(x)))
        .expect("Environment variable ADMIN_ID must be the admin's Telegram user ID!");

    let bot = Bot::new(key.trim());

    bot.set_my_commands(Command::generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let database = Arc::new(Database::new().await.expect("Failed to create database!"));

    let host = Arc::new(DatingHost::new(
        Box::new(TelegramNotifier::new(bot.clone())),
        Box::new(RandomTopics),
    ));

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![database, host, admin])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
