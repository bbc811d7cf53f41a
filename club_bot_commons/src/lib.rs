//! Things every Allgorithm club bot needs and nobody wants to write twice:
//! logger and runtime startup, retrying Telegram requests, keyboard helpers.

use std::future::Future;

pub mod useful_methods;

/// Crates used by the exported macros, so that users of the macros don't
/// have to depend on them under the exact same names.
#[doc(hidden)]
pub mod reexports {
    pub use log;
    pub use teloxide;
    pub use tokio;
}

/// How many times [`teloxide_retry`] waits out Telegram's flood control
/// before giving up and returning the error.
pub const RETRY_ATTEMPTS: u8 = 3;

/// Evaluate a Telegram request expression (including the `.await`), and if
/// Telegram answers with "retry after N seconds", sleep and evaluate it again,
/// up to [`RETRY_ATTEMPTS`] times. Any other result is returned as is.
///
/// The expression is evaluated anew on each attempt, so it must build the
/// request inside of it:
///
/// ```ignore
/// teloxide_retry!(bot.send_message(chat_id, "hi").await)
/// ```
#[macro_export]
macro_rules! teloxide_retry {
    ($request:expr) => {{
        let mut attempts_left: u8 = $crate::RETRY_ATTEMPTS;
        loop {
            match $request {
                Err($crate::reexports::teloxide::RequestError::RetryAfter(wait))
                    if attempts_left > 0 =>
                {
                    attempts_left -= 1;
                    $crate::reexports::log::warn!(
                        "Hit flood control, retrying in {:?}...",
                        wait.duration()
                    );
                    $crate::reexports::tokio::time::sleep(wait.duration()).await;
                }
                result => break result,
            }
        }
    }};
}

/// Initialize logging and start the `closure` in an async runtime.
///
/// Logging filter is taken from environment variable `RUST_LOG`, or
/// `default_filter` if it's not set. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
///
/// # Panics
///
/// Panics if the tokio runtime can't be built.
pub fn start_everything(default_filter: &str, closure: impl Future<Output = ()>) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    // journald timestamps everything by itself.
    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_filter);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("hi");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the tokio runtime!")
        .block_on(closure);
}
