// src/services/commands.rs

//! Bot command surface: `/start`, `/help` and `/check`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{MessagesConfig, TelegramConfig};
use crate::pipeline::Watcher;
use crate::services::{BotApi, BotCommand, Message, Update};
use crate::utils::escape_markup;

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Check,
}

impl Command {
    /// Parse the leading command of a message.
    ///
    /// `/check@SomeBot` is accepted only when `SomeBot` is `bot_username`
    /// (or the username is unknown). Arguments are ignored.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let token = text.split_whitespace().next()?.strip_prefix('/')?;
        let (name, target) = match token.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (token, None),
        };

        if let (Some(target), Some(username)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(username) {
                return None;
            }
        }

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

/// Commands registered in the bot's menu.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("help", "Show help"),
        BotCommand::new("check", "Check for new courses now"),
    ]
}

/// Long-polls the bot API and answers commands.
pub struct BotListener {
    api: Arc<dyn BotApi>,
    watcher: Arc<Watcher>,
    messages: MessagesConfig,
    username: Option<String>,
    parse_mode: String,
    poll_timeout_secs: u64,
    retry: Duration,
    offset: Option<i64>,
}

impl BotListener {
    pub fn new(
        api: Arc<dyn BotApi>,
        watcher: Arc<Watcher>,
        messages: MessagesConfig,
        telegram: &TelegramConfig,
        retry: Duration,
    ) -> Self {
        Self {
            api,
            watcher,
            messages,
            username: None,
            parse_mode: telegram.parse_mode.clone(),
            poll_timeout_secs: telegram.poll_timeout_secs,
            retry,
            offset: None,
        }
    }

    /// Only accept `/cmd@name` addressed to this bot.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Poll and dispatch until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let polled = tokio::select! {
                polled = self.poll_once() => polled,
                _ = &mut shutdown => break,
            };

            if let Err(e) = polled {
                log::warn!("Polling bot updates failed: {e}");
                tokio::select! {
                    _ = tokio::time::sleep(self.retry) => {}
                    _ = &mut shutdown => break,
                }
            }
        }
        log::info!("Bot listener stopping");
    }

    /// Fetch one batch of updates and handle each in order.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self.api.poll(self.offset, self.poll_timeout_secs).await?;
        let count = updates.len();
        for update in updates {
            self.offset = Some(update.update_id + 1);
            if let Err(e) = self.handle_update(&update).await {
                log::error!("Handling update {} failed: {e}", update.update_id);
            }
        }
        Ok(count)
    }

    async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(command) = message
            .text
            .as_deref()
            .and_then(|text| Command::parse(text, self.username.as_deref()))
        else {
            return Ok(());
        };

        log::info!("Received {command:?} from chat {}", message.chat.id);
        self.execute(command, message).await
    }

    async fn execute(&self, command: Command, message: &Message) -> Result<()> {
        match command {
            Command::Start | Command::Help => {
                self.api.reply(message, &self.messages.welcome).await
            }
            Command::Check => {
                self.api.reply(message, &self.messages.check_started).await?;
                let reply = match self.watcher.check().await {
                    Ok(report) => self
                        .messages
                        .check_complete
                        .replace("{count}", &report.new_courses.len().to_string()),
                    Err(e) => {
                        log::error!("Manual check failed: {e}");
                        let error = escape_markup(&self.parse_mode, &e.to_string());
                        self.messages.check_failed.replace("{error}", &error)
                    }
                };
                self.api.reply(message, &reply).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::models::{Config, Credentials};
    use crate::services::Chat;
    use crate::testing::{MemoryStore, RecordingNotifier, ScriptedSource, course};

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/help extra args", None), Some(Command::Help));
        assert_eq!(Command::parse("  /CHECK", None), Some(Command::Check));
        assert_eq!(Command::parse("/check@AcademyBot", None), Some(Command::Check));
        assert_eq!(
            Command::parse("/check@academybot", Some("AcademyBot")),
            Some(Command::Check)
        );
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert_eq!(Command::parse("check", None), None);
        assert_eq!(Command::parse("/stop", None), None);
        assert_eq!(Command::parse("", None), None);
        assert_eq!(Command::parse("hello /check", None), None);
        assert_eq!(Command::parse("/check@OtherBot", Some("AcademyBot")), None);
    }

    #[test]
    fn test_bot_commands_match_parser() {
        for command in bot_commands() {
            let text = format!("/{}", command.command);
            assert!(Command::parse(&text, None).is_some(), "{text}");
        }
    }

    /// Bot API fake: replays update batches and records replies.
    #[derive(Default)]
    struct FakeBot {
        batches: Mutex<VecDeque<Result<Vec<Update>>>>,
        offsets: Mutex<Vec<Option<i64>>>,
        replies: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl BotApi for FakeBot {
        async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
            self.offsets.lock().unwrap().push(offset);
            let next = self.batches.lock().unwrap().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    // Nothing queued: behave like a long poll that times out.
                    tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
                    Ok(Vec::new())
                }
            }
        }

        async fn reply(&self, message: &Message, text: &str) -> Result<()> {
            self.replies
                .lock()
                .unwrap()
                .push((message.chat.id, text.to_string()));
            Ok(())
        }
    }

    fn text_update(update_id: i64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id: update_id * 10,
                chat: Chat { id: 7 },
                text: Some(text.to_string()),
            }),
        }
    }

    fn listener(
        bot: Arc<FakeBot>,
        source: ScriptedSource,
        notifier: Arc<RecordingNotifier>,
    ) -> BotListener {
        let config = Config::default();
        let credentials = Credentials {
            bot_token: "token".to_string(),
            chat_id: "42".to_string(),
        };
        let watcher = Watcher::new(
            &config,
            &credentials,
            Arc::new(source),
            Arc::new(MemoryStore::default()),
            notifier,
        );
        BotListener::new(
            bot,
            Arc::new(watcher),
            config.messages.clone(),
            &config.telegram,
            Duration::from_secs(15),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_help_replies_welcome_and_advances_offset() {
        let bot = Arc::new(FakeBot::default());
        bot.batches.lock().unwrap().push_back(Ok(vec![
            text_update(5, "/help"),
            text_update(6, "just chatting"),
        ]));
        let mut listener = listener(
            bot.clone(),
            ScriptedSource::default(),
            Arc::new(RecordingNotifier::default()),
        );

        assert_eq!(listener.poll_once().await.unwrap(), 2);
        listener.poll_once().await.unwrap();

        let replies = bot.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, 7);
        assert!(replies[0].1.starts_with("Welcome"));
        assert_eq!(*bot.offsets.lock().unwrap(), vec![None, Some(7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_runs_cycle_and_reports() {
        let bot = Arc::new(FakeBot::default());
        bot.batches
            .lock()
            .unwrap()
            .push_back(Ok(vec![text_update(1, "/check")]));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut listener = listener(
            bot.clone(),
            ScriptedSource::new(vec![Ok(vec![course("A", "Active"), course("B", "Active")])]),
            notifier.clone(),
        );

        listener.poll_once().await.unwrap();

        let replies: Vec<String> = bot
            .replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect();
        assert_eq!(
            replies,
            vec![
                "Checking Binance Learn and Earn courses...".to_string(),
                "Manual check complete: 2 new course(s).".to_string(),
            ]
        );
        // Course notifications go to the configured chat, not the caller.
        assert!(notifier.messages().iter().all(|(chat, _)| chat == "42"));
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_failure_is_reported() {
        let bot = Arc::new(FakeBot::default());
        bot.batches
            .lock()
            .unwrap()
            .push_back(Ok(vec![text_update(1, "/check")]));
        let mut listener = listener(
            bot.clone(),
            ScriptedSource::new(vec![Err("no cards".to_string())]),
            Arc::new(RecordingNotifier::default()),
        );

        listener.poll_once().await.unwrap();

        let replies = bot.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 2);
        assert!(replies[1].1.starts_with("Manual check failed:"));
        assert!(replies[1].1.contains("no cards"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_keeps_offset() {
        let bot = Arc::new(FakeBot::default());
        {
            let mut batches = bot.batches.lock().unwrap();
            batches.push_back(Ok(vec![text_update(3, "/start")]));
            batches.push_back(Err(AppError::telegram("getUpdates", "Conflict")));
        }
        let mut listener = listener(
            bot.clone(),
            ScriptedSource::default(),
            Arc::new(RecordingNotifier::default()),
        );

        listener.poll_once().await.unwrap();
        assert!(listener.poll_once().await.is_err());
        listener.poll_once().await.unwrap();

        assert_eq!(
            *bot.offsets.lock().unwrap(),
            vec![None, Some(4), Some(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let bot = Arc::new(FakeBot::default());
        let mut listener = listener(
            bot.clone(),
            ScriptedSource::default(),
            Arc::new(RecordingNotifier::default()),
        );

        tokio::time::timeout(
            Duration::from_secs(5),
            listener.run(tokio::time::sleep(Duration::from_secs(1))),
        )
        .await
        .unwrap_or_else(|_| panic!("listener did not stop"));
    }
}
