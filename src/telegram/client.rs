//! Telegram client wrapper for the referral bot.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use grammers_client::client::UpdateStream;
use grammers_client::types::Chat;
use grammers_client::update::{CallbackQuery, Message, Update};
use grammers_client::{
    Client, InputMessage, InvocationError, SenderPool, UpdatesConfiguration, button, reply_markup,
    sender,
};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::updates::{chat_id, joined_members, user_id};
use crate::config::TelegramConfig;
use crate::events::{BotCommand, ButtonPressed, CommandIssued, InboundEvent, MembershipChanged};
use crate::notify::{Control, DeliveryError, Messenger, Notification};
use crate::types::{ChatId, MessageHandle, MessageId, Participant, QueryId, UserId};

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["FLOOD_WAIT_", "flood wait "];

    for pattern in patterns {
        if let Some(idx) = err_msg.to_lowercase().find(&pattern.to_lowercase()) {
            let start = idx + pattern.len();
            let num_str: String = err_msg[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// Bot session on top of the grammers client.
///
/// Turns updates into [`InboundEvent`]s and implements [`Messenger`]. Sending
/// and deleting go through message objects remembered from updates, so the
/// bot only talks in chats it has heard from.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Incoming updates.
    updates: Mutex<UpdateStream>,

    /// Bot username, known after sign-in.
    username: OnceLock<Option<String>>,

    /// Latest incoming message per chat, used to reach the chat.
    anchors: DashMap<ChatId, Message>,

    /// Messages waiting for deletion.
    tracked: DashMap<MessageHandle, Message>,

    /// Button presses waiting for an answer.
    queries: DashMap<QueryId, CallbackQuery>,

    next_query: AtomicI64,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram with the given configuration.
    pub async fn connect(config: &TelegramConfig) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let updates = client
            .stream_updates(
                updates,
                UpdatesConfiguration {
                    catch_up: false,
                    ..Default::default()
                },
            )
            .await;

        Ok(Self {
            client,
            handle: handle.thin,
            updates: Mutex::new(updates),
            username: OnceLock::new(),
            anchors: DashMap::new(),
            tracked: DashMap::new(),
            queries: DashMap::new(),
            next_query: AtomicI64::new(1),
            _pool_task: pool_task,
        })
    }

    /// Signs in with the bot token unless the session is already authorized.
    pub async fn sign_in(&self, config: &TelegramConfig) -> Result<(), TelegramError> {
        let authorized = self
            .client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if authorized {
            debug!("Session already authorized");
        } else {
            info!("Signing in with bot token...");
            self.client
                .bot_sign_in(&config.bot_token, &config.api_hash)
                .await
                .map_err(|e| TelegramError::SignInFailed(e.to_string()))?;
        }

        let username = self.fetch_username().await?;
        info!(
            "Signed in as @{}",
            username.as_deref().unwrap_or("<no username>")
        );
        let _ = self.username.set(username);
        Ok(())
    }

    async fn fetch_username(&self) -> Result<Option<String>, TelegramError> {
        let request = tl::functions::users::GetUsers {
            id: vec![tl::enums::InputUser::UserSelf],
        };

        let users = self.client.invoke(&request).await?;
        Ok(match users.into_iter().next() {
            Some(tl::enums::User::User(user)) => user.username,
            _ => None,
        })
    }

    /// Bot username without the `@`, if it has one.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.get().and_then(Option::as_deref)
    }

    /// Waits for the next update and converts it.
    ///
    /// Returns `Ok(None)` for updates the bot does not care about.
    pub async fn next_event(&self) -> Result<Option<InboundEvent>, TelegramError> {
        let update = self.updates.lock().await.next().await?;
        Ok(self.to_event(update))
    }

    fn to_event(&self, update: Update) -> Option<InboundEvent> {
        match update {
            Update::NewMessage(message) if !message.outgoing() => self.message_event(message),
            Update::CallbackQuery(query) => self.button_event(query),
            _ => None,
        }
    }

    fn message_event(&self, message: Message) -> Option<InboundEvent> {
        let (chat, from, action, text) = match &message.raw {
            tl::enums::Message::Message(m) => (
                chat_id(&m.peer_id),
                m.from_id.as_ref().and_then(user_id),
                None,
                Some(m.message.clone()),
            ),
            tl::enums::Message::Service(s) => (
                chat_id(&s.peer_id),
                s.from_id.as_ref().and_then(user_id),
                Some(s.action.clone()),
                None,
            ),
            tl::enums::Message::Empty(_) => return None,
        };

        self.anchors.insert(chat, message.clone());

        if let Some(action) = action {
            let joined = joined_members(&action, from)?;
            let sender = message.sender();
            let actor = from.map(|id| participant(id, sender.as_ref()));
            return Some(InboundEvent::MembershipChanged(MembershipChanged {
                chat,
                actor,
                joined,
            }));
        }

        let command = BotCommand::parse(text.as_deref()?, self.username())?;
        let issuer = participant(from?, message.sender().as_ref());
        let handle = MessageHandle::new(chat, MessageId(message.id()));
        self.tracked.insert(handle, message);

        Some(InboundEvent::Command(CommandIssued {
            chat,
            issuer,
            command,
            message: handle,
        }))
    }

    fn button_event(&self, query: CallbackQuery) -> Option<InboundEvent> {
        let payload = String::from_utf8(query.data().to_vec()).ok()?;
        let chat = chat_id(&query.raw.peer);
        let presser = participant(UserId(query.raw.user_id), Some(query.sender()));

        let id = QueryId(self.next_query.fetch_add(1, Ordering::Relaxed));
        self.queries.insert(id, query);

        Some(InboundEvent::ButtonPressed(ButtonPressed {
            chat,
            presser,
            payload,
            query: id,
        }))
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl Messenger for TelegramBot {
    async fn send_message(
        &self,
        chat: ChatId,
        notification: &Notification,
    ) -> Result<MessageHandle, DeliveryError> {
        let anchor = self
            .anchors
            .get(&chat)
            .map(|m| m.clone())
            .ok_or(DeliveryError::UnknownChat(chat))?;

        let mut input = InputMessage::html(&notification.html);
        if let Some(control) = &notification.control {
            let row = match control {
                Control::Callback { label, payload } => button::inline(label, payload.as_bytes()),
                Control::Url { label, url } => button::url(label, url),
            };
            input = input.reply_markup(&reply_markup::inline(vec![vec![row]]));
        }

        let sent = anchor.respond(input).await.map_err(TelegramError::from)?;
        let handle = MessageHandle::new(chat, MessageId(sent.id()));
        self.tracked.insert(handle, sent);
        Ok(handle)
    }

    async fn answer_button_press(&self, query: QueryId, text: &str) -> Result<(), DeliveryError> {
        let Some((_, pending)) = self.queries.remove(&query) else {
            warn!("Button press {:?} was already answered", query);
            return Ok(());
        };

        let answer = pending.answer();
        let answer = if text.is_empty() { answer } else { answer.text(text) };
        answer.send().await.map_err(TelegramError::from)?;
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<(), DeliveryError> {
        let (_, message) = self
            .tracked
            .remove(&handle)
            .ok_or(DeliveryError::UnknownMessage(handle))?;

        message.delete().await.map_err(TelegramError::from)?;
        Ok(())
    }

    fn forget_message(&self, handle: MessageHandle) {
        if self.tracked.remove(&handle).is_some() {
            debug!("Stopped tracking message {}", handle);
        }
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("username", &self.username())
            .field("tracked", &self.tracked.len())
            .finish_non_exhaustive()
    }
}

/// Builds a participant from the sender entity, when Telegram sent one.
fn participant(id: UserId, sender: Option<&Chat>) -> Participant {
    match sender {
        Some(Chat::User(user)) => Participant {
            id,
            username: user.username().map(str::to_owned),
            first_name: Some(user.first_name().to_owned()).filter(|n| !n.is_empty()),
        },
        _ => Participant::anonymous(id),
    }
}
