//! Conversation state controller
//!
//! Owns the ordered message list, the loading flag and the error banner.
//! All mutation goes through [`Conversation::begin_send`] and
//! [`Conversation::finish_send`]; [`Conversation::send_user_message`] runs
//! both around a single awaited backend call.

use crate::ai::ResponseSource;
use crate::error::{ConversationError, ResponseError};
use crate::state::{Message, MessageId, Role};

pub const DEFAULT_WELCOME: &str = "Halo! Saya Arsyad AI. Ada yang bisa saya bantu hari ini? 😊";
pub const DEFAULT_FALLBACK: &str = "Maaf, sepertinya ada masalah teknis. Coba lagi nanti ya!";

/// Ticket for the one send that is currently in flight.
///
/// Only [`Conversation::begin_send`] creates one and
/// [`Conversation::finish_send`] consumes it, so every user message is paired
/// with exactly one bot reply.
#[derive(Debug)]
#[must_use = "a pending send must be finished or the conversation stays loading"]
pub struct PendingSend {
    user_message: MessageId,
    prompt: String,
}

impl PendingSend {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn user_message_id(&self) -> &MessageId {
        &self.user_message
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    is_loading: bool,
    last_error: Option<String>,
    fallback: String,
    next_seq: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME)
    }
}

impl Conversation {
    pub fn new(welcome: impl Into<String>) -> Self {
        Self::with_fallback(welcome, DEFAULT_FALLBACK)
    }

    pub fn with_fallback(welcome: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(MessageId::welcome(), Role::Bot, welcome)],
            is_loading: false,
            last_error: None,
            fallback: fallback.into(),
            next_seq: 1,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback
    }

    /// Clear the error banner without sending anything.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Append the user's message and enter the loading state.
    ///
    /// Rejected with [`ConversationError::SendInFlight`] while an earlier send
    /// is still waiting for its reply; the state is left untouched.
    pub fn begin_send(&mut self, text: impl Into<String>) -> Result<PendingSend, ConversationError> {
        if self.is_loading {
            tracing::warn!("send rejected, a reply is still pending");
            return Err(ConversationError::SendInFlight);
        }

        let text = text.into();
        let id = self.append(Role::User, text.clone());
        self.is_loading = true;
        self.last_error = None;

        tracing::debug!(message_id = %id, "send started");
        Ok(PendingSend {
            user_message: id,
            prompt: text,
        })
    }

    /// Append the reply (or the fallback on failure) and leave the loading state.
    pub fn finish_send(
        &mut self,
        pending: PendingSend,
        outcome: Result<String, ResponseError>,
    ) -> &Message {
        match outcome {
            Ok(reply) => {
                tracing::debug!(reply_to = %pending.user_message, "reply received");
                self.append(Role::Bot, reply);
            }
            Err(err) => {
                let description = err.description();
                tracing::error!(reply_to = %pending.user_message, "response failed: {description}");
                self.last_error = Some(description);
                let fallback = self.fallback.clone();
                self.append(Role::Bot, fallback);
            }
        }
        self.is_loading = false;

        &self.messages[self.messages.len() - 1]
    }

    /// One full round trip: user message, backend call, reply or fallback.
    ///
    /// Backend failures never escape; they become the fallback bubble plus
    /// the error banner. The only error returned is an in-flight rejection.
    pub async fn send_user_message(
        &mut self,
        source: &dyn ResponseSource,
        text: impl Into<String>,
    ) -> Result<(), ConversationError> {
        let pending = self.begin_send(text)?;
        let outcome = source.get_response(pending.prompt()).await;
        self.finish_send(pending, outcome);
        Ok(())
    }

    fn append(&mut self, role: Role, text: String) -> MessageId {
        let id = MessageId::from_seq(self.next_seq);
        self.next_seq += 1;
        self.messages.push(Message::new(id.clone(), role, text));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WELCOME_ID;
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    /// Replies with queued outcomes in order.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResponseSource for Scripted {
        async fn get_response(&self, prompt: &str) -> Result<String, ResponseError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(ResponseError::Backend(msg)),
                None => Err(ResponseError::Backend("no scripted reply".to_string())),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[test]
    fn test_new_conversation_has_welcome() {
        let convo = Conversation::default();
        assert_eq!(convo.len(), 1);
        let welcome = &convo.messages()[0];
        assert_eq!(welcome.id().as_str(), WELCOME_ID);
        assert_eq!(welcome.role(), Role::Bot);
        assert_eq!(welcome.text(), DEFAULT_WELCOME);
        assert!(!convo.is_loading());
        assert!(convo.last_error().is_none());
    }

    #[tokio::test]
    async fn test_successful_send() {
        let mut convo = Conversation::default();
        let source = Scripted::new(vec![Ok("Hi there")]);

        convo.send_user_message(&source, "Hello").await.unwrap();

        assert_eq!(convo.len(), 3);
        assert_eq!(convo.messages()[1].role(), Role::User);
        assert_eq!(convo.messages()[1].text(), "Hello");
        assert_eq!(convo.messages()[2].role(), Role::Bot);
        assert_eq!(convo.messages()[2].text(), "Hi there");
        assert!(!convo.is_loading());
        assert!(convo.last_error().is_none());
        assert_eq!(source.prompts.lock().unwrap().as_slice(), ["Hello"]);
    }

    #[tokio::test]
    async fn test_failed_send_appends_fallback() {
        let mut convo = Conversation::default();
        let source = Scripted::new(vec![Err("quota exceeded")]);

        convo.send_user_message(&source, "Hello").await.unwrap();

        assert_eq!(convo.len(), 3);
        assert_eq!(convo.messages()[1].role(), Role::User);
        let last = convo.last().unwrap();
        assert_eq!(last.role(), Role::Bot);
        assert_eq!(last.text(), DEFAULT_FALLBACK);
        assert_eq!(convo.last_error(), Some("quota exceeded"));
        assert!(!convo.is_loading());
    }

    #[tokio::test]
    async fn test_next_send_clears_error() {
        let mut convo = Conversation::default();
        let source = Scripted::new(vec![Err("quota exceeded"), Ok("back online")]);

        convo.send_user_message(&source, "one").await.unwrap();
        assert!(convo.last_error().is_some());

        let pending = convo.begin_send("two").unwrap();
        assert!(convo.last_error().is_none());
        let outcome = source.get_response(pending.prompt()).await;
        convo.finish_send(pending, outcome);

        assert_eq!(convo.last().unwrap().text(), "back online");
        assert!(convo.last_error().is_none());
    }

    #[test]
    fn test_loading_spans_begin_to_finish() {
        let mut convo = Conversation::default();
        assert!(!convo.is_loading());

        let pending = convo.begin_send("Hello").unwrap();
        assert!(convo.is_loading());
        assert_eq!(convo.len(), 2);
        assert_eq!(pending.user_message_id(), convo.messages()[1].id());

        convo.finish_send(pending, Ok("Hi".to_string()));
        assert!(!convo.is_loading());
        assert_eq!(convo.len(), 3);
    }

    #[test]
    fn test_loading_cleared_on_failure() {
        let mut convo = Conversation::default();
        let pending = convo.begin_send("Hello").unwrap();
        convo.finish_send(pending, Err(ResponseError::Empty("Gemini")));
        assert!(!convo.is_loading());
        assert_eq!(convo.last_error(), Some("Gemini returned an empty response"));
    }

    #[test]
    fn test_second_send_while_loading_is_rejected() {
        let mut convo = Conversation::default();
        let pending = convo.begin_send("first").unwrap();
        let before = convo.messages().to_vec();

        let err = convo.begin_send("second").unwrap_err();
        assert_eq!(err, ConversationError::SendInFlight);
        assert_eq!(convo.messages(), before.as_slice());
        assert!(convo.is_loading());

        convo.finish_send(pending, Ok("reply".to_string()));
        assert!(convo.begin_send("second").is_ok());
    }

    #[test]
    fn test_dismiss_error_keeps_messages() {
        let mut convo = Conversation::default();
        let pending = convo.begin_send("Hello").unwrap();
        convo.finish_send(pending, Err(ResponseError::Backend("down".to_string())));
        let count = convo.len();

        convo.dismiss_error();
        assert!(convo.last_error().is_none());
        assert_eq!(convo.len(), count);
    }

    #[test]
    fn test_custom_fallback_text() {
        let mut convo = Conversation::with_fallback("hey", "sorry!");
        let pending = convo.begin_send("Hello").unwrap();
        let reply = convo.finish_send(pending, Err(ResponseError::Backend("x".to_string())));
        assert_eq!(reply.text(), "sorry!");
        assert_eq!(convo.messages()[0].text(), "hey");
    }

    #[tokio::test]
    async fn test_history_is_append_only_with_unique_ids() {
        let mut convo = Conversation::default();
        let source = Scripted::new(vec![
            Ok("a"),
            Err("timeout"),
            Ok("c"),
            Err(""),
            Ok("e"),
        ]);

        for (i, prompt) in ["1", "2", "3", "4", "5"].iter().enumerate() {
            let before = convo.messages().to_vec();
            convo.send_user_message(&source, *prompt).await.unwrap();

            assert_eq!(convo.len(), before.len() + 2);
            assert_eq!(&convo.messages()[..before.len()], before.as_slice());
            assert_eq!(convo.messages()[before.len()].role(), Role::User);
            assert_eq!(convo.messages()[before.len() + 1].role(), Role::Bot);
            assert_eq!(convo.len(), 1 + 2 * (i + 1));
        }

        let ids: HashSet<_> = convo.messages().iter().map(|m| m.id().clone()).collect();
        assert_eq!(ids.len(), convo.len());
        assert_eq!(convo.last_error(), None);
    }

    #[tokio::test]
    async fn test_blank_error_uses_generic_description() {
        let mut convo = Conversation::default();
        let source = Scripted::new(vec![Err("")]);
        convo.send_user_message(&source, "Hello").await.unwrap();
        assert_eq!(
            convo.last_error(),
            Some(crate::error::GENERIC_ERROR_DESCRIPTION)
        );
    }
}
