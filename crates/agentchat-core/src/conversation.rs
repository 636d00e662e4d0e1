//! Conversation state machine
//!
//! Owns everything the chat view shows: the message log, the single in-flight
//! flag, the pending error banner, per-message feedback, and the prompt input.
//! Each send goes `Idle -> Sending -> Idle`. The controller never awaits the
//! network itself unless [`Conversation::submit`] is used; front ends that must
//! stay responsive call [`Conversation::begin_submit`], run the agent call in
//! the background, and hand the outcome to [`Conversation::complete_submit_for`]
//! along with the [`Conversation::generation`] it was started in.

use std::collections::HashMap;

use crate::agent::Agent;
use crate::auth::User;
use crate::clipboard::ClipboardWriter;
use crate::error::InvocationError;
use crate::feedback::FeedbackSink;
use crate::state::{Feedback, FeedbackState, Message};
use crate::suggestions::{self, SuggestedPrompt};

pub const EMPTY_PROMPT_ERROR: &str = "Please enter a prompt";

/// Outcome of asking to send the current prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submit {
    /// Accepted; the caller must invoke the agent with this prompt
    Send(String),
    /// Not signed in; a sign-in was requested instead
    AuthRequired,
    /// Blank prompt; the validation error is now pending
    Invalid,
    /// A send is already in flight; nothing changed
    Busy,
}

#[derive(Debug, Default)]
pub struct Conversation {
    local_mode: bool,
    user: Option<User>,
    messages: Vec<Message>,
    feedback: HashMap<usize, FeedbackState>,
    input: String,
    sending: bool,
    /// Bumped on sign-out so replies to an earlier session are dropped
    generation: u64,
    error: Option<String>,
    suggestions_visible: bool,
    sign_in_requested: bool,
}

impl Conversation {
    pub fn new(local_mode: bool) -> Self {
        Self {
            local_mode,
            suggestions_visible: true,
            ..Self::default()
        }
    }

    // Read access

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.local_mode || self.user.is_some()
    }

    pub fn feedback_state(&self, index: usize) -> FeedbackState {
        self.feedback.get(&index).copied().unwrap_or_default()
    }

    /// Suggestions are hidden while a reply is pending
    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible && !self.sending
    }

    pub fn suggestions(&self) -> &'static [SuggestedPrompt] {
        suggestions::suggestions(&self.messages)
    }

    // Input

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn select_suggestion(&mut self, text: &str) {
        self.input = text.to_string();
        self.suggestions_visible = false;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // Session

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn request_sign_in(&mut self) {
        self.sign_in_requested = true;
    }

    /// Returns true once per sign-in request
    pub fn take_sign_in_request(&mut self) -> bool {
        std::mem::take(&mut self.sign_in_requested)
    }

    /// Drops the user and the whole conversation. A send still in flight
    /// belongs to the old generation and its reply is discarded.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.messages.clear();
        self.feedback.clear();
        self.error = None;
        self.suggestions_visible = true;
        self.sending = false;
        self.generation = self.generation.wrapping_add(1);
    }

    // Sending

    pub fn begin_submit(&mut self) -> Submit {
        if self.sending {
            return Submit::Busy;
        }

        if !self.is_authenticated() {
            self.request_sign_in();
            return Submit::AuthRequired;
        }

        if self.input.trim().is_empty() {
            self.error = Some(EMPTY_PROMPT_ERROR.to_string());
            return Submit::Invalid;
        }

        let prompt = std::mem::take(&mut self.input);
        self.messages.push(Message::user(prompt.clone()));
        self.suggestions_visible = false;
        self.sending = true;
        self.error = None;

        Submit::Send(prompt)
    }

    pub fn complete_submit(&mut self, result: Result<String, InvocationError>) {
        match result {
            Ok(reply) => {
                self.messages.push(Message::agent(clean_response(&reply)));
                self.suggestions_visible = true;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        self.sending = false;
    }

    /// Completes a background send. False when the send was started before a
    /// sign-out; the outcome is dropped.
    pub fn complete_submit_for(
        &mut self,
        generation: u64,
        result: Result<String, InvocationError>,
    ) -> bool {
        if generation != self.generation {
            log::debug!(
                "Dropping reply from generation {} (now {})",
                generation,
                self.generation
            );
            return false;
        }
        self.complete_submit(result);
        true
    }

    /// Begin, await the agent inline, and complete.
    pub async fn submit(&mut self, agent: &dyn Agent) -> Submit {
        let outcome = self.begin_submit();
        if let Submit::Send(prompt) = &outcome {
            let result = agent.invoke(prompt).await;
            self.complete_submit(result);
        }
        outcome
    }

    // Feedback

    /// Marks the rating as submitting. False when the index is not an agent
    /// message, already rated, or mid-submission.
    pub fn begin_feedback(&mut self, index: usize) -> bool {
        if !self.messages.get(index).is_some_and(Message::is_agent) {
            return false;
        }

        let state = self.feedback.entry(index).or_default();
        if state.locked() {
            return false;
        }
        state.submitting = true;
        true
    }

    pub fn finish_feedback(&mut self, index: usize, feedback: Feedback, result: anyhow::Result<()>) {
        let Some(state) = self.feedback.get_mut(&index) else {
            return;
        };
        state.submitting = false;

        match result {
            Ok(()) => {
                if state.feedback.is_none() {
                    state.feedback = Some(feedback);
                }
            }
            Err(e) => log::warn!("Failed to submit feedback for message {}: {}", index, e),
        }
    }

    pub async fn set_feedback(
        &mut self,
        index: usize,
        feedback: Feedback,
        sink: &dyn FeedbackSink,
    ) -> bool {
        if !self.begin_feedback(index) {
            return false;
        }
        let result = sink.record(index, feedback).await;
        self.finish_feedback(index, feedback, result);
        true
    }

    // Copy

    /// Clipboard failures are logged and otherwise ignored
    pub fn copy(&mut self, index: usize, text: &str, clipboard: &mut dyn ClipboardWriter) -> bool {
        match clipboard.write_text(text) {
            Ok(()) => {
                self.feedback.entry(index).or_default().copied = true;
                true
            }
            Err(e) => {
                log::warn!("Failed to copy: {}", e);
                false
            }
        }
    }

    pub fn clear_copied(&mut self, index: usize) {
        if let Some(state) = self.feedback.get_mut(&index) {
            state.copied = false;
        }
    }
}

/// Tidy up replies that arrive as half-decoded JSON strings: trim, drop one
/// matching pair of outer quotes, and turn literal `\n` / `\t` into real
/// whitespace.
pub fn clean_response(response: &str) -> String {
    let mut cleaned = response.trim();

    for quote in ['"', '\''] {
        if cleaned.len() >= 2 && cleaned.starts_with(quote) && cleaned.ends_with(quote) {
            cleaned = &cleaned[1..cleaned.len() - 1];
            break;
        }
    }

    cleaned.replace("\\n", "\n").replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AgentError, ClipboardError};
    use crate::feedback::SimulatedFeedback;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedAgent {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl FixedAgent {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Agent for FixedAgent {
        async fn invoke(&self, _prompt: &str) -> Result<String, InvocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(AgentError::Transport {
                    label: "AgentCore",
                    status: 502,
                    reason: "Bad Gateway".to_string(),
                    body: "upstream down".to_string(),
                }
                .into()),
            }
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        contents: Vec<String>,
        broken: bool,
    }

    impl ClipboardWriter for FakeClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError::Unavailable);
            }
            self.contents.push(text.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl FeedbackSink for FailingSink {
        async fn record(&self, _index: usize, _feedback: Feedback) -> anyhow::Result<()> {
            anyhow::bail!("feedback service unavailable")
        }
    }

    fn instant_sink() -> SimulatedFeedback {
        SimulatedFeedback::new(Duration::ZERO)
    }

    async fn conversation_with_reply(reply: &str) -> Conversation {
        let mut conversation = Conversation::new(true);
        conversation.set_input("question");
        conversation.submit(&FixedAgent::replying(reply)).await;
        conversation
    }

    #[test]
    fn test_clean_response_strips_double_quotes() {
        assert_eq!(clean_response("\"hello\""), "hello");
    }

    #[test]
    fn test_clean_response_strips_single_quotes() {
        assert_eq!(clean_response("  'hello'  "), "hello");
    }

    #[test]
    fn test_clean_response_strips_only_one_pair() {
        assert_eq!(clean_response("\"\"nested\"\""), "\"nested\"");
    }

    #[test]
    fn test_clean_response_unescapes_newlines_and_tabs() {
        assert_eq!(clean_response("line1\\nline2"), "line1\nline2");
        assert_eq!(clean_response("a\\tb"), "a\tb");
    }

    #[test]
    fn test_clean_response_leaves_unbalanced_quotes() {
        assert_eq!(clean_response("  \"hello  "), "\"hello");
        assert_eq!(clean_response("'hello\""), "'hello\"");
    }

    #[test]
    fn test_clean_response_single_quote_char() {
        assert_eq!(clean_response("\""), "\"");
    }

    #[tokio::test]
    async fn test_successful_send_appends_user_then_agent() {
        let agent = FixedAgent::replying("\"The answer\\nis 579\"");
        let mut conversation = Conversation::new(true);
        conversation.set_input("What is 123 + 456? ");

        let outcome = conversation.submit(&agent).await;

        assert_eq!(outcome, Submit::Send("What is 123 + 456? ".to_string()));
        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, crate::state::Role::User);
        assert_eq!(messages[0].text, "What is 123 + 456? ");
        assert_eq!(messages[1].role, crate::state::Role::Agent);
        assert_eq!(messages[1].text, "The answer\nis 579");
        assert_eq!(conversation.input(), "");
        assert!(!conversation.is_sending());
        assert!(conversation.error().is_none());
        assert!(conversation.suggestions_visible());
    }

    #[tokio::test]
    async fn test_blank_prompt_sets_validation_error() {
        let agent = FixedAgent::replying("unused");
        let mut conversation = Conversation::new(true);
        conversation.set_input("   \t ");

        let outcome = conversation.submit(&agent).await;

        assert_eq!(outcome, Submit::Invalid);
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.error(), Some(EMPTY_PROMPT_ERROR));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_history_and_sets_error() {
        let mut conversation = conversation_with_reply("first answer").await;
        conversation.set_input("second question");

        conversation.submit(&FixedAgent::failing()).await;

        assert_eq!(conversation.messages().len(), 3);
        let error = conversation.error().unwrap();
        assert!(error.starts_with("Failed to invoke agent:"));
        assert!(error.contains("502"));
        assert!(!conversation.is_sending());
    }

    #[test]
    fn test_begin_submit_while_sending_is_noop() {
        let mut conversation = Conversation::new(true);
        conversation.set_input("first");
        assert!(matches!(conversation.begin_submit(), Submit::Send(_)));

        conversation.set_input("second");
        assert_eq!(conversation.begin_submit(), Submit::Busy);
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.input(), "second");
        assert!(conversation.is_sending());
    }

    #[test]
    fn test_sending_hides_suggestions_and_clears_error() {
        let mut conversation = Conversation::new(true);
        conversation.begin_submit();
        assert!(conversation.error().is_some());

        conversation.set_input("hello");
        conversation.begin_submit();
        assert!(conversation.error().is_none());
        assert!(!conversation.suggestions_visible());
    }

    #[tokio::test]
    async fn test_signed_out_production_requests_sign_in() {
        let agent = FixedAgent::replying("unused");
        let mut conversation = Conversation::new(false);
        conversation.set_input("hello");

        assert_eq!(conversation.submit(&agent).await, Submit::AuthRequired);
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.input(), "hello");
        assert!(conversation.take_sign_in_request());
        assert!(!conversation.take_sign_in_request());
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);

        conversation.set_user(Some(User {
            email: "ana@example.com".to_string(),
        }));
        assert!(matches!(conversation.submit(&agent).await, Submit::Send(_)));
    }

    #[tokio::test]
    async fn test_feedback_is_write_once() {
        let mut conversation = conversation_with_reply("answer").await;
        let sink = instant_sink();

        assert!(conversation.set_feedback(1, Feedback::Helpful, &sink).await);
        assert!(!conversation.set_feedback(1, Feedback::NotHelpful, &sink).await);

        let state = conversation.feedback_state(1);
        assert_eq!(state.feedback, Some(Feedback::Helpful));
        assert!(!state.submitting);
    }

    #[tokio::test]
    async fn test_feedback_blocked_while_submitting() {
        let mut conversation = conversation_with_reply("answer").await;

        assert!(conversation.begin_feedback(1));
        assert!(conversation.feedback_state(1).submitting);
        assert!(!conversation.begin_feedback(1));

        conversation.finish_feedback(1, Feedback::NotHelpful, Ok(()));
        assert_eq!(conversation.feedback_state(1).feedback, Some(Feedback::NotHelpful));
    }

    #[tokio::test]
    async fn test_feedback_only_on_agent_messages() {
        let mut conversation = conversation_with_reply("answer").await;
        assert!(!conversation.begin_feedback(0));
        assert!(!conversation.begin_feedback(7));
    }

    #[tokio::test]
    async fn test_failed_feedback_can_be_retried() {
        let mut conversation = conversation_with_reply("answer").await;

        assert!(conversation.set_feedback(1, Feedback::Helpful, &FailingSink).await);
        let state = conversation.feedback_state(1);
        assert_eq!(state.feedback, None);
        assert!(!state.submitting);

        assert!(conversation.set_feedback(1, Feedback::Helpful, &instant_sink()).await);
        assert_eq!(conversation.feedback_state(1).feedback, Some(Feedback::Helpful));
    }

    #[tokio::test]
    async fn test_copy_sets_and_clears_indicator() {
        let mut conversation = conversation_with_reply("answer").await;
        let mut clipboard = FakeClipboard::default();

        assert!(conversation.copy(1, "answer", &mut clipboard));
        assert_eq!(clipboard.contents, vec!["answer".to_string()]);
        assert!(conversation.feedback_state(1).copied);

        conversation.clear_copied(1);
        assert!(!conversation.feedback_state(1).copied);
    }

    #[tokio::test]
    async fn test_copy_failure_is_silent() {
        let mut conversation = conversation_with_reply("answer").await;
        let mut clipboard = FakeClipboard {
            broken: true,
            ..FakeClipboard::default()
        };

        assert!(!conversation.copy(1, "answer", &mut clipboard));
        assert_eq!(conversation.feedback_state(1), FeedbackState::default());
        assert!(conversation.error().is_none());
    }

    #[tokio::test]
    async fn test_suggestions_follow_last_reply() {
        let conversation = conversation_with_reply("The sum is 579").await;
        assert_eq!(conversation.suggestions(), &suggestions::AFTER_CALCULATION);
    }

    #[test]
    fn test_select_suggestion_fills_input() {
        let mut conversation = Conversation::new(true);
        assert!(conversation.suggestions_visible());

        conversation.select_suggestion("What is 123 + 456?");
        assert_eq!(conversation.input(), "What is 123 + 456?");
        assert!(!conversation.suggestions_visible());
    }

    #[tokio::test]
    async fn test_sign_out_clears_conversation() {
        let mut conversation = conversation_with_reply("answer").await;
        conversation.set_user(Some(User {
            email: "ana@example.com".to_string(),
        }));
        conversation.set_feedback(1, Feedback::Helpful, &instant_sink()).await;

        conversation.sign_out();

        assert!(conversation.user().is_none());
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.feedback_state(1), FeedbackState::default());
    }

    #[test]
    fn test_reply_after_sign_out_is_dropped() {
        let mut conversation = Conversation::new(false);
        conversation.set_user(Some(User {
            email: "ana@example.com".to_string(),
        }));
        conversation.set_input("hello");
        assert_eq!(conversation.begin_submit(), Submit::Send("hello".to_string()));
        let started = conversation.generation();

        conversation.sign_out();
        assert!(!conversation.is_sending());

        assert!(!conversation.complete_submit_for(started, Ok("stale".to_string())));
        assert!(conversation.messages().is_empty());
        assert!(conversation.error().is_none());
    }

    #[test]
    fn test_reply_in_same_generation_is_applied() {
        let mut conversation = Conversation::new(true);
        conversation.set_input("hello");
        conversation.begin_submit();

        let generation = conversation.generation();
        assert!(conversation.complete_submit_for(generation, Ok("hi".to_string())));
        assert_eq!(conversation.messages().len(), 2);
        assert!(!conversation.is_sending());
    }
}
