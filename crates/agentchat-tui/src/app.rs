use std::sync::Arc;

use agentchat_core::{
    Agent, AgentClient, AuthProvider, ClipboardWriter, Config, Conversation,
    EndpointMode, Feedback, FeedbackSink, InvocationError, LocalDevAuth, SimulatedFeedback,
    Submit, TokenAuth, COPY_FEEDBACK_DURATION,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::clipboard::SystemClipboard;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub mode: EndpointMode,
    pub checking_auth: bool,

    // Conversation (all business state lives here)
    pub conversation: Conversation,
    pub input_cursor: usize, // cursor position in the prompt, in chars

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub selected_message: Option<usize>, // always an agent message

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Sign-in prompt state
    pub show_sign_in: bool,
    pub sign_in_input: String,
    pub sign_in_error: Option<String>,

    // Collaborators
    agent: Arc<dyn Agent>,
    auth: Arc<dyn AuthProvider>,
    token_auth: Option<Arc<TokenAuth>>,
    feedback_sink: Arc<dyn FeedbackSink>,
    clipboard: Box<dyn ClipboardWriter>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, events: UnboundedSender<AppEvent>) -> Self {
        let mode = config.mode();

        let (auth, token_auth): (Arc<dyn AuthProvider>, Option<Arc<TokenAuth>>) = match mode {
            EndpointMode::Local => (Arc::new(LocalDevAuth), None),
            EndpointMode::Production => {
                let token_auth = Arc::new(TokenAuth::new(config.access_token.clone()));
                (token_auth.clone(), Some(token_auth))
            }
        };

        let agent: Arc<dyn Agent> = Arc::new(AgentClient::new(config, auth.clone()));

        Self::with_collaborators(
            mode,
            agent,
            auth,
            token_auth,
            Arc::new(SimulatedFeedback::default()),
            Box::new(SystemClipboard::new()),
            events,
        )
    }

    pub fn with_collaborators(
        mode: EndpointMode,
        agent: Arc<dyn Agent>,
        auth: Arc<dyn AuthProvider>,
        token_auth: Option<Arc<TokenAuth>>,
        feedback_sink: Arc<dyn FeedbackSink>,
        clipboard: Box<dyn ClipboardWriter>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            mode,
            checking_auth: true,

            conversation: Conversation::new(mode == EndpointMode::Local),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            selected_message: None,

            animation_frame: 0,

            show_sign_in: false,
            sign_in_input: String::new(),
            sign_in_error: None,

            agent,
            auth,
            token_auth,
            feedback_sink,
            clipboard,
            events,
        }
    }

    /// Ask the auth collaborator who is signed in
    pub async fn check_auth(&mut self) {
        let user = match self.auth.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                log::info!("No signed-in user: {}", e);
                None
            }
        };
        self.conversation.set_user(user);
        self.checking_auth = false;
    }

    // Sending

    pub fn submit(&mut self) {
        match self.conversation.begin_submit() {
            Submit::Send(prompt) => {
                self.input_cursor = 0;
                self.scroll_chat_to_bottom();

                let agent = self.agent.clone();
                let events = self.events.clone();
                let generation = self.conversation.generation();
                tokio::spawn(async move {
                    let result = agent.invoke(&prompt).await;
                    let _ = events.send(AppEvent::AgentReply { generation, result });
                });
            }
            Submit::AuthRequired => {
                if self.conversation.take_sign_in_request() {
                    self.open_sign_in();
                }
            }
            Submit::Invalid | Submit::Busy => {}
        }
    }

    pub fn on_agent_reply(&mut self, generation: u64, result: Result<String, InvocationError>) {
        if !self.conversation.complete_submit_for(generation, result) {
            return;
        }
        self.selected_message = self.last_agent_message();
        self.scroll_chat_to_bottom();
    }

    // Message actions

    pub fn rate_selected(&mut self, feedback: Feedback) {
        let Some(index) = self.selected_message else {
            return;
        };
        if !self.conversation.begin_feedback(index) {
            return;
        }

        let sink = self.feedback_sink.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = sink.record(index, feedback).await;
            let _ = events.send(AppEvent::FeedbackRecorded {
                index,
                feedback,
                result,
            });
        });
    }

    pub fn on_feedback_recorded(&mut self, index: usize, feedback: Feedback, result: anyhow::Result<()>) {
        self.conversation.finish_feedback(index, feedback, result);
    }

    pub fn copy_selected(&mut self) {
        let Some(index) = self.selected_message else {
            return;
        };
        let Some(text) = self.conversation.messages().get(index).map(|m| m.text.clone()) else {
            return;
        };

        if self.conversation.copy(index, &text, self.clipboard.as_mut()) {
            let events = self.events.clone();
            tokio::spawn(async move {
                tokio::time::sleep(COPY_FEEDBACK_DURATION).await;
                let _ = events.send(AppEvent::CopyExpired(index));
            });
        }
    }

    pub fn on_copy_expired(&mut self, index: usize) {
        self.conversation.clear_copied(index);
    }

    pub fn select_next_message(&mut self) {
        let start = self.selected_message.map(|i| i + 1).unwrap_or(0);
        let next = self
            .conversation
            .messages()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, m)| m.is_agent())
            .map(|(i, _)| i);
        if next.is_some() {
            self.selected_message = next;
        }
    }

    pub fn select_prev_message(&mut self) {
        let end = match self.selected_message {
            Some(i) => i,
            None => return,
        };
        let prev = self.conversation.messages()[..end]
            .iter()
            .rposition(|m| m.is_agent());
        if prev.is_some() {
            self.selected_message = prev;
        }
    }

    fn last_agent_message(&self) -> Option<usize> {
        self.conversation.messages().iter().rposition(|m| m.is_agent())
    }

    // Suggestions

    /// `n` is zero-based
    pub fn pick_suggestion(&mut self, n: usize) {
        if !self.conversation.suggestions_visible() {
            return;
        }
        if let Some(prompt) = self.conversation.suggestions().get(n) {
            self.conversation.select_suggestion(prompt.text);
            self.input_cursor = prompt.text.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    // Session

    pub fn open_sign_in(&mut self) {
        if self.token_auth.is_none() {
            return;
        }
        self.show_sign_in = true;
        self.sign_in_input.clear();
        self.sign_in_error = None;
    }

    pub fn close_sign_in(&mut self) {
        self.show_sign_in = false;
        self.sign_in_input.clear();
        self.sign_in_error = None;
    }

    pub async fn submit_sign_in(&mut self) {
        let Some(token_auth) = self.token_auth.clone() else {
            return;
        };
        match token_auth.sign_in(&self.sign_in_input) {
            Ok(_) => {
                self.close_sign_in();
                self.check_auth().await;
            }
            Err(e) => self.sign_in_error = Some(e.to_string()),
        }
    }

    /// Local development has no session to end
    pub async fn sign_out(&mut self) {
        if self.mode == EndpointMode::Local {
            return;
        }
        self.auth.sign_out().await;
        self.conversation.sign_out();
        self.selected_message = None;
        self.chat_scroll = 0;
    }

    pub async fn toggle_session(&mut self) {
        if self.conversation.user().is_some() {
            self.sign_out().await;
        } else {
            self.open_sign_in();
        }
    }

    // View helpers

    pub fn tick_animation(&mut self) {
        if self.conversation.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    /// Scroll chat to bottom so the newest message (or the pending indicator)
    /// is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for (index, msg) in self.conversation.messages().iter().enumerate() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Agent:")
            for line in msg.text.lines() {
                // Character count, not byte length
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            if msg.is_agent() && self.message_status(index).is_some() {
                total_lines = total_lines.saturating_add(1);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.conversation.is_sending() {
            total_lines = total_lines.saturating_add(2); // "Agent:" + "Generating a response..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        let scroll = total_lines.saturating_sub(visible_height as usize);
        self.chat_scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    }

    /// Status line under an agent message, if any
    pub fn message_status(&self, index: usize) -> Option<String> {
        let state = self.conversation.feedback_state(index);
        let mut parts = Vec::new();

        if state.submitting {
            parts.push("Submitting feedback...".to_string());
        } else if let Some(feedback) = state.feedback {
            parts.push(format!("Feedback submitted ({})", feedback.display_name()));
        }
        if state.copied {
            parts.push("Copied".to_string());
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" · "))
        }
    }

    pub fn user_label(&self) -> String {
        match (self.mode, self.conversation.user()) {
            (EndpointMode::Local, _) => "Local Development".to_string(),
            (_, Some(user)) => format!("{} | Sign Out", user.email),
            (_, None) => "Sign In".to_string(),
        }
    }
}
