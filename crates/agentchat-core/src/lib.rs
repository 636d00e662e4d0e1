pub mod agent;
pub mod auth;
pub mod clipboard;
pub mod config;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod mode;
pub mod state;
pub mod suggestions;

// Re-export main types for convenience
pub use agent::{Agent, AgentClient};
pub use auth::{AuthProvider, LocalDevAuth, TokenAuth, User};
pub use clipboard::{ClipboardWriter, COPY_FEEDBACK_DURATION};
pub use config::Config;
pub use conversation::{clean_response, Conversation, Submit};
pub use error::{AgentError, AuthError, ClipboardError, ConfigError, InvocationError};
pub use feedback::{FeedbackSink, SimulatedFeedback};
pub use mode::EndpointMode;
pub use state::{Feedback, FeedbackState, Message, Role};
pub use suggestions::{suggestions, SuggestedPrompt};
