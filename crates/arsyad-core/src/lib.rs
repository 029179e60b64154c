pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod state;

// Re-export main types for convenience
pub use ai::{backend_from_config, GeminiClient, OllamaClient, ResponseSource};
pub use config::Config;
pub use conversation::{Conversation, PendingSend};
pub use error::{ConfigError, ConversationError, ResponseError};
pub use provider::Provider;
pub use state::{Message, MessageId, Role};
