use serde::{Deserialize, Serialize};

pub use crate::chatbot::ChatReply;

/// A message for the help bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}
