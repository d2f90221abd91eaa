//! UI utilities for the client.

use std::io::Write;

use crate::domain::{RoomId, UserId};

/// Prompt text shown by the line editor
pub fn prompt_text(user: &UserId, room: &RoomId) -> String {
    format!("{}@{}> ", user, room)
}

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
