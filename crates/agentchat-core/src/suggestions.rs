//! Suggested follow-up prompts
//!
//! Picks one of five fixed prompt sets from the shape of the conversation. Only
//! the most recent message is inspected.

use crate::state::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedPrompt {
    pub id: &'static str,
    pub text: &'static str,
}

const fn prompt(id: &'static str, text: &'static str) -> SuggestedPrompt {
    SuggestedPrompt { id, text }
}

pub const STARTER: [SuggestedPrompt; 4] = [
    prompt("calc", "What is 123 + 456?"),
    prompt("weather", "What's the weather like today?"),
    prompt("table", "Create a comparison table of 3 AWS services"),
    prompt("math", "Calculate 2048 * 1024 and explain the result"),
];

pub const AFTER_CALCULATION: [SuggestedPrompt; 3] = [
    prompt("another-calc", "Can you do another calculation?"),
    prompt("weather-follow", "What's the weather?"),
    prompt("explain", "Can you explain that in more detail?"),
];

pub const AFTER_WEATHER: [SuggestedPrompt; 3] = [
    prompt("calc-follow", "What is 999 + 111?"),
    prompt("table-follow", "Show me a table with sample data"),
    prompt("thanks", "Thank you!"),
];

pub const AFTER_TABLE: [SuggestedPrompt; 3] = [
    prompt("another-table", "Create another table with different data"),
    prompt("calc-after-table", "Calculate 15 * 12"),
    prompt("format", "Can you format that differently?"),
];

pub const DEFAULT_FOLLOW_UP: [SuggestedPrompt; 3] = [
    prompt("more", "Tell me more"),
    prompt("calc-default", "Do a calculation"),
    prompt("weather-default", "Check the weather"),
];

const CALCULATION_WORDS: [&str; 3] = ["result", "sum", "calculation"];
const WEATHER_WORDS: [&str; 3] = ["weather", "sunny", "°f"];
const TABLE_WORDS: [&str; 2] = ["|", "table"];

pub fn suggestions(messages: &[Message]) -> &'static [SuggestedPrompt] {
    let Some(last) = messages.last() else {
        return &STARTER;
    };

    if last.role == Role::Agent {
        let text = last.text.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if mentions(&CALCULATION_WORDS) {
            return &AFTER_CALCULATION;
        }
        if mentions(&WEATHER_WORDS) {
            return &AFTER_WEATHER;
        }
        if mentions(&TABLE_WORDS) {
            return &AFTER_TABLE;
        }
    }

    &DEFAULT_FOLLOW_UP
}
