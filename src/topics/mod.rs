//! # Conversation Topics
//!
//! Text printed under an uploaded image when the user did not supply their
//! own. A [`TopicSource`] turns an optional hint into a list of conversation
//! prompts already formatted for the receipt:
//!
//! ```text
//!
//! CONVERSATION TOPICS
//! ========================================
//! Printed on: March 04, 2026
//!
//! 1. ...
//! 2. ...
//!
//! ========================================
//! ```
//!
//! ## Sources
//!
//! - [`OpenAiTopicSource`]: chat-completions API
//! - [`StaticTopicSource`]: fixed text, used when no API key is configured

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiTopicSource};

use async_trait::async_trait;
use chrono::Local;

use crate::error::Result;
use crate::sanitize::sanitize;

/// Header line of every topics slip.
pub const HEADER: &str = "CONVERSATION TOPICS";

/// Width of the `=` rules around the topics.
pub const RULE_WIDTH: usize = 40;

/// Printed when topic generation fails.
pub const FALLBACK_TOPICS: &str = "\nCONVERSATION TOPICS\n\
========================================\n\
\n\
1. What's something small that made today better than expected?\n\
2. What's a habit of mine you've quietly gotten used to?\n\
3. What's one thing we should do more of this month?\n\
4. What's a memory from this year you'd like to keep?\n\
5. What's something you're looking forward to that you haven't said out loud?\n\
\n\
========================================\n";

/// Prompt sent when the caller gives no override.
pub const BASE_PROMPT: &str = "\
Write 15 numbered conversation prompts for a couple to talk through together. \
Keep the tone warm and a little playful, curious rather than heavy, and \
grounded in ordinary day-to-day life, including the busy stretches that come \
with raising small children. Favor questions about shared values, quiet \
wins, how each person has grown, and the small things that keep a \
relationship close. Each prompt should be easy to start answering and \
reward a real answer.

Output plain ASCII text only: one prompt per line, numbered 1 to 15, with no \
emojis, no unicode symbols and no markdown. The text goes straight to a \
thermal receipt printer.

Examples of the style:
1. What's a decision we made early on that still shapes our days?
2. What's something you've stopped worrying about since we've been together?
3. What's a moment this week when you felt like we were a good team?
4. What's something I do that you'd miss if I stopped?
5. What's a part of our routine you'd keep even if everything else changed?";

/// Generates the text printed under an image.
#[async_trait]
pub trait TopicSource: Send + Sync {
    /// Produce topics ready to print.
    ///
    /// `user_hint` steers the topics; a non-blank `system_prompt` replaces
    /// [`BASE_PROMPT`].
    async fn generate_topics(
        &self,
        user_hint: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String>;
}

/// Assemble the prompt sent to the model.
pub fn build_prompt(user_hint: Option<&str>, system_prompt: Option<&str>) -> String {
    let mut prompt = match system_prompt.map(str::trim) {
        Some(custom) if !custom.is_empty() => custom.to_string(),
        _ => BASE_PROMPT.to_string(),
    };

    if let Some(hint) = user_hint.map(str::trim).filter(|h| !h.is_empty()) {
        prompt.push_str(
            "\n\nIMPORTANT: on top of the instructions above, follow these \
             additional instructions from the user:\n",
        );
        prompt.push_str(hint);
    }

    prompt
}

/// Wrap model output in the topics slip layout.
pub fn format_for_thermal_print(text: &str) -> String {
    format_with_date(text, &Local::now().format("%B %d, %Y").to_string())
}

fn format_with_date(text: &str, date: &str) -> String {
    let body = sanitize(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let rule = "=".repeat(RULE_WIDTH);

    format!("\n{HEADER}\n{rule}\nPrinted on: {date}\n\n{body}\n\n{rule}\n")
}

/// Returns the same text for every request.
#[derive(Debug, Clone)]
pub struct StaticTopicSource {
    text: String,
}

impl StaticTopicSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StaticTopicSource {
    fn default() -> Self {
        Self::new(FALLBACK_TOPICS)
    }
}

#[async_trait]
impl TopicSource for StaticTopicSource {
    async fn generate_topics(&self, _user_hint: Option<&str>, _system_prompt: Option<&str>) -> Result<String> {
        Ok(self.text.clone())
    }
}
