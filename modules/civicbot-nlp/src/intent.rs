use std::sync::LazyLock;

use regex::Regex;

use civicbot_common::Intent;

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(hello|hi|hey|howdy|hola|greetings|good morning|good afternoon|good evening|what's up|sup|yo)\b",
    )
    .unwrap()
});

const HELP_PHRASES: [&str; 4] = ["help", "what can you do", "how does this work", "assist"];
const THANKS_PHRASES: [&str; 2] = ["thank", "appreciate"];
const STATUS_PHRASES: [&str; 3] = ["status", "update", "check"];

/// Route an inbound message to a conversation intent. First match wins, in
/// fixed priority order: greeting, help, thanks, status check, report.
/// A message with neither text nor media is unclear.
pub fn classify(message: &str, has_media: bool) -> Intent {
    let msg = message.trim().to_lowercase();

    if msg.is_empty() {
        return if has_media {
            Intent::Report
        } else {
            Intent::Unclear
        };
    }

    if GREETING_RE.is_match(&msg) {
        return Intent::Greeting;
    }

    if HELP_PHRASES.iter().any(|p| msg.contains(p)) {
        return Intent::Help;
    }

    if THANKS_PHRASES.iter().any(|p| msg.contains(p)) {
        return Intent::Thanks;
    }

    let purely_numeric = msg.chars().all(|c| c.is_ascii_digit());
    if purely_numeric || STATUS_PHRASES.iter().any(|p| msg.contains(p)) {
        return Intent::StatusCheck;
    }

    Intent::Report
}
