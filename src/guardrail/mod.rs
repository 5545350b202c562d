//! Topic guardrail.
//!
//! Decides whether a prompt is in scope *before* any external API call is
//! spent on it. Pure keyword containment over the lowercased prompt:
//! blocklist hit → rejected, else allowlist hit → accepted, else rejected.
//! The blocklist always wins, even when an allowlisted term is also present.

/// Canned reply for rejected prompts. No external call is made.
pub const OFF_TOPIC_MESSAGE: &str = "I can only help with questions about the show - episodes, \
    videos, and guests. Try asking about the latest episode!";

/// Subjects the widget explicitly refuses to engage with.
const BLOCKLIST: &[&str] = &[
    "homework",
    "assignment",
    "essay",
    "exam",
    "medical",
    "diagnosis",
    "prescription",
    "legal advice",
    "lawyer",
    "lawsuit",
    "tax advice",
    "investment",
    "stock tip",
    "crypto",
    "gambling",
    "betting",
    "dating",
];

/// Show-related vocabulary that marks a prompt as in scope.
const ALLOWLIST: &[&str] = &[
    "episode",
    "episde", // long-lived typo in real traffic, kept deliberately
    "video",
    "upload",
    "show",
    "podcast",
    "guest",
    "host",
    "channel",
    "watch",
    "interview",
    "season",
    "clip",
    "subscribe",
    "latest",
    "newest",
    "recent",
    "popular",
    "summary",
    "summarize",
    "recap",
    "about",
    "topic",
    "speaker",
    "series",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Rejected,
}

/// Classify a prompt against the keyword lists. Blocklist precedence is
/// absolute; prompts matching neither list are rejected.
pub fn screen(prompt: &str) -> Verdict {
    let t = prompt.to_lowercase();

    if BLOCKLIST.iter().any(|term| t.contains(term)) {
        return Verdict::Rejected;
    }
    if ALLOWLIST.iter().any(|term| t.contains(term)) {
        return Verdict::Allowed;
    }
    Verdict::Rejected
}
