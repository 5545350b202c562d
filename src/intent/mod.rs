//! Prompt intent classification.
//!
//! An ordered table of pure predicates over the normalized prompt; the
//! first match wins. Priority is fixed and total: a prompt containing both
//! "latest episode" and "most popular" classifies as [`Intent::LatestEpisode`]
//! because that predicate sits earlier in [`MATCHERS`]. There is no scoring
//! and no best-match resolution; the table order *is* the specification.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Intents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "What is the latest episode?"
    LatestEpisode,
    /// "What are the most popular videos?"
    MostPopular,
    /// "Videos about robotics"
    TopicVideos { topic: String },
    /// "Episodes featuring Jane Doe"
    PersonVideos { person: String },
    /// "Who are the guests?"
    GuestList,
    /// "Which guests talked about robotics?"
    GuestsByTopic { topic: String },
    /// "Has Jane Doe been on the show?"
    HasPersonBeen { person: String },
    /// "What was it about?", resolved against stored context.
    AboutFollowUp,
    /// "Summarize #2", 1-indexed against the stored list.
    IndexedFollowUp { index: usize },
    /// Forwarded verbatim to the generative gateway.
    Fallback,
}

/// Lowercase and collapse whitespace; punctuation is kept for the regexes.
pub fn normalize(prompt: &str) -> String {
    prompt.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a raw prompt. Walks [`MATCHERS`] in order; first match wins.
pub fn classify(prompt: &str) -> Intent {
    let t = normalize(prompt);
    for matcher in MATCHERS {
        if let Some(intent) = matcher(&t) {
            return intent;
        }
    }
    Intent::Fallback
}

type Matcher = fn(&str) -> Option<Intent>;

/// Priority order. Do not reorder without also updating the tests that pin
/// each pairwise precedence.
const MATCHERS: &[Matcher] = &[
    match_latest_episode,
    match_most_popular,
    match_topic_videos,
    match_person_videos,
    match_guest_list,
    match_guests_by_topic,
    match_has_person_been,
    match_about_follow_up,
    match_indexed_follow_up,
];

// ============================================================================
// Keyword tables
// ============================================================================

const RECENCY_KEYWORDS: &[&str] = &["latest", "newest", "most recent", "last"];

// "episde" is a long-lived typo observed in real traffic.
const MEDIA_KEYWORDS: &[&str] = &["episode", "episde", "video", "upload", "show", "podcast"];

const POPULAR_PHRASES: &[&str] = &[
    "most popular",
    "top videos",
    "most viewed",
    "most watched",
    "popular videos",
    "best videos",
];

const GUEST_LIST_PHRASES: &[&str] = &[
    "who are the guests",
    "guest list",
    "list the guests",
    "list of guests",
    "past guests",
    "all the guests",
    "guests on the show",
    "who has been on the show",
];

const ABOUT_PHRASES: &[&str] = &[
    "what was this episode about",
    "what is this episode about",
    "what was it about",
    "what is it about",
    "tell me about this episode",
    "summarize it",
    "summary",
    "recap",
];

/// Captures that are pronouns or self-references, never real topics.
const STOP_TOPICS: &[&str] = &[
    "it",
    "this",
    "that",
    "them",
    "this episode",
    "the episode",
    "this video",
    "that video",
    "the show",
    "the podcast",
    "the channel",
];

/// "latest videos" must never become topic "latest".
const TWO_WORD_STOP: &[&str] = &[
    "latest", "newest", "recent", "new", "popular", "top", "best", "more", "any", "the",
];

// ============================================================================
// Regexes
// ============================================================================

static TOPIC_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:videos?|episodes?|uploads?|content)\s+(?:about|on|covering)\s+(.+)$").unwrap()
});

static TOPIC_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:about|on|related to|regarding|around)\s+(.+)$").unwrap());

static TOPIC_TWO_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9][a-z0-9\-]*)\s+(?:videos?|episodes?)\??$").unwrap());

static PERSON_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:videos?\s+with|episodes?\s+with|featuring|feat\.?|ft\.?|with\s+guest|guest)\s+(.+)$")
        .unwrap()
});

static HAS_BEEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:has|have)\s+(.+?)\s+been on\b").unwrap());

static WAS_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwas\s+(.+?)\s+on\s+(?:the\s+)?(?:show|podcast|channel)\b").unwrap()
});

static INDEX_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\d+)\b").unwrap());

static INDEX_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnumber\s+(\d+)\b").unwrap());

static INDEX_CMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:summari[sz]e|tell me about|describe)\s+#?(\d+)\??$").unwrap());

// ============================================================================
// Predicates (pure functions of the normalized prompt)
// ============================================================================

fn contains_any(t: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| t.contains(term))
}

fn has_media_word(t: &str) -> bool {
    contains_any(t, MEDIA_KEYWORDS)
}

/// Strip trailing punctuation/quotes and reject stop topics.
fn clean_phrase(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_end_matches(['?', '!', '.', ',', ';', ':', '"', '\''])
        .trim()
        .to_string();
    if cleaned.is_empty() || STOP_TOPICS.contains(&cleaned.as_str()) {
        return None;
    }
    Some(cleaned)
}

/// Recency keyword AND media keyword, both plain substring tests.
pub fn match_latest_episode(t: &str) -> Option<Intent> {
    if contains_any(t, RECENCY_KEYWORDS) && has_media_word(t) {
        return Some(Intent::LatestEpisode);
    }
    None
}

pub fn match_most_popular(t: &str) -> Option<Intent> {
    if contains_any(t, POPULAR_PHRASES) {
        return Some(Intent::MostPopular);
    }
    None
}

/// Topic extraction, strict form: an explicit media cue ("videos about X"),
/// a trailing topic phrase when a media word is present, or the two-word
/// "robotics videos" shorthand.
pub fn extract_topic(t: &str) -> Option<String> {
    if let Some(caps) = TOPIC_CUE.captures(t) {
        if let Some(topic) = clean_phrase(caps.get(1)?.as_str()) {
            return Some(topic);
        }
    }
    if has_media_word(t) {
        if let Some(caps) = TOPIC_TRAILING.captures(t) {
            if let Some(topic) = clean_phrase(caps.get(1)?.as_str()) {
                return Some(topic);
            }
        }
    }
    if let Some(caps) = TOPIC_TWO_WORD.captures(t) {
        let word = caps.get(1)?.as_str();
        if !TWO_WORD_STOP.contains(&word) {
            return Some(word.to_string());
        }
    }
    None
}

/// Topic extraction, relaxed form for guest queries: the "guest" token
/// already anchors the prompt, so the trailing regex runs ungated.
fn extract_topic_relaxed(t: &str) -> Option<String> {
    if let Some(topic) = extract_topic(t) {
        return Some(topic);
    }
    let caps = TOPIC_TRAILING.captures(t)?;
    clean_phrase(caps.get(1)?.as_str())
}

pub fn match_topic_videos(t: &str) -> Option<Intent> {
    // Guest-flavored prompts belong to the guest branches further down.
    if t.contains("guest") {
        return None;
    }
    extract_topic(t).map(|topic| Intent::TopicVideos { topic })
}

/// Person extraction after with/featuring/ft/guest cues.
pub fn extract_person(t: &str) -> Option<String> {
    let caps = PERSON_CUE.captures(t)?;
    let person = clean_phrase(caps.get(1)?.as_str())?;
    // "videos with guest jane doe" matches on "videos with"; drop the cue.
    let person = person.strip_prefix("guest ").unwrap_or(&person).to_string();
    // A capture that reads like a topic continuation is not a name.
    for prefix in ["about ", "on ", "the ", "a ", "list", "are ", "is "] {
        if person.starts_with(prefix) {
            return None;
        }
    }
    if person.contains(" about ") {
        return None;
    }
    Some(person)
}

pub fn match_person_videos(t: &str) -> Option<Intent> {
    extract_person(t).map(|person| Intent::PersonVideos { person })
}

pub fn match_guest_list(t: &str) -> Option<Intent> {
    if contains_any(t, GUEST_LIST_PHRASES) {
        return Some(Intent::GuestList);
    }
    None
}

pub fn match_guests_by_topic(t: &str) -> Option<Intent> {
    if !t.contains("guest") {
        return None;
    }
    extract_topic_relaxed(t).map(|topic| Intent::GuestsByTopic { topic })
}

pub fn match_has_person_been(t: &str) -> Option<Intent> {
    let caps = HAS_BEEN.captures(t).or_else(|| WAS_ON.captures(t))?;
    let person = clean_phrase(caps.get(1)?.as_str())?;
    Some(Intent::HasPersonBeen { person })
}

pub fn match_about_follow_up(t: &str) -> Option<Intent> {
    if contains_any(t, ABOUT_PHRASES) {
        return Some(Intent::AboutFollowUp);
    }
    None
}

pub fn match_indexed_follow_up(t: &str) -> Option<Intent> {
    let caps = INDEX_HASH
        .captures(t)
        .or_else(|| INDEX_NUMBER.captures(t))
        .or_else(|| INDEX_CMD.captures(t))?;
    let index: usize = caps.get(1)?.as_str().parse().ok()?;
    if index == 0 {
        return None;
    }
    Some(Intent::IndexedFollowUp { index })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Branch 1: latest episode ────────────────────────────────────────

    #[test]
    fn test_latest_needs_recency_and_media() {
        assert_eq!(classify("What is the latest episode?"), Intent::LatestEpisode);
        assert_eq!(classify("newest video please"), Intent::LatestEpisode);
        assert_eq!(classify("what was the most recent upload"), Intent::LatestEpisode);
        assert_eq!(classify("the episde that just came out? latest one"), Intent::LatestEpisode);
    }

    #[test]
    fn test_recency_without_media_is_not_latest() {
        // "latest" alone has nothing to anchor to.
        assert_ne!(classify("what's the latest"), Intent::LatestEpisode);
    }

    #[test]
    fn test_latest_wins_over_every_other_branch() {
        // Recency + media selects branch 1 even when other branches' keywords
        // are present; the priority order is fixed and total.
        assert_eq!(
            classify("latest episode about the most popular guests"),
            Intent::LatestEpisode
        );
        assert_eq!(
            classify("summarize the latest video"),
            Intent::LatestEpisode
        );
    }

    // ── Branch 2: most popular ──────────────────────────────────────────

    #[test]
    fn test_popular_phrases() {
        assert_eq!(classify("what are the most popular videos?"), Intent::MostPopular);
        assert_eq!(classify("show me your top videos"), Intent::MostPopular);
        assert_eq!(classify("most viewed stuff"), Intent::MostPopular);
    }

    // ── Branch 3: topic videos ──────────────────────────────────────────

    #[test]
    fn test_topic_via_cue_phrase() {
        assert_eq!(
            classify("videos about robotics"),
            Intent::TopicVideos { topic: "robotics".into() }
        );
        assert_eq!(
            classify("any episodes on machine learning?"),
            Intent::TopicVideos { topic: "machine learning".into() }
        );
    }

    #[test]
    fn test_topic_via_trailing_phrase_needs_media_word() {
        assert_eq!(
            classify("which video is regarding quantum computing"),
            Intent::TopicVideos { topic: "quantum computing".into() }
        );
    }

    #[test]
    fn test_topic_two_word_shorthand() {
        assert_eq!(
            classify("robotics videos"),
            Intent::TopicVideos { topic: "robotics".into() }
        );
        // ...but recency shorthands never become topics.
        assert_ne!(
            classify("new videos"),
            Intent::TopicVideos { topic: "new".into() }
        );
    }

    #[test]
    fn test_about_follow_up_is_not_a_topic() {
        // Nothing follows "about", so the topic regex has nothing to grab.
        assert_eq!(classify("what is this episode about"), Intent::AboutFollowUp);
    }

    // ── Branch 4: person videos ─────────────────────────────────────────

    #[test]
    fn test_person_via_with_and_featuring() {
        assert_eq!(
            classify("videos with jane doe"),
            Intent::PersonVideos { person: "jane doe".into() }
        );
        assert_eq!(
            classify("episodes featuring john smith?"),
            Intent::PersonVideos { person: "john smith".into() }
        );
        assert_eq!(
            classify("anything ft. ada lovelace"),
            Intent::PersonVideos { person: "ada lovelace".into() }
        );
    }

    #[test]
    fn test_bare_guest_cue_extracts_person() {
        assert_eq!(
            classify("videos with guest grace hopper"),
            Intent::PersonVideos { person: "grace hopper".into() }
        );
    }

    // ── Branch 5: guest list ────────────────────────────────────────────

    #[test]
    fn test_guest_list_phrases() {
        assert_eq!(classify("who are the guests?"), Intent::GuestList);
        assert_eq!(classify("show me the guest list"), Intent::GuestList);
    }

    // ── Branch 6: guests by topic ───────────────────────────────────────

    #[test]
    fn test_guests_by_topic() {
        assert_eq!(
            classify("which guests talked about robotics"),
            Intent::GuestsByTopic { topic: "robotics".into() }
        );
    }

    #[test]
    fn test_guest_prompts_never_classify_as_topic_videos() {
        let intent = classify("which guests talked about robotics");
        assert!(!matches!(intent, Intent::TopicVideos { .. }));
    }

    // ── Branch 7: has person been on ────────────────────────────────────

    #[test]
    fn test_has_person_been_on() {
        assert_eq!(
            classify("has jane doe been on?"),
            Intent::HasPersonBeen { person: "jane doe".into() }
        );
        assert_eq!(
            classify("was alan turing on the show"),
            Intent::HasPersonBeen { person: "alan turing".into() }
        );
    }

    // ── Branch 8: about follow-up ───────────────────────────────────────

    #[test]
    fn test_about_follow_up_phrases() {
        assert_eq!(classify("what was it about?"), Intent::AboutFollowUp);
        assert_eq!(classify("summarize it"), Intent::AboutFollowUp);
        assert_eq!(classify("give me a recap"), Intent::AboutFollowUp);
    }

    // ── Branch 9: indexed follow-up ─────────────────────────────────────

    #[test]
    fn test_indexed_follow_up_forms() {
        assert_eq!(classify("tell me about #2"), Intent::IndexedFollowUp { index: 2 });
        assert_eq!(classify("summarize #4"), Intent::IndexedFollowUp { index: 4 });
        assert_eq!(classify("summarize 3"), Intent::IndexedFollowUp { index: 3 });
        assert_eq!(classify("number 5"), Intent::IndexedFollowUp { index: 5 });
    }

    #[test]
    fn test_index_zero_is_rejected() {
        assert_eq!(classify("summarize #0"), Intent::Fallback);
    }

    // ── Branch 10: fallback ─────────────────────────────────────────────

    #[test]
    fn test_unmatched_prompts_fall_back() {
        assert_eq!(classify("who is the host?"), Intent::Fallback);
        assert_eq!(classify("hello there"), Intent::Fallback);
    }

    // ── Cross-branch priority pins ──────────────────────────────────────

    #[test]
    fn test_priority_popular_before_topic() {
        // "popular videos" is a popularity phrase even though "videos" could
        // anchor a topic reading.
        assert_eq!(classify("popular videos about anything"), Intent::MostPopular);
    }

    #[test]
    fn test_priority_about_before_indexed() {
        // "summary" sits in the about table, which outranks the index table.
        assert_eq!(classify("summary of number 2"), Intent::AboutFollowUp);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  What   IS\tthe LATEST  episode "), "what is the latest episode");
    }
}
