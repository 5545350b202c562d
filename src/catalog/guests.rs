//! Guest-mention extraction.
//!
//! A fixed regex set pulls capitalized two-or-more-word sequences out of
//! video titles and descriptions after cues like "with", "ft.", or an em
//! dash. This is a labeled heuristic, not a named-entity recognizer: it will
//! happily collect "San Francisco" after "with" and miss a guest whose name
//! is written lowercase. Upgrading it to real NER would change observable
//! answers, so it stays as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::VideoRecord;

/// A name and the number of distinct videos it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestMention {
    pub name: String,
    pub video_count: usize,
}

// Two-or-more capitalized words, allowing apostrophes and hyphens inside
// a word ("O'Brien", "Jean-Luc").
const NAME: &str = r"((?:[A-Z][A-Za-z'\-]+\s+)+[A-Z][A-Za-z'\-]+)";

static GUEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"\bwith\s+{NAME}"),
        format!(r"\bfeaturing\s+{NAME}"),
        format!(r"\bfeat\.?\s+{NAME}"),
        format!(r"\bft\.?\s+{NAME}"),
        format!(r"\bguest:?\s+{NAME}"),
        format!(r"[—–-]\s*{NAME}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("guest pattern must compile"))
    .collect()
});

/// Names mentioned in a single video's title + description, deduplicated.
fn names_in(video: &VideoRecord) -> Vec<String> {
    let text = format!("{} {}", video.title, video.description);
    let mut names: Vec<String> = Vec::new();
    for pattern in GUEST_PATTERNS.iter() {
        for caps in pattern.captures_iter(&text) {
            if let Some(m) = caps.get(1) {
                let name = m.as_str().trim().to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// Extract guest mentions across `videos`, ranked by how many videos each
/// name appears in (descending; ties alphabetical for determinism).
pub fn extract_guests(videos: &[VideoRecord]) -> Vec<GuestMention> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for video in videos {
        for name in names_in(video) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut mentions: Vec<GuestMention> = counts
        .into_iter()
        .map(|(name, video_count)| GuestMention { name, video_count })
        .collect();
    mentions.sort_by(|a, b| {
        b.video_count
            .cmp(&a.video_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    mentions
}
