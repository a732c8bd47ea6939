//! Per-format generation policy: sampling temperature, output cap and
//! post-processing of raw backend output.
//!
//! | format            | kind               | temp | cap | post-processing                       |
//! |-------------------|--------------------|------|-----|---------------------------------------|
//! | `telegram`        | short social post  | 0.8  | 200 | collapse blank lines, 300-char budget |
//! | `email`           | structured message | 0.7  | 300 | none                                  |
//! | `official_letter` | formal letter      | 0.5  | 600 | warn on missing markers               |
//! | `newsletter`      | bulk announcement  | 0.7  | 500 | collapse blank lines                  |
//! | anything else     | default            | 0.7  | -   | trim                                  |

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Character ceiling for short social posts.
pub const SOCIAL_POST_MAX_CHARS: usize = 300;

/// Markers a formal letter must keep for later filling.
pub const LETTER_MARKERS: [&str; 3] = ["[SENDER]", "[RECIPIENT]", "[DATE]"];

/// Descriptions of the custom formats shipped in the default templates.
/// They run under the default policy.
pub const BUNDLED_DESCRIPTIONS: [(&str, &str); 8] = [
    ("blog", "Informative blog article (~400-500 words)"),
    ("press_release", "Professional press release (~300-400 words)"),
    ("announcement", "Corporate announcement (~200-300 words)"),
    ("ad_copy", "Persuasive advertising copy (~150-200 words)"),
    ("seo_article", "SEO-optimized article (~500-700 words)"),
    ("video_script", "Video script (~300-400 words)"),
    ("podcast_description", "Podcast episode description (~150-200 words)"),
    ("faq", "Frequently asked questions section"),
];

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

/// Post-processing family a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Short post with a hard character budget.
    ShortSocialPost,
    /// Structured message; structure comes from the template.
    StructuredMessage,
    /// Formal letter with required placeholder markers.
    FormalLetter,
    /// Long announcement sent to many readers.
    BulkAnnouncement,
    /// Custom formats.
    Default,
}

/// Policy applied around one backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatStrategy {
    /// Post-processing family.
    pub kind: StrategyKind,
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
    /// Output token cap; `None` leaves the backend default.
    pub max_output_tokens: Option<u32>,
    /// Human-readable summary of the format.
    pub description: &'static str,
}

impl FormatStrategy {
    /// Short social post: 0.8, 200 tokens, 300-character budget.
    #[must_use]
    pub fn short_social_post() -> Self {
        Self {
            kind: StrategyKind::ShortSocialPost,
            temperature: 0.8,
            max_output_tokens: Some(200),
            description: "Short Telegram post (max 300 characters)",
        }
    }

    /// Structured message: 0.7, 300 tokens.
    #[must_use]
    pub fn structured_message() -> Self {
        Self {
            kind: StrategyKind::StructuredMessage,
            temperature: 0.7,
            max_output_tokens: Some(300),
            description: "Email with subject and body (~150 words)",
        }
    }

    /// Formal letter: 0.5, 600 tokens.
    #[must_use]
    pub fn formal_letter() -> Self {
        Self {
            kind: StrategyKind::FormalLetter,
            temperature: 0.5,
            max_output_tokens: Some(600),
            description: "Official letter (~300 words)",
        }
    }

    /// Bulk announcement: 0.7, 500 tokens.
    #[must_use]
    pub fn bulk_announcement() -> Self {
        Self {
            kind: StrategyKind::BulkAnnouncement,
            temperature: 0.7,
            max_output_tokens: Some(500),
            description: "Newsletter for a mailing list (~250 words)",
        }
    }

    /// Fallback for custom formats: 0.7, no cap, trim only.
    #[must_use]
    pub fn default_policy() -> Self {
        Self {
            kind: StrategyKind::Default,
            temperature: 0.7,
            max_output_tokens: None,
            description: "Custom format",
        }
    }

    /// Turn raw backend output into the final content for `format_name`.
    #[must_use]
    pub fn post_process(&self, format_name: &str, raw: &str) -> String {
        match self.kind {
            StrategyKind::ShortSocialPost => {
                let content = collapse_blank_lines(raw);
                let content = content.trim();
                let length = content.chars().count();
                if length > SOCIAL_POST_MAX_CHARS {
                    warn!(
                        format = format_name,
                        length, "post exceeds {} characters, trimming", SOCIAL_POST_MAX_CHARS
                    );
                }
                fit_sentences(content, SOCIAL_POST_MAX_CHARS)
            }
            StrategyKind::FormalLetter => {
                for marker in LETTER_MARKERS {
                    if !raw.contains(marker) {
                        warn!(format = format_name, marker, "letter is missing placeholder marker");
                    }
                }
                raw.trim().to_string()
            }
            StrategyKind::BulkAnnouncement => collapse_blank_lines(raw).trim().to_string(),
            StrategyKind::StructuredMessage | StrategyKind::Default => raw.trim().to_string(),
        }
    }
}

/// Replace runs of three or more newlines with a single blank line.
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Longest prefix of `text` made of whole sentences that fits in
/// `max_chars` characters.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace; the tail after
/// the last such boundary counts as a sentence too. Text already within the
/// budget is returned unchanged. When not even the first sentence fits, the
/// text is cut at `max_chars` characters.
#[must_use]
pub fn fit_sentences(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    // Byte offsets just past each sentence terminator.
    let mut ends: Vec<usize> = SENTENCE_END.find_iter(text).map(|m| m.start() + 1).collect();
    ends.push(text.len());

    let mut best = "";
    for end in ends {
        let candidate = text[..end].trim_end();
        if candidate.chars().count() <= max_chars {
            best = candidate;
        } else {
            break;
        }
    }

    if best.is_empty() {
        text.chars().take(max_chars).collect()
    } else {
        best.to_string()
    }
}

/// Strategies for the built-in formats plus the fallback for custom ones.
///
/// Built once at startup and handed to the pipeline and the surfaces that
/// need to tell built-in formats from custom ones.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    builtins: Vec<(String, FormatStrategy)>,
    fallback: FormatStrategy,
}

impl FormatRegistry {
    /// The four built-in formats in their canonical order.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            builtins: vec![
                ("telegram".to_string(), FormatStrategy::short_social_post()),
                ("email".to_string(), FormatStrategy::structured_message()),
                ("official_letter".to_string(), FormatStrategy::formal_letter()),
                ("newsletter".to_string(), FormatStrategy::bulk_announcement()),
            ],
            fallback: FormatStrategy::default_policy(),
        }
    }

    /// Add or replace a built-in format.
    #[must_use]
    pub fn with_format(mut self, name: impl Into<String>, strategy: FormatStrategy) -> Self {
        let name = name.into();
        match self.builtins.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = strategy,
            None => self.builtins.push((name, strategy)),
        }
        self
    }

    /// Strategy for `format_name`, or the default policy for custom formats.
    #[must_use]
    pub fn strategy_for(&self, format_name: &str) -> &FormatStrategy {
        self.builtins
            .iter()
            .find(|(n, _)| n == format_name)
            .map_or(&self.fallback, |(_, s)| s)
    }

    /// Short description of `format_name`. Unlisted custom formats get the
    /// default policy's.
    #[must_use]
    pub fn describe(&self, format_name: &str) -> &'static str {
        if self.is_builtin(format_name) {
            return self.strategy_for(format_name).description;
        }
        BUNDLED_DESCRIPTIONS
            .iter()
            .find(|(name, _)| *name == format_name)
            .map_or(self.fallback.description, |&(_, description)| description)
    }

    /// Whether `format_name` is a built-in format.
    #[must_use]
    pub fn is_builtin(&self, format_name: &str) -> bool {
        self.builtins.iter().any(|(n, _)| n == format_name)
    }

    /// Built-in format names in canonical order.
    #[must_use]
    pub fn builtin_names(&self) -> Vec<String> {
        self.builtins.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterate built-in `(name, strategy)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormatStrategy)> {
        self.builtins.iter().map(|(n, s)| (n.as_str(), s))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
