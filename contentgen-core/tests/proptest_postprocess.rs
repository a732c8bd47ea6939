//! Property-based tests for format post-processing.

use proptest::prelude::*;

use contentgen_core::strategy::{SOCIAL_POST_MAX_CHARS, collapse_blank_lines, fit_sentences};
use contentgen_core::template;
use contentgen_core::FormatStrategy;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_sentence() -> impl Strategy<Value = String> {
    ("[a-zA-Zа-я ]{1,80}", prop::sample::select(vec![".", "!", "?"]))
        .prop_map(|(body, end)| format!("{}{end}", body.trim_start()))
}

fn arb_post() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_sentence(), 1..12).prop_map(|s| s.join(" "))
}

// ---------------------------------------------------------------------------
// Property: social posts never exceed the character budget
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn social_post_fits_budget(raw in "\\PC{0,600}") {
        let out = FormatStrategy::short_social_post().post_process("telegram", &raw);
        prop_assert!(out.chars().count() <= SOCIAL_POST_MAX_CHARS);
    }

    #[test]
    fn social_post_is_prefix_of_normalized_input(raw in arb_post()) {
        let normalized = collapse_blank_lines(&raw);
        let normalized = normalized.trim();
        let out = FormatStrategy::short_social_post().post_process("telegram", &raw);
        prop_assert!(normalized.starts_with(&out));
    }

    #[test]
    fn short_text_is_unchanged(raw in "[a-z .!?]{0,300}") {
        let trimmed = raw.trim();
        prop_assert_eq!(fit_sentences(trimmed, SOCIAL_POST_MAX_CHARS), trimmed);
    }

    #[test]
    fn long_sentences_cut_at_a_boundary(raw in arb_post()) {
        let out = fit_sentences(&raw, 120);
        prop_assert!(out.chars().count() <= 120);
        if raw.chars().count() > 120 && !out.is_empty() && out.chars().count() < 120 {
            prop_assert!(out.ends_with(['.', '!', '?']));
        }
    }

    #[test]
    fn collapsed_text_has_no_triple_newlines(raw in "[a\\n]{0,100}") {
        prop_assert!(!collapse_blank_lines(&raw).contains("\n\n\n"));
    }

    #[test]
    fn escaped_braces_render_literally(body in "[a-z ]{0,40}") {
        let rendered = template::render(&format!("{{{{{body}}}}}"), &[])
            .expect("escaped braces render");
        prop_assert_eq!(rendered, format!("{{{body}}}"));
    }
}
