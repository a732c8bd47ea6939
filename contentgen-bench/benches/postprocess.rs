//! contentgen benchmark suite.
//!
//! Hot paths that run once per generated format, outside the backend call:
//!   social_post_trim_long ......... sentence-boundary trimming of a 2 KB post
//!   social_post_passthrough ....... post already within budget
//!   newsletter_collapse ........... blank-line collapsing of a long newsletter
//!   render_user_template .......... placeholder substitution with extras
//!   template_set_parse_defaults ... parsing the bundled YAML templates

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use contentgen_core::store::{DEFAULT_TEMPLATES, TemplateSet};
use contentgen_core::template;
use contentgen_core::FormatStrategy;

fn long_post() -> String {
    (0..40)
        .map(|i| format!("Sentence number {i} talks about the product launch!"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_social_post(c: &mut Criterion) {
    let strategy = FormatStrategy::short_social_post();
    let long = long_post();
    let short = "Product X is out today. Try it and tell us what you think?";

    c.bench_function("social_post_trim_long", |b| {
        b.iter(|| black_box(strategy.post_process("telegram", black_box(&long))));
    });
    c.bench_function("social_post_passthrough", |b| {
        b.iter(|| black_box(strategy.post_process("telegram", black_box(short))));
    });
}

fn bench_newsletter(c: &mut Criterion) {
    let strategy = FormatStrategy::bulk_announcement();
    let raw = (0..30)
        .map(|i| format!("Paragraph {i} with the latest updates for subscribers."))
        .collect::<Vec<_>>()
        .join("\n\n\n\n");

    c.bench_function("newsletter_collapse", |b| {
        b.iter(|| black_box(strategy.post_process("newsletter", black_box(&raw))));
    });
}

fn bench_render(c: &mut Criterion) {
    let user = "Write about {input_text} for {audience}. Mention {{brand}} once.\n\nContext: {context}";
    let input = long_post();
    let vars = [
        ("input_text", input.as_str()),
        ("audience", "early adopters"),
        ("context", "spring release"),
    ];

    c.bench_function("render_user_template", |b| {
        b.iter(|| black_box(template::render(black_box(user), &vars)));
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("template_set_parse_defaults", |b| {
        b.iter(|| black_box(TemplateSet::from_yaml(black_box(DEFAULT_TEMPLATES))));
    });
}

criterion_group!(
    benches,
    bench_social_post,
    bench_newsletter,
    bench_render,
    bench_parse
);
criterion_main!(benches);
