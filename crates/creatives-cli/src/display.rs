//! Terminal rendering for creatives, trial summaries, and refinement results.

use creatives_ai::GeneratedCreatives;
use creatives_core::{CreativeItem, QuestionDraft, Tone, TrialSummary};
use creatives_sync::AugmentOutcome;

/// Print a batch of creatives from one provider as cards.
pub fn print_generated(batch: &GeneratedCreatives, published: bool) {
    println!("=== {} ({}) ===", batch.provider, batch.model);
    println!(
        "{} creative(s) in {} ms, received {}",
        batch.creatives.creatives.len(),
        batch.elapsed_ms,
        batch.received_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    for (i, creative) in batch.creatives.creatives.iter().enumerate() {
        let item = CreativeItem::new(
            format!("{}-{}", batch.provider, i + 1),
            creative.clone(),
            published,
        );
        print_creative_card(&item);
    }
}

/// Print one creative as a vertical card.
pub fn print_creative_card(item: &CreativeItem) {
    let c = &item.creative;
    println!("--- {} ---", item.id);
    print_field("Headline", &c.headline);
    print_field("Byline", &c.description);
    print_field("Text", &c.primary_text);
    print_field("Call to action", &c.call_to_action);
    if !c.target_demo.is_empty() {
        print_field("Audience", &c.target_demo.join(", "));
    }
    print_field("Image prompt", &c.prompt_for_ad_image);
    println!("  [{}]", item.publish_action().label());
    println!();
}

pub fn print_trial(trial: &TrialSummary) {
    println!("=== {} ===", trial.nct_id);
    if let Some(title) = &trial.brief_title {
        println!("{title}");
    }
    println!();
    println!("Summary:");
    println!("{}", indent(&trial.brief_summary));
    println!();
    println!("Eligibility:");
    println!("{}", indent(&trial.eligibility));
}

pub fn print_tones() {
    for tone in Tone::ALL {
        println!("  {:<12} {}", tone.label(), tone.instruction());
    }
}

/// Print the draft's displayed text after an augment attempt.
pub fn print_refinement(draft: &QuestionDraft, outcome: &AugmentOutcome) {
    if outcome.is_refined() {
        println!("{}", draft.text());
    } else {
        println!("{} (unchanged)", draft.text());
    }
}

fn print_field(label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    println!("  {:<16} {}", format!("{label}:"), value);
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
