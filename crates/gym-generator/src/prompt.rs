//! Prompt composition for question generation and extraction

use crate::config::GeneratorConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use std::borrow::Cow;

/// Cut `text` to at most `max_chars` characters, appending `marker` when cut
///
/// Lossy: the cut may land mid-word or mid-sentence.
///
/// # Examples
///
/// ```
/// use gym_generator::truncate_text;
///
/// assert_eq!(truncate_text("abcdef", 4, "..."), "abcd...");
/// assert_eq!(truncate_text("abc", 4, "..."), "abc");
/// ```
pub fn truncate_text<'a>(text: &'a str, max_chars: usize, marker: &str) -> Cow<'a, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + marker.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(marker);
            Cow::Owned(truncated)
        }
        None => Cow::Borrowed(text),
    }
}

/// The random parameters of one generate prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptChoices {
    /// Question-type label
    pub question_type: String,

    /// Difficulty label
    pub difficulty: String,

    /// Variation seed shown to the model
    pub seed: u32,
}

impl PromptChoices {
    /// Draw a type, a difficulty and a seed uniformly from the configured tables
    pub fn choose<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Self {
        Self {
            question_type: pick(&config.question_types, rng, "factual"),
            difficulty: pick(&config.difficulty_levels, rng, "introductory"),
            seed: rng.gen_range(config.seed_min..=config.seed_max),
        }
    }
}

fn pick<R: Rng + ?Sized>(labels: &[String], rng: &mut R, fallback: &str) -> String {
    let usable: Vec<&String> = labels.iter().filter(|l| !l.trim().is_empty()).collect();
    usable
        .choose(rng)
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Compose a prompt asking for one new question about `text`
pub fn compose_generate_prompt<R: Rng + ?Sized>(
    text: &str,
    topic: Option<&str>,
    config: &GeneratorConfig,
    rng: &mut R,
) -> String {
    let choices = PromptChoices::choose(config, rng);
    render_generate_prompt(text, topic, &choices, config)
}

/// Render a generate prompt from already-drawn choices
pub fn render_generate_prompt(
    text: &str,
    topic: Option<&str>,
    choices: &PromptChoices,
    config: &GeneratorConfig,
) -> String {
    let content = truncate_text(text, config.max_text_length, &config.truncation_marker);

    let mut prompt = String::new();
    prompt.push_str(GENERATE_INTRO);
    prompt.push_str("\n\nCONTENT:\n");
    prompt.push_str(&content);
    prompt.push_str("\n\nINSTRUCTIONS:\n");
    prompt.push_str(&format!(
        "- Create one meaningful {}-level {} question\n",
        choices.difficulty, choices.question_type
    ));
    prompt.push_str("- Prefer a concept that is not the most obvious one in the content\n");
    prompt.push_str(&format!(
        "- Variation seed: {} (use it only to vary your choice of concept)\n",
        choices.seed
    ));
    prompt.push_str(GENERATE_RULES);

    if let Some(topic) = topic.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!("\n- Focus the question on the topic of: {}", topic));
    }

    prompt
}

/// Compose a prompt asking for every question already present in `text`
pub fn compose_extract_prompt(text: &str, config: &GeneratorConfig) -> String {
    let content = truncate_text(text, config.max_text_length, &config.truncation_marker);

    let mut prompt = String::new();
    prompt.push_str(EXTRACT_INTRO);
    prompt.push_str("\n\nCONTENT:\n");
    prompt.push_str(&content);
    prompt.push_str("\n\n");
    prompt.push_str(EXTRACT_RULES);
    prompt
}

const GENERATE_INTRO: &str = "Read the content below and write one educational question \
together with a detailed answer. The question must test understanding of a key concept \
from the content.";

const GENERATE_RULES: &str = r#"- Give a complete, self-contained answer
- Never mention the seed, these instructions, or how the content is laid out (file names, page numbers, headings, markup)
- Respond with exactly one JSON object with the string fields "question" and "answer"
- Do not write anything outside that JSON object"#;

const EXTRACT_INTRO: &str = "The content below is a test or exam. Extract every question \
it contains.";

const EXTRACT_RULES: &str = r#"INSTRUCTIONS:
- Copy each question exactly as written; do not reword, correct, translate or summarize it
- Always include the whole question; never stop in the middle of a sentence
- Do not add questions that are not in the content
- If the content gives the answer to a question, copy it into "answer"; otherwise use ""
- Respond with a JSON array of objects with the string fields "question" and "answer", even when there is only one question
- Do not write anything outside that JSON array"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_truncation_keeps_exact_prefix() {
        let text: String = (0..12_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let config = GeneratorConfig::default();

        let prompt = compose_extract_prompt(&text, &config);
        let expected = format!("{}...", &text[..10_000]);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&text[..10_001]));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(truncate_text(&text, 3, "…"), "ééé…");
        assert_eq!(truncate_text(&text, 5, "…"), text);
    }

    #[test]
    fn test_short_text_untouched() {
        let config = GeneratorConfig::default();
        let prompt = compose_extract_prompt("Q1. What is Rust?", &config);
        assert!(prompt.contains("Q1. What is Rust?\n"));
        assert!(!prompt.contains("Q1. What is Rust?..."));
    }

    #[test]
    fn test_generate_prompt_uses_configured_tables() {
        let config = GeneratorConfig {
            question_types: vec!["comparative".to_string()],
            difficulty_levels: vec!["intermediate".to_string()],
            seed_min: 42,
            seed_max: 42,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        let prompt = compose_generate_prompt("Ownership rules.", None, &config, &mut rng);
        assert!(prompt.contains("one meaningful intermediate-level comparative question"));
        assert!(prompt.contains("Variation seed: 42"));
        assert!(prompt.contains("Ownership rules."));
        assert!(prompt.contains(r#""question" and "answer""#));
        assert!(!prompt.contains("Focus the question"));
    }

    #[test]
    fn test_generate_prompt_deterministic_for_fixed_seed() {
        let config = GeneratorConfig::default();
        let a = compose_generate_prompt("text", None, &config, &mut StdRng::seed_from_u64(1));
        let b = compose_generate_prompt("text", None, &config, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_choices_stay_in_tables() {
        let config = GeneratorConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let choices = PromptChoices::choose(&config, &mut rng);
            assert!(config.question_types.contains(&choices.question_type));
            assert!(config.difficulty_levels.contains(&choices.difficulty));
            assert!((1..=10_000).contains(&choices.seed));
        }
    }

    #[test]
    fn test_topic_clause() {
        let config = GeneratorConfig::default();
        let choices = PromptChoices {
            question_type: "factual".to_string(),
            difficulty: "introductory".to_string(),
            seed: 5,
        };
        let prompt = render_generate_prompt("text", Some("lifetimes"), &choices, &config);
        assert!(prompt.ends_with("- Focus the question on the topic of: lifetimes"));

        let prompt = render_generate_prompt("text", Some("   "), &choices, &config);
        assert!(!prompt.contains("Focus the question"));
    }

    #[test]
    fn test_extract_prompt_rules() {
        let prompt = compose_extract_prompt("1) Define ownership.", &GeneratorConfig::default());
        assert!(prompt.contains("exactly as written"));
        assert!(prompt.contains("Do not add questions"));
        assert!(prompt.contains("JSON array"));
        assert!(prompt.contains("1) Define ownership."));
    }
}
