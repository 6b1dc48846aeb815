//! Response assembly: the translation plus display metrics.
//!
//! The counts (words, characters, sentences) are real. The quality figures
//! (`accuracy`, `bleuScore`, segment `confidence`, ...) are synthetic display
//! values drawn from fixed ranges; nothing here measures translation quality.
//! The random source is injected so tests get deterministic numbers.

use crate::language::Language;
use crate::provider::free::split_sentences;
use crate::provider::ProviderId;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Maximum number of display segments in a result.
pub const MAX_SEGMENTS: usize = 20;
/// Segment text is cut to this many characters.
pub const SEGMENT_CHARS: usize = 200;

const PRESERVED_ELEMENTS: [&str; 4] = ["Structure", "Format", "Tables", "Hierarchy"];

/// The `data` object of a successful translate response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    pub original_file_preview: Option<String>,
    pub file_name: String,
    /// KiB with two decimals, e.g. `"12.50"`.
    pub file_size: String,
    pub file_type: String,
    pub word_count: usize,
    pub translated_word_count: usize,
    pub character_count: usize,
    pub sentence_count: usize,
    pub segments: Vec<Segment>,
    pub kpis: Kpis,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: usize,
    pub source: String,
    pub target: String,
    pub confidence: f64,
    pub tokens: usize,
    pub processing_time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub accuracy: f64,
    pub latency: f64,
    pub throughput: u64,
    pub wer: f64,
    pub bleu_score: f64,
    pub semantic_similarity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub file_name: String,
    pub file_size: String,
    pub file_type: String,
    pub word_count: usize,
    pub character_count: usize,
    pub sentence_count: usize,
    pub processed_at: String,
    pub model: String,
    pub provider_used: ProviderId,
    pub source_language: Language,
    pub target_language: Language,
    pub language_pair: String,
    pub preserved_elements: Vec<String>,
}

/// What the assembler needs to know about the input file.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub name: String,
    pub media_type: String,
    pub size_bytes: usize,
    pub preview: Option<String>,
}

/// Inputs to [`assemble`].
#[derive(Debug, Clone)]
pub struct Assembly<'a> {
    pub original_text: &'a str,
    pub translated_text: &'a str,
    pub file: FileSummary,
    pub provider: ProviderId,
    pub model: String,
    pub source: Language,
    pub target: Language,
    pub elapsed: Duration,
}

/// Build the result object.
pub fn assemble<R: Rng>(input: Assembly<'_>, rng: &mut R) -> TranslationResult {
    let translated = input.translated_text;
    let translated_word_count = count_words(translated);
    let word_count = if input.original_text.trim().is_empty() {
        translated_word_count
    } else {
        count_words(input.original_text)
    };
    let character_count = translated.chars().count();

    let sentences: Vec<&str> = split_sentences(translated)
        .into_iter()
        .filter(|s| s.chars().count() > 5)
        .collect();
    let sentence_count = sentences.len();

    let segments = sentences
        .iter()
        .take(MAX_SEGMENTS)
        .enumerate()
        .map(|(i, sentence)| {
            let shown: String = sentence.chars().take(SEGMENT_CHARS).collect();
            Segment {
                id: i + 1,
                source: shown.clone(),
                target: shown,
                confidence: round_to(rng.gen_range(0.94..1.0), 3),
                tokens: count_words(sentence),
                processing_time: round_to(rng.gen_range(0.05..0.25), 2),
            }
        })
        .collect();

    let accuracy = round_to(rng.gen_range(96.0..99.5), 1);
    let latency = round_to(input.elapsed.as_secs_f64(), 2);
    let throughput = if latency > 0.0 {
        (translated_word_count as f64 / latency).floor() as u64
    } else {
        translated_word_count as u64
    };
    let kpis = Kpis {
        accuracy,
        latency,
        throughput,
        wer: round_to(5.0 - accuracy * 0.04, 1),
        bleu_score: round_to(accuracy - 1.5, 1),
        semantic_similarity: round_to((accuracy + 0.8).min(100.0), 1),
    };

    let file_size = format!("{:.2}", input.file.size_bytes as f64 / 1024.0);
    let metadata = Metadata {
        file_name: input.file.name.clone(),
        file_size: file_size.clone(),
        file_type: input.file.media_type.clone(),
        word_count,
        character_count,
        sentence_count,
        processed_at: Utc::now().to_rfc3339(),
        model: input.model,
        provider_used: input.provider,
        source_language: input.source,
        target_language: input.target,
        language_pair: format!("{} → {}", input.source, input.target),
        preserved_elements: PRESERVED_ELEMENTS.iter().map(|s| s.to_string()).collect(),
    };

    TranslationResult {
        original_text: input.original_text.to_string(),
        translated_text: translated.to_string(),
        original_file_preview: input.file.preview,
        file_name: input.file.name,
        file_size,
        file_type: input.file.media_type,
        word_count,
        translated_word_count,
        character_count,
        sentence_count,
        segments,
        kpis,
        metadata,
    }
}

/// Whitespace-separated word count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
