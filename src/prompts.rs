//! Prompts for LLM-backed translation and language detection.
//!
//! Every prompt lives here so adapters stay free of prompt text and unit
//! tests can inspect what is sent without calling a model.

use crate::language::Language;

/// System prompt shared by every LLM adapter.
pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a professional document translator. \
Translate faithfully and completely. Output only the translation, never commentary.";

/// Instruction sent alongside an image or PDF for a vision/document model.
pub fn document_prompt(source: Language, target: Language) -> String {
    format!(
        r#"Translate the COMPLETE document from {src} to {tgt}.

RULES:
1. Translate ALL text: every word, heading, table cell, label and caption
2. Keep the structure: headings (# ##), tables (| |), lists
3. Preserve numbers, codes, dates and URLs exactly
4. Use Markdown formatting
5. Output ONLY the {tgt} translation

Translate the entire document now:"#,
        src = source.display_name(),
        tgt = target.display_name(),
    )
}

/// Instruction wrapping extracted text for a chat model.
pub fn text_prompt(source: Language, target: Language, text: &str) -> String {
    format!(
        r#"Translate the following {src} text to {tgt}.

RULES:
1. Translate everything; do not summarise or skip sections
2. Keep paragraphs, headings, lists and tables in place
3. Preserve numbers, codes, dates and URLs exactly
4. Output ONLY the translation

TEXT:
"""
{text}
""""#,
        src = source.display_name(),
        tgt = target.display_name(),
    )
}

/// Ask a model to name the language of a short sample.
pub fn detection_prompt(sample: &str) -> String {
    let names: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
    format!(
        "Identify the language of the text below. Answer with exactly one word from \
this list: {}. If it is none of these, answer \"unknown\".\n\nTEXT:\n\"\"\"\n{}\n\"\"\"",
        names.join(", "),
        sample
    )
}
