//! Prompt context and extractive fallback.

use super::Hit;

/// Answer used when there is nothing to summarize.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant context in the indexed episodes.";

/// Number of hits quoted by the extractive summary.
const SUMMARY_HITS: usize = 5;

/// Characters quoted per hit in the extractive summary.
const SUMMARY_CHARS: usize = 200;

/// One `[source start-end] text` line per hit, at most `max_hits` lines.
pub fn format_context(hits: &[Hit], max_hits: usize) -> String {
    hits.iter()
        .take(max_hits)
        .map(|h| {
            format!(
                "[{} {:.1}-{:.1}] {}",
                h.metadata.source_id, h.metadata.start, h.metadata.end, h.document_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bullet list quoting the top hits.
pub fn extractive_summary(hits: &[Hit]) -> String {
    if hits.is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }

    let bullets: Vec<String> = hits
        .iter()
        .take(SUMMARY_HITS)
        .map(|h| {
            let excerpt: String = h.document_text.chars().take(SUMMARY_CHARS).collect();
            format!(
                "- {} @ {:.1}s: {}...",
                h.metadata.source_id, h.metadata.start, excerpt
            )
        })
        .collect();

    format!("Based on the most relevant segments:\n{}", bullets.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::hit;

    #[test]
    fn test_format_context() {
        let hits = vec![
            hit("ep1", 0.0, 45.0, "first passage"),
            hit("ep2", 38.0, 83.5, "second passage"),
            hit("ep3", 0.0, 1.0, "dropped"),
        ];

        let context = format_context(&hits, 2);

        assert_eq!(
            context,
            "[ep1 0.0-45.0] first passage\n[ep2 38.0-83.5] second passage"
        );
    }

    #[test]
    fn test_extractive_summary() {
        assert_eq!(extractive_summary(&[]), NO_CONTEXT_ANSWER);

        let long = "x".repeat(500);
        let hits: Vec<Hit> = (0..7)
            .map(|i| hit(&format!("ep{}", i), i as f64 * 10.0, i as f64 * 10.0 + 5.0, &long))
            .collect();

        let summary = extractive_summary(&hits);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines[0], "Based on the most relevant segments:");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("- ep0 @ 0.0s: "));
        assert_eq!(lines[1].len(), "- ep0 @ 0.0s: ".len() + 200 + 3);
    }
}
