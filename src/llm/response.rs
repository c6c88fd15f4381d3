//! Response parser: extracts a compilable code artifact from a raw completion
//!
//! Models commonly wrap the code in prose, tag the fence inconsistently, or
//! indent the whole block. The parser scans every fenced block, keeps the
//! candidates whose info string matches the target language (or is empty),
//! and returns the first one that parses syntactically. Prose around fences
//! is never an error.

use super::types::RawCompletion;
use crate::spec::Language;
use crate::validation::syntax_ok;
use thiserror::Error;

/// Why a completion could not be turned into a code artifact.
/// Fatal for the affected target only.
#[derive(Debug, Clone, Error)]
pub enum ResponseParseError {
    #[error("completion contains no fenced code block")]
    NoCodeBlock,

    #[error("fenced code block is empty")]
    EmptyBlock,

    #[error("none of the {candidates} candidate block(s) parse as {language}")]
    NoValidCandidate { candidates: usize, language: Language },
}

/// Extracts and cleans the business-logic source from a completion.
pub fn extract_code(raw: &RawCompletion, language: Language) -> Result<String, ResponseParseError> {
    let blocks = fenced_blocks(&raw.text);
    if blocks.is_empty() {
        return Err(ResponseParseError::NoCodeBlock);
    }

    let candidates: Vec<&FencedBlock> = blocks
        .iter()
        .filter(|block| block.matches(language))
        .collect();
    if candidates.is_empty() {
        return Err(ResponseParseError::NoCodeBlock);
    }

    let mut saw_content = false;
    for candidate in &candidates {
        let cleaned = clean_block(&candidate.body);
        if cleaned.is_empty() {
            continue;
        }
        saw_content = true;
        if syntax_ok(language, &cleaned) {
            return Ok(cleaned);
        }
    }

    if saw_content {
        Err(ResponseParseError::NoValidCandidate {
            candidates: candidates.len(),
            language,
        })
    } else {
        Err(ResponseParseError::EmptyBlock)
    }
}

struct FencedBlock {
    info: String,
    body: String,
}

impl FencedBlock {
    fn matches(&self, language: Language) -> bool {
        self.info.is_empty()
            || language
                .fence_aliases()
                .contains(&self.info.to_lowercase().as_str())
    }
}

fn fenced_blocks(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<FencedBlock> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            match current.take() {
                Some(block) => blocks.push(block),
                None => {
                    current = Some(FencedBlock {
                        info: rest.trim().to_string(),
                        body: String::new(),
                    });
                }
            }
        } else if let Some(block) = current.as_mut() {
            block.body.push_str(line);
            block.body.push('\n');
        }
    }

    // An unterminated fence still counts: models regularly drop the closer.
    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}

/// Strips a uniform outer indent and trailing blank lines without touching
/// the code's own structure.
fn clean_block(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();

    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .map(|line| strip_indent(line, min_indent))
        .collect();

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().is_some_and(|line| line.trim().is_empty()) {
        cleaned.remove(0);
    }

    let mut result = cleaned.join("\n");
    if !result.is_empty() {
        result.push('\n');
    }
    result
}

/// Drops up to `count` leading whitespace characters. Indexing by char, not
/// byte: indentation can mix ASCII spaces with wider whitespace (NBSP, em
/// space) and a byte slice would land mid-character.
fn strip_indent(line: &str, count: usize) -> &str {
    for (taken, (offset, c)) in line.char_indices().enumerate() {
        if taken == count || !c.is_whitespace() {
            return &line[offset..];
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn raw(text: &str) -> RawCompletion {
        RawCompletion {
            text: text.to_string(),
            model: "mock".to_string(),
            elapsed: Duration::from_millis(1),
            attempts: 1,
        }
    }

    #[test]
    fn test_extracts_simple_block() {
        let completion = raw("```python\ndef add_numbers(a, b):\n    return a + b\n```\n");
        let code = extract_code(&completion, Language::Python).unwrap();
        assert_eq!(code, "def add_numbers(a, b):\n    return a + b\n");
    }

    #[test]
    fn test_prose_around_fence_is_ignored() {
        let completion = raw(
            "Sure! Here is the function you asked for:\n\n\
             ```python\ndef f():\n    return 1\n```\n\nLet me know if it helps.",
        );
        let code = extract_code(&completion, Language::Python).unwrap();
        assert!(code.starts_with("def f()"));
        assert!(!code.contains("Sure!"));
    }

    #[test]
    fn test_alias_fence_tag_accepted() {
        let completion = raw("```py\ndef f():\n    return 1\n```");
        assert!(extract_code(&completion, Language::Python).is_ok());
    }

    #[test]
    fn test_untagged_fence_accepted() {
        let completion = raw("```\ndef f():\n    return 1\n```");
        assert!(extract_code(&completion, Language::Python).is_ok());
    }

    #[test]
    fn test_wrong_language_fence_skipped() {
        let completion = raw("```ruby\nputs 'hi'\n```");
        let err = extract_code(&completion, Language::Python).unwrap_err();
        assert!(matches!(err, ResponseParseError::NoCodeBlock));
    }

    #[test]
    fn test_first_valid_candidate_wins() {
        let completion = raw(
            "```python\ndef broken(:\n```\n\nActually, use this:\n\n\
             ```python\ndef fixed():\n    return 2\n```",
        );
        let code = extract_code(&completion, Language::Python).unwrap();
        assert!(code.contains("def fixed()"));
    }

    #[test]
    fn test_outer_indent_stripped() {
        let completion = raw("```python\n    def f():\n        return 1\n```");
        let code = extract_code(&completion, Language::Python).unwrap();
        assert_eq!(code, "def f():\n    return 1\n");
    }

    #[test]
    fn test_multibyte_whitespace_indent_stripped() {
        // Em-space indent on one line, ASCII space on the next; the common
        // indent is one character, not one byte.
        let completion = raw("```python\n\u{2003}x = 1\n y = 2\n```");
        let code = extract_code(&completion, Language::Python).unwrap();
        assert_eq!(code, "x = 1\ny = 2\n");
    }

    #[test]
    fn test_unterminated_fence_still_parses() {
        let completion = raw("```python\ndef f():\n    return 1\n");
        assert!(extract_code(&completion, Language::Python).is_ok());
    }

    #[test]
    fn test_no_block_at_all() {
        let completion = raw("I cannot help with that.");
        let err = extract_code(&completion, Language::Python).unwrap_err();
        assert!(matches!(err, ResponseParseError::NoCodeBlock));
    }

    #[test]
    fn test_empty_block() {
        let completion = raw("```python\n```");
        let err = extract_code(&completion, Language::Python).unwrap_err();
        assert!(matches!(err, ResponseParseError::EmptyBlock));
    }

    #[test]
    fn test_all_candidates_invalid() {
        let completion = raw("```python\ndef broken(:\n```");
        let err = extract_code(&completion, Language::Python).unwrap_err();
        assert!(matches!(
            err,
            ResponseParseError::NoValidCandidate { candidates: 1, .. }
        ));
    }
}
