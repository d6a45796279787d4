//! Syntax highlighting for the code shown inside editor elements.
//!
//! Highlighting is driven by the editor's free-form language tag. Known
//! tags get a keyword set and comment syntax; unknown tags fall back to
//! plain text with string and number coloring only.

use eframe::egui::{self, Color32};
use eframe::epaint::text::{LayoutJob, TextFormat};

const KEYWORD_COLOR: Color32 = Color32::from_rgb(86, 156, 214);
const STRING_COLOR: Color32 = Color32::from_rgb(206, 145, 120);
const COMMENT_COLOR: Color32 = Color32::from_rgb(106, 153, 85);
const NUMBER_COLOR: Color32 = Color32::from_rgb(181, 206, 168);
const FUNCTION_COLOR: Color32 = Color32::from_rgb(220, 220, 170);
const DEFAULT_COLOR: Color32 = Color32::from_rgb(212, 212, 212);

const JS_KEYWORDS: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "do", "switch", "case", "break",
    "continue", "var", "let", "const", "new", "this", "typeof", "null", "undefined", "true",
    "false", "in", "of", "try", "catch", "finally", "throw", "class", "extends", "super",
    "static", "async", "await", "yield", "import", "export", "default", "from", "as",
    "interface", "type", "enum", "implements", "readonly",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "def", "return", "if", "elif", "else", "for", "while", "break", "continue", "pass", "class",
    "lambda", "import", "from", "as", "try", "except", "finally", "raise", "with", "yield",
    "async", "await", "global", "nonlocal", "del", "in", "is", "not", "and", "or", "None",
    "True", "False", "self",
];

const RUST_KEYWORDS: &[&str] = &[
    "fn", "return", "if", "else", "for", "while", "loop", "match", "break", "continue", "let",
    "mut", "const", "static", "struct", "enum", "trait", "impl", "pub", "use", "mod", "crate",
    "self", "Self", "super", "where", "async", "await", "move", "ref", "dyn", "unsafe", "in",
    "as", "true", "false",
];

/// Comment and keyword profile for one language tag.
struct LanguageProfile {
    keywords: &'static [&'static str],
    line_comment: &'static str,
    block_comment: Option<(&'static str, &'static str)>,
}

fn profile_for(language: &str) -> LanguageProfile {
    match language.to_ascii_lowercase().as_str() {
        "javascript" | "typescript" | "js" | "ts" | "java" | "c" | "cpp" | "c++" | "csharp"
        | "go" => LanguageProfile {
            keywords: JS_KEYWORDS,
            line_comment: "//",
            block_comment: Some(("/*", "*/")),
        },
        "python" | "py" | "ruby" | "shell" | "bash" | "sh" | "yaml" => LanguageProfile {
            keywords: PYTHON_KEYWORDS,
            line_comment: "#",
            block_comment: None,
        },
        "rust" | "rs" => LanguageProfile {
            keywords: RUST_KEYWORDS,
            line_comment: "//",
            block_comment: Some(("/*", "*/")),
        },
        _ => LanguageProfile {
            keywords: &[],
            line_comment: "\u{0}",
            block_comment: None,
        },
    }
}

/// Highlights source code for the given language tag.
///
/// # Arguments
///
/// * `text` - The source code to highlight
/// * `font_id` - The font to use for rendering
/// * `language` - The editor's language tag
///
/// # Returns
///
/// A `LayoutJob` containing the highlighted text
pub fn highlight_source(text: &str, font_id: egui::FontId, language: &str) -> LayoutJob {
    let profile = profile_for(language);
    let mut job = LayoutJob::default();
    let mut append = |s: &str, color: Color32| {
        job.append(s, 0.0, TextFormat::simple(font_id.clone(), color));
    };

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &text[i..];

        if rest.starts_with(profile.line_comment) {
            let end = rest.find('\n').map(|o| i + o).unwrap_or(text.len());
            append(&text[i..end], COMMENT_COLOR);
            i = end;
            continue;
        }

        if let Some((open, close)) = profile.block_comment {
            if rest.starts_with(open) {
                let end = rest[open.len()..]
                    .find(close)
                    .map(|o| i + open.len() + o + close.len())
                    .unwrap_or(text.len());
                append(&text[i..end], COMMENT_COLOR);
                i = end;
                continue;
            }
        }

        let c = rest.chars().next().unwrap_or('\0');

        if c == '"' || c == '\'' || c == '`' {
            let mut end = i + c.len_utf8();
            let mut escaped = false;
            for (off, ch) in rest[c.len_utf8()..].char_indices() {
                end = i + c.len_utf8() + off + ch.len_utf8();
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == c || ch == '\n' {
                    break;
                }
            }
            append(&text[i..end], STRING_COLOR);
            i = end;
            continue;
        }

        if c.is_ascii_digit() {
            let end = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '_'))
                .map(|(o, _)| i + o)
                .unwrap_or(text.len());
            append(&text[i..end], NUMBER_COLOR);
            i = end;
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let end = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_' || *ch == '$'))
                .map(|(o, _)| i + o)
                .unwrap_or(text.len());
            let word = &text[i..end];
            let color = if profile.keywords.contains(&word) {
                KEYWORD_COLOR
            } else if text[end..].starts_with('(') {
                FUNCTION_COLOR
            } else {
                DEFAULT_COLOR
            };
            append(word, color);
            i = end;
            continue;
        }

        let end = i + c.len_utf8();
        append(&text[i..end], DEFAULT_COLOR);
        i = end;
    }

    job
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(job: &LayoutJob) -> Vec<(String, Color32)> {
        job.sections
            .iter()
            .map(|s| (job.text[s.byte_range.clone()].to_string(), s.format.color))
            .collect()
    }

    #[test]
    fn test_javascript_keywords_and_strings() {
        let job = highlight_source(
            "const x = 'hi'; // note",
            egui::FontId::monospace(12.0),
            "javascript",
        );
        let sections = sections(&job);
        assert!(sections.iter().any(|(t, c)| t == "const" && *c == KEYWORD_COLOR));
        assert!(sections.iter().any(|(t, c)| t == "'hi'" && *c == STRING_COLOR));
        assert!(sections.iter().any(|(t, c)| t == "// note" && *c == COMMENT_COLOR));
        // The whole input survives tokenization.
        assert_eq!(job.text, "const x = 'hi'; // note");
    }

    #[test]
    fn test_python_hash_comments() {
        let job = highlight_source("x = 1 # count", egui::FontId::monospace(12.0), "python");
        let sections = sections(&job);
        assert!(sections.iter().any(|(t, c)| t == "# count" && *c == COMMENT_COLOR));
        assert!(sections.iter().any(|(t, c)| t == "1" && *c == NUMBER_COLOR));
    }

    #[test]
    fn test_function_call_coloring() {
        let job = highlight_source("foo(1)", egui::FontId::monospace(12.0), "javascript");
        let sections = sections(&job);
        assert!(sections.iter().any(|(t, c)| t == "foo" && *c == FUNCTION_COLOR));
    }

    #[test]
    fn test_unknown_language_has_no_keywords() {
        let job = highlight_source("function x", egui::FontId::monospace(12.0), "brainfuck");
        let sections = sections(&job);
        assert!(sections.iter().any(|(t, c)| t == "function" && *c == DEFAULT_COLOR));
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let job = highlight_source("'open\nnext", egui::FontId::monospace(12.0), "javascript");
        assert_eq!(job.text, "'open\nnext");
    }
}
