//! Classifies a raw oracle reply as prose or a multiple-choice question.
//!
//! The system instruction asks the model to format MCQ options as
//! `A) Option text`, one per line. Detection is purely structural: a line
//! counts as an option if it starts (after leading whitespace) with a single
//! uppercase ASCII letter, a closing parenthesis, one whitespace character,
//! and at least one more character. Anything with fewer than two such lines
//! is plain narrative, so classification can never fail.

/// The result of classifying one assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    /// Free-form text, preserved verbatim.
    Narrative(String),
    /// A question stem followed by its answer options.
    MultipleChoice {
        /// All lines strictly before the first option line, rejoined.
        stem: String,
        /// The option lines, trimmed, in original order. Always >= 2 entries.
        options: Vec<String>,
    },
}

/// Whether a line has the `A) ...` option shape.
///
/// Option letters are deliberately not checked for contiguity or uniqueness;
/// any two lines matching the shape qualify the reply as multiple-choice.
fn is_option_line(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.next() == Some(')')
        && matches!(chars.next(), Some(c) if c.is_whitespace())
        && chars.next().is_some()
}

/// Splits a reply into stem and options when it looks like an MCQ.
pub fn classify(text: &str) -> ParsedReply {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut options = Vec::new();
    let mut first_option_index = None;

    for (index, line) in lines.iter().enumerate() {
        if is_option_line(line) {
            first_option_index.get_or_insert(index);
            options.push(line.trim().to_string());
        }
    }

    match first_option_index {
        Some(start) if options.len() >= 2 => ParsedReply::MultipleChoice {
            stem: lines[..start].join("\n"),
            options,
        },
        _ => ParsedReply::Narrative(text.to_string()),
    }
}
