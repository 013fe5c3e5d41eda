//! Keyword gates that keep the pipeline read-only
//!
//! Both gates are purely lexical. The prompt gate matches substrings anywhere
//! in the user's request, the SQL gate only matches the leading statement
//! keyword of the generated query. The two are intentionally kept separate.

/// Words in a natural-language prompt that signal modification intent.
pub const DANGEROUS_PROMPT_WORDS: &[&str] = &["delete", "drop", "remove", "truncate", "update"];

/// Statement prefixes that are never executed.
pub const BLOCKED_SQL_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "truncate", "create",
];

/// User-facing message for a tripped prompt gate.
pub const DANGEROUS_PROMPT_MESSAGE: &str =
    "⚠️ Dangerous intent detected in prompt. Data modification is not allowed.";

/// User-facing message for a tripped SQL gate.
pub const UNSAFE_SQL_MESSAGE: &str = "⚠️ Unsafe SQL blocked: Only read-only SELECT queries are allowed.\nYour prompt requested a modification.";

/// Returns the first dangerous word contained in the prompt, if any.
///
/// Coarse on purpose: "show me updates to the schedule" is rejected too.
pub fn dangerous_prompt_word(prompt: &str) -> Option<&'static str> {
    let lower = prompt.to_lowercase();
    DANGEROUS_PROMPT_WORDS
        .iter()
        .copied()
        .find(|word| lower.contains(word))
}

/// Returns the blocked keyword the statement starts with, if any.
pub fn blocked_sql_keyword(sql: &str) -> Option<&'static str> {
    let lower = sql.trim().to_lowercase();
    BLOCKED_SQL_KEYWORDS
        .iter()
        .copied()
        .find(|kw| lower.starts_with(kw))
}

/// True when `;` separates more than one statement.
///
/// Quoted strings and identifiers are skipped, and trailing terminators are
/// allowed. Comments are not, so `SELECT 1 -- ; x` counts as stacked.
pub fn has_stacked_statements(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in sql.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ';' if !strip_leading_terminators(&sql[i..]).is_empty() => return true,
                _ => {}
            },
        }
    }

    false
}

fn strip_leading_terminators(sql: &str) -> &str {
    sql.trim_start_matches(|c: char| c == ';' || c.is_whitespace())
}

/// The statement without trailing whitespace and `;` terminators.
pub fn strip_terminators(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// True when the statement is a read query whose rows should be returned.
pub fn is_select(sql: &str) -> bool {
    sql.trim().to_lowercase().starts_with("select")
}
