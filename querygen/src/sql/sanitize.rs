//! Extraction of a bare SQL statement from free-form model output
//!
//! Models routinely wrap SQL in markdown fences or prefix it with a sentence of
//! explanation even when told not to. This is a heuristic, not a parser: no
//! grammar is checked.

/// Statement keywords, in the priority order used to find where the SQL starts.
const STATEMENT_KEYWORDS: &[&str] = &[
    "select", "update", "insert", "delete", "create", "drop", "alter", "truncate",
];

const FENCE: &str = "```";

/// Reduce raw model output to the SQL statement it contains.
///
/// Returns the trimmed text as-is when no statement keyword is found, which
/// may be an empty string.
pub fn sanitize_sql(raw: &str) -> String {
    let mut sql = raw.trim();

    if let Some(rest) = sql.strip_prefix(FENCE) {
        sql = strip_fence_tag(rest);
        if let Some(end) = sql.find(FENCE) {
            sql = &sql[..end];
        }
    }

    if let Some(start) = first_keyword_offset(sql) {
        sql = &sql[start..];
    }

    sql.trim().to_string()
}

/// Drop an optional language tag (`sql`, `mysql`, ...) and the whitespace after it.
fn strip_fence_tag(after_fence: &str) -> &str {
    let tag_len = after_fence
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_fence.len());
    after_fence[tag_len..].trim_start()
}

/// Byte offset of the first occurrence of the highest-priority keyword present.
///
/// Keywords are checked in list order, not by position: if both "select" and
/// "update" appear, the cut happens at "select" even when "update" comes first.
fn first_keyword_offset(sql: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets aligned with the original text.
    let lower = sql.to_ascii_lowercase();
    STATEMENT_KEYWORDS.iter().find_map(|kw| lower.find(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_sql_with_language_tag() {
        assert_eq!(sanitize_sql("```sql\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_fenced_sql_without_tag() {
        assert_eq!(
            sanitize_sql("```\nSELECT * FROM users\n```"),
            "SELECT * FROM users"
        );
    }

    #[test]
    fn test_unclosed_fence_keeps_remaining_text() {
        assert_eq!(sanitize_sql("```sql\nSELECT id FROM t"), "SELECT id FROM t");
    }

    #[test]
    fn test_text_after_closing_fence_is_dropped() {
        let raw = "```sql\nSELECT name FROM users\n```\nThis returns every name.";
        assert_eq!(sanitize_sql(raw), "SELECT name FROM users");
    }

    #[test]
    fn test_leading_prose_is_dropped() {
        let raw = "Here is the query you asked for: SELECT * FROM orders;";
        assert_eq!(sanitize_sql(raw), "SELECT * FROM orders;");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert_eq!(sanitize_sql("sure! sElEcT 1"), "sElEcT 1");
    }

    #[test]
    fn test_keyword_priority_beats_position() {
        // "update" occurs first in the text, but "select" has priority.
        let raw = "To update nothing: SELECT 1";
        assert_eq!(sanitize_sql(raw), "SELECT 1");
    }

    #[test]
    fn test_modification_statement_is_preserved_for_the_gate() {
        assert_eq!(sanitize_sql("DROP TABLE users;"), "DROP TABLE users;");
    }

    #[test]
    fn test_no_keyword_returns_trimmed_text() {
        assert_eq!(sanitize_sql("  I cannot help with that.  "), "I cannot help with that.");
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(sanitize_sql(""), "");
        assert_eq!(sanitize_sql("   \n\t "), "");
        assert_eq!(sanitize_sql("```sql\n```"), "");
    }

    #[test]
    fn test_non_ascii_prefix_keeps_char_boundaries() {
        assert_eq!(sanitize_sql("Voilà la requête : SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "```sql\nSELECT 1\n```",
            "```mysql\n  select a from b where c = 'x'\n```  trailing",
            "Explanation first. SELECT * FROM users",
            "no sql at all",
            "",
            "```",
            "``` ```",
            "DROP TABLE users;",
            "update then SELECT 2",
            "```sql\n```sql\nSELECT 3\n```\n```",
        ];
        for input in inputs {
            let once = sanitize_sql(input);
            assert_eq!(sanitize_sql(&once), once, "not idempotent for {input:?}");
        }
    }
}
