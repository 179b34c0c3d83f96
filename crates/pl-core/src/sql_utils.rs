//! SQL text inspection for change-scripts
//!
//! Scripts are executed verbatim and are never parsed into statements. These
//! helpers only tokenize the body (DuckDB dialect) and look at the leading
//! keyword of each `;`-separated statement, so comments, string literals, and
//! quoted identifiers never count as keywords.

use sqlparser::dialect::DuckDbDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Leading keywords of statements that open, close, or abandon a transaction
const TRANSACTION_CONTROL: &[&str] = &["BEGIN", "START", "COMMIT", "END", "ROLLBACK", "ABORT"];

/// Upper-cased leading keyword of every statement in `sql`.
///
/// Statements that start with a quoted identifier or a non-word token have
/// no keyword. Text that does not tokenize yields no keywords.
///
/// # Examples
/// ```
/// use pl_core::sql_utils::statement_keywords;
/// assert_eq!(
///     statement_keywords("begin; create table t (id int); commit;"),
///     vec!["BEGIN", "CREATE", "COMMIT"]
/// );
/// ```
pub fn statement_keywords(sql: &str) -> Vec<String> {
    let dialect = DuckDbDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            log::debug!("Could not tokenize script body: {e}");
            return Vec::new();
        }
    };

    let mut keywords = Vec::new();
    let mut at_statement_start = true;
    for token in tokens {
        match token {
            Token::Whitespace(_) => {}
            Token::SemiColon => at_statement_start = true,
            Token::Word(word) if at_statement_start => {
                if word.quote_style.is_none() {
                    keywords.push(word.value.to_ascii_uppercase());
                }
                at_statement_start = false;
            }
            _ => at_statement_start = false,
        }
    }
    keywords
}

/// Whether `sql` manages its own transaction (`BEGIN`, `COMMIT`, `ROLLBACK`, ...).
pub fn has_transaction_control(sql: &str) -> bool {
    statement_keywords(sql)
        .iter()
        .any(|keyword| TRANSACTION_CONTROL.contains(&keyword.as_str()))
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
