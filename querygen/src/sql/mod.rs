//! SQL text handling: sanitizing model output and read-only gates

pub mod guard;
pub mod sanitize;

pub use guard::{
    blocked_sql_keyword, dangerous_prompt_word, has_stacked_statements, is_select,
    strip_terminators,
};
pub use sanitize::sanitize_sql;
