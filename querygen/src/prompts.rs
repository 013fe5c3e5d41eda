//! System prompts for the two model calls

use crate::llm::Message;

/// Messages asking the model which of the existing tables the prompt needs
pub fn table_selection(existing_tables: &[String], prompt: &str) -> Vec<Message> {
    let system = format!(
        "You are an expert database assistant.\n\
         Valid tables: {}\n\
         Extract ONLY relevant table names from the list above.\n\
         Return only the table names, comma-separated.\n\
         Do NOT guess or invent tables.\n",
        existing_tables.join(", ")
    );

    vec![Message::system(system), Message::user(prompt)]
}

/// Messages asking the model for a single SELECT over the given schema
pub fn sql_generation(schema: &str, prompt: &str) -> Vec<Message> {
    let system = format!(
        "You are a MySQL expert.\n\
         Use the schema below to write a valid SQL query for the user's prompt.\n\
         \n\
         {schema}\n\
         \n\
         Rules:\n\
         - Only generate SELECT queries.\n\
         - Do NOT generate INSERT, UPDATE, DELETE, DROP, ALTER, CREATE, or TRUNCATE.\n\
         - Never modify or remove data; only read.\n\
         - Return only SQL. No markdown. No explanations.\n"
    );

    vec![Message::system(system), Message::user(prompt)]
}
