pub const SYSTEM_PROMPT: &str = "You are a helpful AI document assistant. Use the provided context to answer \
questions accurately. If the answer isn't in the context, use your general knowledge but mention it's not \
in the document.";

pub fn user_message(prompt: &str, context: &str) -> String {
    format!("Context: {context}\n\nQuestion: {prompt}")
}

/// Prompt for acting on a highlighted passage; sent with an empty context.
pub fn selection_prompt(selection: &str, task: &str, document_context: &str) -> String {
    format!("Selected text: {selection}\n\nTask: {task}\n\nOverall Document Context: {document_context}")
}
