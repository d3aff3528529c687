const TEMPLATE: &str = "You are a helping assistant. Who help other to answer frequently asked questions. Don't Provide them the wrong answers. First check if your answer is right or not. The user's question is : {input}. The Conversational History is : {history}\n Answer: ";

/// Fill the FAQ assistant template with the question and prior history.
pub fn format_prompt(input: &str, history: &str) -> String {
    TEMPLATE
        .replacen("{history}", history, 1)
        .replacen("{input}", input, 1)
}
