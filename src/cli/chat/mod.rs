pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use eyre::Result;
use prompt::PROMPT_TEXT;
use rustyline::error::ReadlineError;
use tracing::error;

use crate::chat::sessions::DEFAULT_SESSION;
use crate::chat::ConversationChain;

const WELCOME_TEXT: &str = "
How can I assist you today? Type 'q' or 'e' to exit.

/clear        Clear the conversation history
/help         Show the help dialogue
";

const HELP_TEXT: &str = "
Groq Chat

/clear        Clear the conversation history
/help         Show this help dialogue
q, e          Quit the application
";

const GOODBYE_TEXT: &str = "Ending the Conversation. Hope you get your query solved.";

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

/// Terminal chat against the same chain the HTTP server uses.
pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    chain: ConversationChain,
}

impl ChatContext {
    pub fn new(output: Box<dyn Write>, input: Option<String>, chain: ConversationChain) -> Self {
        Self {
            output,
            input,
            chain,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            return match self.process_chat_input(&input).await {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    Ok(ExitCode::FAILURE)
                }
            };
        }

        writeln!(self.output, "{}", WELCOME_TEXT)?;
        self.run_interactive().await?;
        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            match rl.readline(PROMPT_TEXT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    match self.handle_input(&line).await {
                        Ok(Action::Quit) => break,
                        Ok(Action::Continue) => {}
                        Err(e) => {
                            error!("Chat request failed: {}", e);
                            writeln!(self.output, "Error: {}", e)?;
                        }
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    writeln!(self.output, "{}", GOODBYE_TEXT)?;
                    break;
                }
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<Action> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("e") {
            writeln!(self.output, "{}", GOODBYE_TEXT)?;
            return Ok(Action::Quit);
        }

        match trimmed {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.chain.sessions().remove(DEFAULT_SESSION).await;
                writeln!(self.output, "Conversation cleared.")?;
            }
            _ => self.process_chat_input(input).await?,
        }

        Ok(Action::Continue)
    }

    async fn process_chat_input(&mut self, input: &str) -> Result<()> {
        let output = self.chain.invoke(DEFAULT_SESSION, input).await?;
        writeln!(self.output, "Assistant: {}", output.response)?;
        Ok(())
    }
}
