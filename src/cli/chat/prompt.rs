use rustyline::{Config, Editor, Result};

pub const PROMPT_TEXT: &str = "User: ";

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    Editor::with_config(config)
}
