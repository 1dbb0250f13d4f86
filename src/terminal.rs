//! Line-oriented operator I/O.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Where the console reads operator input and writes its output.
pub trait Terminal {
    /// Reads one line after showing `prompt`. `None` means the operator closed input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Writes one line of output.
    fn print(&mut self, text: &str);
}

/// Interactive terminal with line editing and in-session history.
pub struct EditorTerminal {
    editor: DefaultEditor,
}

impl EditorTerminal {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Terminal for EditorTerminal {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => None,
            Err(e) => {
                tracing::warn!("failed to read input: {}", e);
                None
            }
        }
    }

    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Terminal fed from a fixed list of input lines, capturing everything printed.
#[cfg(test)]
pub struct ScriptedTerminal {
    inputs: std::collections::VecDeque<String>,
    pub output: String,
}

#[cfg(test)]
impl ScriptedTerminal {
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: String::new(),
        }
    }
}

#[cfg(test)]
impl Terminal for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.output.push_str(prompt);
        let line = self.inputs.pop_front();
        self.output.push('\n');
        line
    }

    fn print(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}
