use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    diagnostics::{Result, TinyTalkError},
    runtime::Interpreter,
    value::ValueKind,
};

pub struct Repl {
    interpreter: Interpreter,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(|err| {
            TinyTalkError::from(std::io::Error::new(std::io::ErrorKind::Other, err))
        })?;
        loop {
            match editor.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == ":quit" || trimmed == ":exit" {
                        break;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    let result = self.interpreter.eval_source(trimmed);
                    for shown in self.interpreter.drain_output() {
                        println!("{shown}");
                    }
                    match result {
                        Ok(value) => {
                            if !matches!(&*value.0, ValueKind::None) {
                                println!("{value}");
                            }
                        }
                        Err(err) => eprintln!("{err}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    return Err(TinyTalkError::from(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        err,
                    )));
                }
            }
        }
        Ok(())
    }
}
