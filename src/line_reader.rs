use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Editor, Result};

use tracing::warn;

pub struct LineReader {
    rl: Editor<(), FileHistory>,
    history_file: String,
    prompt: String,
}

impl Drop for LineReader {
    fn drop(&mut self) {
        if let Err(err) = self.rl.save_history(&self.history_file) {
            warn!(%err, file = %self.history_file, "could not save history");
        }
    }
}

pub enum LineReadStatus {
    Line(String),
    Done,
}

impl LineReader {
    pub fn new(history_file: &str, prompt: &str) -> Result<LineReader> {
        let mut rl = Editor::<(), FileHistory>::new()?;
        rl.load_history(history_file).ok();
        Ok(LineReader {
            rl,
            history_file: history_file.into(),
            prompt: prompt.into(),
        })
    }

    pub fn readline(&mut self) -> LineReadStatus {
        match self.rl.readline(&self.prompt) {
            Ok(line) => {
                self.rl.add_history_entry(line.as_str()).ok();
                LineReadStatus::Line(line)
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => LineReadStatus::Done,
            Err(err) => {
                warn!(%err, "readline failed");
                LineReadStatus::Done
            }
        }
    }
}
