/// Where a piece of source text came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Literal,
    Repl,
    File(String),
}

#[derive(Debug, Clone)]
pub struct Input {
    pub source: Source,
    pub content: String,
}

impl Input {
    pub fn new(source: Source, content: impl Into<String>) -> Input {
        Input {
            source,
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        match &self.source {
            Source::Literal => "<command-line input>",
            Source::Repl => "<repl>",
            Source::File(filename) => filename,
        }
    }

    /// The 1-based source line `line`, if it exists.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|idx| self.content.lines().nth(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let input = Input::new(Source::Literal, "print 1;\nprint 2;");
        assert_eq!(input.line(2), Some("print 2;"));
        assert_eq!(input.line(0), None);
        assert_eq!(input.line(3), None);
        assert_eq!(input.name(), "<command-line input>");
    }
}
