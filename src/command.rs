use std::fmt;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line
/// tools.
pub type ExitCode = i32;

/// One pipeline stage: an argument vector plus optional file redirections.
///
/// `argv[0]` is the command name. The background flag is only meaningful on
/// the final stage of a pipeline; the parser clears it anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub background: bool,
}

impl Command {
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))?;
        if let Some(path) = &self.input {
            write!(f, " < {}", path.display())?;
        }
        if let Some(path) = &self.output {
            write!(f, " > {}", path.display())?;
        }
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}

/// An ordered sequence of stages connected stdout-to-stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Command>,
}

impl Pipeline {
    /// Whether the whole pipeline runs without being awaited, governed by
    /// the final stage's background flag.
    pub fn background(&self) -> bool {
        self.stages.last().is_some_and(|stage| stage.background)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}
