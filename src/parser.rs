use std::fmt;
use std::path::PathBuf;

use crate::command::{Command, Pipeline};
use crate::config::Limits;

/// Non-fatal conditions noticed while parsing a line.
///
/// The grammar has no hard syntax errors: anything malformed degrades to a
/// smaller pipeline. Every degradation is surfaced here instead of being
/// dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// More stages than the configured limit; the excess was dropped.
    TooManyStages { max: usize, dropped: usize },
    /// A stage had more arguments than the configured limit; the rest of the
    /// stage was dropped.
    TooManyArgs { max: usize },
    /// `<` or `>` at the end of a stage with no file name after it.
    DanglingRedirect { op: char },
    /// `&` on a stage other than the last; the flag was ignored there.
    BackgroundNotLast,
    /// A stage between pipes held no command; it was skipped.
    EmptyStage,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::TooManyStages { max, dropped } => {
                write!(f, "pipeline longer than {} stages; {} dropped", max, dropped)
            }
            ParseWarning::TooManyArgs { max } => {
                write!(f, "stage has more than {} arguments; extras dropped", max)
            }
            ParseWarning::DanglingRedirect { op } => {
                write!(f, "'{}' with no file name", op)
            }
            ParseWarning::BackgroundNotLast => {
                write!(f, "'&' is only meaningful on the last pipeline stage")
            }
            ParseWarning::EmptyStage => write!(f, "empty pipeline stage skipped"),
        }
    }
}

/// Split an expanded line into a pipeline of commands.
///
/// The line is cut on `|` into stages and each stage is tokenized on
/// whitespace, with `< file`, `> file` and a terminating `&` recognized.
/// An empty or whitespace-only line yields no pipeline. Capacity overflow
/// and malformed pieces are reported through the returned warnings rather
/// than aborting the parse.
pub fn parse_pipeline(line: &str, limits: &Limits) -> (Option<Pipeline>, Vec<ParseWarning>) {
    let mut warnings = Vec::new();
    if line.trim().is_empty() {
        return (None, warnings);
    }

    let raw: Vec<&str> = line.split('|').collect();
    let total = raw.len();
    let mut stages = Vec::new();
    for (idx, stage_str) in raw.iter().enumerate() {
        if stages.len() == limits.max_stages {
            warnings.push(ParseWarning::TooManyStages {
                max: limits.max_stages,
                dropped: total - idx,
            });
            break;
        }
        match parse_command(stage_str, limits, &mut warnings) {
            Some(command) => stages.push(command),
            None => warnings.push(ParseWarning::EmptyStage),
        }
    }

    // The background flag only counts on the final stage.
    let last = stages.len().saturating_sub(1);
    for (i, stage) in stages.iter_mut().enumerate() {
        if stage.background && i != last {
            stage.background = false;
            warnings.push(ParseWarning::BackgroundNotLast);
        }
    }

    if stages.is_empty() {
        (None, warnings)
    } else {
        (Some(Pipeline { stages }), warnings)
    }
}

/// Tokenize one stage. Returns `None` when it holds no command word.
fn parse_command(stage: &str, limits: &Limits, warnings: &mut Vec<ParseWarning>) -> Option<Command> {
    let mut command = Command::default();
    let mut tokens = stage.split_whitespace();

    while let Some(token) = tokens.next() {
        match token {
            "<" => match tokens.next() {
                Some(path) => command.input = Some(PathBuf::from(path)),
                None => warnings.push(ParseWarning::DanglingRedirect { op: '<' }),
            },
            ">" => match tokens.next() {
                Some(path) => command.output = Some(PathBuf::from(path)),
                None => warnings.push(ParseWarning::DanglingRedirect { op: '>' }),
            },
            "&" => {
                command.background = true;
                break;
            }
            arg => {
                if command.argv.len() == limits.max_args {
                    warnings.push(ParseWarning::TooManyArgs { max: limits.max_args });
                    break;
                }
                command.argv.push(arg.to_string());
            }
        }
    }

    if command.argv.is_empty() { None } else { Some(command) }
}
