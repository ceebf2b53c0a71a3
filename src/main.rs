use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};

use xsh::Shell;
use xsh::shell::is_exit_request;

/// Interactive front end: read one line at a time and feed it to the shell
/// core. The shell's own exit status is 0 on every normal termination path;
/// only child processes carry failure codes.
fn main() -> Result<()> {
    let mut shell = Shell::new();
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("xsh# ") {
            Ok(line) => {
                if is_exit_request(&line) {
                    break;
                }
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
                if let Err(err) = shell.run_line(&line) {
                    eprintln!("xsh: {:#}", err);
                }
            }
            // ^C drops the current line and shows a fresh prompt
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("xsh: {}", err);
                break;
            }
        }
    }

    Ok(())
}
