use std::io::Write;

use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};

use crate::command::{Command, ExitCode, Pipeline};
use crate::env::Environment;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process. Routing them through the pipeline executor would run
/// them in a child, making their effects (directory change, variable
/// mutation) invisible to subsequent commands.
pub(crate) trait Builtin: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "pwd".
    fn name() -> &'static str;

    /// Executes the command. 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Intercept a pipeline whose sole stage names a builtin.
///
/// Returns `None` for multi-stage pipelines and for unrecognized names, in
/// which case the caller hands the pipeline to the executor.
pub fn dispatch(
    pipeline: &Pipeline,
    env: &mut Environment,
    stdout: &mut dyn Write,
) -> Option<Result<ExitCode>> {
    let [command] = pipeline.stages.as_slice() else {
        return None;
    };
    if let Some(result) = try_run::<Cd>(command, stdout, env) {
        return Some(result);
    }
    if let Some(result) = try_run::<Pwd>(command, stdout, env) {
        return Some(result);
    }
    if let Some(result) = try_run::<Set>(command, stdout, env) {
        return Some(result);
    }
    if let Some(result) = try_run::<Unset>(command, stdout, env) {
        return Some(result);
    }
    None
}

fn try_run<T: Builtin>(
    command: &Command,
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> Option<Result<ExitCode>> {
    if command.name() != T::name() {
        return None;
    }
    let args: Vec<&str> = command.argv[1..].iter().map(String::as_str).collect();
    Some(match T::from_args(&[T::name()], &args) {
        Ok(builtin) => builtin.execute(stdout, env),
        Err(EarlyExit { output, status }) => {
            let code = if status.is_err() { 1 } else { 0 };
            stdout
                .write_all(output.as_bytes())
                .map(|_| code)
                .map_err(Into::into)
        }
    })
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; no-op when omitted.
    pub target: Option<String>,
}

impl Builtin for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.target else {
            return Ok(0);
        };
        std::env::set_current_dir(&target).with_context(|| format!("cd: {}", target))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl Builtin for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let cwd = std::env::current_dir().context("pwd")?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Assign a shell variable. The store is internal to the shell; variables
/// are not exported to child processes.
pub struct Set {
    #[argh(positional)]
    /// variable name; ASCII alphanumerics and underscores only.
    pub name: String,

    #[argh(positional)]
    /// value to store.
    pub value: String,
}

impl Builtin for Set {
    fn name() -> &'static str {
        "set"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.set(&self.name, &self.value)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove a shell variable. Removing an absent name is not an error.
pub struct Unset {
    #[argh(positional)]
    /// variable name to remove.
    pub name: String,
}

impl Builtin for Unset {
    fn name() -> &'static str {
        "unset"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.unset(&self.name);
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::parser::parse_pipeline;

    fn pipeline(line: &str) -> Pipeline {
        parse_pipeline(line, &Limits::default()).0.expect("pipeline")
    }

    // The working directory is process-wide; tests that read or change it
    // must not interleave.
    static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn run(line: &str, env: &mut Environment) -> Option<(ExitCode, String)> {
        let mut out: Vec<u8> = Vec::new();
        let result = dispatch(&pipeline(line), env, &mut out)?;
        Some((result.unwrap(), String::from_utf8(out).unwrap()))
    }

    #[test]
    fn unknown_names_and_multi_stage_pipelines_pass_through() {
        let mut env = Environment::new(&Limits::default());
        let mut out: Vec<u8> = Vec::new();
        assert!(dispatch(&pipeline("ls -l"), &mut env, &mut out).is_none());
        // a piped `pwd` is not a builtin invocation
        assert!(dispatch(&pipeline("pwd | wc -c"), &mut env, &mut out).is_none());
    }

    #[test]
    fn set_and_unset_mutate_the_store() {
        let mut env = Environment::new(&Limits::default());
        let (code, out) = run("set LANG C", &mut env).unwrap();
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert_eq!(env.get("LANG"), Some("C"));

        let (code, _) = run("unset LANG", &mut env).unwrap();
        assert_eq!(code, 0);
        assert_eq!(env.get("LANG"), None);

        // absent name is still success
        let (code, _) = run("unset LANG", &mut env).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn set_with_wrong_arity_reports_usage_without_touching_state() {
        let mut env = Environment::new(&Limits::default());
        let (code, out) = run("set ONLY_NAME", &mut env).unwrap();
        assert_eq!(code, 1);
        assert!(!out.is_empty());
        assert!(env.is_empty());
    }

    #[test]
    fn set_surfaces_store_errors() {
        let mut env = Environment::new(&Limits::default());
        let mut out: Vec<u8> = Vec::new();
        let result = dispatch(&pipeline("set bad-name x"), &mut env, &mut out).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn pwd_prints_the_working_directory() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::new(&Limits::default());
        let (code, out) = run("pwd", &mut env).unwrap();
        assert_eq!(code, 0);
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(out.trim_end(), cwd.display().to_string());
    }

    #[test]
    #[cfg(unix)]
    fn cd_then_pwd_agree_on_the_new_directory() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = std::env::current_dir().unwrap();
        let dir = std::env::temp_dir().join(format!("builtin_tests_{}_cd", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let canonical = std::fs::canonicalize(&dir).expect("canonicalize");

        let mut env = Environment::new(&Limits::default());
        let (code, _) = run(&format!("cd {}", dir.display()), &mut env).unwrap();
        assert_eq!(code, 0);
        assert_eq!(std::env::current_dir().unwrap(), canonical);

        let (code, out) = run("pwd", &mut env).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out.trim_end(), canonical.display().to_string());

        std::env::set_current_dir(&before).expect("restore cwd");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn cd_without_argument_is_a_noop_and_failure_is_reported() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::new(&Limits::default());
        let before = std::env::current_dir().unwrap();

        let (code, _) = run("cd", &mut env).unwrap();
        assert_eq!(code, 0);
        assert_eq!(std::env::current_dir().unwrap(), before);

        let mut out: Vec<u8> = Vec::new();
        let result = dispatch(
            &pipeline("cd /definitely/not/a/directory"),
            &mut env,
            &mut out,
        )
        .unwrap();
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
