use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};

use anyhow::{Context, Result};
use os_pipe::PipeReader;

use crate::command::{Command, ExitCode, Pipeline};
use crate::jobs::JobTable;
use crate::path::PathResolver;

/// Exit code reported when a stage's executable cannot be resolved.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Run a pipeline of external commands.
///
/// All executables are resolved and all redirection files are opened before
/// anything is spawned, so a pipeline that cannot run to completion spawns
/// nothing. Stage i reads the pipe written by stage i-1 and writes the pipe
/// read by stage i+1; an explicit `<`/`>` redirection overrides the
/// corresponding pipe end for its stage. Pipe endpoints are moved into
/// exactly one child each and the parent's handles drop at spawn time, so
/// every descriptor closes on every exit path.
///
/// A foreground pipeline waits for every stage, in any completion order, and
/// reports the last stage's exit code. A background pipeline waits for none:
/// its children are registered in the job table and control returns
/// immediately.
pub fn run(pipeline: &Pipeline, resolver: &PathResolver, jobs: &mut JobTable) -> Result<ExitCode> {
    if pipeline.stages.is_empty() {
        return Ok(0);
    }

    let mut exes = Vec::with_capacity(pipeline.stages.len());
    for stage in &pipeline.stages {
        match resolver.resolve(stage.name()) {
            Some(path) => exes.push(path),
            None => {
                eprintln!("xsh: command not found: {}", stage.name());
                return Ok(EXIT_NOT_FOUND);
            }
        }
    }

    let mut redirections = Vec::with_capacity(pipeline.stages.len());
    for stage in &pipeline.stages {
        redirections.push(open_redirections(stage)?);
    }

    let children = spawn_all(&pipeline.stages, &exes, redirections)?;

    if pipeline.background() {
        let pid = children.last().map(Child::id).unwrap_or_default();
        let id = jobs.register(pipeline.to_string(), children);
        println!("[{}] {}", id, pid);
        return Ok(0);
    }

    let mut last_code = 0;
    for mut child in children {
        let status = child.wait().context("waiting for child process")?;
        last_code = exit_code(status);
    }
    Ok(last_code)
}

/// Opened `<`/`>` files for one stage, if requested.
struct Redirections {
    input: Option<File>,
    output: Option<File>,
}

fn open_redirections(stage: &Command) -> Result<Redirections> {
    let input = match &stage.input {
        Some(path) => Some(
            File::open(path)
                .with_context(|| format!("cannot open {} for reading", path.display()))?,
        ),
        None => None,
    };
    let output = match &stage.output {
        Some(path) => Some(
            File::create(path)
                .with_context(|| format!("cannot open {} for writing", path.display()))?,
        ),
        None => None,
    };
    Ok(Redirections { input, output })
}

fn spawn_all(
    stages: &[Command],
    exes: &[PathBuf],
    redirections: Vec<Redirections>,
) -> Result<Vec<Child>> {
    let mut children: Vec<Child> = Vec::with_capacity(stages.len());
    let mut prev_reader: Option<PipeReader> = None;
    let last = stages.len() - 1;

    for (i, ((stage, exe), redir)) in stages.iter().zip(exes).zip(redirections).enumerate() {
        match spawn_stage(stage, exe, i == last, &mut prev_reader, redir) {
            Ok(child) => children.push(child),
            Err(e) => {
                // Drop our read end so upstream stages see a closed pipe,
                // then reap whatever was already spawned.
                drop(prev_reader.take());
                for mut child in children {
                    let _ = child.wait();
                }
                return Err(e);
            }
        }
    }
    Ok(children)
}

fn spawn_stage(
    stage: &Command,
    exe: &Path,
    is_last: bool,
    prev_reader: &mut Option<PipeReader>,
    redir: Redirections,
) -> Result<Child> {
    // Taking the previous read end here closes it even when an explicit `<`
    // wins over it; the upstream writer then sees a broken pipe instead of
    // blocking forever.
    let stdin: Stdio = match (redir.input, prev_reader.take()) {
        (Some(file), _) => Stdio::from(file),
        (None, Some(reader)) => Stdio::from(reader),
        (None, None) => Stdio::inherit(),
    };

    let stdout: Stdio = if let Some(file) = redir.output {
        if !is_last {
            // `>` on an interior stage overrides the pipe; the next stage
            // keeps a read end whose writer drops at once, so it sees EOF.
            let (reader, _writer) = os_pipe::pipe().context("creating pipe")?;
            *prev_reader = Some(reader);
        }
        Stdio::from(file)
    } else if is_last {
        Stdio::inherit()
    } else {
        let (reader, writer) = os_pipe::pipe().context("creating pipe")?;
        *prev_reader = Some(reader);
        Stdio::from(writer)
    };

    std::process::Command::new(exe)
        .args(&stage.argv[1..])
        .stdin(stdin)
        .stdout(stdout)
        .spawn()
        .with_context(|| format!("failed to spawn {}", stage.name()))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => match status.signal() {
            Some(signal) => 128 + signal,
            None => 1,
        },
    }
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> ExitCode {
    status.code().unwrap_or(1)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::parser::parse_pipeline;
    use std::fs;
    use std::time::{Duration, Instant};

    fn resolver() -> PathResolver {
        PathResolver::from_dirs(vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")])
    }

    fn pipeline(line: &str) -> Pipeline {
        parse_pipeline(line, &Limits::default()).0.expect("pipeline")
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("executor_tests_{}_{}", std::process::id(), tag));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn output_redirection_truncates_and_writes() {
        let dir = scratch_dir("redirect_out");
        let out = dir.join("out.txt");
        fs::write(&out, "stale contents that should vanish").unwrap();

        let mut jobs = JobTable::new();
        let line = format!("echo fresh > {}", out.display());
        let code = run(&pipeline(&line), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "fresh\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn input_redirection_feeds_the_file() {
        let dir = scratch_dir("redirect_in");
        let input = dir.join("in.txt");
        let out = dir.join("out.txt");
        fs::write(&input, "line one\nline two\n").unwrap();

        let mut jobs = JobTable::new();
        let line = format!("cat < {} > {}", input.display(), out.display());
        let code = run(&pipeline(&line), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "line one\nline two\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn pipe_delivers_producer_output_to_consumer() {
        let dir = scratch_dir("pipe");
        let out = dir.join("out.txt");

        let mut jobs = JobTable::new();
        let line = format!("echo hello | cat > {}", out.display());
        let code = run(&pipeline(&line), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn three_stage_pipeline_runs_to_completion() {
        let dir = scratch_dir("three");
        let out = dir.join("out.txt");

        let mut jobs = JobTable::new();
        let line = format!("echo one two three | cat | wc -w > {}", out.display());
        let code = run(&pipeline(&line), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&out).unwrap().trim(), "3");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn foreground_exit_code_is_the_last_stage() {
        let mut jobs = JobTable::new();
        let code = run(&pipeline("false | true"), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        let code = run(&pipeline("true | false"), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn unresolvable_stage_spawns_nothing() {
        let dir = scratch_dir("not_found");
        let out = dir.join("out.txt");

        let mut jobs = JobTable::new();
        let line = format!("no_such_command_xyzzy > {}", out.display());
        let code = run(&pipeline(&line), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, EXIT_NOT_FOUND);
        // resolution happens before redirection files are touched
        assert!(!out.exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_input_file_fails_the_pipeline() {
        let mut jobs = JobTable::new();
        let result = run(
            &pipeline("cat < /definitely/not/a/file"),
            &resolver(),
            &mut jobs,
        );
        assert!(result.is_err());
    }

    #[test]
    fn background_pipeline_returns_immediately() {
        let mut jobs = JobTable::new();
        let started = Instant::now();
        let code = run(&pipeline("sleep 5 &"), &resolver(), &mut jobs).unwrap();
        assert_eq!(code, 0);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(jobs.len(), 1);
        // the sleeper is still running, so nothing reaps yet
        assert!(jobs.reap().is_empty());
    }
}
