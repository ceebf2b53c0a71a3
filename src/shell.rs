use anyhow::Result;

use crate::builtin;
use crate::command::ExitCode;
use crate::config::Limits;
use crate::env::Environment;
use crate::executor;
use crate::expand::expand;
use crate::jobs::JobTable;
use crate::parser::parse_pipeline;
use crate::path::PathResolver;

/// Literal input lines that terminate the shell.
pub fn is_exit_request(line: &str) -> bool {
    line == "exit" || line == "quit"
}

/// One shell instance: the variable store, the search path captured at
/// startup, and the background job table, with the line-to-side-effects
/// plumbing that connects them.
///
/// The caller owns line acquisition; [`Shell::run_line`] takes one raw line
/// (newline already stripped) and drives it end to end: reap finished
/// background jobs, expand `$NAME` tokens, parse the pipeline, then either
/// dispatch a builtin in-process or hand the pipeline to the executor.
pub struct Shell {
    limits: Limits,
    env: Environment,
    resolver: PathResolver,
    jobs: JobTable,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        let env = Environment::new(&limits);
        let resolver = PathResolver::from_env(&limits);
        Self {
            limits,
            env,
            resolver,
            jobs: JobTable::new(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Execute one input line. Never fatal to the shell: errors come back to
    /// the caller for reporting and the next line can proceed.
    pub fn run_line(&mut self, line: &str) -> Result<ExitCode> {
        for (id, cmdline) in self.jobs.reap() {
            println!("[{}] done\t{}", id, cmdline);
        }

        let expanded = expand(line, &self.env);
        let (pipeline, warnings) = parse_pipeline(&expanded, &self.limits);
        for warning in warnings {
            eprintln!("xsh: {}", warning);
        }
        let Some(pipeline) = pipeline else {
            return Ok(0);
        };

        let mut stdout = std::io::stdout();
        if let Some(result) = builtin::dispatch(&pipeline, &mut self.env, &mut stdout) {
            return result;
        }
        executor::run(&pipeline, &self.resolver, &mut self.jobs)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
