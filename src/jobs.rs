use std::process::Child;

/// One detached background pipeline: every stage's child process under a
/// single job id.
#[derive(Debug)]
pub struct Job {
    pub id: usize,
    pub cmdline: String,
    children: Vec<Child>,
}

/// Table of background jobs, reaped lazily.
///
/// The shell polls the table once per prompt iteration instead of leaving
/// finished children unreaped for its whole lifetime.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    next_id: usize,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            next_id: 1,
        }
    }

    /// Track a freshly launched background pipeline. Returns its job id.
    pub fn register(&mut self, cmdline: String, children: Vec<Child>) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            cmdline,
            children,
        });
        id
    }

    /// Poll every tracked process without blocking, dropping jobs whose
    /// stages have all exited. Returns `(id, cmdline)` for each finished job
    /// so the caller can report it.
    pub fn reap(&mut self) -> Vec<(usize, String)> {
        let mut finished = Vec::new();
        self.jobs.retain_mut(|job| {
            job.children
                .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
            if job.children.is_empty() {
                finished.push((job.id, job.cmdline.clone()));
                false
            } else {
                true
            }
        });
        finished
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}
