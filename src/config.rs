/// Capacity limits for one shell instance.
///
/// Historically shells of this size used fixed global arrays and truncated
/// silently on overflow. Here every limit is per-instance configuration and
/// exceeding one is a reported failure, never a silent drop.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of variables the environment store will hold.
    pub max_env_vars: usize,
    /// Maximum number of directories kept from the inherited search path.
    pub max_path_dirs: usize,
    /// Maximum number of stages in one pipeline.
    pub max_stages: usize,
    /// Maximum number of arguments in one pipeline stage, command name included.
    pub max_args: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_env_vars: 100,
            max_path_dirs: 64,
            max_stages: 10,
            max_args: 64,
        }
    }
}
