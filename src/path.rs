use std::path::{Path, PathBuf};

use crate::config::Limits;

/// Executable lookup over the search path inherited at startup.
///
/// The directory list is built once from `PATH` and is immutable for the
/// lifetime of the shell; later changes to the process environment are not
/// observed. A missing `PATH` yields an empty list, which resolves nothing
/// but direct paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Split the inherited `PATH` on the platform separator, keeping at most
    /// `limits.max_path_dirs` entries. Excess directories are reported and
    /// ignored.
    pub fn from_env(limits: &Limits) -> Self {
        let mut dirs = Vec::new();
        if let Some(path) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path) {
                if dirs.len() == limits.max_path_dirs {
                    eprintln!(
                        "xsh: PATH has more than {} directories; ignoring the rest",
                        limits.max_path_dirs
                    );
                    break;
                }
                dirs.push(dir);
            }
        }
        Self { dirs }
    }

    /// Build a resolver over an explicit directory list.
    pub fn from_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve a command name to an executable path.
    ///
    /// A name containing a path separator is treated as a direct path and
    /// returned only if it is executable. A bare name probes each search
    /// directory in order; the first executable `dir/name` wins, matching
    /// conventional shell behavior.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.contains(std::path::MAIN_SEPARATOR) {
            let direct = PathBuf::from(name);
            return is_executable(&direct).then_some(direct);
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
