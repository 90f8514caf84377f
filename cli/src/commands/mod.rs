pub mod generate;
pub mod index;

use std::path::PathBuf;

/// Working directory used when `--work` is not given.
pub(crate) fn work_dir(work: &Option<PathBuf>) -> PathBuf {
    work.clone().unwrap_or_else(|| "./work".into())
}
