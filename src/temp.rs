//! Safe temporary directory bases so scratch, staging and chunk directories are
//! never created under the current working directory (e.g. when TMPDIR=tmp).

use std::env;
use std::path::PathBuf;

/// Name of the per-user work directory under the system temp location
const WORK_DIR_NAME: &str = "intunepack";

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Default root for staging directories
pub fn work_dir_base() -> PathBuf {
    temp_dir_base().join(WORK_DIR_NAME)
}
