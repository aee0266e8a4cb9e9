//! Cross-process single-flight for named sync jobs.
//!
//! A job holds `<dir>/<job>.lock` while a cycle runs. The file records the
//! owning pid, so a lock left behind by a crashed process can be reclaimed.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::unix_timestamp_now;

/// Locks older than this are treated as abandoned even if the pid is alive.
const LOCK_STALE_SECONDS: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Sync job '{job}' is already running in process {pid}")]
    Held { job: String, pid: u32 },
    #[error("Failed to acquire lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    acquired_at: i64,
    job: String,
}

/// Held lock for one job; released on drop.
#[derive(Debug)]
pub struct JobLock {
    path: PathBuf,
}

impl JobLock {
    /// Take the lock for `job` in `dir`, creating the directory if needed.
    pub fn acquire(dir: &Path, job: &str) -> Result<Self, LockError> {
        let path = lock_path(dir, job);
        let io_error = |source| LockError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_error)?;

        // One reclaim attempt; losing the race after that means someone else holds it
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let info = LockInfo {
                        pid: std::process::id(),
                        acquired_at: unix_timestamp_now(),
                        job: job.to_string(),
                    };
                    let raw = serde_json::to_vec(&info)
                        .map_err(|error| io_error(io::Error::other(error)))?;
                    if let Err(error) = file.write_all(&raw) {
                        let _ = fs::remove_file(&path);
                        return Err(io_error(error));
                    }
                    tracing::debug!(job, path = %path.display(), "Acquired sync lock");
                    return Ok(Self { path });
                }
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                    match read_lock_info(&path) {
                        Some(info) if !is_stale(&info) => {
                            return Err(LockError::Held {
                                job: job.to_string(),
                                pid: info.pid,
                            });
                        }
                        _ => {
                            tracing::warn!(
                                job,
                                path = %path.display(),
                                "Removing abandoned sync lock"
                            );
                            match fs::remove_file(&path) {
                                Ok(()) => {}
                                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                                Err(error) => return Err(io_error(error)),
                            }
                        }
                    }
                }
                Err(error) => return Err(io_error(error)),
            }
        }

        let pid = read_lock_info(&path).map_or(0, |info| info.pid);
        Err(LockError::Held {
            job: job.to_string(),
            pid,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to release {}: {}", self.path.display(), error);
            }
        }
    }
}

/// `<dir>/<job>.lock`, with characters unsafe in file names replaced.
pub fn lock_path(dir: &Path, job: &str) -> PathBuf {
    let file_stem: String = job
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{file_stem}.lock"))
}

fn read_lock_info(path: &Path) -> Option<LockInfo> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn is_stale(info: &LockInfo) -> bool {
    !pid_is_alive(info.pid) || unix_timestamp_now() - info.acquired_at > LOCK_STALE_SECONDS
}

#[cfg(target_os = "linux")]
fn pid_is_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn pid_is_alive(_pid: u32) -> bool {
    true
}
