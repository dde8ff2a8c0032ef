use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

const LOCK_FILE_NAME: &str = "bulkrename.lock";
const STALE_LOCK_TIMEOUT_SECS: u64 = 300;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Parse `pid:timestamp`.
fn parse_holder(content: &str) -> Option<(u32, u64)> {
    let (pid, timestamp) = content.trim().split_once(':')?;
    Some((pid.parse().ok()?, timestamp.parse().ok()?))
}

/// Exclusive hold on a state directory for the length of one commit.
#[derive(Debug)]
pub struct BatchLock {
    path: PathBuf,
    pid: u32,
    timestamp: u64,
}

impl BatchLock {
    /// Take the lock, clearing it first if its holder is stale or gone.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let lock_path = state_dir.join(LOCK_FILE_NAME);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).context("Failed to read lock file")?;
            match parse_holder(&content) {
                Some((pid, timestamp))
                    if now_secs().saturating_sub(timestamp) <= STALE_LOCK_TIMEOUT_SECS
                        && is_process_running(pid) =>
                {
                    return Err(anyhow!(
                        "Another bulkrename commit is already running (PID: {}). \
                        If this is incorrect, remove the lock file at: {}",
                        pid,
                        lock_path.display()
                    ));
                },
                _ => fs::remove_file(&lock_path).context("Failed to remove stale lock file")?,
            }
        }

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }

        let pid = process::id();
        let timestamp = now_secs();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .context("Failed to create lock file")?;
        file.write_all(format!("{}:{}", pid, timestamp).as_bytes())
            .context("Failed to write lock file")?;

        Ok(Self {
            path: lock_path,
            pid,
            timestamp,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ours(&self) -> bool {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| parse_holder(&content))
            == Some((self.pid, self.timestamp))
    }

    /// Remove the lock file if it is still ours.
    pub fn release(self) -> Result<()> {
        if self.is_ours() {
            fs::remove_file(&self.path).context("Failed to remove lock file")?;
        }
        Ok(())
    }
}

impl Drop for BatchLock {
    fn drop(&mut self) {
        if self.is_ours() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // Signal 0 only checks that the process exists
    #[allow(clippy::cast_possible_wrap)]
    unsafe {
        libc::kill(pid as libc::pid_t, 0) == 0
    }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::winnt::PROCESS_QUERY_INFORMATION;

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
        if handle.is_null() {
            false
        } else {
            CloseHandle(handle);
            true
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn is_process_running(_pid: u32) -> bool {
    false
}
