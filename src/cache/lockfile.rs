//! Exclusive cross-process file locks
//!
//! Wraps an open state file holding an `flock(LOCK_EX)`. The lock belongs
//! to the open file description, so two handles in the same process
//! exclude each other just like two processes do. Closing the file (or
//! process death) releases it.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Permission bits for newly created state files
pub const STATE_FILE_MODE: u32 = 0o600;

/// An open file holding an exclusive OS lock
#[derive(Debug)]
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    /// Open or create `path` and block until the exclusive lock is held
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_state_file(path)?;
        sys::lock(&file, true)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Like [`LockedFile::open`] but returns `None` instead of waiting
    pub fn try_open(path: &Path) -> io::Result<Option<Self>> {
        let file = open_state_file(path)?;
        match sys::lock(&file, false) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file from offset zero as raw bytes
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut content = Vec::new();
        self.file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Replace the file content: truncate, write from zero, sync
    pub fn replace(&mut self, content: &[u8]) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(content)?;
        self.file.sync_data()
    }

    /// Release the lock and close the file
    pub fn unlock(self) -> io::Result<()> {
        sys::unlock(&self.file)
    }
}

fn open_state_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(STATE_FILE_MODE);
    }

    options.open(path)
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub fn lock(file: &File, blocking: bool) -> io::Result<()> {
        let op = if blocking {
            libc::LOCK_EX
        } else {
            libc::LOCK_EX | libc::LOCK_NB
        };
        flock(file, op)
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }

    fn flock(file: &File, op: libc::c_int) -> io::Result<()> {
        loop {
            // SAFETY: the descriptor is owned by `file` and open for the call
            let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    pub fn lock(_file: &File, _blocking: bool) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "exclusive state file locks require a unix platform",
        ))
    }

    pub fn unlock(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_file_with_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".state-test");

        let locked = LockedFile::open(&path).unwrap();
        assert!(path.exists());

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, STATE_FILE_MODE);
        locked.unlock().unwrap();
    }

    #[test]
    fn try_open_contended_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".state-test");

        let held = LockedFile::open(&path).unwrap();
        assert!(LockedFile::try_open(&path).unwrap().is_none());

        held.unlock().unwrap();
        assert!(LockedFile::try_open(&path).unwrap().is_some());
    }

    #[test]
    fn blocking_open_waits_for_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".state-test");

        let held = LockedFile::open(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        let waiter_path = path.clone();
        let waiter = thread::spawn(move || {
            let locked = LockedFile::open(&waiter_path).unwrap();
            tx.send(()).unwrap();
            locked.unlock().unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        held.unlock().unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn replace_truncates_longer_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".state-test");

        let mut locked = LockedFile::open(&path).unwrap();
        locked.replace(b"a much longer first line\n").unwrap();
        locked.replace(b"short\n").unwrap();

        assert_eq!(locked.read_all().unwrap(), b"short\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short\n");
    }

    #[test]
    fn open_fails_when_directory_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join(".state-test");

        let err = LockedFile::open(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
