//! Checks that a source file is free to be moved.
//!
//! A rip that is still being written shows up as a file that cannot be
//! opened. The planner asks an `AccessProbe` before touching each file so
//! tests can stand in for a locked file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

pub trait AccessProbe {
    fn check(&self, path: &Path) -> io::Result<()>;
}

/// Opens the file for reading; on Windows no sharing is allowed, so a file
/// held open by another process is reported as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExclusiveOpen;

impl AccessProbe for ExclusiveOpen {
    fn check(&self, path: &Path) -> io::Result<()> {
        let file = open_exclusive(path)?;
        drop(file);
        Ok(())
    }
}

#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    OpenOptions::new().read(true).share_mode(0).open(path)
}

#[cfg(not(windows))]
fn open_exclusive(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}
