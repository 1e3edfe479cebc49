#![allow(dead_code)]

use batchren_core::{RenameFs, RenameRequest, StdFs};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Real filesystem that records every rename call and can fail on demand
#[derive(Debug, Default)]
pub struct CountingFs {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail_on: Mutex<Option<PathBuf>>,
}

impl CountingFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next rename whose destination is `target` fail with EACCES
    pub fn fail_on(&self, target: impl Into<PathBuf>) {
        *self.fail_on.lock().unwrap() = Some(target.into());
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl RenameFs for CountingFs {
    fn exists(&self, path: &Path) -> bool {
        StdFs.exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));

        let mut fail_on = self.fail_on.lock().unwrap();
        if fail_on.as_deref() == Some(to) {
            *fail_on = None;
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"));
        }
        drop(fail_on);

        StdFs.rename(from, to)
    }
}

/// Create `names` in `dir`, each file holding its own name
pub fn populate(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), name).unwrap();
    }
}

pub fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

pub fn request(dir: &Path, from: &str, to: &str) -> RenameRequest {
    RenameRequest::for_path(dir.join(from), to).unwrap()
}

/// Sorted leaf names in `dir`
pub fn listing(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
