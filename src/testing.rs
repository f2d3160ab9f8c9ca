//! Fakes for the installer's capability traits.
//!
//! Each fake records what it was asked to do so tests can assert on the
//! sequence of calls without touching the network or spawning processes.

use crate::download::ArchiveFetcher;
use crate::env::Environment;
use crate::error::{InstallError, InstallResult};
use crate::models::DownloadRequest;
use crate::plan::PlanRunner;
use crate::runner::{ProcessRunner, ShellCommand};
use crate::ui::Reporter;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Reporter that keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    infos: RefCell<Vec<String>>,
    comments: RefCell<Vec<String>>,
    lines: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn infos(&self) -> Vec<String> {
        self.infos.borrow().clone()
    }

    pub fn comments(&self) -> Vec<String> {
        self.comments.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.infos.borrow_mut().push(message.to_string());
    }

    fn comment(&self, message: &str) {
        self.comments.borrow_mut().push(message.to_string());
    }

    fn line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Environment with a fixed working directory and declared files/binaries.
///
/// `on_disk` environments also report paths that exist on the real
/// filesystem, for tests that work inside a temp directory.
#[derive(Debug, Clone)]
pub struct FakeEnvironment {
    cwd: PathBuf,
    files: HashSet<PathBuf>,
    executables: HashMap<String, PathBuf>,
    tty: bool,
    on_disk: bool,
}

impl FakeEnvironment {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: HashSet::new(),
            executables: HashMap::new(),
            tty: false,
            on_disk: false,
        }
    }

    pub fn on_disk(cwd: impl Into<PathBuf>) -> Self {
        Self {
            on_disk: true,
            ..Self::new(cwd)
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    pub fn with_executable(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(name.to_string(), path.into());
        self
    }

    pub fn with_tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }
}

impl Environment for FakeEnvironment {
    fn current_dir(&self) -> &Path {
        &self.cwd
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains(path) || (self.on_disk && path.exists())
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables.get(name).cloned()
    }

    fn has_tty(&self) -> bool {
        self.tty
    }
}

/// Fetcher serving one fixed body, or failing with an HTTP status
#[derive(Debug)]
pub struct FixtureFetcher {
    body: Result<Vec<u8>, u16>,
    urls: RefCell<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body: Ok(body),
            urls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            body: Err(status),
            urls: RefCell::new(Vec::new()),
        }
    }

    /// Every URL requested so far, in order
    pub fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }
}

impl ArchiveFetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> InstallResult<Box<dyn Read>> {
        self.urls.borrow_mut().push(url.to_string());
        match &self.body {
            Ok(body) => Ok(Box::new(Cursor::new(body.clone()))),
            Err(status) => Err(InstallError::fetch(url, format!("HTTP {status}"), Some(*status))),
        }
    }
}

/// Process runner that records commands and replays a canned result
#[derive(Debug, Default)]
pub struct ScriptedProcessRunner {
    exit_code: i32,
    output: Vec<String>,
    commands: RefCell<Vec<ShellCommand>>,
}

impl ScriptedProcessRunner {
    pub fn new(exit_code: i32, output: &[&str]) -> Self {
        Self {
            exit_code,
            output: output.iter().map(|l| (*l).to_string()).collect(),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.borrow().clone()
    }
}

impl ProcessRunner for ScriptedProcessRunner {
    fn run(&self, command: &ShellCommand, on_line: &mut dyn FnMut(&str)) -> InstallResult<i32> {
        self.commands.borrow_mut().push(command.clone());
        for line in &self.output {
            on_line(line);
        }
        Ok(self.exit_code)
    }
}

/// Plan runner that counts calls and returns queued exit codes (0 once
/// the queue is empty)
#[derive(Debug, Default)]
pub struct CountingPlanRunner {
    codes: RefCell<VecDeque<i32>>,
    calls: Cell<usize>,
    projects: RefCell<Vec<String>>,
}

impl CountingPlanRunner {
    pub fn returning(codes: &[i32]) -> Self {
        Self {
            codes: RefCell::new(codes.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn projects(&self) -> Vec<String> {
        self.projects.borrow().clone()
    }
}

impl PlanRunner for CountingPlanRunner {
    fn run(&self, request: &DownloadRequest) -> InstallResult<i32> {
        self.calls.set(self.calls.get() + 1);
        self.projects.borrow_mut().push(request.project_name.clone());
        Ok(self.codes.borrow_mut().pop_front().unwrap_or(0))
    }
}

/// Build an in-memory zip; names ending in `/` become directories
pub fn zip_fixture(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();

    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}
