//! Dataset layout on disk.
//!
//! <root>/<class>/<class:04>-<trace:04>-<sample:04>_btr.qoe.log  bitrate log
//! <root>/<class>/<class:04>-<trace:04>-<sample:04>.qoe.log      event log
//!
//! Example: 7/0007-0002-0009_btr.qoe.log

use crate::Result;
use crate::config::DatasetLayout;
use anyhow::Context;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_SUFFIX: &str = ".qoe.log";
const FILE_NAME_RE: &str = r"^(\d{4})-(\d{4})-(\d{4})(_btr)?\.qoe\.log$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogKind {
    /// Player events.
    Events,
    /// Per-segment bitrates.
    Bitrate,
}

/// Position of one session in the class/trace/sample grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId {
    pub class: u32,
    pub trace: u32,
    pub sample: u32,
}

/// Matcher for file names that follow the layout.
#[derive(Debug, Clone)]
pub struct NamePattern {
    re: Regex,
}

impl NamePattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(FILE_NAME_RE)?,
        })
    }

    /// Recover the id and kind from a file name.
    pub fn parse(&self, file_name: &str) -> Option<(SampleId, LogKind)> {
        let caps = self.re.captures(file_name)?;
        let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        let id = SampleId::new(num(1)?, num(2)?, num(3)?);
        let kind = if caps.get(4).is_some() {
            LogKind::Bitrate
        } else {
            LogKind::Events
        };
        Some((id, kind))
    }
}

impl SampleId {
    pub fn new(class: u32, trace: u32, sample: u32) -> Self {
        Self {
            class,
            trace,
            sample,
        }
    }

    pub fn file_name(&self, kind: LogKind) -> String {
        let suffix = match kind {
            LogKind::Bitrate => "_btr",
            LogKind::Events => "",
        };
        format!(
            "{:04}-{:04}-{:04}{}{}",
            self.class, self.trace, self.sample, suffix, LOG_SUFFIX
        )
    }
}

/// A log file located in the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// `None` when the file name does not follow the layout.
    pub id: Option<SampleId>,
    pub kind: Option<LogKind>,
}

impl LogFile {
    pub fn display(&self) -> String {
        self.path.display().to_string()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    layout: DatasetLayout,
    names: NamePattern,
}

impl Dataset {
    pub fn new(root: impl Into<PathBuf>, layout: DatasetLayout) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            layout,
            names: NamePattern::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> std::ops::Range<u32> {
        0..self.layout.classes
    }

    pub fn path_of(&self, id: SampleId, kind: LogKind) -> PathBuf {
        self.root
            .join(id.class.to_string())
            .join(id.file_name(kind))
    }

    /// Existing files of one class, in trace/sample order.
    ///
    /// Missing files are skipped silently.
    pub fn class_files(&self, class: u32, kind: LogKind) -> Vec<LogFile> {
        let mut out = Vec::new();
        for trace in 0..self.layout.traces {
            for sample in 0..self.layout.samples {
                let id = SampleId::new(class, trace, sample);
                let path = self.path_of(id, kind);
                if path.is_file() {
                    out.push(LogFile {
                        path,
                        id: Some(id),
                        kind: Some(kind),
                    });
                }
            }
        }
        out
    }

    /// Every `*.qoe.log` below the root, at any depth.
    ///
    /// Files named after the layout come first, in class/trace/sample order
    /// (event log before bitrate log); the rest follow sorted by path.
    pub fn walk_logs(&self) -> Result<Vec<LogFile>> {
        let mut paths = Vec::new();
        walk(&self.root, &mut paths)?;

        let mut files: Vec<LogFile> = paths
            .into_iter()
            .map(|path| {
                let parsed = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| self.names.parse(n));
                LogFile {
                    path,
                    id: parsed.map(|(id, _)| id),
                    kind: parsed.map(|(_, kind)| kind),
                }
            })
            .collect();
        files.sort_by(|a, b| {
            (a.id.is_none(), a.id, a.kind, &a.path).cmp(&(b.id.is_none(), b.id, b.kind, &b.path))
        });
        Ok(files)
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read dataset directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", path.display()))?;

        if file_type.is_dir() {
            walk(&path, out)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(LOG_SUFFIX))
        {
            out.push(path);
        }
    }
    Ok(())
}
