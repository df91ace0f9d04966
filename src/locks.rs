//! Package-manager lock detection
//!
//! Ubuntu serialises `apt`/`dpkg` through a handful of lock files. Before
//! touching packages we find out whether another process (an operator's
//! `apt`, `unattended-upgrades`, or a second copy of this tool) holds one of
//! them, and optionally wait for it to go away.
//!
//! No single inspection tool is guaranteed to be installed, so detection
//! walks a configurable list of [`LockProbe`]s and degrades silently when a
//! tool is missing or its output cannot be parsed.

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::exec::{CommandRunner, Invocation, capture};

/// Snapshot of package-manager lock contention
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockInfo {
    pub locked: bool,
    pub holder_pid: Option<u32>,
    pub holder_cmd: Option<String>,
    pub path: Option<String>,
    /// Raw output of the probe that produced this snapshot
    pub raw: String,
}

impl LockInfo {
    pub fn unlocked(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// Lock held by an identified process
    pub fn held(pid: u32, cmd: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            locked: true,
            holder_pid: Some(pid),
            holder_cmd: Some(cmd.into()),
            path: Some(path.into()),
            raw: String::new(),
        }
    }

    /// Human-readable description of the holder, as far as it is known
    pub fn describe(&self) -> String {
        if !self.locked {
            return "no lock held".to_string();
        }
        let who = match (&self.holder_cmd, self.holder_pid) {
            (Some(cmd), Some(pid)) => format!("{cmd} (pid {pid})"),
            (None, Some(pid)) => format!("pid {pid}"),
            (Some(cmd), None) => cmd.clone(),
            (None, None) => "an unidentified process".to_string(),
        };
        match &self.path {
            Some(path) => format!("{who} holds {path}"),
            None => format!("{who} holds a package-manager lock"),
        }
    }
}

/// Lock inspection tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockProbe {
    /// `lslocks -o PID,COMMAND,PATH`
    Lslocks,
    /// `lsof -F` field output
    Lsof,
    /// `fuser -v`, confirms contention without naming the holder reliably
    Fuser,
}

impl LockProbe {
    fn invocation(self, paths: &[String]) -> Invocation {
        match self {
            LockProbe::Lslocks => Invocation::new(["lslocks", "-o", "PID,COMMAND,PATH"]),
            LockProbe::Lsof => Invocation::new(["lsof", "-FnPc"]).args(paths.iter().cloned()),
            LockProbe::Fuser => Invocation::new(["fuser", "-v"]).args(paths.iter().cloned()),
        }
    }

    fn parse(self, out: &str, paths: &[String]) -> Option<LockInfo> {
        let info = match self {
            LockProbe::Lslocks => parse_lslocks(out, paths),
            LockProbe::Lsof => parse_lsof(out, paths),
            LockProbe::Fuser => paths
                .iter()
                .any(|path| out.contains(path.as_str()))
                .then(|| LockInfo {
                    locked: true,
                    ..LockInfo::default()
                }),
        }?;
        Some(LockInfo {
            raw: out.to_string(),
            ..info
        })
    }
}

fn parse_lslocks(out: &str, paths: &[String]) -> Option<LockInfo> {
    out.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 || !paths.iter().any(|p| p == parts[2]) {
            return None;
        }
        let pid = parts[0].parse().ok()?;
        Some(LockInfo::held(pid, parts[1], parts[2]))
    })
}

fn parse_lsof(out: &str, paths: &[String]) -> Option<LockInfo> {
    let mut pid: Option<u32> = None;
    let mut cmd: Option<&str> = None;
    for field in out.lines() {
        if let Some(value) = field.strip_prefix('p') {
            pid = value.parse().ok();
        } else if let Some(value) = field.strip_prefix('c') {
            cmd = Some(value);
        } else if let Some(value) = field.strip_prefix('n') {
            if let Some(pid) = pid {
                if paths.iter().any(|p| p == value) {
                    return Some(LockInfo {
                        locked: true,
                        holder_pid: Some(pid),
                        holder_cmd: cmd.map(str::to_string),
                        path: Some(value.to_string()),
                        raw: String::new(),
                    });
                }
            }
        }
    }
    None
}

/// Source of lock snapshots
pub trait DetectLock {
    fn detect_lock(&self) -> LockInfo;
}

/// Detects lock holders by shelling out to the configured probes
pub struct LockDetector<'a> {
    runner: &'a dyn CommandRunner,
    paths: Vec<String>,
    probes: Vec<LockProbe>,
}

impl<'a> LockDetector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: Vec<String>, probes: Vec<LockProbe>) -> Self {
        Self {
            runner,
            paths,
            probes,
        }
    }

    pub fn from_settings(runner: &'a dyn CommandRunner, settings: &Settings) -> Self {
        Self::new(
            runner,
            settings.lock_paths.clone(),
            settings.lock_probes.clone(),
        )
    }
}

impl DetectLock for LockDetector<'_> {
    /// First successful, parseable hit across the probes wins
    fn detect_lock(&self) -> LockInfo {
        let mut last_raw = String::new();
        for probe in &self.probes {
            let Some(output) = capture(self.runner, &probe.invocation(&self.paths)) else {
                continue;
            };
            let raw = output.combined();
            if output.success() {
                if let Some(info) = probe.parse(&raw, &self.paths) {
                    debug!(?probe, holder = %info.describe(), "package-manager lock detected");
                    return info;
                }
            }
            last_raw = raw;
        }
        LockInfo::unlocked(last_raw)
    }
}

/// How an operation deals with a held lock before mutating packages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    /// Do not look at the lock at all
    Skip,
    /// Look once, fail if held
    Check,
    /// Poll until released or the timeout elapses
    Wait(Duration),
}

impl LockWait {
    /// Negative skips, zero checks once, positive waits that many seconds
    pub fn from_seconds(seconds: i64) -> Self {
        match u64::try_from(seconds) {
            Err(_) => LockWait::Skip,
            Ok(0) => LockWait::Check,
            Ok(secs) => LockWait::Wait(Duration::from_secs(secs)),
        }
    }
}

/// Wait until the lock clears or `timeout` elapses
///
/// `on_progress` fires only when the snapshot changes between polls. When
/// the deadline passes one final detection is returned as-is, so the caller
/// decides what a still-held lock means. A zero timeout performs exactly one
/// detection. A timeout too large to represent as a deadline polls until the
/// lock clears.
pub fn wait_for_lock(
    detector: &dyn DetectLock,
    timeout: Duration,
    tick: Duration,
    mut on_progress: Option<&mut dyn FnMut(&LockInfo)>,
) -> LockInfo {
    let deadline = Instant::now().checked_add(timeout);
    let mut last: Option<LockInfo> = None;

    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        let info = detector.detect_lock();
        if !info.locked {
            return info;
        }
        if last.as_ref() != Some(&info) {
            if let Some(callback) = on_progress.as_mut() {
                callback(&info);
            }
        }
        last = Some(info);
        let pause = deadline.map_or(tick, |deadline| {
            tick.min(deadline.saturating_duration_since(Instant::now()))
        });
        thread::sleep(pause);
    }

    detector.detect_lock()
}
