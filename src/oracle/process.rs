//! Process listing
//!
//! A poor man's psutil: `pgrep` picks the process ids, `ps` reports
//! `pid, user, command` for them. The Oracle modules use this only to
//! confirm an instance's PMON background process is up before querying.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, RunOptions};

/// Process name prefix of the PMON background process
pub const DEFAULT_PMON_PREFIX: &str = "ora_pmon_";

/// Which processes to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessFilter {
    /// Full command line matches the pattern (`pgrep -f`)
    Pattern(String),
    /// Processes owned by the user (`pgrep -u`)
    User(String),
}

impl ProcessFilter {
    /// Build a filter from optional arguments; exactly one must be set.
    pub fn from_options(pattern: Option<String>, user: Option<String>) -> Result<Self> {
        match (pattern, user) {
            (Some(pattern), None) => Ok(ProcessFilter::Pattern(pattern)),
            (None, Some(user)) => Ok(ProcessFilter::User(user)),
            (None, None) => Err(Error::InvalidArgument(
                "one of pattern or user is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::InvalidArgument(
                "pattern and user are mutually exclusive".to_string(),
            )),
        }
    }

    fn pgrep_argv(&self) -> Vec<String> {
        let (flag, value) = match self {
            ProcessFilter::Pattern(pattern) => ("-f", pattern),
            ProcessFilter::User(user) => ("-u", user),
        };
        vec![
            "pgrep".to_string(),
            "-d,".to_string(),
            flag.to_string(),
            value.clone(),
        ]
    }
}

/// One line of process listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub user: String,
    pub command: String,
}

/// Parse `ps h -o %p, -o %u, -o cmd` output.
pub fn parse_ps(output: &str) -> Vec<ProcessInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(3, ',').map(str::trim);
            let pid = parts.next()?.parse().ok()?;
            let user = parts.next()?.to_string();
            let command = parts.next()?.to_string();
            Some(ProcessInfo { pid, user, command })
        })
        .collect()
}

/// List processes matching `filter`.
pub fn find_processes(runner: &dyn CommandRunner, filter: &ProcessFilter) -> Result<Vec<ProcessInfo>> {
    let pgrep = filter.pgrep_argv();
    let found = runner.run(&pgrep, &RunOptions::new())?;

    // pgrep exits 1 when nothing matched
    if found.exit_code == 1 {
        debug!(filter = ?filter, "No matching processes");
        return Ok(Vec::new());
    }
    if !found.success {
        return Err(Error::CommandFailed {
            command: shell_words::join(&pgrep),
            exit_code: found.exit_code,
            stderr: found.stderr,
        });
    }

    let pids = found.stdout.trim();
    if pids.is_empty() {
        return Ok(Vec::new());
    }

    let ps = vec![
        "ps".to_string(),
        "h".to_string(),
        "-o".to_string(),
        "%p,".to_string(),
        "-o".to_string(),
        "%u,".to_string(),
        "-o".to_string(),
        "cmd".to_string(),
        "-p".to_string(),
        pids.to_string(),
    ];
    let listed = runner.run(&ps, &RunOptions::new())?;

    // The processes may have exited between pgrep and ps
    if listed.exit_code == 1 && listed.stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !listed.success {
        return Err(Error::CommandFailed {
            command: shell_words::join(&ps),
            exit_code: listed.exit_code,
            stderr: listed.stderr,
        });
    }

    Ok(parse_ps(&listed.stdout))
}

/// Name of the PMON process for `sid`.
pub fn pmon_name(prefix: &str, sid: &str) -> String {
    format!("{}{}", prefix, sid)
}

/// Whether the PMON process for `sid` is running.
///
/// Returns the processes seen so callers can report them on failure.
pub fn pmon_running(
    runner: &dyn CommandRunner,
    sid: &str,
    prefix: &str,
) -> Result<(bool, Vec<ProcessInfo>)> {
    let processes = find_processes(runner, &ProcessFilter::Pattern(prefix.to_string()))?;
    let expected = pmon_name(prefix, sid);
    let running = processes.iter().any(|p| p.command == expected);
    debug!(sid = %sid, running, "Checked PMON process");
    Ok((running, processes))
}
