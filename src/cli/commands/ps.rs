//! Ps command - list processes by command pattern or owner

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use orasible::oracle::{find_processes, ProcessFilter};

/// Arguments for the ps command
#[derive(Parser, Debug, Clone)]
#[command(group(clap::ArgGroup::new("filter").required(true).args(["pattern", "user"])))]
pub struct PsArgs {
    /// Match against the full command line
    #[arg(long)]
    pub pattern: Option<String>,

    /// Match processes owned by this user
    #[arg(long)]
    pub user: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl PsArgs {
    /// Execute the ps command
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let filter = ProcessFilter::from_options(self.pattern.clone(), self.user.clone())?;
        let processes = find_processes(ctx.runner.as_ref(), &filter)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&processes)?);
        } else {
            for process in &processes {
                println!("{:>7} {:<12} {}", process.pid, process.user, process.command);
            }
        }
        Ok(0)
    }
}
