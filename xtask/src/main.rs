use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the widget-catcher test suite with cargo nextest
    Test {
        #[arg(long)]
        profile: Option<String>,
        /// Only run tests whose name matches
        filter: Option<String>,
    },
    /// Format check, clippy, then the full test suite
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Test { profile, filter } => run_nextest(profile, filter)?,
        Commands::Ci => {
            run_cargo(&["fmt", "--all", "--check"])?;
            run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            run_nextest(None, None)?;
        }
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, filter: Option<String>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["nextest", "run", "-p", "widget-catcher"]);
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if let Some(filter) = filter {
        cmd.arg(filter);
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
