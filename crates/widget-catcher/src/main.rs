use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use widget_catcher::app::catch::CatchService;
use widget_catcher::app::expander::SelectionExpander;
use widget_catcher::app::feedback::TerminalFeedback;
use widget_catcher::app::messaging::{ExtensionInfo, PageAgent};
use widget_catcher::app::usage::UsageStore;
use widget_catcher::domain::document::{Document, TextSelection};
use widget_catcher::infra::clipboard::{Clipboard, ClipboardSink, MemoryClipboard};
use widget_catcher::infra::config::Config;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Copy the full bracket-balanced Flutter widget call around a selected name"
)]
struct Cli {
    /// Extra config file layered over user and workspace config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a selection in a source file and copy the widget call
    Catch(CatchArgs),
    /// Answer JSON-line CATCH requests on stdin against a source file
    Serve {
        #[arg(long)]
        file: PathBuf,
        /// Do not touch the system clipboard
        #[arg(long)]
        no_copy: bool,
    },
    /// Print the stored usage count
    Stats,
    /// Print name and version as JSON
    Info,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct CatchArgs {
    /// Source file to read
    #[arg(long)]
    file: PathBuf,
    /// Select this text in the file
    #[arg(long, conflicts_with = "at")]
    select: Option<String>,
    /// Which occurrence of --select to use, starting at 0
    #[arg(long, default_value_t = 0, requires = "select")]
    occurrence: usize,
    /// Select starting at this character offset
    #[arg(long)]
    at: Option<usize>,
    /// Number of characters to select with --at
    #[arg(long, default_value_t = 1, requires = "at")]
    len: usize,
    /// Do not touch the system clipboard
    #[arg(long)]
    no_copy: bool,
    /// Print the full catch report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    widget_catcher::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Catch(args) => {
            let config = Config::load_with_explicit(cli.config.as_deref())?;
            run_catch(&config, args)
        }
        Commands::Serve { file, no_copy } => {
            let config = Config::load_with_explicit(cli.config.as_deref())?;
            run_serve(&config, &file, no_copy)
        }
        Commands::Stats => {
            let config = Config::load_with_explicit(cli.config.as_deref())?;
            run_stats(&config)
        }
        Commands::Info => {
            println!("{}", serde_json::to_string(&ExtensionInfo::default())?);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_catch(config: &Config, args: CatchArgs) -> Result<()> {
    let mut document = load_document(&args.file)?;
    match (&args.select, args.at) {
        (Some(needle), _) => {
            document.select_text(needle, args.occurrence)?;
        }
        (None, Some(at)) => {
            document.select_range(at, at.saturating_add(args.len));
        }
        (None, None) => bail!("either --select or --at is required"),
    }
    let hint = document.selected_text();

    let report = if args.no_copy {
        let mut service = build_service(config, MemoryClipboard::new());
        service.catch(&mut document, Some(&hint))
    } else {
        let mut service = build_service(config, system_clipboard(config));
        service.catch(&mut document, Some(&hint))
    };

    let mut stdout = io::stdout().lock();
    if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if let Some(text) = &report.final_text {
        writeln!(stdout, "{text}")?;
    }

    if !report.success {
        bail!("nothing selected");
    }
    Ok(())
}

fn run_serve(config: &Config, file: &Path, no_copy: bool) -> Result<()> {
    let document = load_document(file)?;
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    if no_copy {
        let service = build_service(config, MemoryClipboard::new());
        PageAgent::new(document, service).serve(stdin, stdout)
    } else {
        let service = build_service(config, system_clipboard(config));
        PageAgent::new(document, service).serve(stdin, stdout)
    }
}

fn run_stats(config: &Config) -> Result<()> {
    let Some(path) = config.usage.resolved_path() else {
        bail!("no data directory available for usage stats");
    };
    let stats = UsageStore::new(path).load()?;
    println!("{}", stats.usage_count);
    Ok(())
}

fn load_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read source file: {}", path.display()))?;
    Ok(Document::new(text))
}

fn system_clipboard(config: &Config) -> Clipboard {
    Clipboard::new().with_fallback_commands(config.clipboard.fallback_commands())
}

fn build_service<C: ClipboardSink>(
    config: &Config,
    clipboard: C,
) -> CatchService<C, TerminalFeedback> {
    let feedback = TerminalFeedback::new(config.feedback.snackbar_duration());
    let service = CatchService::new(SelectionExpander::from_config(config), clipboard, feedback);
    match config.usage.resolved_path().filter(|_| config.usage.enabled()) {
        Some(path) => service.with_usage(UsageStore::new(path)),
        None => service,
    }
}
