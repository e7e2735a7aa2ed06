mod cli;
mod clipboard;
mod clock;
mod code;
mod config;
mod display;
mod history;
mod journal;
mod manager;
mod prompt;
mod store;
mod ticker;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "vcode",
    about = "Short-lived verification codes with a live countdown"
)]
pub struct Args {
    #[arg(long, env = "VCODE_CONFIG", help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "VCODE_HISTORY_DIR", help = "Directory holding the code history")]
    pub history_dir: Option<PathBuf>,

    #[arg(long, help = "Keep history in memory only for this session")]
    pub no_persist: bool,

    #[arg(long, help = "Diagnostic journal path (JSONL)")]
    pub journal: Option<PathBuf>,

    #[arg(long, help = "Generate a single code and exit")]
    pub once: bool,

    #[arg(long, requires = "once", help = "Copy the generated code (with --once)")]
    pub copy: bool,

    #[arg(long, help = "Print the stored history and exit")]
    pub list_history: bool,

    #[arg(long, help = "Clear the stored history and exit")]
    pub clear_history: bool,

    #[arg(long, help = "Answer yes to confirmation prompts")]
    pub yes: bool,

    #[arg(long, help = "Disable colors and terminal title updates")]
    pub no_color: bool,

    #[arg(long, help = "Debug output (print effective settings)")]
    pub debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // An explicit config file must load; the layered lookup falls back to defaults
    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config, using defaults: {}", e);
            config::Config::default()
        })
    };

    if let Some(dir) = &args.history_dir {
        cfg.history.dir = Some(dir.clone());
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} errors)",
            errors.len()
        ));
    }

    let data_dir = cfg.history.dir.clone().or_else(store::JsonFileStore::default_dir);

    let history_store: Box<dyn store::HistoryStore> = match (&data_dir, args.no_persist) {
        (Some(dir), false) => Box::new(store::JsonFileStore::new(
            dir,
            &cfg.history.key,
            cfg.history.limit,
        )),
        (None, false) => {
            eprintln!("Warning: no data directory found, history will not be saved");
            Box::new(store::MemoryStore::new(cfg.history.limit))
        }
        (_, true) => Box::new(store::MemoryStore::new(cfg.history.limit)),
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let journal_path = args.journal.clone().or_else(|| {
        if args.no_persist {
            None
        } else {
            data_dir.as_ref().map(|d| d.join("journal.jsonl"))
        }
    });
    let journal = match &journal_path {
        Some(path) => match journal::Journal::open(path, &session_id) {
            Ok(j) => Some(j),
            Err(e) => {
                eprintln!("Warning: failed to open journal {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let clipboard_timeout = Duration::from_millis(cfg.clipboard.timeout_ms);
    let clipboard = match &cfg.clipboard.command {
        Some(command) => {
            clipboard::CommandClipboard::from_command_line(command, clipboard_timeout)?
        }
        None => clipboard::CommandClipboard::detect(clipboard_timeout),
    };

    if args.debug {
        eprintln!("[DEBUG] Session: {}", session_id);
        eprintln!("[DEBUG] History dir: {:?}", data_dir);
        eprintln!(
            "[DEBUG] History: key={} limit={} persist={}",
            cfg.history.key, cfg.history.limit, !args.no_persist
        );
        eprintln!("[DEBUG] Journal: {:?}", journal_path);
        eprintln!(
            "[DEBUG] Validity: {}m (urgent below {}m)",
            cfg.code.validity_minutes, cfg.code.urgent_minutes
        );
        eprintln!("[DEBUG] Clipboard: {}", clipboard.describe());
    }

    let color = cfg.ui.color && !args.no_color && std::io::stdout().is_terminal();

    let (tx, rx) = mpsc::channel();
    let countdown = ticker::IntervalTicker::new(ticker::TICK_INTERVAL, tx.clone(), || {
        cli::Msg::Tick
    });

    let manager = manager::CodeManager::new(
        manager::Settings::from_config(&cfg),
        manager::Collaborators {
            store: history_store,
            symbols: Box::new(code::RandomSymbols::new()),
            clock: Box::new(clock::SystemClock),
            display: Box::new(display::TerminalDisplay::new(color)),
            ticker: Box::new(countdown),
            confirm: Box::new(prompt::StdinConfirm::new(args.yes)),
            journal,
        },
    );

    let mut ctx = cli::Context {
        manager,
        clipboard: Arc::new(clipboard),
        tx,
        rx,
        startup_delay: Duration::from_millis(cfg.ui.startup_delay_ms),
    };

    if args.list_history {
        ctx.manager.show_history();
        ctx.manager.show_stats();
        return Ok(());
    }

    if args.clear_history {
        ctx.manager.clear_history();
        return Ok(());
    }

    if args.once {
        return cli::run_once(&mut ctx, args.copy);
    }

    cli::run_repl(ctx)
}
