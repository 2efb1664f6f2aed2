use std::env;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use tracing::info;

use relay_core::state::PanelState;

mod config;
mod logging;
mod replay;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("relay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "replay" => {
            let opts = parse_session_args(args.collect::<Vec<_>>())?;
            let state = prepare(&opts)?;
            replay::run_replay(&opts.inbox, state, opts.auto_approve)
        }
        "watch" => {
            let opts = parse_session_args(args.collect::<Vec<_>>())?;
            let state = prepare(&opts)?;
            let outbox = opts
                .outbox
                .clone()
                .unwrap_or_else(|| default_outbox_path(&opts.inbox));
            ui::run(state, &opts.inbox, &outbox)
        }
        _ => {
            print_help();
            bail!("unknown command: {command}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionArgs {
    inbox: PathBuf,
    config: Option<PathBuf>,
    outbox: Option<PathBuf>,
    auto_approve: bool,
}

fn parse_session_args(args: Vec<String>) -> anyhow::Result<SessionArgs> {
    let mut inbox = None;
    let mut config = None;
    let mut outbox = None;
    let mut auto_approve = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--config requires a path");
                };
                config = Some(PathBuf::from(value));
                i += 2;
            }
            "--outbox" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--outbox requires a path");
                };
                outbox = Some(PathBuf::from(value));
                i += 2;
            }
            "--auto-approve" => {
                auto_approve = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                bail!("unsupported argument: {other}");
            }
            other => {
                if inbox.is_some() {
                    bail!("unexpected extra argument: {other}");
                }
                inbox = Some(PathBuf::from(other));
                i += 1;
            }
        }
    }
    let Some(inbox) = inbox else {
        bail!("an inbox file is required");
    };
    Ok(SessionArgs {
        inbox,
        config,
        outbox,
        auto_approve,
    })
}

fn prepare(opts: &SessionArgs) -> anyhow::Result<PanelState> {
    let config = config::load_config(opts.config.as_deref())?;
    let default_log = config::default_log_path();
    logging::init_tracing(&config.logs, default_log.as_deref());
    info!(inbox = %opts.inbox.display(), "relay starting");
    Ok(PanelState::from_config(&config))
}

/// `session.jsonl` pairs with `session.out.jsonl` in the same directory.
fn default_outbox_path(inbox: &Path) -> PathBuf {
    let stem = inbox
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("relay");
    inbox.with_file_name(format!("{stem}.out.jsonl"))
}

fn print_help() {
    println!("relay - approval-gated companion panel for a coding agent");
    println!();
    println!("usage:");
    println!("  relay watch <inbox.jsonl> [--outbox PATH] [--config PATH]");
    println!("  relay replay <inbox.jsonl> [--auto-approve] [--config PATH]");
    println!("  relay --version");
    println!();
    println!("watch   follow the agent's inbox live and write decisions to the outbox");
    println!("replay  feed a recorded inbox through the panel and print the result");
}
