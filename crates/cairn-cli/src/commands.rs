use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cairn_core::{
    CancellationToken, Command as NodeCommand, CoreError, Node, OutputMode, PutOptions,
    RemoveOptions, Transform,
};
use cairn_server::{CairnServer, ServerConfig};
use cairn_stream::ResponseKind;
use cairn_types::parse_cid;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;
use crate::config::{resolve_repo, RepoConfig, REPO_ENV};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let repo = resolve_repo(cli.repo, env::var_os(REPO_ENV));
    let config = RepoConfig::load(&repo)?;
    let node = Node::open(&repo, config.node)
        .with_context(|| format!("opening repo {}", repo.display()))?;
    debug!(repo = %repo.display(), "repo ready");
    match cli.command {
        Command::Block(args) => {
            let cmd = block_command(args.action)?;
            run_node_command(&node, cmd, cli.enc).await
        }
        Command::Cat(args) => {
            let paths = args_or_stdin(args.paths)?;
            run_node_command(&node, NodeCommand::Cat { paths }, cli.enc).await
        }
        Command::Pin(args) => cmd_pin(&node, args.action),
        Command::Serve(args) => cmd_serve(node, config.server, args.bind).await,
    }
}

fn block_command(action: BlockAction) -> anyhow::Result<NodeCommand> {
    let cmd = match action {
        BlockAction::Stat { key } => NodeCommand::Stat {
            key: key_or_stdin(key)?,
        },
        BlockAction::Get { key } => NodeCommand::Get {
            key: key_or_stdin(key)?,
        },
        BlockAction::Put(args) => NodeCommand::Put {
            data: read_data(args.data.as_deref())?,
            options: PutOptions {
                format: args.format,
                mhtype: args.mhtype,
                mhlen: args.mhlen,
            },
        },
        BlockAction::Rm(args) => NodeCommand::Rm {
            keys: args_or_stdin(args.hashes)?,
            options: RemoveOptions {
                force: args.force,
                quiet: args.quiet,
            },
        },
    };
    Ok(cmd)
}

/// Run a node command with stdout as the output and stderr for diagnostics.
/// Ctrl-C cancels the producer.
async fn run_node_command(node: &Node, cmd: NodeCommand, enc: Encoding) -> anyhow::Result<()> {
    let mode = output_mode(enc, cmd.kind(), io::stderr().is_terminal());
    let transform = Transform::select(mode, cmd.kind());
    debug!(command = cmd.name(), ?mode, ?transform, "running");

    let cancel = cancel_on_interrupt();
    let mut stdout = io::stdout();
    let result = cmd
        .run(node, transform, &mut stdout, Box::new(io::stderr()), cancel)
        .await;
    stdout.flush()?;
    result?;
    Ok(())
}

/// A token cancelled by Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupted");
            interrupt.cancel();
        }
    });
    cancel
}

fn output_mode(enc: Encoding, kind: ResponseKind, interactive: bool) -> OutputMode {
    match (enc, kind) {
        (Encoding::Json, ResponseKind::Items) => OutputMode::Json,
        (_, ResponseKind::Payload) if interactive => OutputMode::Interactive,
        (_, ResponseKind::Payload) => OutputMode::Binary,
        (Encoding::Text, ResponseKind::Items) => OutputMode::Text,
    }
}

fn read_data(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data).context("reading stdin")?;
            Ok(data)
        }
    }
}

/// Arguments from the command line, or whitespace-separated from stdin when
/// none were given and stdin is not a terminal.
fn args_or_stdin(args: Vec<String>) -> anyhow::Result<Vec<String>> {
    let stdin = io::stdin();
    if !args.is_empty() || stdin.is_terminal() {
        return Ok(args);
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text).context("reading stdin")?;
    Ok(split_args(&text))
}

fn key_or_stdin(key: Option<String>) -> anyhow::Result<String> {
    let keys = args_or_stdin(key.into_iter().collect())?;
    keys.into_iter()
        .next()
        .ok_or_else(|| CoreError::InvalidRequest("argument \"key\" is required".into()).into())
}

fn split_args(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn cmd_pin(node: &Node, action: PinAction) -> anyhow::Result<()> {
    let pins = node.pins();
    match action {
        PinAction::Add { keys } => {
            for key in args_or_stdin(keys)? {
                let cid = parse_cid(&key)?;
                if !node.access().has(&cid)? {
                    anyhow::bail!("cannot pin {cid}: block not found");
                }
                pins.pin(cid)?;
                println!("{} {}", "pinned".green(), cid);
            }
        }
        PinAction::Rm { keys } => {
            for key in args_or_stdin(keys)? {
                let cid = parse_cid(&key)?;
                if pins.unpin(&cid)? {
                    println!("{} {}", "unpinned".green(), cid);
                } else {
                    println!("{} {} was not pinned", "skipped".yellow(), cid);
                }
            }
        }
        PinAction::Ls => {
            for cid in pins.list() {
                println!("{cid}");
            }
        }
    }
    Ok(())
}

async fn cmd_serve(
    node: Node,
    mut config: ServerConfig,
    bind: Option<SocketAddr>,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    eprintln!(
        "{} serving {} on {}",
        "cairn".bold(),
        node.repo().map(|p| p.display().to_string()).unwrap_or_default(),
        config.bind_addr.to_string().cyan()
    );
    CairnServer::new(config, Arc::new(node))
        .serve_until(cancel_on_interrupt())
        .await?;
    Ok(())
}
