use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cairn", about = "Content-addressed block store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output encoding for item results.
    #[arg(long, global = true, default_value = "text")]
    pub enc: Encoding,

    /// Repo directory. Falls back to $CAIRN_PATH, then `.cairn`.
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Encoding {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Work with raw blocks
    Block(BlockArgs),
    /// Print the concatenated contents of one or more paths
    Cat(CatArgs),
    /// Protect blocks from removal
    Pin(PinArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    pub action: BlockAction,
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// Print a block's identifier and size
    Stat { key: Option<String> },
    /// Write a block's raw bytes to stdout
    Get { key: Option<String> },
    /// Store data as a block and print its identifier
    Put(PutArgs),
    /// Remove blocks
    Rm(RmArgs),
}

#[derive(Args)]
pub struct PutArgs {
    /// File holding the block data; stdin when absent or `-`.
    pub data: Option<PathBuf>,
    /// v0, raw, cbor or protobuf [default: v0]
    #[arg(short, long)]
    pub format: Option<String>,
    /// Hash function name [default: sha2-256]
    #[arg(long)]
    pub mhtype: Option<String>,
    /// Digest length in bytes; -1 for the natural length
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub mhlen: i32,
}

#[derive(Args)]
pub struct RmArgs {
    /// Identifiers to remove; read from stdin when none are given.
    pub hashes: Vec<String>,
    /// Ignore pinned and missing blocks
    #[arg(short, long)]
    pub force: bool,
    /// Print nothing for removed blocks
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct CatArgs {
    pub paths: Vec<String>,
}

#[derive(Args)]
pub struct PinArgs {
    #[command(subcommand)]
    pub action: PinAction,
}

#[derive(Subcommand)]
pub enum PinAction {
    Add { keys: Vec<String> },
    Rm { keys: Vec<String> },
    Ls,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the repo config.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_stat() {
        let cli = Cli::try_parse_from(["cairn", "block", "stat", "QmKey"]).unwrap();
        let Command::Block(args) = cli.command else { panic!("wrong command") };
        assert!(matches!(args.action, BlockAction::Stat { key: Some(k) } if k == "QmKey"));
    }

    #[test]
    fn parse_block_get_without_key() {
        let cli = Cli::try_parse_from(["cairn", "block", "get"]).unwrap();
        let Command::Block(args) = cli.command else { panic!("wrong command") };
        assert!(matches!(args.action, BlockAction::Get { key: None }));
    }

    #[test]
    fn parse_put_defaults() {
        let cli = Cli::try_parse_from(["cairn", "block", "put"]).unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Put(args) }) = cli.command else {
            panic!("wrong command")
        };
        assert!(args.data.is_none());
        assert!(args.format.is_none());
        assert!(args.mhtype.is_none());
        assert_eq!(args.mhlen, -1);
    }

    #[test]
    fn parse_put_options() {
        let cli = Cli::try_parse_from([
            "cairn", "block", "put", "-f", "raw", "--mhtype", "sha2-512", "--mhlen", "20", "data.bin",
        ])
        .unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Put(args) }) = cli.command else {
            panic!("wrong command")
        };
        assert_eq!(args.format.as_deref(), Some("raw"));
        assert_eq!(args.mhtype.as_deref(), Some("sha2-512"));
        assert_eq!(args.mhlen, 20);
        assert_eq!(args.data, Some(PathBuf::from("data.bin")));
    }

    #[test]
    fn parse_put_negative_mhlen() {
        let cli = Cli::try_parse_from(["cairn", "block", "put", "--mhlen=-1"]).unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Put(args) }) = cli.command else {
            panic!("wrong command")
        };
        assert_eq!(args.mhlen, -1);
    }

    #[test]
    fn parse_rm_flags() {
        let cli = Cli::try_parse_from(["cairn", "block", "rm", "-f", "-q", "a", "b"]).unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Rm(args) }) = cli.command else {
            panic!("wrong command")
        };
        assert!(args.force);
        assert!(args.quiet);
        assert_eq!(args.hashes, vec!["a", "b"]);
    }

    #[test]
    fn parse_rm_long_flags() {
        let cli = Cli::try_parse_from(["cairn", "block", "rm", "--force", "--quiet", "a"]).unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Rm(args) }) = cli.command else {
            panic!("wrong command")
        };
        assert!(args.force && args.quiet);
    }

    #[test]
    fn parse_cat_paths() {
        let cli = Cli::try_parse_from(["cairn", "cat", "/ipfs/a", "b"]).unwrap();
        let Command::Cat(args) = cli.command else { panic!("wrong command") };
        assert_eq!(args.paths, vec!["/ipfs/a", "b"]);
    }

    #[test]
    fn parse_pin() {
        let cli = Cli::try_parse_from(["cairn", "pin", "add", "a", "b"]).unwrap();
        let Command::Pin(args) = cli.command else { panic!("wrong command") };
        assert!(matches!(args.action, PinAction::Add { keys } if keys.len() == 2));

        let cli = Cli::try_parse_from(["cairn", "pin", "ls"]).unwrap();
        let Command::Pin(args) = cli.command else { panic!("wrong command") };
        assert!(matches!(args.action, PinAction::Ls));
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["cairn", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        let Command::Serve(args) = cli.command else { panic!("wrong command") };
        assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "cairn", "block", "stat", "k", "--enc", "json", "--repo", "/tmp/r", "-v",
        ])
        .unwrap();
        assert_eq!(cli.enc, Encoding::Json);
        assert_eq!(cli.repo, Some(PathBuf::from("/tmp/r")));
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_unknown_encoding() {
        assert!(Cli::try_parse_from(["cairn", "--enc", "xml", "pin", "ls"]).is_err());
    }
}
