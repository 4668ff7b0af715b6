// SPDX-License-Identifier: MIT

//! A thin client binary over `stampede-wire` (§1: "the CLI that invokes a
//! client" is out of scope beyond this wrapper).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use stampede_core::Key;

#[derive(Parser)]
#[command(name = "stampede")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a key and block for the reply.
    Request {
        /// The daemon's path prefix.
        path: PathBuf,
        /// The request key.
        key: String,
    },
    /// Send a key without waiting for a reply.
    Notify {
        path: PathBuf,
        key: String,
    },
    /// Reuse a live daemon, or spawn one and then send the request.
    RequestAndSpawn {
        path: PathBuf,
        key: String,
        /// The daemon binary to spawn if none is running.
        #[arg(long)]
        cmd: PathBuf,
        /// Extra arguments passed to the spawned daemon.
        #[arg(long = "arg")]
        cmd_args: Vec<String>,
        /// Socket poll timeout in milliseconds. Defaults to
        /// `STAMPEDE_IPC_TIMEOUT_MS`, or 1000ms if that's unset too.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Request { path, key } => {
            let key = Key::new(key.into_bytes())?;
            let reply = stampede_wire::request(&path, &key)?;
            println!("{}", serde_json::to_string(&reply)?);
        }
        Command::Notify { path, key } => {
            let key = Key::new(key.into_bytes())?;
            stampede_wire::request_detached(&path, &key)?;
        }
        Command::RequestAndSpawn { path, key, cmd, cmd_args, timeout_ms } => {
            let key = Key::new(key.into_bytes())?;
            let args: Vec<&str> = cmd_args.iter().map(String::as_str).collect();
            let timeout = timeout_ms.map(Duration::from_millis).unwrap_or_else(stampede_daemon::ipc_timeout);
            let reply = stampede_wire::request_and_spawn(&cmd, &args, &path, &key, Some(timeout))?;
            println!("{}", serde_json::to_string(&reply)?);
        }
    }

    Ok(())
}
