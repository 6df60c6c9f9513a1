//! bramble command-line front end.
//!
//! The file subcommands run the editor layers headless and print what they
//! compute. `vm-agent` is the process the IDE launches as its execution VM;
//! it speaks the frame protocol on stdin/stdout, so logs go to stderr.

use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bramble_debugger::{ScratchHost, serve};
use bramble_editor::{BrambleConfig, EditorSession};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

mod cli;
mod report;

use cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
	let args = Cli::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(args.log_level())
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let config = match &args.config {
		Some(path) => BrambleConfig::load(path)?,
		None => BrambleConfig::default(),
	};

	let stdout = std::io::stdout();
	let mut out = stdout.lock();
	match args.command {
		Command::Parse { file } => report::write_tree(&open(&file, &config)?, &mut out)?,
		Command::Scopes { file, strength } => {
			let mut config = config;
			if let Some(strength) = strength {
				config.scope.strength = strength;
			}
			report::write_scopes(&mut open(&file, &config)?, &mut out)?;
		}
		Command::Highlight { file } => report::write_highlight(&mut open(&file, &config)?, &mut out)?,
		Command::VmAgent => {
			drop(out);
			return run_agent().await;
		}
	}
	out.flush()?;
	Ok(())
}

fn open(path: &Path, config: &BrambleConfig) -> Result<EditorSession, Box<dyn Error>> {
	let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
	let mut session = EditorSession::open(&text, config);
	session.settle();
	info!(path = %path.display(), lines = session.document().line_count(), "cli.parsed");
	Ok(session)
}

async fn run_agent() -> Result<(), Box<dyn Error>> {
	let (events_tx, events_rx) = mpsc::unbounded_channel();
	let host = Arc::new(ScratchHost::new().with_output(events_tx));
	info!("vm_agent.started");
	serve(host, tokio::io::stdin(), tokio::io::stdout(), events_rx).await?;
	info!("vm_agent.stopped");
	Ok(())
}
