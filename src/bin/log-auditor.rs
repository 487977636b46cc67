use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use merkle_log::auditor::{Auditor, LogClient};
use merkle_log::merkle::verify_inclusion;
use merkle_log::{Digest, TreeHead};

#[derive(Parser)]
#[command(name = "log-auditor")]
#[command(version, about = "Verify inclusion and consistency proofs from a Merkle event log server")]
struct Args {
    /// Base URL of the log server
    #[arg(short, long, default_value = "http://localhost:3000")]
    server: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current tree head
    Head,

    /// Append an event and print the new head
    Append {
        #[arg(short, long)]
        event: String,
    },

    /// Verify that an event sits at a given leaf index
    Inclusion {
        #[arg(short, long)]
        event: String,

        #[arg(short, long)]
        index: u64,

        /// Tree size to prove against (defaults to the current size)
        #[arg(long)]
        size: Option<u64>,

        /// Trusted root for that size (defaults to the root the server reports)
        #[arg(long, requires = "size")]
        root: Option<Digest>,
    },

    /// Verify that an event is present anywhere in the log
    Event {
        #[arg(short, long)]
        event: String,

        #[arg(long, requires = "root")]
        size: Option<u64>,

        #[arg(long, requires = "size")]
        root: Option<Digest>,
    },

    /// Verify the log grew consistently from a previously trusted head
    Consistency {
        #[arg(long)]
        old_size: u64,

        #[arg(long)]
        old_root: Digest,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.quiet {
        tracing::Level::ERROR
    } else if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let client = LogClient::new(args.server.clone());
    let verified = match run(&client, args.command, args.quiet).await {
        Ok(verified) => verified,
        Err(e) => {
            error!("Audit failed: {}", e);
            std::process::exit(2);
        }
    };

    if !verified {
        error!("Verification failed");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(client: &LogClient, command: Command, quiet: bool) -> Result<bool> {
    match command {
        Command::Head => {
            let head = client.head().await?;
            print_head(&head);
            Ok(true)
        }

        Command::Append { event } => {
            let head = client.append(&event).await?;
            print_head(&head);
            Ok(true)
        }

        Command::Inclusion {
            event,
            index,
            size,
            root,
        } => {
            let head = resolve_head(client, size, root).await?;
            info!("Verifying leaf {} against size {}", index, head.size);

            let proof = client.inclusion_proof(index, head.size).await?;
            if proof.tree_size != head.size {
                return Err(anyhow!(
                    "server returned a proof for size {}, expected {}",
                    proof.tree_size,
                    head.size
                ));
            }
            let verified = verify_inclusion(event.as_bytes(), index, &proof, &head.root_hash);
            if !quiet && verified {
                println!("✓ Event is leaf {} of the log at size {}", index, head.size);
            }
            Ok(verified)
        }

        Command::Event { event, size, root } => {
            let mut auditor = match (size, root) {
                (Some(size), Some(root_hash)) => Auditor::with_trusted_head(
                    client.clone(),
                    TreeHead { size, root_hash },
                ),
                _ => Auditor::new(client.clone()),
            };
            let verified = auditor.verify_event_existence(&event).await?;
            if !quiet && verified {
                println!("✓ Event is included in the log");
            }
            Ok(verified)
        }

        Command::Consistency { old_size, old_root } => {
            let trusted = TreeHead {
                size: old_size,
                root_hash: old_root,
            };
            let mut auditor = Auditor::with_trusted_head(client.clone(), trusted);
            let verified = auditor.verify_log_growth().await?;
            if !quiet && verified {
                if let Some(head) = auditor.trusted_head() {
                    println!(
                        "✓ Log grew consistently from {} to {} entries",
                        old_size, head.size
                    );
                    print_head(&head);
                }
            }
            Ok(verified)
        }
    }
}

/// Use the caller's trusted head if given, else ask the server.
///
/// A root is only accepted together with the size it commits to.
async fn resolve_head(
    client: &LogClient,
    size: Option<u64>,
    root: Option<Digest>,
) -> Result<TreeHead> {
    match (size, root) {
        (Some(size), Some(root_hash)) => Ok(TreeHead { size, root_hash }),
        (Some(size), None) => Ok(client.historical_root(size).await?),
        (None, Some(_)) => Err(anyhow!("--root needs the --size it was taken at")),
        (None, None) => Ok(client.head().await?),
    }
}

fn print_head(head: &TreeHead) {
    println!("size: {}", head.size);
    println!("root: {}", head.root_hash);
}
