//! passdeck - launcher front-end for the Proton Pass CLI
//!
//! Thin presentation glue over the core library: every subcommand maps
//! onto one `PassClient` operation and prints its typed result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use passdeck::client::PassClient;
use passdeck::config::Config;
use passdeck::model::GeneratePasswordOptions;
use passdeck::totp::{ItemKey, TotpCycle, TotpEvent};
use passdeck::PassCliError;

#[derive(Parser, Debug)]
#[command(name = "passdeck")]
#[command(author, version, about = "Browse and act on Proton Pass vaults", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a Proton Pass session is active
    Auth,

    /// List vaults
    Vaults,

    /// List items, optionally scoped to one vault
    Items {
        /// Vault share id to scope the listing to
        #[arg(long)]
        vault: Option<String>,
    },

    /// Show one item's full detail
    Show {
        share_id: String,
        item_id: String,
    },

    /// Fetch an item's TOTP code
    Totp {
        share_id: String,
        item_id: String,

        /// Keep refreshing at every 30-second window rollover
        #[arg(long)]
        watch: bool,
    },

    /// Generate a password
    Generate {
        /// random or passphrase (defaults to the configured type)
        #[arg(long)]
        kind: Option<String>,

        /// Length for random passwords
        #[arg(long)]
        length: Option<u32>,

        /// Include digits (random passwords)
        #[arg(long)]
        numbers: Option<bool>,

        /// Include uppercase letters (random passwords)
        #[arg(long)]
        uppercase: Option<bool>,

        /// Include symbols (random passwords)
        #[arg(long)]
        symbols: Option<bool>,

        /// Word count for passphrases
        #[arg(long)]
        words: Option<u32>,

        /// Word separator for passphrases
        #[arg(long)]
        separator: Option<String>,

        /// Capitalize passphrase words
        #[arg(long)]
        capitalize: Option<bool>,
    },

    /// Score a password's strength
    Score {
        password: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("passdeck={log_level}")));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = run(args).await {
        match e.downcast_ref::<PassCliError>() {
            Some(cli_error) => {
                eprintln!("error: {cli_error}");
                eprintln!("hint: {}", cli_error.remedy());
            }
            None => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_ref())?;
    let client = PassClient::open(config);

    match args.command {
        Command::Auth => {
            if client.check_authenticated().await? {
                println!("signed in");
            } else {
                println!("not signed in");
                println!("hint: run `pass-cli auth login` in a terminal");
            }
        }

        Command::Vaults => {
            let vaults = match client.list_vaults().await {
                Ok(vaults) => vaults,
                Err(e) => match client.cached_vaults() {
                    // Keep showing last-known data; only surface the
                    // error when there is nothing to show.
                    Some(cached) => {
                        eprintln!("warning: refresh failed ({e}), showing cached data");
                        cached
                    }
                    None => return Err(e.into()),
                },
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&vaults)?);
            } else {
                for vault in &vaults {
                    println!(
                        "{:<36} {:<24} {:>5} items  {:?}",
                        vault.share_id, vault.name, vault.item_count, vault.role
                    );
                }
            }
        }

        Command::Items { vault } => {
            let fresh = client.list_items(vault.as_deref()).await;
            let items = match fresh {
                Ok(items) => items,
                Err(e) => match (vault.is_none(), client.cached_items()) {
                    (true, Some(cached)) => {
                        eprintln!("warning: refresh failed ({e}), showing cached data");
                        cached
                    }
                    _ => return Err(e.into()),
                },
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    let totp = if item.has_totp { " [totp]" } else { "" };
                    println!(
                        "{:<24} {:<12} {:<20}{totp}",
                        item.title,
                        format!("{:?}", item.kind).to_lowercase(),
                        item.vault_name
                    );
                }
            }
        }

        Command::Show { share_id, item_id } => {
            let detail = client.get_item_detail(&share_id, &item_id).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!("title: {}", detail.item.title);
                println!("vault: {}", detail.item.vault_name);
                if let Some(username) = &detail.item.username {
                    println!("username: {username}");
                }
                if let Some(password) = &detail.password {
                    println!("password: {password}");
                }
                if let Some(urls) = &detail.urls {
                    for url in urls {
                        println!("url: {url}");
                    }
                }
                if let Some(note) = &detail.note {
                    println!("note: {note}");
                }
                if let Some(fields) = &detail.custom_fields {
                    for field in fields {
                        println!("{}: {}", field.name, field.value);
                    }
                }
            }
        }

        Command::Totp {
            share_id,
            item_id,
            watch,
        } => {
            let code = client.get_totp_code(&share_id, &item_id).await?;
            println!("{code}");

            if watch {
                let client = Arc::new(client);
                let tracked = Arc::new(RwLock::new(vec![ItemKey {
                    share_id,
                    item_id,
                }]));
                let (tx, mut rx) = mpsc::unbounded_channel();
                let cycle = TotpCycle::spawn(client, tracked, tx);

                loop {
                    tokio::select! {
                        event = rx.recv() => match event {
                            Some(TotpEvent::Code { code, .. }) => println!("{code}"),
                            Some(TotpEvent::Tick { .. }) => {}
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                cycle.cancel();
            }
        }

        Command::Generate {
            kind,
            length,
            numbers,
            uppercase,
            symbols,
            words,
            separator,
            capitalize,
        } => {
            let options = match kind.as_deref() {
                Some("passphrase") => Some(GeneratePasswordOptions::Passphrase {
                    words,
                    separator,
                    capitalize,
                }),
                Some("random") => Some(GeneratePasswordOptions::Random {
                    length,
                    numbers,
                    uppercase,
                    symbols,
                }),
                Some(other) => anyhow::bail!("unknown password type: {other}"),
                None => None,
            };
            let password = client.generate_password(options).await?;
            println!("{password}");
        }

        Command::Score { password } => {
            let score = client.score_password(&password).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&score)?);
            } else {
                println!("{} ({})", score.password_score, score.numeric_score);
                if let Some(penalties) = &score.penalties {
                    for penalty in penalties {
                        println!("- {penalty}");
                    }
                }
            }
        }
    }

    Ok(())
}
