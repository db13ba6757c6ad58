mod gateway;

use clap::{Parser, Subcommand};
use otvet_channels::telegram::TelegramChannel;
use otvet_core::{config, knowledge};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "otvet", version, about = "Keyword autoresponder bot for Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check token and knowledge file health.
    Status,
    /// Resolve a message against the knowledge file and print the reply.
    Ask {
        /// The message to match.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            if cfg.telegram.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram bot_token is empty. \
                     Set it in config.toml or the TELEGRAM_BOT_TOKEN env var."
                );
            }

            let mut channels: HashMap<String, Arc<dyn otvet_core::traits::Channel>> =
                HashMap::new();
            let channel = TelegramChannel::new(cfg.telegram.clone());
            channels.insert("telegram".to_string(), Arc::new(channel));

            let gw = Arc::new(gateway::Gateway::new(
                channels,
                PathBuf::from(&cfg.knowledge.path),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("otvet status\n");
            println!("Config: {}", cli.config);

            if cfg.telegram.bot_token.is_empty() {
                println!("  telegram: missing bot_token");
            } else {
                let channel = TelegramChannel::new(cfg.telegram.clone());
                match channel.check_token().await {
                    Ok(name) => println!("  telegram: token ok ({name})"),
                    Err(e) => println!("  telegram: {e}"),
                }
            }

            let qa_path = PathBuf::from(&cfg.knowledge.path);
            let records = knowledge::load(&qa_path);
            println!(
                "  knowledge: {} records ({})",
                records.len(),
                qa_path.display()
            );
            for record in &records {
                if record.kind == knowledge::AnswerKind::Photo
                    && !PathBuf::from(&record.answer).exists()
                {
                    println!("    warning: photo file missing: {}", record.answer);
                }
            }
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: otvet ask <message>");
            }

            let text = message.join(" ");
            let cfg = config::load(&cli.config)?;
            let records = knowledge::load(&PathBuf::from(&cfg.knowledge.path));

            match knowledge::resolve(&text, &records) {
                Some(knowledge::Reply::Text(answer)) => println!("{answer}"),
                Some(knowledge::Reply::Photo { path, caption }) => {
                    if caption.is_empty() {
                        println!("[photo] {}", path.display());
                    } else {
                        println!("[photo] {} ({caption})", path.display());
                    }
                }
                None => println!("no match"),
            }
        }
    }

    Ok(())
}
