use std::sync::Arc;

use chatlink::config::Config;
use chatlink::directory::UserDirectory;
use chatlink::error::{ClientError, Result};
use chatlink::loopback::LoopbackTransport;
use chatlink::{Client, IncomingMessage};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("chatlink=info"))
        .init();
    info!("Starting chatlink loopback client");

    match run().await {
        Ok(()) => {
            info!("Client shut down successfully");
            Ok(())
        }
        Err(e) => {
            error!("Client encountered an error: {}", e);
            eprintln!("{}", e.user_message());
            Err(e)
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let directory = UserDirectory::load(&config.directory_path)?;
    let client = Arc::new(Client::new(LoopbackTransport::new(
        directory,
        config.poll_interval,
    )));

    client.start_listen(print_message)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Reached end of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = client.send(&line, &config.destination) {
                    if e.is_usage_error() {
                        return Err(e);
                    }
                    warn!("Failed to send message: {}", e);
                    eprintln!("{}", e.user_message());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, shutting down...");
                break;
            }
        }
    }

    let listener = Arc::clone(&client);
    tokio::task::spawn_blocking(move || listener.stop_listen())
        .await
        .map_err(|_| ClientError::ListenerPanicked)?
        .or_else(|e| match e {
            // The session may have ended on its own while we were reading input.
            ClientError::NotListening => Ok(()),
            e => Err(e),
        })
}

fn print_message(message: &IncomingMessage) {
    println!(
        "[{}] {} {}: {}",
        message.received_at.format("%H:%M:%S"),
        message.thread_type,
        message.thread_id,
        message.text
    );
    for mention in &message.mentions {
        let name: String = message
            .text
            .chars()
            .skip(mention.offset)
            .take(mention.length)
            .collect();
        println!("    {} -> {}", name, mention.recipient_id);
    }
}
