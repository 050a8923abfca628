// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `frontdesk console`: talk to the receptionist from a terminal
//!
//! Serves the help desk API in-process and runs one conversation on stdin.
//! Unanswered questions are escalated over HTTP to that same API, so a
//! supervisor can resolve them from the dashboard or with
//! `frontdesk requests resolve` while the console keeps running.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use frontdesk_core::application::{KnowledgeLookup, Receptionist};
use frontdesk_core::domain::conversation::{ContextMessage, Conversation, ConversationContextSink, ConversationError};
use frontdesk_core::domain::escalation::ChatMessage;
use frontdesk_core::infrastructure::help_desk_client::HelpDeskClient;

use super::{apply_network_overrides, load_config};
use crate::embedded::EmbeddedServices;
use crate::server;

/// Prints what the receptionist is told and says
struct ConsoleSink {
    show_context: bool,
}

#[async_trait]
impl ConversationContextSink for ConsoleSink {
    async fn append_context(&self, message: ContextMessage) -> Result<(), ConversationError> {
        if self.show_context {
            println!("\n{}", format!("[{}] {}", message.role, message.content).dimmed());
        }
        Ok(())
    }

    async fn say(&self, text: &str) -> Result<(), ConversationError> {
        println!("\n{} {}", "Receptionist:".green().bold(), text);
        Ok(())
    }
}

pub async fn handle_command(
    config_path: Option<PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
    room: String,
    show_context: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_network_overrides(&mut config, host, port);

    let services = EmbeddedServices::from_config(config)?;
    let shutdown = CancellationToken::new();

    let network = &services.config.spec.network;
    let listener = server::bind(&network.bind_address, network.port).await?;
    let local_port = listener.local_addr().context("Failed to read listener address")?.port();
    let server_task = tokio::spawn(server::serve(listener, services.router()?, shutdown.clone()));
    let sweeper = services.backfill_sweeper(shutdown.child_token()).map(|s| s.start());
    tokio::spawn(server::shutdown_signal(shutdown.clone()));

    let client = HelpDeskClient::with_timeout(
        format!("http://127.0.0.1:{}", local_port),
        Duration::from_secs(services.config.spec.escalation.request_timeout_seconds),
    )?;
    let coordinator = Arc::new(services.coordinator(Arc::new(client), shutdown.child_token()));
    let sink = Arc::new(ConsoleSink { show_context });
    let conversation = Conversation::new(room, Some("console".to_string()), sink);
    let receptionist = Receptionist::new(services.matcher.clone(), coordinator, conversation);

    println!("{}", "Frontdesk console".bold());
    println!("  Help desk API: http://127.0.0.1:{}", local_port);
    println!("  Resolve escalations with: frontdesk --port {} requests resolve <ID> <ANSWER>", local_port);
    println!("  Commands: /pending, /quit");
    println!();

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "You:".cyan().bold());
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = shutdown.cancelled() => None,
        };
        let Some(line) = line else { break };
        let text = line.trim();

        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/pending" => {
                let pending = receptionist.conversation().pending.ids();
                if pending.is_empty() {
                    println!("{}", "No questions waiting on a supervisor".dimmed());
                }
                for id in pending {
                    println!("  {}", id);
                }
                continue;
            }
            _ => {}
        }

        history.push(ChatMessage::new("user", text));
        let reply = respond(&receptionist, text, &history).await;
        println!("{} {}", "Receptionist:".green().bold(), reply);
        history.push(ChatMessage::new("assistant", reply));
    }

    shutdown.cancel();
    if let Some(handle) = sweeper {
        handle.await.ok();
    }
    server_task.await.context("HTTP server task failed")??;
    Ok(())
}

/// Answer from the knowledge base, or escalate
async fn respond(receptionist: &Receptionist, text: &str, history: &[ChatMessage]) -> String {
    match receptionist.on_user_turn(text).await {
        KnowledgeLookup::Answered(matched) => matched.entry.answer,
        KnowledgeLookup::NoMatch | KnowledgeLookup::Degraded(_) => {
            receptionist.request_human_supervisor(text, history.to_vec()).await
        }
    }
}
