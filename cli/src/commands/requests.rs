// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Help request commands for supervisors
//!
//! Commands: list, show, resolve

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use frontdesk_core::domain::escalation::{EscalationId, EscalationRequest, EscalationStatus};

use super::help_desk_client;

#[derive(Subcommand)]
pub enum RequestsCommand {
    /// List help requests, newest first
    List {
        /// Filter by status (pending, resolved)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one help request with its conversation
    Show {
        /// Help request ID
        id: String,
    },

    /// Answer a pending help request
    Resolve {
        /// Help request ID
        id: String,

        /// Supervisor answer
        #[arg(required = true, trailing_var_arg = true)]
        answer: Vec<String>,
    },
}

pub async fn handle_command(
    command: RequestsCommand,
    config_path: Option<PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<()> {
    let client = help_desk_client(config_path, host, port)?;

    match command {
        RequestsCommand::List { status } => {
            let status = status
                .as_deref()
                .map(str::parse::<EscalationStatus>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let requests = client.list_requests(status).await?;

            if requests.is_empty() {
                println!("{}", "No help requests".dimmed());
                return Ok(());
            }

            println!(
                "{:<38} {:<10} {:<20} {}",
                "ID".bold(),
                "STATUS".bold(),
                "CREATED".bold(),
                "QUESTION".bold()
            );
            for request in &requests {
                println!(
                    "{:<38} {:<10} {:<20} {}",
                    request.id.to_string(),
                    colored_status(request.status),
                    request.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    request.original_query
                );
            }
            Ok(())
        }
        RequestsCommand::Show { id } => {
            let request = client.get_request(parse_id(&id)?).await?;
            print_request(&request);
            Ok(())
        }
        RequestsCommand::Resolve { id, answer } => {
            let id = parse_id(&id)?;
            let receipt = client.resolve_request(id, &answer.join(" ")).await?;

            println!("{}", format!("✓ Help request {} resolved", receipt.request_id).green());
            match receipt.knowledge_entry_id {
                Some(entry_id) => println!("  Added to knowledge base as {}", entry_id),
                None => println!("  {}", "Not added to the knowledge base".yellow()),
            }
            Ok(())
        }
    }
}

fn parse_id(id: &str) -> Result<EscalationId> {
    id.parse::<EscalationId>()
        .with_context(|| format!("Invalid help request ID: {}", id))
}

fn colored_status(status: EscalationStatus) -> String {
    match status {
        EscalationStatus::Pending => status.to_string().yellow().to_string(),
        EscalationStatus::Resolved => status.to_string().green().to_string(),
    }
}

fn print_request(request: &EscalationRequest) {
    println!("{} {}", "Help request".bold(), request.id);
    println!("  Status: {}", colored_status(request.status));
    println!("  Room: {}", request.room_id);
    if let Some(participant) = &request.participant_id {
        println!("  Participant: {}", participant);
    }
    println!("  Created: {}", request.created_at.to_rfc3339());
    println!("  Question: {}", request.original_query);
    if let Some(answer) = request.answer() {
        println!("  Answer: {}", answer.green());
    }
    if let Some(resolved_at) = request.resolved_at {
        println!("  Resolved: {}", resolved_at.to_rfc3339());
    }

    if !request.conversation_history.is_empty() {
        println!();
        println!("{}", "Conversation:".bold());
        for message in &request.conversation_history {
            println!("  {}: {}", message.role.dimmed(), message.content);
        }
    }
}
