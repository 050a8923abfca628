// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Knowledge base commands
//!
//! Commands: list, match

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use super::help_desk_client;

#[derive(Subcommand)]
pub enum KbCommand {
    /// List learned answers, newest first
    List,

    /// Check whether a question would be answered from the knowledge base
    Match {
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },
}

pub async fn handle_command(
    command: KbCommand,
    config_path: Option<PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<()> {
    let client = help_desk_client(config_path, host, port)?;

    match command {
        KbCommand::List => {
            let entries = client.knowledge_base().await?;
            if entries.is_empty() {
                println!("{}", "Knowledge base is empty".dimmed());
                return Ok(());
            }

            for entry in &entries {
                let vectors = match (entry.has_question_embedding, entry.has_content_embedding) {
                    (true, true) => "question+content",
                    (true, false) => "question",
                    (false, true) => "content",
                    (false, false) => "none",
                };
                println!("{} {}", "Q:".bold(), entry.question);
                println!("{} {}", "A:".bold(), entry.answer);
                println!(
                    "   {}",
                    format!(
                        "{} · {} · embeddings: {}",
                        entry.id,
                        entry.created_at.format("%Y-%m-%d %H:%M"),
                        vectors
                    )
                    .dimmed()
                );
                println!();
            }
            Ok(())
        }
        KbCommand::Match { query } => {
            let decision = client.match_query(&query.join(" ")).await?;
            let score = decision
                .score
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "n/a".to_string());

            if decision.matched {
                println!("{} (similarity {})", "✓ Match".green().bold(), score);
                if let Some(question) = &decision.question {
                    println!("  Question: {}", question);
                }
                if let Some(answer) = &decision.answer {
                    println!("  Answer: {}", answer);
                }
                if let Some(reason) = decision.accepted_by {
                    println!("  Accepted by: {:?}", reason);
                }
            } else {
                println!("{} (best similarity {})", "✗ No match".yellow().bold(), score);
                if let Some(question) = &decision.question {
                    println!("  Closest question: {}", question);
                }
            }
            Ok(())
        }
    }
}
