//! Interactive session: one service, many questions, shared history.

use super::ask::render;
use super::{open_service, print_json};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::AnswerStrategy;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask several questions in one process
#[derive(Args, Debug)]
pub struct SessionCommand {
    /// Answer strategy for every question in the session
    #[arg(short, long)]
    pub strategy: Option<AnswerStrategy>,

    /// Print each response as JSON
    #[arg(long)]
    pub json: bool,
}

/// A line typed at the session prompt.
#[derive(Debug, PartialEq, Eq)]
enum SessionInput<'a> {
    Skip,
    Quit,
    History,
    ClearHistory,
    Health,
    Query(&'a str),
}

fn parse_line(line: &str) -> SessionInput<'_> {
    match line.trim() {
        "" => SessionInput::Skip,
        ":quit" | ":exit" | "quit" | "exit" => SessionInput::Quit,
        ":history" => SessionInput::History,
        ":clear" => SessionInput::ClearHistory,
        ":health" => SessionInput::Health,
        query => SessionInput::Query(query),
    }
}

impl SessionCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting session");

        let service = open_service(config)?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        eprintln!("Type a question, :history, :clear, :health or :quit");
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                SessionInput::Skip => continue,
                SessionInput::Quit => break,
                SessionInput::History => {
                    let history = service.history().await;
                    if self.json {
                        print_json(&history)?;
                    } else {
                        for (i, record) in history.iter().enumerate() {
                            println!("{}. Q: {}\n   A: {}", i + 1, record.query, record.answer);
                        }
                    }
                }
                SessionInput::ClearHistory => {
                    service.clear_history().await;
                    eprintln!("History cleared");
                }
                SessionInput::Health => print_json(&service.health().await)?,
                SessionInput::Query(query) => {
                    let response = service.ask(query, self.strategy).await;
                    render(&response, self.json)?;
                }
            }
        }

        tracing::info!("Session ended");
        Ok(())
    }
}
