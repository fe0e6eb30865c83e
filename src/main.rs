// This is the entry point of the notes & news gate.
//
// **Architecture Overview:**
// - `core/` = Business logic (access rules, moderation, notes, news)
// - `infra/` = Implementations of core traits (in-memory and SQLite stores)
// - `gateway/` = Request surface (routing, response classification)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Feed JSON requests from stdin through the gateway

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "gateway/gateway_layer.rs"]
mod gateway;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{AppConfig, StorageKind};
use crate::core::moderation::ContentFilter;
use crate::core::news::{NewsService, NewsStore};
use crate::core::notes::{NoteStore, NotesService};
use crate::gateway::routes::Route;
use crate::gateway::{Gateway, Request, Response};
use crate::infra::news::{InMemoryNewsStore, SqliteNewsStore};
use crate::infra::notes::{InMemoryNoteStore, SqliteNoteStore};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Operator command to publish a news item.
#[derive(Debug, Deserialize)]
struct Publish {
    title: String,
    text: String,
    date: NaiveDate,
}

/// One input line: either an operator command or a user request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Line {
    Publish { publish: Publish },
    Request(Request),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. Stdout carries the response stream, so logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    tracing::info!(storage = ?config.storage, login_url = %config.login_url, "Starting up");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    match config.storage {
        StorageKind::Sqlite => {
            let notes = SqliteNoteStore::connect(&config.notes_database_url).await?;
            let news = SqliteNewsStore::connect(&config.news_database_url).await?;
            serve(&config, notes, news, stdin(), tokio::io::stdout()).await
        }
        StorageKind::Memory => {
            serve(
                &config,
                InMemoryNoteStore::new(),
                InMemoryNewsStore::new(),
                stdin(),
                tokio::io::stdout(),
            )
            .await
        }
    }
}

fn stdin() -> BufReader<tokio::io::Stdin> {
    BufReader::new(tokio::io::stdin())
}

/// Wire the services around the chosen stores and answer one JSON response
/// per input line until the input closes.
async fn serve<N, W, I, O>(
    config: &AppConfig,
    notes: N,
    news: W,
    input: I,
    mut output: O,
) -> anyhow::Result<()>
where
    N: NoteStore,
    W: NewsStore,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let notes = Arc::new(NotesService::new(notes));
    let news = Arc::new(NewsService::new(
        news,
        ContentFilter::new(config.moderation.clone()),
        config.news_per_page,
    ));
    let gateway = Gateway::new(Arc::clone(&notes), Arc::clone(&news), config.login_url.clone());

    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Line>(&line) {
            Ok(Line::Request(request)) => gateway.handle(&request).await,
            Ok(Line::Publish { publish }) => {
                match news.publish(publish.title, publish.text, publish.date).await {
                    Ok(published) => Response::Redirect {
                        location: Route::NewsDetail(published.id).path(),
                    },
                    Err(e) => {
                        tracing::error!("Failed to publish news: {}", e);
                        Response::Error {
                            message: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Malformed request line: {}", e);
                Response::Error {
                    message: format!("malformed request: {}", e),
                }
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        output.write_all(&out).await?;
        output.flush().await?;
    }

    tracing::info!(
        notes = notes.count().await?,
        comments = news.comment_count().await?,
        "Input closed, shutting down"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn run(input: &str) -> String {
        let config = AppConfig::from_lookup(|key| match key {
            "STORAGE" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        let mut output = Vec::new();
        serve(
            &config,
            InMemoryNoteStore::new(),
            InMemoryNewsStore::new(),
            input.as_bytes(),
            &mut output,
        )
        .await
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_output_is_one_json_response_per_line() {
        let output = run(concat!(
            r#"{"publish": {"title": "Заголовок", "text": "Текст", "date": "2024-01-01"}}"#,
            "\n\n",
            r#"{"user": 1, "method": "POST", "path": "/add/", "form": {"title": "Заголовок", "text": "Текст"}}"#,
            "\n",
            r#"{"path": "/notes/"}"#,
            "\n",
            "not json\n",
        ))
        .await;

        let responses: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["location"], "/news/1/");
        assert_eq!(responses[1]["location"], "/done/");
        assert_eq!(responses[2]["status"], "redirect_login");
        assert_eq!(responses[2]["location"], "/auth/login/?next=/notes/");
        assert_eq!(responses[3]["status"], "error");
    }
}
