// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use campus_advisor::rag::PlainTextSource;
use campus_advisor::routing::QueryRequest;
use campus_advisor::session::SessionStore;
use campus_advisor::{AdvisorConfig, AdvisorEngine};
use chrono::Utc;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

fn spawn_cleanup_sweep(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sessions.evict_if_idle(Utc::now()).await;
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("Starting Campus Advisor v{}...", campus_advisor::version::VERSION);

    let config = AdvisorConfig::from_env();
    let engine = AdvisorEngine::from_config(config.clone())?;

    // Restore persisted index and sessions; bootstrap from the catalog when
    // no snapshot exists. The query path itself never triggers indexing.
    let restored = engine.restore().await?;
    if restored {
        println!("Index restored: {} chunks", engine.index().len().await);
    } else if let Some(catalog) = &config.catalog_path {
        println!("No index snapshot found; indexing {}...", catalog.display());
        let source = PlainTextSource::new("catalog", catalog.clone());
        engine.rebuild_from(&source).await?;
        println!("Indexed {} chunks", engine.index().len().await);
    } else {
        warn!("no index snapshot and no ADVISOR_CATALOG_PATH; answers will be templated");
    }

    spawn_cleanup_sweep(Arc::clone(engine.sessions()));

    println!("Ready. Ask a question (ctrl-d to exit).\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id: Option<String> = None;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let mut request = QueryRequest::new(text);
        if let Some(id) = &session_id {
            request = request.with_session(id.clone());
        }

        match engine.handle_query(request).await {
            Ok(response) => {
                session_id = Some(response.session_id.clone());
                println!("\n{}\n", response.answer_text);
                if !response.degraded_domains.is_empty() {
                    let degraded: Vec<&str> = response
                        .degraded_domains
                        .iter()
                        .map(|d| d.as_tag())
                        .collect();
                    println!("(degraded: {})\n", degraded.join(", "));
                }
            }
            Err(e) => {
                eprintln!("error [{}]: {}", e.error_code(), e);
            }
        }
    }

    engine.sessions().save_to_disk().await?;
    println!("Goodbye.");
    Ok(())
}
