use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::ScrapeRow;

const CONCURRENCY: usize = 4;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages concurrently, saving each result to DB as it arrives.
///
/// Failed fetches are recorded as error rows and the page still marked
/// visited, so reruns do not spin on dead pages. A missing page is not fatal
/// to the run; it just yields zero lines at processing time.
pub async fn scrape_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String, u32)>,
) -> Result<ScrapeStats> {
    let client = Arc::new(
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?,
    );
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ScrapeRow>(CONCURRENCY * 2);

    for (page_id, url, page_no) in pages {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let row = fetch_with_retry(&client, page_id, &url, page_no).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, url, page_no, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }

        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(ScrapeStats { total, ok, errors })
}

/// Save a single scrape result to DB using pre-prepared statements.
fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &ScrapeRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.page_id, row.url, row.page_no, row.html, row.status, row.error, row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.page_id])?;
    Ok(())
}

async fn fetch_with_retry(
    client: &reqwest::Client,
    page_id: i64,
    url: &str,
    page_no: u32,
) -> ScrapeRow {
    for attempt in 0..=MAX_RETRIES {
        let row = fetch_one(client, page_id, url, page_no).await;

        let should_retry = matches!(
            row.status,
            Some(429) | Some(500) | Some(502) | Some(503) | Some(504)
        );

        if !should_retry || attempt == MAX_RETRIES {
            return row;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "HTTP {} on page {} (attempt {}/{}), backing off {:.1}s",
            row.status.unwrap_or_default(),
            page_no,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    fetch_one(client, page_id, url, page_no).await
}

async fn fetch_one(client: &reqwest::Client, page_id: i64, url: &str, page_no: u32) -> ScrapeRow {
    let start = Instant::now();
    let response = client.get(url).send().await;
    let elapsed = start.elapsed().as_millis() as i64;

    match response {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                match resp.text().await {
                    Ok(html) => ScrapeRow {
                        page_id,
                        url: url.to_string(),
                        page_no,
                        html: Some(html),
                        status: Some(status.as_u16() as i32),
                        error: None,
                        latency_ms: Some(elapsed),
                    },
                    Err(e) => error_row(page_id, url, page_no, Some(status.as_u16() as i32), e, elapsed),
                }
            } else {
                ScrapeRow {
                    page_id,
                    url: url.to_string(),
                    page_no,
                    html: None,
                    status: Some(status.as_u16() as i32),
                    error: Some(format!("HTTP {}", status)),
                    latency_ms: Some(elapsed),
                }
            }
        }
        Err(e) => error_row(page_id, url, page_no, None, e, elapsed),
    }
}

fn error_row(
    page_id: i64,
    url: &str,
    page_no: u32,
    status: Option<i32>,
    error: reqwest::Error,
    latency_ms: i64,
) -> ScrapeRow {
    ScrapeRow {
        page_id,
        url: url.to_string(),
        page_no,
        html: None,
        status,
        error: Some(error.to_string()),
        latency_ms: Some(latency_ms),
    }
}
