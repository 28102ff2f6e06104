//! Bulk ingest of the JSON-lines corpora.
//!
//! One producer reads the file line by line. Each line becomes a task that
//! parses the record and issues its write(s). A semaphore of `width` permits
//! is acquired before a task is spawned, so at most `width` records are in
//! flight and the producer waits instead of queueing without bound.
//!
//! Bytes that are not valid UTF-8 are replaced with U+FFFD, so one damaged
//! line never ends a load.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::catalog::driver::Driver;
use crate::catalog::statement::{StatementCache, Values};
use crate::catalog::{CatalogError, ItemRow, Result, ReviewRow, Session};
use crate::config::LoaderConfig;

/// Outcome of one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Non-blank lines handed to workers.
    pub submitted: usize,
    pub written: usize,
    pub failed: usize,
    /// Set when the wait bound expired with records still in flight.
    pub timed_out: bool,
}

impl LoadReport {
    fn tally(&mut self, outcome: std::result::Result<bool, JoinError>) {
        match outcome {
            Ok(true) => self.written += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                error!("Load worker aborted: {e}");
                self.failed += 1;
            }
        }
    }
}

impl Session {
    /// Loads the items corpus at `path` into `items`.
    pub async fn load_items(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let (driver, statements) = self.handles()?;
        run_pipeline(
            path.as_ref(),
            "item",
            &self.loader,
            self.loader.item_progress_every,
            move |line| {
                let driver = driver.clone();
                let statements = statements.clone();
                async move { write_item(driver.as_ref(), &statements, &line).await }
            },
        )
        .await
    }

    /// Loads the reviews corpus at `path` into both review projections.
    pub async fn load_reviews(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let (driver, statements) = self.handles()?;
        run_pipeline(
            path.as_ref(),
            "review",
            &self.loader,
            self.loader.review_progress_every,
            move |line| {
                let driver = driver.clone();
                let statements = statements.clone();
                async move { write_review(driver.as_ref(), &statements, &line).await }
            },
        )
        .await
    }
}

async fn write_item(driver: &dyn Driver, statements: &StatementCache, line: &str) -> Result<()> {
    let item = ItemRow::from_json_line(line)?;
    driver
        .execute(&statements.insert_item.bind(Values::Item(item))?)
        .await?;
    Ok(())
}

/// Writes the by-user projection, then the by-item projection. A failure of
/// the second write leaves the first in place.
async fn write_review(driver: &dyn Driver, statements: &StatementCache, line: &str) -> Result<()> {
    let review = ReviewRow::from_json_line(line)?;
    driver
        .execute(
            &statements
                .insert_review_by_user
                .bind(Values::Review(review.clone()))?,
        )
        .await?;
    driver
        .execute(&statements.insert_review_by_item.bind(Values::Review(review))?)
        .await?;
    Ok(())
}

async fn run_pipeline<F, Fut>(
    path: &Path,
    kind: &'static str,
    config: &LoaderConfig,
    progress_every: usize,
    mut task: F,
) -> Result<LoadReport>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    info!("Loading {kind}s from: {}", path.display());
    let io_error = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).await.map_err(io_error)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut read_error = None;

    let permits = Arc::new(Semaphore::new(config.width.max(1)));
    let progress_every = progress_every.max(1);
    let mut workers = JoinSet::new();
    let mut report = LoadReport::default();

    loop {
        let line = match next_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Reading {} stopped: {e}", path.display());
                read_error = Some(e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let index = report.submitted;
        report.submitted += 1;

        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let work = task(line);
        workers.spawn(async move {
            let _permit = permit;
            match work.await {
                Ok(()) => {
                    if index % progress_every == 0 {
                        info!("Loaded {kind}: {index}");
                    }
                    true
                }
                Err(e) => {
                    error!("Error loading {kind} {index}: {e}");
                    false
                }
            }
        });

        while let Some(outcome) = workers.try_join_next() {
            report.tally(outcome);
        }
    }

    if timeout(config.wait_timeout, drain(&mut workers, &mut report))
        .await
        .is_err()
    {
        warn!(
            "Loading {kind}s timed out after {:?} with {} still in flight",
            config.wait_timeout,
            workers.len()
        );
        report.timed_out = true;
        workers.detach_all();
    }

    info!(
        "Loading {kind}s... Done. Total {kind}s: {} (written: {}, failed: {})",
        report.submitted, report.written, report.failed
    );
    match read_error {
        Some(source) => Err(io_error(source)),
        None => Ok(report),
    }
}

/// Reads the next line without its terminator, decoding it lossily.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

async fn drain(workers: &mut JoinSet<bool>, report: &mut LoadReport) {
    while let Some(outcome) = workers.join_next().await {
        report.tally(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    fn corpus(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_pipeline_bounds_in_flight_work() {
        let file = corpus(&["a"; 40]);
        let config = LoaderConfig {
            width: 4,
            ..LoaderConfig::default()
        };
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let report = {
            let (active, peak) = (active.clone(), peak.clone());
            run_pipeline(file.path(), "line", &config, 1_000, move |_| {
                let (active, peak) = (active.clone(), peak.clone());
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap()
        };

        assert_eq!(report.submitted, 40);
        assert_eq!(report.written, 40);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_pipeline_counts_failures_and_skips_blank_lines() {
        let file = corpus(&["ok", "", "bad", "   ", "ok"]);
        let report = run_pipeline(
            file.path(),
            "line",
            &LoaderConfig::default(),
            1,
            |line| async move {
                if line == "ok" {
                    Ok(())
                } else {
                    Err(CatalogError::MissingField {
                        record: "line",
                        field: "ok",
                    })
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(
            report,
            LoadReport {
                submitted: 3,
                written: 2,
                failed: 1,
                timed_out: false
            }
        );
    }

    #[tokio::test]
    async fn test_pipeline_wait_is_bounded() {
        let file = corpus(&["slow"]);
        let config = LoaderConfig {
            wait_timeout: Duration::from_millis(20),
            ..LoaderConfig::default()
        };
        let report = run_pipeline(file.path(), "line", &config, 1, |_| async {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap();
        assert!(report.timed_out);
        assert_eq!(report.written, 0);
    }

    #[tokio::test]
    async fn test_next_line_decodes_lossily() {
        let mut reader = BufReader::new(&b"ok\r\ncaf\xe9\nlast"[..]);
        let mut buf = Vec::new();
        assert_eq!(
            next_line(&mut reader, &mut buf).await.unwrap().as_deref(),
            Some("ok")
        );
        assert_eq!(
            next_line(&mut reader, &mut buf).await.unwrap().as_deref(),
            Some("caf\u{FFFD}")
        );
        assert_eq!(
            next_line(&mut reader, &mut buf).await.unwrap().as_deref(),
            Some("last")
        );
        assert_eq!(next_line(&mut reader, &mut buf).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = run_pipeline(
            Path::new("/nonexistent/items.json"),
            "item",
            &LoaderConfig::default(),
            1,
            |_| async { Ok(()) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
