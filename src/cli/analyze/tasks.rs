use std::sync::Arc;

use anyhow::{Result, anyhow};
use futures::StreamExt;
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use tokio::sync::mpsc::{Receiver, channel};
use tokio::task::{JoinHandle, spawn_blocking};

use super::types::*;
use crate::analyze::Analyzer;
use crate::db::{Database, crud};

/// Page through unanalyzed wallpapers and read their files
///
/// Files that cannot be read are skipped, they stay unanalyzed and are picked up
/// again by the next run.
pub fn task_load(
    db: Database,
    batch_size: usize,
    limit: usize,
    pb: ProgressBar,
) -> (JoinHandle<Result<()>>, Receiver<LoadedImage>) {
    let (tx, rx) = channel(num_cpus::get());
    let t = tokio::spawn(async move {
        let mut after = 0;
        let mut remaining = limit;
        while remaining > 0 {
            let n = batch_size.min(remaining).max(1);
            let batch = crud::get_unanalyzed(&db, after, i64::try_from(n).unwrap_or(i64::MAX)).await?;
            let Some(last) = batch.last() else {
                break;
            };
            after = last.id;
            remaining = remaining.saturating_sub(batch.len());
            pb.inc_length(batch.len() as u64);
            debug!("loading batch of {} wallpapers", batch.len());

            futures::stream::iter(batch)
                .for_each_concurrent(32, |record| {
                    let tx = tx.clone();
                    let pb = pb.clone();
                    async move {
                        match tokio::fs::read(&record.path).await {
                            Ok(data) => {
                                let image = LoadedImage { id: record.id, path: record.path, data };
                                let _ = tx.send(image).await;
                            }
                            Err(e) => {
                                warn!("failed to read {}: {e}", record.path);
                                pb.inc(1);
                            }
                        }
                    }
                })
                .await;

            if tx.is_closed() {
                break;
            }
        }
        Ok(())
    });
    (t, rx)
}

pub fn task_calc(
    mut lrx: Receiver<LoadedImage>,
    analyzer: Arc<Analyzer>,
    pb: ProgressBar,
) -> (JoinHandle<Result<()>>, Receiver<AnalyzedImage>) {
    let (tx, rx) = channel(num_cpus::get());
    let t = spawn_blocking(move || {
        let mut buffer = vec![];
        while lrx.blocking_recv_many(&mut buffer, num_cpus::get() * 10) != 0 {
            let results = buffer
                .par_drain(..)
                .map(|image| (image.id, image.path, analyzer.analyze_bytes(&image.data)))
                .collect::<Vec<_>>();
            for (id, path, result) in results {
                match result {
                    Ok(analysis) => {
                        tx.blocking_send(AnalyzedImage { id, path, analysis })
                            .map_err(|_| anyhow!("save task stopped"))?;
                    }
                    Err(e) => {
                        warn!("failed to analyze {path}: {e}");
                        pb.inc(1);
                    }
                }
            }
        }
        Ok(())
    });
    (t, rx)
}

/// Write analysis results back, returns how many were saved
pub fn task_save(
    mut lrx: Receiver<AnalyzedImage>,
    db: Database,
    pb: ProgressBar,
) -> JoinHandle<Result<usize>> {
    tokio::spawn(async move {
        let mut saved = 0;
        while let Some(image) = lrx.recv().await {
            let analysis = &image.analysis;
            crud::set_analysis(
                &db,
                image.id,
                analysis.fingerprint,
                analysis.width,
                analysis.height,
                &analysis.colors,
            )
            .await?;
            pb.set_message(image.path);
            pb.inc(1);
            saved += 1;
        }
        Ok(saved)
    })
}
