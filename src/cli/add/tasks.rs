use std::path::PathBuf;

use anyhow::{Result, anyhow};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressIterator};
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use tokio::sync::mpsc::{Receiver, Sender, channel};
use tokio::task::{JoinHandle, spawn_blocking};
use walkdir::WalkDir;

use super::types::*;
use crate::db::{Database, crud};
use crate::utils::pb_style;

pub fn task_scan(
    path: PathBuf,
    pb: ProgressBar,
    regex_suf: Regex,
) -> (JoinHandle<Result<()>>, Receiver<ImageData>) {
    let (tx, rx) = channel(num_cpus::get());
    let t = tokio::spawn(scan_directory(path, tx, regex_suf, pb));
    (t, rx)
}

pub fn task_hash(
    mut lrx: Receiver<ImageData>,
    pb: ProgressBar,
) -> (JoinHandle<Result<()>>, Receiver<HashedImageData>) {
    let (tx, rx) = channel(num_cpus::get());
    let t = spawn_blocking(move || {
        let mut buffer = vec![];
        // hash a bounded batch at a time so memory stays flat
        while lrx.blocking_recv_many(&mut buffer, num_cpus::get() * 10) != 0 {
            let hashed = buffer
                .par_drain(..)
                .map(|data| HashedImageData { hash: blake3::hash(&data.data), path: data.path })
                .collect::<Vec<_>>();
            for data in hashed {
                tx.blocking_send(data).map_err(|_| anyhow!("add task stopped"))?;
            }
        }
        pb.set_message("hashing done");
        Ok(())
    });
    (t, rx)
}

/// Insert new wallpapers, returns how many were added
pub fn task_add(
    mut lrx: Receiver<HashedImageData>,
    pb: ProgressBar,
    db: Database,
    overwrite: bool,
) -> JoinHandle<Result<usize>> {
    tokio::spawn(async move {
        let mut added = 0;
        while let Some(data) = lrx.recv().await {
            let hash = data.hash.as_bytes();
            if crud::check_image_hash(&db, hash).await? {
                if overwrite {
                    crud::update_image_path(&db, hash, &data.path).await?;
                    pb.set_message(format!("updated path: {}", data.path));
                } else {
                    pb.set_message(format!("skipped known file: {}", data.path));
                }
            } else {
                crud::add_image(&db, hash, &data.path).await?;
                pb.set_message(data.path);
                added += 1;
            }
            pb.inc(1);
        }
        Ok(added)
    })
}

async fn scan_directory(
    path: PathBuf,
    tx: Sender<ImageData>,
    regex_suf: Regex,
    pb: ProgressBar,
) -> Result<()> {
    info!("scanning directory: {}", path.display());
    let pb2 = ProgressBar::no_length().with_style(pb_style());
    let entries = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .progress_with(pb2)
        .filter_map(|entry| {
            entry.ok().and_then(|entry| {
                let path = entry.path();
                if path.is_file() {
                    if let Some(ext) = path.extension() {
                        if regex_suf.is_match(&ext.to_string_lossy()) {
                            return Some(path.to_string_lossy().to_string());
                        }
                    }
                }
                None
            })
        })
        .collect::<Vec<_>>();
    info!("found {} images", entries.len());

    pb.set_length(entries.len() as u64);

    futures::stream::iter(entries)
        .for_each_concurrent(32, |entry| {
            let tx = tx.clone();
            let pb = pb.clone();
            async move {
                match tokio::fs::read(&entry).await {
                    Ok(data) => {
                        // a closed channel means a later stage failed and reports it
                        let _ = tx.send(ImageData { path: entry, data }).await;
                    }
                    Err(e) => {
                        warn!("failed to read {entry}: {e}");
                        pb.inc(1);
                    }
                }
            }
        })
        .await;

    Ok(())
}
