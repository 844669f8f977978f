use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use tasks::*;

mod tasks;
mod types;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db::init_db;
use crate::utils::{pb_style, suffix_regex};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// Directory containing the wallpapers
    pub path: PathBuf,
    /// File extensions to pick up, comma separated
    #[arg(short, long, default_value = "png,jpg,jpeg,bmp,webp")]
    pub suffix: String,
    /// Update the stored path of files that were already added
    #[arg(long)]
    pub overwrite: bool,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let re_suf = suffix_regex(&self.suffix).context("invalid suffix list")?;
        let root = tokio::fs::canonicalize(&self.path)
            .await
            .with_context(|| format!("cannot open {}", self.path.display()))?;

        let db = init_db(opts.conf_dir.database()).await?;

        let pb = ProgressBar::no_length().with_style(pb_style());

        let (t1, rx) = task_scan(root, pb.clone(), re_suf);
        let (t2, rx) = task_hash(rx, pb.clone());
        let t3 = task_add(rx, pb.clone(), db, self.overwrite);

        let (r1, r2, r3) = tokio::try_join!(t1, t2, t3)?;
        r1?;
        r2?;
        let added = r3?;

        pb.finish_with_message("done");
        info!("added {added} new wallpapers");

        Ok(())
    }
}
