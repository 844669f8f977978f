use std::sync::Arc;

use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use tasks::*;

mod tasks;
mod types;

use crate::analyze::Analyzer;
use crate::cli::SubCommandExtend;
use crate::config::{AnalyzeOptions, Opts};
use crate::db::init_db;
use crate::utils::pb_style_speed;

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeCommand {
    #[command(flatten)]
    pub analyze: AnalyzeOptions,
    /// Analyze at most N wallpapers
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl SubCommandExtend for AnalyzeCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = init_db(opts.conf_dir.database()).await?;
        let analyzer = Arc::new(Analyzer::from(&self.analyze));

        let pb = ProgressBar::no_length().with_style(pb_style_speed());

        let limit = self.limit.unwrap_or(usize::MAX);
        let (t1, rx) = task_load(db.clone(), self.analyze.batch_size, limit, pb.clone());
        let (t2, rx) = task_calc(rx, analyzer, pb.clone());
        let t3 = task_save(rx, db, pb.clone());

        let (r1, r2, r3) = tokio::try_join!(t1, t2, t3)?;
        r1?;
        r2?;
        let saved = r3?;

        pb.finish_with_message("done");
        info!("analyzed {saved} wallpapers");

        Ok(())
    }
}
