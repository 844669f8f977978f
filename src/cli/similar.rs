use anyhow::Result;
use clap::Parser;
use log::debug;
use serde_json::json;
use tokio::task::spawn_blocking;

use crate::ImageId;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat, SearchOptions};
use crate::db::{crud, init_db};
use crate::search::FingerprintIndex;

#[derive(Parser, Debug, Clone)]
pub struct SimilarCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// Id of the wallpaper to compare against
    pub id: ImageId,
}

impl SubCommandExtend for SimilarCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = init_db(opts.conf_dir.database()).await?;
        let records = crud::get_fingerprints(&db).await?;

        let (id, k) = (self.id, self.search.k);
        let result = spawn_blocking(move || {
            let index = FingerprintIndex::build(records);
            debug!("fingerprint index holds {} wallpapers", index.len());
            index.similar_with_distance(id, k)
        })
        .await??;

        let ids = result.iter().map(|&(id, _)| id).collect::<Vec<_>>();
        let paths = crud::get_paths(&db, &ids).await?;
        let rows = result
            .into_iter()
            .map(|(id, distance)| (distance, id, paths.get(&id).cloned().unwrap_or_default()))
            .collect::<Vec<_>>();

        print_result(&rows, self.search.output_format)
    }
}

fn print_result(rows: &[(u32, ImageId, String)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = rows
                .iter()
                .map(|(distance, id, path)| json!({ "id": id, "distance": distance, "path": path }))
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Table => {
            for (distance, id, path) in rows {
                println!("{distance}\t{id}\t{path}");
            }
        }
    }
    Ok(())
}
