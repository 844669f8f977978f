use std::collections::HashMap;

use anyhow::Result;
use clap::Parser;
use log::info;
use serde::Serialize;
use tokio::task::spawn_blocking;

use crate::ImageId;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat};
use crate::db::{crud, init_db};
use crate::duplicate::{DuplicateGroup, duplicate_flags, find_duplicates};

#[derive(Parser, Debug, Clone)]
pub struct DuplicatesCommand {
    /// Largest Hamming distance between two fingerprints of the same group
    #[arg(short, long, value_name = "BITS")]
    pub radius: u32,
    /// Write the duplicate flags back to the database
    #[arg(long)]
    pub mark: bool,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

#[derive(Serialize)]
struct Entry<'a> {
    id: ImageId,
    path: &'a str,
}

#[derive(Serialize)]
struct GroupOutput<'a> {
    canonical: Entry<'a>,
    members: Vec<Entry<'a>>,
}

impl SubCommandExtend for DuplicatesCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = init_db(opts.conf_dir.database()).await?;

        let records = crud::get_fingerprints(&db).await?;
        info!("clustering {} fingerprints with radius {}", records.len(), self.radius);

        let radius = self.radius;
        let groups = spawn_blocking(move || find_duplicates(records, radius)).await?;
        info!("found {} duplicate groups", groups.len());

        if self.mark {
            crud::set_duplicates(&db, &duplicate_flags(&groups)).await?;
            info!("duplicate flags updated");
        }

        let ids = groups
            .iter()
            .flat_map(|g| std::iter::once(g.canonical).chain(g.members.iter().copied()))
            .collect::<Vec<_>>();
        let paths = crud::get_paths(&db, &ids).await?;

        print_groups(&groups, &paths, self.output_format)
    }
}

fn print_groups(groups: &[DuplicateGroup], paths: &HashMap<ImageId, String>, format: OutputFormat) -> Result<()> {
    let entry = |id: ImageId| Entry { id, path: paths.get(&id).map(String::as_str).unwrap_or_default() };
    match format {
        OutputFormat::Json => {
            let output = groups
                .iter()
                .map(|g| GroupOutput {
                    canonical: entry(g.canonical),
                    members: g.members.iter().map(|&id| entry(id)).collect(),
                })
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            for group in groups {
                let canonical = entry(group.canonical);
                println!("{}\t{}", canonical.id, canonical.path);
                for &id in &group.members {
                    let member = entry(id);
                    println!("  {}\t{}", member.id, member.path);
                }
            }
        }
    }
    Ok(())
}
