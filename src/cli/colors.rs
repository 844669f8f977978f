use clap::Parser;
use serde_json::json;
use tokio::task::spawn_blocking;

use crate::ImageId;
use crate::cli::SubCommandExtend;
use crate::color::Color;
use crate::config::{Opts, OutputFormat};
use crate::db::{AspectRatio, DEFAULT_ASPECT_TOLERANCE, WallpaperQuery, crud, init_db, parse_aspect_ratio};
use crate::search::{ColorIndex, FingerprintIndex};

#[derive(Parser, Debug, Clone)]
pub struct ColorsCommand {
    /// Query color, #RRGGBB
    pub color: Color,
    /// Number of stored colors to match
    #[arg(short, value_name = "N", default_value_t = 20)]
    pub n: usize,
    /// Maximum number of wallpapers listed
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub limit: u32,
    /// Only list these wallpapers
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub ids: Option<Vec<ImageId>>,
    /// Only list wallpapers among the K most similar to this one
    #[arg(long, value_name = "ID")]
    pub similar_to: Option<ImageId>,
    /// Number of similar wallpapers considered by --similar-to
    #[arg(short, value_name = "K", default_value_t = 20)]
    pub k: usize,
    /// Only list wallpapers with this shape, as W:H or a ratio
    #[arg(long, value_name = "RATIO", value_parser = parse_aspect_ratio)]
    pub aspect_ratio: Option<f64>,
    /// Allowed deviation from --aspect-ratio
    #[arg(long, value_name = "EPS", default_value_t = DEFAULT_ASPECT_TOLERANCE)]
    pub tolerance: f64,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for ColorsCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = init_db(opts.conf_dir.database()).await?;
        let colors = crud::get_all_colors(&db).await?;

        let (query, n) = (self.color, self.n);
        let nearest = spawn_blocking(move || ColorIndex::build(colors).nearest_with_distance(query, n)).await?;
        let matched = nearest.iter().map(|&(color, _)| color).collect::<Vec<_>>();

        let mut filter = WallpaperQuery {
            ids: self.ids.clone(),
            colors: Some(matched.clone()),
            aspect_ratio: self.aspect_ratio.map(|ratio| AspectRatio::new(ratio, self.tolerance)).transpose()?,
        };
        if let Some(id) = self.similar_to {
            let records = crud::get_fingerprints(&db).await?;
            let k = self.k;
            let similar = spawn_blocking(move || FingerprintIndex::build(records).similar_images(id, k)).await??;
            filter.restrict_ids(similar);
        }
        let wallpapers = crud::find_wallpapers(&db, &filter, self.limit).await?;

        match self.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "colors": matched,
                    "wallpapers": wallpapers,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                for (color, distance) in &nearest {
                    println!("{color}\t{distance:.2}");
                }
                println!();
                for wallpaper in &wallpapers {
                    println!("{}\t{}", wallpaper.id, wallpaper.path);
                }
            }
        }
        Ok(())
    }
}
