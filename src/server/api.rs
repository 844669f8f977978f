use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use log::info;
use tokio::task::spawn_blocking;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::ImageId;
use crate::color::Color;
use crate::db::{WallpaperQuery, WallpaperRecord, crud};
use crate::duplicate::{DuplicateGroup, find_duplicates};
use crate::error::Error;
use crate::search::{ColorIndex, FingerprintIndex};

/// Wallpapers most similar to a stored one
pub async fn similar_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ImageId>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Timed<Vec<ImageId>>>> {
    let start = Instant::now();
    let k = query.k.unwrap_or(state.search.k);

    let records = crud::get_fingerprints(&state.db).await?;
    let result = spawn_blocking(move || FingerprintIndex::build(records).similar_images(id, k)).await??;

    info!("similar to {id}: {} results", result.len());
    Ok(Json(Timed { time: start.elapsed().as_millis(), result }))
}

/// Stored colors nearest to the query color
pub async fn colors_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ColorsQuery>,
) -> Result<Json<Timed<Vec<Color>>>> {
    let start = Instant::now();
    let color: Color = query.color.parse()?;
    let n = query.n.unwrap_or(state.search.k);

    let colors = crud::get_all_colors(&state.db).await?;
    let result = spawn_blocking(move || ColorIndex::build(colors).nearest_colors(color, n)).await?;

    Ok(Json(Timed { time: start.elapsed().as_millis(), result }))
}

/// Current duplicate groups, computed on request without touching the stored flags
pub async fn duplicates_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DuplicatesQuery>,
) -> Result<Json<Timed<Vec<DuplicateGroup>>>> {
    let start = Instant::now();

    let records = crud::get_fingerprints(&state.db).await?;
    let result = spawn_blocking(move || find_duplicates(records, query.radius)).await?;

    Ok(Json(Timed { time: start.elapsed().as_millis(), result }))
}

/// A stored wallpaper with its palette
pub async fn wallpaper_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ImageId>,
) -> Result<Json<Timed<WallpaperDetail>>> {
    let start = Instant::now();

    let record = crud::get_image(&state.db, id).await?.ok_or(Error::UnknownId(id))?;
    let colors = crud::get_colors(&state.db, id).await?;

    Ok(Json(Timed { time: start.elapsed().as_millis(), result: WallpaperDetail { record, colors } }))
}

/// Non-duplicate wallpapers matching a combination of color, id, similarity
/// and aspect ratio filters
pub async fn wallpapers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WallpapersQuery>,
) -> Result<Json<Timed<Vec<WallpaperRecord>>>> {
    let start = Instant::now();

    let mut filter = WallpaperQuery {
        ids: query.parse_ids()?,
        colors: None,
        aspect_ratio: query.parse_aspect_ratio()?,
    };

    if let Some(color) = &query.color {
        let color: Color = color.parse()?;
        let n = query.n.unwrap_or(state.search.k);
        let colors = crud::get_all_colors(&state.db).await?;
        filter.colors = Some(spawn_blocking(move || ColorIndex::build(colors).nearest_colors(color, n)).await?);
    }

    if let Some(id) = query.similar_to {
        let k = query.k.unwrap_or(state.search.k);
        let records = crud::get_fingerprints(&state.db).await?;
        let similar = spawn_blocking(move || FingerprintIndex::build(records).similar_images(id, k)).await??;
        filter.restrict_ids(similar);
    }

    let limit = query.limit.unwrap_or(state.search.k.try_into().unwrap_or(u32::MAX));
    let result = crud::find_wallpapers(&state.db, &filter, limit).await?;

    info!("wallpaper query {filter:?}: {} results", result.len());
    Ok(Json(Timed { time: start.elapsed().as_millis(), result }))
}
