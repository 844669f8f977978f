use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Result, Sqlite, SqlitePool};

use super::{WallpaperQuery, WallpaperRecord};
use crate::ImageId;
use crate::color::Color;
use crate::dhash::Fingerprint;

fn decode_error(err: crate::Error) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

/// Add a wallpaper, returns its id
pub async fn add_image<'c, E>(executor: E, hash: &[u8], path: &str) -> Result<ImageId>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO wallpaper (hash, path)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(hash)
    .bind(path)
    .fetch_one(executor)
    .await
}

/// Check whether a file with this content hash was already added
pub async fn check_image_hash<'c, E>(executor: E, hash: &[u8]) -> Result<bool>
where
    E: Executor<'c, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallpaper WHERE hash = ?")
        .bind(hash)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

pub async fn update_image_path<'c, E>(executor: E, hash: &[u8], path: &str) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query("UPDATE wallpaper SET path = ? WHERE hash = ?")
        .bind(path)
        .bind(hash)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get_image<'c, E>(executor: E, id: ImageId) -> Result<Option<WallpaperRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM wallpaper WHERE id = ?").bind(id).fetch_optional(executor).await
}

/// Paths of the given wallpapers, ids that do not exist are left out
pub async fn get_paths<'c, E>(executor: E, ids: &[ImageId]) -> Result<HashMap<ImageId, String>>
where
    E: Executor<'c, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut query = QueryBuilder::<Sqlite>::new("SELECT id, path FROM wallpaper WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(ImageId, String)> = query.build_query_as().fetch_all(executor).await?;
    Ok(rows.into_iter().collect())
}

/// Wallpapers not analyzed yet with an id greater than `after`, in id order
pub async fn get_unanalyzed<'c, E>(executor: E, after: ImageId, limit: i64) -> Result<Vec<WallpaperRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT * FROM wallpaper
        WHERE analyzed = 0 AND id > ?
        ORDER BY id ASC LIMIT ?
        "#,
    )
    .bind(after)
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Store the analysis of a wallpaper, replacing its previous palette
pub async fn set_analysis(
    executor: &SqlitePool,
    id: ImageId,
    fingerprint: Fingerprint,
    width: u32,
    height: u32,
    colors: &[Color],
) -> Result<()> {
    let mut tx = executor.begin().await?;

    sqlx::query(
        r#"
        UPDATE wallpaper
        SET dhash = ?, width = ?, height = ?, analyzed = 1
        WHERE id = ?
        "#,
    )
    .bind(fingerprint.to_string())
    .bind(width as i64)
    .bind(height as i64)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM wallpaper_color WHERE wallpaper_id = ?").bind(id).execute(&mut *tx).await?;

    for (rank, color) in colors.iter().enumerate() {
        sqlx::query("INSERT INTO wallpaper_color (wallpaper_id, color, rank) VALUES (?, ?, ?)")
            .bind(id)
            .bind(color.value() as i64)
            .bind(rank as i64)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// `(id, fingerprint)` of every analyzed wallpaper, in id order
pub async fn get_fingerprints<'c, E>(executor: E) -> Result<Vec<(ImageId, Fingerprint)>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows: Vec<(ImageId, String)> =
        sqlx::query_as("SELECT id, dhash FROM wallpaper WHERE dhash IS NOT NULL ORDER BY id")
            .fetch_all(executor)
            .await?;
    rows.into_iter()
        .map(|(id, dhash)| Ok((id, dhash.parse().map_err(decode_error)?)))
        .collect()
}

/// Palette of a wallpaper, most frequent color first
pub async fn get_colors<'c, E>(executor: E, id: ImageId) -> Result<Vec<Color>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let values: Vec<i64> =
        sqlx::query_scalar("SELECT color FROM wallpaper_color WHERE wallpaper_id = ? ORDER BY rank")
            .bind(id)
            .fetch_all(executor)
            .await?;
    values.into_iter().map(to_color).collect()
}

/// Every distinct stored color, in the order they were first stored
pub async fn get_all_colors<'c, E>(executor: E) -> Result<Vec<Color>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let values: Vec<i64> =
        sqlx::query_scalar("SELECT color FROM wallpaper_color GROUP BY color ORDER BY MIN(rowid)")
            .fetch_all(executor)
            .await?;
    values.into_iter().map(to_color).collect()
}

fn to_color(value: i64) -> Result<Color> {
    let value = u32::try_from(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Color::from_packed(value).map_err(decode_error)
}

/// Replace all duplicate flags, wallpapers missing from `flags` are cleared
pub async fn set_duplicates(executor: &SqlitePool, flags: &HashMap<ImageId, bool>) -> Result<()> {
    let mut tx = executor.begin().await?;
    sqlx::query("UPDATE wallpaper SET duplicate = 0").execute(&mut *tx).await?;
    for (id, duplicate) in flags {
        sqlx::query("UPDATE wallpaper SET duplicate = ? WHERE id = ?")
            .bind(duplicate)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Non-duplicate wallpapers matching every filter of `query`
///
/// With a color filter the result is ordered by how prominent the matched
/// color is in each palette, otherwise by id.
pub async fn find_wallpapers<'c, E>(executor: E, query: &WallpaperQuery, limit: u32) -> Result<Vec<WallpaperRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let colors = query.colors.as_deref();
    let ids = query.ids.as_deref();
    if colors.is_some_and(|c| c.is_empty()) || ids.is_some_and(|i| i.is_empty()) {
        return Ok(vec![]);
    }

    let mut builder = QueryBuilder::<Sqlite>::new("SELECT w.* FROM wallpaper w");
    if colors.is_some() {
        builder.push(" JOIN wallpaper_color c ON c.wallpaper_id = w.id");
    }
    builder.push(" WHERE w.duplicate = 0");

    if let Some(colors) = colors {
        builder.push(" AND c.color IN (");
        let mut separated = builder.separated(", ");
        for color in colors {
            separated.push_bind(color.value() as i64);
        }
        separated.push_unseparated(")");
    }
    if let Some(ids) = ids {
        builder.push(" AND w.id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
    }
    if let Some(aspect) = query.aspect_ratio {
        builder
            .push(" AND w.height > 0 AND ABS(CAST(w.width AS REAL) / w.height - ")
            .push_bind(aspect.ratio)
            .push(") <= ")
            .push_bind(aspect.tolerance);
    }

    if colors.is_some() {
        builder.push(" GROUP BY w.id ORDER BY MIN(c.rank) ASC, w.id ASC");
    } else {
        builder.push(" ORDER BY w.id ASC");
    }
    builder.push(" LIMIT ").push_bind(limit as i64);

    builder.build_query_as().fetch_all(executor).await
}
