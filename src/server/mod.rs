mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

pub use self::state::*;

/// Build the API router
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/similar/{id}", get(api::similar_handler))
        .route("/colors", get(api::colors_handler))
        .route("/duplicates", get(api::duplicates_handler))
        .route("/wallpaper/{id}", get(api::wallpaper_handler))
        .route("/wallpapers", get(api::wallpapers_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::ImageId;
    use crate::color::Color;
    use crate::config::{OutputFormat, SearchOptions};
    use crate::db::{crud, init_db};
    use crate::dhash::Fingerprint;

    struct Fixture {
        _dir: tempfile::TempDir,
        app: Router,
        /// 16:9 red and blue
        wide: ImageId,
        /// 16:9 red, one bit away from `wide`
        near: ImageId,
        /// square blue, three bits away from `wide`
        square: ImageId,
        /// same content as `wide`
        copy: ImageId,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path().join("wallflower.db")).await.unwrap();
        let (red, blue) = (Color::from_rgb(255, 0, 0), Color::from_rgb(0, 0, 255));

        let mut ids = vec![];
        for (name, fingerprint, (width, height), colors) in [
            ("wide", 0u64, (1920, 1080), vec![red, blue]),
            ("near", 0b1, (1280, 720), vec![red]),
            ("square", 0b111, (500, 500), vec![blue]),
            ("copy", 0, (1920, 1080), vec![red]),
        ] {
            let id = crud::add_image(&db, name.as_bytes(), &format!("/{name}.png")).await.unwrap();
            crud::set_analysis(&db, id, Fingerprint::from(fingerprint), width, height, &colors).await.unwrap();
            ids.push(id);
        }

        let search = SearchOptions { k: 20, output_format: OutputFormat::Table };
        let app = create_app(AppState::new(db, search));
        Fixture { _dir: dir, app, wide: ids[0], near: ids[1], square: ids[2], copy: ids[3] }
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn result_ids(body: &Value) -> Vec<ImageId> {
        body["result"].as_array().unwrap().iter().map(|w| w["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_similar() {
        let f = fixture().await;

        let (status, body) = get(&f.app, &format!("/similar/{}", f.wide)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["time"].is_u64());
        assert_eq!(body["result"], json!([f.copy, f.near, f.square]));

        let (_, body) = get(&f.app, &format!("/similar/{}?k=1", f.wide)).await;
        assert_eq!(body["result"], json!([f.copy]));

        let (status, body) = get(&f.app, &format!("/similar/{}?k={}", f.wide, usize::MAX)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"].as_array().unwrap().len(), 3);

        let (status, _) = get(&f.app, "/similar/424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_colors() {
        let f = fixture().await;

        let (status, body) = get(&f.app, "/colors?color=%23FE0101&n=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], json!(["#FF0000"]));

        let (_, body) = get(&f.app, "/colors?color=%230000FF").await;
        assert_eq!(body["result"], json!(["#0000FF", "#FF0000"]));

        for uri in ["/colors?color=%23GGGGGG", "/colors", "/colors?color=%23FF0000&n=-1"] {
            let (status, _) = get(&f.app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_duplicates() {
        let f = fixture().await;

        let (status, body) = get(&f.app, "/duplicates?radius=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], json!([{ "canonical": f.wide, "members": [f.wide, f.copy] }]));

        let (_, body) = get(&f.app, "/duplicates?radius=1").await;
        assert_eq!(body["result"], json!([{ "canonical": f.wide, "members": [f.wide, f.near, f.copy] }]));

        for uri in ["/duplicates", "/duplicates?radius=-1", "/duplicates?radius=wide"] {
            let (status, _) = get(&f.app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_wallpaper() {
        let f = fixture().await;

        let (status, body) = get(&f.app, &format!("/wallpaper/{}", f.wide)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["path"], "/wide.png");
        assert_eq!(body["result"]["width"], 1920);
        assert_eq!(body["result"]["colors"], json!(["#FF0000", "#0000FF"]));
        assert!(body["result"].get("hash").is_none());

        let (status, _) = get(&f.app, "/wallpaper/424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wallpapers_filters() {
        let f = fixture().await;

        let (status, body) = get(&f.app, "/wallpapers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result_ids(&body), vec![f.wide, f.near, f.square, f.copy]);

        // blue leads the square palette and trails the wide one
        let (_, body) = get(&f.app, "/wallpapers?color=%230000FF&n=1").await;
        assert_eq!(result_ids(&body), vec![f.square, f.wide]);

        let (_, body) = get(&f.app, "/wallpapers?color=%230000FF&n=1&aspect_ratio=16:9").await;
        assert_eq!(result_ids(&body), vec![f.wide]);

        let (_, body) = get(&f.app, "/wallpapers?aspect_ratio=1&limit=5").await;
        assert_eq!(result_ids(&body), vec![f.square]);

        let (_, body) = get(&f.app, &format!("/wallpapers?similar_to={}&k=2", f.wide)).await;
        assert_eq!(result_ids(&body), vec![f.near, f.copy]);

        let uri = format!("/wallpapers?similar_to={}&k=2&ids={},{}", f.wide, f.square, f.near);
        let (_, body) = get(&f.app, &uri).await;
        assert_eq!(result_ids(&body), vec![f.near]);

        let (_, body) = get(&f.app, "/wallpapers?limit=1").await;
        assert_eq!(result_ids(&body), vec![f.wide]);

        for uri in ["/wallpapers?aspect_ratio=wide", "/wallpapers?ids=1,x", "/wallpapers?color=red", "/wallpapers?limit=-1"] {
            let (status, _) = get(&f.app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }

        let (status, _) = get(&f.app, "/wallpapers?similar_to=424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
