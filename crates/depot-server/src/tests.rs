use std::{collections::HashMap, io::Write as _, path::Path};

use axum::{
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use depot_llm::{DEFAULT_BASE_URL, LlmClient, LlmConfig};
use depot_store_sqlite::SqliteStore;
use tower::ServiceExt;

use super::*;

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
  Some(
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect(),
  )
}

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
  let path = dir.path().join("depot.toml");
  let mut file = std::fs::File::create(&path).unwrap();
  file.write_all(contents.as_bytes()).unwrap();
  path
}

// ─── Settings ───────────────────────────────────────────────────────────────

#[test]
fn defaults_without_file_or_environment() {
  let settings = Settings::load_with_env(Path::new("/nonexistent/depot.toml"), env(&[])).unwrap();
  assert_eq!(settings.address(), "127.0.0.1:3001");
  assert_eq!(settings.backend(), Backend::Sqlite);
  assert_eq!(settings.store_path, Path::new("depot.db"));
  assert!(settings.yandex_api_key.is_none());
}

#[test]
fn environment_overrides_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_config(
    &dir,
    r#"
      host = "0.0.0.0"
      port = 8080
      backend = "supabase"
      supabase_url = "https://file.supabase.co"
      yandex_api_key = "from-file"
      completion_model = "yandexgpt/latest"
    "#,
  );

  let settings = Settings::load_with_env(
    &path,
    env(&[
      ("DEPOT_PORT", "9000"),
      ("VITE_SUPABASE_URL", "https://env.supabase.co"),
      ("VITE_SUPABASE_ANON_KEY", "anon"),
      ("YANDEX_API_KEY", "from-env"),
      ("YANDEX_FOLDER_ID", "b1gfolder"),
    ]),
  )
  .unwrap();

  assert_eq!(settings.address(), "0.0.0.0:9000");
  assert_eq!(settings.backend(), Backend::Supabase);

  let supabase = settings.supabase_config().unwrap();
  assert_eq!(supabase.url, "https://env.supabase.co");
  assert_eq!(supabase.anon_key, "anon");

  let llm = settings.llm_config().unwrap();
  assert_eq!(llm.api_key, "from-env");
  assert_eq!(llm.completion_model_uri(), "gpt://b1gfolder/yandexgpt/latest");
  assert_eq!(llm.base_url, DEFAULT_BASE_URL);
}

#[test]
fn empty_well_known_variable_does_not_clear_file_value() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_config(&dir, r#"yandex_folder_id = "b1gfile""#);
  let settings =
    Settings::load_with_env(&path, env(&[("YANDEX_FOLDER_ID", "")])).unwrap();
  assert_eq!(settings.yandex_folder_id.as_deref(), Some("b1gfile"));
}

#[test]
fn missing_credentials_name_the_variable() {
  let settings = Settings::load_with_env(
    Path::new("/nonexistent/depot.toml"),
    env(&[("YANDEX_API_KEY", "key")]),
  )
  .unwrap();

  let err = settings.llm_config().unwrap_err();
  assert!(matches!(err, SettingsError::Missing { key: "yandex_folder_id", .. }));
  assert!(err.to_string().contains("YANDEX_FOLDER_ID"));

  let err = settings.supabase_config().unwrap_err();
  assert!(err.to_string().contains("VITE_SUPABASE_URL"));
}

#[test]
fn supabase_url_selects_supabase_unless_backend_is_set() {
  let missing = Path::new("/nonexistent/depot.toml");
  let url = ("VITE_SUPABASE_URL", "https://env.supabase.co");

  let settings = Settings::load_with_env(missing, env(&[url])).unwrap();
  assert_eq!(settings.backend(), Backend::Supabase);

  let settings =
    Settings::load_with_env(missing, env(&[url, ("DEPOT_BACKEND", "sqlite")])).unwrap();
  assert_eq!(settings.backend(), Backend::Sqlite);
}

#[test]
fn unknown_backend_is_rejected() {
  let err = Settings::load_with_env(
    Path::new("/nonexistent/depot.toml"),
    env(&[("DEPOT_BACKEND", "mysql")]),
  )
  .unwrap_err();
  assert!(matches!(err, SettingsError::Load(_)));
}

// ─── Router ─────────────────────────────────────────────────────────────────

async fn make_app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let llm = LlmClient::new(LlmConfig::new("test-key", "test-folder")).unwrap();
  build_app(store, llm)
}

#[tokio::test]
async fn health_is_ok() {
  let resp = make_app()
    .await
    .oneshot(Request::get("/health").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn api_is_mounted_under_prefix() {
  let app = make_app().await;

  let resp = app
    .clone()
    .oneshot(Request::get("/api/profiles").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = app
    .oneshot(Request::get("/profiles").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_rejects_blank_message_without_calling_provider() {
  let resp = make_app()
    .await
    .oneshot(
      Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"message":"   "}"#))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
  let resp = make_app()
    .await
    .oneshot(
      Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
    "*"
  );
}
