//! The web front end: one page at `/` whose content follows the visitor's view state.

use std::num::{NonZeroU16, NonZeroUsize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{error, info};

use crate::constants::{MAX_UPLOAD_BYTES, SESSION_INACTIVITY_SECONDS, SESSION_SWEEP_SECONDS};
use crate::gemini::GeminiClient;

mod admin;
mod csrf;
mod in_flight;
mod prelude;
mod session;
mod session_store;
mod upload;
mod views;

use admin::{admin_login_handler, open_admin_handler};
use in_flight::InFlight;
use session_store::BoundedMemoryStore;
use views::{create_another_handler, generate_handler, navigate_home_handler, root_handler};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    gemini: Arc<GeminiClient>,
    in_flight: InFlight,
}

impl AppState {
    fn new(gemini: GeminiClient) -> Self {
        Self {
            gemini: Arc::new(gemini),
            in_flight: InFlight::default(),
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/generate", post(generate_handler))
        .route("/home", get(navigate_home_handler))
        .route("/create-another", post(create_another_handler))
        .route("/admin", get(open_admin_handler))
        .route("/admin/login", post(admin_login_handler))
}

fn build_app(state: AppState, session_store: BoundedMemoryStore, static_dir: &Path) -> Router {
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            SESSION_INACTIVITY_SECONDS,
        )));

    create_router()
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(session_layer)
        .with_state(state)
}

/// The bundled `static` directory.
pub fn default_static_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("static")
}

/// Drops expired sessions on a timer, so idle visitors don't pin memory.
async fn sweep_expired_sessions(session_store: &BoundedMemoryStore) {
    let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_SECONDS));
    // the first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Err(err) = session_store.delete_expired().await {
            error!("Failed to sweep expired sessions: {}", err);
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutting down");
}

/// Starts the web server and runs until Ctrl-C.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    gemini: GeminiClient,
    static_dir: &Path,
    session_capacity: NonZeroUsize,
) -> Result<(), anyhow::Error> {
    if !gemini.has_api_key() {
        error!("GEMINI_API_KEY is not set, every generation will fail");
    }
    let session_store = BoundedMemoryStore::new(session_capacity);
    let sweeper_store = session_store.clone();
    tokio::spawn(async move { sweep_expired_sessions(&sweeper_store).await });
    let app = build_app(AppState::new(gemini), session_store, static_dir);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;

    use crate::config::GeminiConfig;
    use crate::constants::GENERIC_FAILURE_MESSAGE;
    use crate::generation::tests::{JPEG_BYTES, PNG_BYTES};

    const BOUNDARY: &str = "zidu-test-boundary";

    async fn fake_gemini(status: StatusCode, body: serde_json::Value) -> (Url, Arc<AtomicUsize>) {
        slow_gemini(status, body, Duration::ZERO).await
    }

    async fn slow_gemini(
        status: StatusCode,
        body: serde_json::Value,
        delay: Duration,
    ) -> (Url, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().fallback(move || {
            let counter = counter.clone();
            let body = body.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                (status, axum::Json(body))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake gemini");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (
            Url::parse(&format!("http://{addr}/")).expect("fake gemini url"),
            hits,
        )
    }

    fn image_response() -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": "QUJD"}}
                ]},
                "finishReason": "STOP"
            }]
        })
    }

    fn client(api_base: Url, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-2.5-flash-image".to_string(),
            api_base,
            timeout: Duration::from_secs(5),
        })
        .expect("gemini client")
    }

    /// Drives the app like a browser, carrying the session cookie along.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        fn new(gemini: GeminiClient) -> Self {
            Self {
                app: build_app(
                    AppState::new(gemini),
                    BoundedMemoryStore::new(NonZeroUsize::new(64).expect("capacity")),
                    &default_static_dir(),
                ),
                cookie: None,
            }
        }

        async fn send(
            &mut self,
            builder: axum::http::request::Builder,
            body: Body,
        ) -> axum::response::Response {
            let builder = match &self.cookie {
                Some(cookie) => builder.header(COOKIE, cookie),
                None => builder,
            };
            let response = self
                .app
                .clone()
                .oneshot(builder.body(body).expect("request"))
                .await
                .expect("response");
            if let Some(value) = response.headers().get(SET_COOKIE) {
                let value = value.to_str().expect("cookie header");
                let pair = value.split(';').next().unwrap_or_default();
                self.cookie = Some(pair.to_string());
            }
            response
        }

        async fn get(&mut self, uri: &str) -> (StatusCode, String) {
            let response = self
                .send(Request::builder().method("GET").uri(uri), Body::empty())
                .await;
            let status = response.status();
            (status, read_body(response).await)
        }

        async fn post_form(&mut self, uri: &str, body: String) -> axum::response::Response {
            self.send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
                Body::from(body),
            )
            .await
        }

        async fn post_multipart(&mut self, body: Vec<u8>) -> axum::response::Response {
            self.post_multipart_body(Body::from(body)).await
        }

        async fn post_multipart_body(&mut self, body: Body) -> axum::response::Response {
            self.send(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    ),
                body,
            )
            .await
        }

        /// A second tab sharing this browser's session.
        fn second_tab(&self) -> Self {
            Self {
                app: self.app.clone(),
                cookie: self.cookie.clone(),
            }
        }

        async fn csrf_token(&mut self) -> String {
            let (_, body) = self.get("/").await;
            extract_csrf(&body)
        }
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn extract_csrf(body: &str) -> String {
        let marker = "name=\"csrf_token\" value=\"";
        let start = body.find(marker).expect("csrf field present") + marker.len();
        let end = body[start..].find('"').expect("csrf value terminated");
        body[start..start + end].to_string()
    }

    fn multipart_body(text: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in text {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, content_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.img\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn complete_submission(csrf: &str) -> Vec<u8> {
        multipart_body(
            &[
                ("csrf_token", csrf),
                ("name", "Alex"),
                ("childhood_year", "1995"),
                ("current_year", "2024"),
            ],
            &[
                ("childhood_image", "image/jpeg", JPEG_BYTES),
                ("current_image", "image/png", PNG_BYTES),
            ],
        )
    }

    #[tokio::test]
    async fn home_renders_the_form() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));

        let (status, body) = browser.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Reconnect with Your Younger Self."));
        assert!(body.contains("name=\"childhood_image\""));
        assert!(body.contains("name=\"current_image\""));
        assert!(!extract_csrf(&body).is_empty());
    }

    #[tokio::test]
    async fn generate_requires_csrf_token() {
        let (api_base, hits) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let _ = browser.csrf_token().await;

        let response = browser.post_multipart(complete_submission("wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incomplete_form_is_rejected() {
        let (api_base, hits) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        let body = multipart_body(
            &[
                ("csrf_token", csrf.as_str()),
                ("name", "Alex"),
                ("childhood_year", "1995"),
                ("current_year", ""),
            ],
            &[
                ("childhood_image", "image/jpeg", JPEG_BYTES),
                ("current_image", "application/octet-stream", &b""[..]),
            ],
        );
        let response = browser.post_multipart(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_generation_shows_result() {
        let (api_base, hits) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        let response = browser.post_multipart(complete_submission(&csrf)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).expect("location"), "/");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("Your Memory, Reimagined."));
        assert!(body.contains("data:image/png;base64,QUJD"));
        assert!(body.contains("download=\"zidu_memory.png\""));
        assert!(!body.contains(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn failed_generation_shows_generic_error() {
        let (api_base, hits) = fake_gemini(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"code": 500, "message": "backend exploded", "status": "INTERNAL"}}),
        )
        .await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        let response = browser.post_multipart(complete_submission(&csrf)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let (_, body) = browser.get("/").await;
        assert!(body.contains(GENERIC_FAILURE_MESSAGE));
        assert!(!body.contains("backend exploded"));
        assert!(body.contains("name=\"childhood_image\""));
    }

    #[tokio::test]
    async fn text_only_response_is_a_failure() {
        let (api_base, _) = fake_gemini(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "No."}]}, "finishReason": "SAFETY"}]}),
        )
        .await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        browser.post_multipart(complete_submission(&csrf)).await;
        let (_, body) = browser.get("/").await;
        assert!(body.contains(GENERIC_FAILURE_MESSAGE));
        assert!(!body.contains("No."));
    }

    #[tokio::test]
    async fn missing_api_key_never_calls_gemini() {
        let (api_base, hits) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, None));
        let csrf = browser.csrf_token().await;

        browser.post_multipart(complete_submission(&csrf)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let (_, body) = browser.get("/").await;
        assert!(body.contains(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn oversized_upload_lands_on_form_with_generic_error() {
        let (api_base, hits) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        let mut huge_photo = JPEG_BYTES.to_vec();
        huge_photo.resize(MAX_UPLOAD_BYTES + 1024 * 1024, 0);
        let body = multipart_body(
            &[
                ("csrf_token", csrf.as_str()),
                ("name", "Alex"),
                ("childhood_year", "1995"),
                ("current_year", "2024"),
            ],
            &[
                ("childhood_image", "image/jpeg", huge_photo.as_slice()),
                ("current_image", "image/png", PNG_BYTES),
            ],
        );
        // arrives in pieces, the way a browser upload does
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = body
            .chunks(64 * 1024)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        let response = browser
            .post_multipart_body(Body::from_stream(futures::stream::iter(chunks)))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).expect("location"), "/");
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let (_, body) = browser.get("/").await;
        assert!(body.contains(GENERIC_FAILURE_MESSAGE));
        assert!(body.contains("name=\"childhood_image\""));
    }

    #[tokio::test]
    async fn loader_shows_while_generating_and_leaving_drops_the_outcome() {
        let (api_base, hits) =
            slow_gemini(StatusCode::OK, image_response(), Duration::from_millis(1000)).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;

        let mut generating_tab = browser.second_tab();
        let generation = tokio::spawn(async move {
            generating_tab
                .post_multipart(complete_submission(&csrf))
                .await
                .status()
        });

        let mut loading_body = String::new();
        for _ in 0..100 {
            let (_, body) = browser.get("/").await;
            if body.contains("loading-page") {
                loading_body = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(loading_body.contains("loading-page"));
        assert!(loading_body.contains("http-equiv=\"refresh\""));
        assert!(!loading_body.contains("name=\"childhood_image\""));

        let (status, _) = browser.get("/home").await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        assert_eq!(generation.await.expect("generation task"), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("name=\"childhood_image\""));
        assert!(!body.contains("data:image/png;base64,QUJD"));
        assert!(!body.contains(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn create_another_returns_to_a_clean_form() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;
        browser.post_multipart(complete_submission(&csrf)).await;

        let response = browser
            .post_form("/create-another", format!("csrf_token={csrf}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("name=\"childhood_image\""));
        assert!(!body.contains("data:image/png;base64,QUJD"));
        assert!(!body.contains(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn logo_link_from_result_acts_like_create_another() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        let csrf = browser.csrf_token().await;
        browser.post_multipart(complete_submission(&csrf)).await;

        let (status, _) = browser.get("/home").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, body) = browser.get("/").await;
        assert!(body.contains("name=\"childhood_image\""));
        assert!(!body.contains("data:image/png;base64,QUJD"));
    }

    #[tokio::test]
    async fn admin_link_shows_login_then_dashboard() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));

        let (status, _) = browser.get("/admin").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, body) = browser.get("/").await;
        assert!(body.contains("Admin Login"));
        let csrf = extract_csrf(&body);

        let response = browser
            .post_form(
                "/admin/login",
                format!("csrf_token={csrf}&email=admin%40zidu.ai&password=x"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let (_, body) = browser.get("/").await;
        assert!(body.contains("Admin Dashboard"));
        assert!(body.contains("1337"));
        assert!(body.contains("Jordan"));

        browser.get("/home").await;
        let (_, body) = browser.get("/").await;
        assert!(body.contains("name=\"childhood_image\""));
    }

    #[tokio::test]
    async fn admin_login_requires_csrf_token() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));
        browser.get("/admin").await;

        let response = browser
            .post_form("/admin/login", "csrf_token=nope".to_string())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn serves_static_assets() {
        let (api_base, _) = fake_gemini(StatusCode::OK, image_response()).await;
        let mut browser = Browser::new(client(api_base, Some("key")));

        let (status, body) = browser.get("/static/site.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("revokeObjectURL"));
        let (status, _) = browser.get("/static/styles.css").await;
        assert_eq!(status, StatusCode::OK);
    }
}
