//! Development server with preview mode, on-demand generation and live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::ChangeSet;
use crate::cms::PREVIEW_COOKIE;
use crate::generator::Generator;
use crate::helpers::{encode_segment, is_valid_uid, post_url, url_for};
use crate::navigation::PageState;
use crate::SpaceTraveling;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Header carrying the revalidation secret
const SECRET_HEADER: &str = "x-revalidate-secret";

/// Finished fallback builds remembered before the record is reset
const MAX_FALLBACK_PAGES: usize = 1024;

/// On-demand builds by uid; `Ready(found)` tells whether the CMS had the post
type FallbackPages = HashMap<String, PageState<bool>>;

/// What a request for an unbuilt post should do
#[derive(Debug, PartialEq)]
enum Fallback {
    /// Start a background build
    Start,
    /// A build is already running
    Pending,
    /// The CMS has no such post
    Missing,
}

/// Server state
pub struct ServerState {
    app: RwLock<SpaceTraveling>,
    generator: RwLock<Arc<Generator>>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
    fallback_pages: Mutex<FallbackPages>,
    regenerating: Mutex<()>,
}

impl ServerState {
    pub fn new(app: &SpaceTraveling, live_reload: bool) -> Result<Self> {
        let generator = Generator::new(app, app.client()?)?;
        let (reload_tx, _) = broadcast::channel::<()>(16);

        Ok(Self {
            app: RwLock::new(app.clone()),
            generator: RwLock::new(Arc::new(generator)),
            reload_tx,
            live_reload,
            fallback_pages: Mutex::new(HashMap::new()),
            regenerating: Mutex::new(()),
        })
    }

    async fn generator(&self) -> Arc<Generator> {
        self.generator.read().await.clone()
    }

    async fn public_dir(&self) -> PathBuf {
        self.app.read().await.public_dir.clone()
    }

    fn decorate(&self, html: String) -> String {
        if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        }
    }

    /// Reload the config, regenerate incrementally and notify browsers
    pub async fn regenerate(&self) -> Result<ChangeSet> {
        let _guard = self.regenerating.lock().await;

        let app = self.app.read().await.reload()?;
        let changes = app.generate(false).await?;
        let generator = Generator::new(&app, app.client()?)?;

        *self.generator.write().await = Arc::new(generator);
        *self.app.write().await = app;
        self.fallback_pages
            .lock()
            .await
            .retain(|_, page| !page.is_ready());

        let _ = self.reload_tx.send(());
        Ok(changes)
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .route("/api/revalidate", post(revalidate_handler))
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(app: &SpaceTraveling, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(app, watch)?);
    let router = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching {:?}...", app.config_path);
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let config_path = app.config_path.clone();
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_config(config_path, state).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Regenerate whenever the config file changes
async fn watch_config(config_path: PathBuf, state: Arc<ServerState>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res: DebounceEventResult| {
        let _ = tx.send(res);
    })?;

    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    while let Some(result) = rx.recv().await {
        match result {
            Ok(events) if events.is_empty() => {}
            Ok(_) => {
                println!("\n📝 Config changed, regenerating...");
                match state.regenerate().await {
                    Ok(changes) => println!("✅ Regenerated: {}", changes.summary()),
                    Err(e) => println!("❌ Generation failed: {:#}", e),
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Enter preview mode and redirect to the previewed document
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    };

    let config = state.app.read().await.config.clone();
    let mut location = url_for(&config, "");

    if let Some(id) = params.document_id {
        let generator = state.generator().await;
        match generator.client().get_by_id(&id, Some(&token)).await {
            Ok(Some(doc))
                if doc.doc_type == config.cms.document_type && is_valid_uid(doc.route_id()) =>
            {
                location = post_url(&config, doc.route_id());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Preview token rejected: {}", e);
                return (StatusCode::UNAUTHORIZED, "Invalid or expired preview token")
                    .into_response();
            }
        }
    }

    tracing::info!("Preview mode enabled, redirecting to {}", location);
    (
        [(header::SET_COOKIE, preview_cookie(&token))],
        Redirect::temporary(&location),
    )
        .into_response()
}

/// Leave preview mode
async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Response {
    let home = url_for(&state.app.read().await.config, "");
    (
        [(header::SET_COOKIE, clear_preview_cookie())],
        Redirect::temporary(&home),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct RevalidateParams {
    secret: Option<String>,
}

/// Webhook: regenerate the site
async fn revalidate_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<RevalidateParams>,
    headers: HeaderMap,
) -> Response {
    let expected = state.app.read().await.config.server.revalidate_secret.clone();
    if let Some(expected) = expected.filter(|s| !s.is_empty()) {
        let given = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or(params.secret);
        if given.as_deref() != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Invalid secret" })),
            )
                .into_response();
        }
    }

    match state.regenerate().await {
        Ok(changes) => Json(serde_json::json!({
            "revalidated": true,
            "changes": changes.summary(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Revalidation failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "revalidated": false,
                    "message": format!("{:#}", e),
                })),
            )
                .into_response()
        }
    }
}

/// Home page, rendered on demand in preview mode
async fn index_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: Request<Body>,
) -> Response {
    if let Some(reference) = preview_ref(&headers) {
        let generator = state.generator().await;
        return match generator.render_index_page(Some(&reference), true).await {
            Ok(html) => Html(state.decorate(html)).into_response(),
            Err(e) => server_error(e),
        };
    }
    fallback_handler(State(state), request).await
}

/// Post page: preview render, built file, or on-demand generation
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_valid_uid(&uid) {
        return not_found(&state).await;
    }

    if let Some(reference) = preview_ref(&headers) {
        let generator = state.generator().await;
        return match generator.render_post_page(&uid, Some(&reference), true).await {
            Ok(Some(html)) => Html(state.decorate(html)).into_response(),
            Ok(None) => not_found(&state).await,
            Err(e) => server_error(e),
        };
    }

    let file = state.public_dir().await.join("post").join(&uid).join("index.html");
    if file.exists() {
        return match tokio::fs::read_to_string(&file).await {
            Ok(html) => Html(state.decorate(html)).into_response(),
            Err(e) => server_error(e.into()),
        };
    }

    let fallback = begin_build(&mut *state.fallback_pages.lock().await, &uid);
    match fallback {
        Fallback::Missing => return not_found(&state).await,
        Fallback::Pending => {}
        Fallback::Start => {
            tracing::info!("Generating {} on demand", uid);
            tokio::spawn(build_in_background(state.clone(), uid));
        }
    }

    match state.generator().await.render_loading() {
        Ok(html) => Html(state.decorate(html)).into_response(),
        Err(e) => server_error(e),
    }
}

/// Build a post that was requested before it existed on disk
async fn build_in_background(state: Arc<ServerState>, uid: String) {
    let generator = state.generator().await;
    let result = generator.generate_post(&uid).await;
    let mut pages = state.fallback_pages.lock().await;
    match result {
        Ok(found) => {
            if found {
                tracing::info!("Generated {} on demand", uid);
            } else {
                tracing::info!("No post {} in the CMS", uid);
            }
            finish_build(&mut pages, &uid, found);
            drop(pages);
            if found {
                let _ = state.reload_tx.send(());
            }
        }
        Err(e) => {
            tracing::error!("On-demand generation of {} failed: {:#}", uid, e);
            pages.remove(&uid);
        }
    }
}

fn begin_build(pages: &mut FallbackPages, uid: &str) -> Fallback {
    match pages.get(uid) {
        Some(PageState::Ready(false)) => Fallback::Missing,
        Some(PageState::Generating) => Fallback::Pending,
        // Ready(true) with no file on disk: the output was cleaned
        Some(PageState::Ready(true)) | None => {
            pages.insert(uid.to_string(), PageState::Generating);
            Fallback::Start
        }
    }
}

fn finish_build(pages: &mut FallbackPages, uid: &str, found: bool) {
    let page = pages.remove(uid).unwrap_or_default();
    pages.insert(uid.to_string(), page.complete(found));
    if pages.len() > MAX_FALLBACK_PAGES {
        pages.retain(|_, page| !page.is_ready());
    }
}

/// Fallback handler that serves files and injects live reload script
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let public_dir = state.public_dir().await;
    let path = request.uri().path().to_string();

    let clean_path = path.trim_start_matches('/');
    // Keep requests inside the public directory
    if clean_path.split('/').any(|segment| segment == "..") {
        return not_found(&state).await;
    }

    let candidate = public_dir.join(clean_path);
    let file_path = if clean_path.is_empty() || candidate.is_dir() {
        candidate.join("index.html")
    } else {
        candidate
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(state.decorate(content)).into_response(),
            Err(_) => not_found(&state).await,
        }
    } else {
        let mut service = ServeDir::new(&public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

async fn not_found(state: &ServerState) -> Response {
    match state.generator().await.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Preview ref from the request cookies
fn preview_ref(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == PREVIEW_COOKIE)
        .map(|(_, value)| {
            percent_encoding::percent_decode_str(value)
                .decode_utf8_lossy()
                .into_owned()
        })
        .filter(|value| !value.is_empty())
}

fn preview_cookie(reference: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        encode_segment(reference)
    )
}

fn clear_preview_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", PREVIEW_COOKIE)
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::fs;
    use tempfile::TempDir;

    const FIXTURES: &str = r#"{
        "documents": [
            {
                "id": "id-older", "uid": "older", "type": "posts",
                "first_publication_date": "2021-03-01T10:00:00+0000",
                "last_publication_date": "2021-03-01T10:00:00+0000",
                "data": { "title": "Older post", "author": "Ana", "content": [] }
            },
            {
                "id": "id-newer", "uid": "newer", "type": "posts",
                "first_publication_date": "2021-03-05T10:00:00+0000",
                "last_publication_date": "2021-03-05T10:00:00+0000",
                "data": { "title": "Newer post", "author": "Ana", "content": [] }
            }
        ],
        "previews": {
            "preview-ref": [
                {
                    "id": "id-newer", "uid": "newer", "type": "posts",
                    "first_publication_date": "2021-03-05T10:00:00+0000",
                    "last_publication_date": "2021-03-06T10:00:00+0000",
                    "data": { "title": "Draft title", "author": "Ana", "content": [] }
                }
            ]
        }
    }"#;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fixtures.json"), FIXTURES).unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "cms:\n  fixtures: fixtures.json\nhighlight:\n  enable: false\nserver:\n  revalidate_secret: s3cret\n",
        )
        .unwrap();
        dir
    }

    async fn serve(dir: &TempDir) -> String {
        let app = SpaceTraveling::new(dir.path()).unwrap();
        let state = Arc::new(ServerState::new(&app, false).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[test]
    fn test_preview_ref_from_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; io.prismic.preview=https%3A%2F%2Frepo.test%2Fpreviews%2Fx"));
        assert_eq!(
            preview_ref(&headers).as_deref(),
            Some("https://repo.test/previews/x")
        );

        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("io.prismic.preview="));
        assert_eq!(preview_ref(&headers), None);
        assert_eq!(preview_ref(&HeaderMap::new()), None);
    }

    #[test]
    fn test_preview_cookie_round_trip() {
        let cookie = preview_cookie("https://repo.test/previews/x?y=1");
        let value = cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_str(value).unwrap());
        assert_eq!(
            preview_ref(&headers).as_deref(),
            Some("https://repo.test/previews/x?y=1")
        );
        assert!(clear_preview_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_fallback_build_lifecycle() {
        let mut pages = FallbackPages::new();
        assert_eq!(begin_build(&mut pages, "a"), Fallback::Start);
        assert_eq!(begin_build(&mut pages, "a"), Fallback::Pending);

        finish_build(&mut pages, "a", false);
        assert_eq!(pages["a"], PageState::Ready(false));
        assert_eq!(begin_build(&mut pages, "a"), Fallback::Missing);

        assert_eq!(begin_build(&mut pages, "b"), Fallback::Start);
        finish_build(&mut pages, "b", true);
        assert_eq!(begin_build(&mut pages, "b"), Fallback::Start);
    }

    #[test]
    fn test_fallback_record_is_bounded() {
        let mut pages = FallbackPages::new();
        for n in 0..MAX_FALLBACK_PAGES {
            let uid = format!("unknown-{}", n);
            begin_build(&mut pages, &uid);
            finish_build(&mut pages, &uid, false);
        }
        assert_eq!(pages.len(), MAX_FALLBACK_PAGES);

        begin_build(&mut pages, "running");
        begin_build(&mut pages, "last");
        finish_build(&mut pages, "last", false);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages["running"], PageState::Generating);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("__livereload"));
        assert!(html.ends_with("</html>"));
        assert!(inject_live_reload("<p>x</p>").contains("__livereload"));
    }

    #[tokio::test]
    async fn test_preview_flow() {
        let dir = site();
        let base = serve(&dir).await;
        let http = client();

        let res = http
            .get(format!("{}/api/preview?token=preview-ref&documentId=id-newer", base))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()["location"], "/post/newer");
        let cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cookie.starts_with("io.prismic.preview=preview-ref;"));

        let page = http
            .get(format!("{}/post/newer", base))
            .header("cookie", "io.prismic.preview=preview-ref")
            .send()
            .await
            .unwrap();
        assert_eq!(page.status(), StatusCode::OK);
        let body = page.text().await.unwrap();
        assert!(body.contains("Draft title"));
        assert!(body.contains("Sair do modo preview"));
        assert!(!dir.path().join("public/post/newer").exists());

        let index = http
            .get(format!("{}/", base))
            .header("cookie", "io.prismic.preview=preview-ref")
            .send()
            .await
            .unwrap();
        assert!(index.text().await.unwrap().contains("Draft title"));

        let exit = http
            .get(format!("{}/api/exit-preview", base))
            .send()
            .await
            .unwrap();
        assert_eq!(exit.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(exit.headers()["location"], "/");
        assert!(exit.headers()["set-cookie"].to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_preview_requires_token() {
        let dir = site();
        let base = serve(&dir).await;
        let res = client().get(format!("{}/api/preview", base)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = client()
            .get(format!("{}/api/preview?token=unknown&documentId=id-newer", base))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_fallback_generation() {
        let dir = site();
        let base = serve(&dir).await;
        let http = client();

        let first = http.get(format!("{}/post/older", base)).send().await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert!(first.text().await.unwrap().contains("Carregando..."));

        let mut built = String::new();
        for _ in 0..100 {
            let body = http
                .get(format!("{}/post/older/", base))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap();
            if !body.contains("Carregando...") {
                built = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(built.contains("Older post"));
        assert!(built.contains("Próximo post"));
        assert!(dir.path().join("public/post/older/index.html").exists());
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_uids() {
        let dir = site();
        let base = serve(&dir).await;
        let http = client();

        let invalid = http.get(format!("{}/post/Not..Valid", base)).send().await.unwrap();
        assert_eq!(invalid.status(), StatusCode::NOT_FOUND);

        let mut status = StatusCode::OK;
        for _ in 0..100 {
            status = http
                .get(format!("{}/post/does-not-exist", base))
                .send()
                .await
                .unwrap()
                .status();
            if status == StatusCode::NOT_FOUND {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_revalidate() {
        let dir = site();
        let base = serve(&dir).await;
        let http = client();

        let denied = http
            .post(format!("{}/api/revalidate", base))
            .send()
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let ok = http
            .post(format!("{}/api/revalidate", base))
            .header(SECRET_HEADER, "s3cret")
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body: serde_json::Value = ok.json().await.unwrap();
        assert_eq!(body["revalidated"], true);
        assert!(dir.path().join("public/index.html").exists());

        let index = http.get(format!("{}/", base)).send().await.unwrap();
        assert!(index.text().await.unwrap().contains("Newer post"));

        let by_query = http
            .post(format!("{}/api/revalidate?secret=s3cret", base))
            .send()
            .await
            .unwrap();
        assert_eq!(by_query.status(), StatusCode::OK);
    }
}
