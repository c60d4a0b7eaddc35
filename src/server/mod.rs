//! Development server with periodic revalidation and live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::CancelToken;
use crate::SpaceTraveling;

/// Reconnecting client that reloads the page after each revalidation
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function connect() {
  var socket = new WebSocket('ws://' + location.host + '/__livereload');
  socket.onmessage = function (event) {
    if (event.data === 'reload') location.reload();
  };
  socket.onclose = function () {
    setTimeout(connect, 2000);
  };
})();
</script>
"#;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the development server.
///
/// Serves the public directory until `cancel` fires. Unless `static_mode`
/// is set, the site is regenerated every `cms.revalidate_secs` and
/// connected browsers reload after each successful run.
pub async fn start(
    site: &SpaceTraveling,
    ip: &str,
    port: u16,
    static_mode: bool,
    open: bool,
    cancel: CancelToken,
) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);
    let live_reload = !static_mode;

    let state = Arc::new(ServerState {
        public_dir: site.public_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload,
    });

    let app = Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);

    let revalidate_secs = site.config.cms.revalidate_secs;
    if live_reload && revalidate_secs > 0 {
        println!(
            "Live reload enabled. Revalidating every {}s...",
            revalidate_secs
        );
        let site = site.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            revalidate(site, Duration::from_secs(revalidate_secs), reload_tx, cancel).await;
        });
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Regenerate the site on every tick until cancelled
async fn revalidate(
    site: SpaceTraveling,
    period: Duration,
    reload_tx: broadcast::Sender<()>,
    cancel: CancelToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // the first tick completes immediately and the site was just generated
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        tracing::info!("Revalidating...");
        match site.generate(&cancel).await {
            Ok(_) => {
                tracing::info!("Regenerated successfully");
                // Notify all connected clients to reload
                let _ = reload_tx.send(());
            }
            Err(e) if cancel.is_cancelled() => {
                tracing::debug!("Revalidation interrupted: {}", e);
                break;
            }
            Err(e) => {
                tracing::error!("Regeneration failed: {}", e);
            }
        }
    }
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reloads = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, reloads))
}

/// Forward regeneration events to one browser until either side goes away
async fn push_reloads(mut socket: WebSocket, mut reloads: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            event = reloads.recv() => match event {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".to_string())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve the public directory.
///
/// HTML pages are read directly so the live reload client can be added;
/// everything else goes through `ServeDir`.
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let Some(file_path) = resolve_path(&state.public_dir, request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let is_html = matches!(
        file_path.extension().and_then(|ext| ext.to_str()),
        Some("html" | "htm")
    );
    if !(is_html && state.live_reload) {
        let mut files = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
        return match files.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(e) => {
                tracing::error!("Failed to serve {:?}: {}", file_path, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        };
    }

    match tokio::fs::read_to_string(&file_path).await {
        Ok(page) => Html(inject_live_reload(&page)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Map a request path to a file under `public_dir`.
///
/// Post directories are named by the raw uid, so the path is percent-decoded
/// first. Returns `None` for paths that would leave `public_dir`.
fn resolve_path(public_dir: &Path, path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let clean_path = decoded.trim_start_matches('/');

    if clean_path.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }
    if clean_path.is_empty() {
        return Some(public_dir.join("index.html"));
    }

    let candidate = public_dir.join(clean_path);
    if candidate.is_dir() {
        return Some(candidate.join("index.html"));
    }
    let with_html = public_dir.join(format!("{}.html", clean_path));
    if !candidate.exists() && with_html.exists() {
        return Some(with_html);
    }
    Some(candidate)
}

/// Place the live reload client before `</body>`, or at the end
fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], LIVE_RELOAD_SCRIPT, &html[at..]),
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
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
