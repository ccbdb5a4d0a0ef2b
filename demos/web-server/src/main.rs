//! Example web server acting as the geofence UI layer.
//!
//! Run with: cargo run -p geofence-web-demo
//!
//! Then open http://localhost:3000 in a browser that allows geolocation.
//! `GEOFENCE_ADDR` overrides the bind address and `GEOFENCE_CONFIG` points
//! at an optional JSON monitor config.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, response::Html, routing::get};
use geofence_core::MonitorConfig;
use geofence_monitor::{GeofenceMonitor, MonitorDriver};
use geofence_providers::{NominatimGeocoder, PositionFeed};
use geofence_transport::{Dispatcher, websocket::create_ws_router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let config = match std::env::var_os("GEOFENCE_CONFIG") {
        Some(path) => MonitorConfig::from_path(&path)
            .with_context(|| format!("loading config from {}", path.to_string_lossy()))?,
        None => MonitorConfig::default(),
    };
    let addr: SocketAddr = std::env::var("GEOFENCE_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("parsing GEOFENCE_ADDR")?;
    tracing::info!(?config, "Loaded monitor config");

    let geocoder = NominatimGeocoder::new().context("building geocoder HTTP client")?;
    let positions = Arc::new(PositionFeed::new());
    let monitor = GeofenceMonitor::new(geocoder, Arc::clone(&positions), config);
    let (handle, driver) = MonitorDriver::spawn(monitor);
    let dispatcher = Arc::new(Dispatcher::new(handle.clone(), positions));

    // Build router
    let app = Router::new()
        .route("/", get(index_handler))
        .merge(create_ws_router(dispatcher))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    handle.shutdown().await;
    driver.await.context("joining monitor driver")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Geofence Alert System</title>
    <style>
        body {
            margin: 0 auto;
            padding: 20px;
            max-width: 720px;
            font-family: system-ui, sans-serif;
        }
        .row { display: flex; gap: 10px; margin-bottom: 10px; }
        .row input { flex: 1; padding: 6px; }
        button { padding: 6px 12px; margin-right: 6px; }
        .status { color: #888; font-size: 14px; margin: 10px 0; }
        #toasts { position: fixed; right: 20px; bottom: 20px; }
        .toast {
            background: #333; color: #fff; padding: 10px 14px;
            border-radius: 6px; margin-top: 8px;
        }
        .toast.success { background: #2d7a2d; }
        .toast.error { background: #a33; }
    </style>
</head>
<body>
    <h1>Geofence Alert System</h1>
    <div class="row">
        <input id="start" placeholder="Starting point (e.g., Theni)" />
        <input id="dest" placeholder="Destination (e.g., Madurai)" />
    </div>
    <div class="row">
        <input id="reminder" placeholder="Reminder location (e.g., Andipatti)" />
    </div>
    <button id="add">Add Reminder</button>
    <button id="startBtn">Set Locations &amp; Start Monitoring</button>
    <button id="stopBtn">Stop Monitoring</button>

    <div class="status" id="status">Connecting...</div>
    <div class="status" id="location"></div>
    <h3>Reminders</h3>
    <ul id="reminders"></ul>
    <h3>Notices</h3>
    <ul id="log" class="status"></ul>
    <div id="toasts"></div>

    <script>
        const $ = (id) => document.getElementById(id);
        const POLL_MS = 5000;
        let ws;

        function send(msg) {
            if (ws && ws.readyState === WebSocket.OPEN) {
                ws.send(JSON.stringify(msg));
            }
        }

        function toast(text, kind) {
            const el = document.createElement('div');
            el.className = `toast ${kind}`;
            el.textContent = text;
            $('toasts').appendChild(el);
            setTimeout(() => el.remove(), 6000);
        }

        function log(text) {
            const li = document.createElement('li');
            li.textContent = text;
            $('log').prepend(li);
        }

        function render(snapshot) {
            $('status').textContent = `Status: ${snapshot.status_label}`;
            const loc = snapshot.current_location;
            $('location').textContent = loc
                ? `Current Location: Lat ${loc.latitude}, Lng ${loc.longitude}`
                : '';
            const list = $('reminders');
            list.innerHTML = '';
            for (const r of snapshot.reminders) {
                const li = document.createElement('li');
                li.textContent = `${r.name}: Lat ${r.location.latitude}, Lng ${r.location.longitude}`
                    + (r.alerted ? ' (alerted)' : '');
                list.appendChild(li);
            }
        }

        function reportPosition() {
            if (!navigator.geolocation) {
                send({ type: 'position', error: 'Geolocation not supported by this browser' });
                return;
            }
            navigator.geolocation.getCurrentPosition(
                (p) => send({
                    type: 'position',
                    latitude: p.coords.latitude,
                    longitude: p.coords.longitude,
                }),
                (e) => send({
                    type: 'position',
                    error: `Geolocation error: ${e.code} - ${e.message}`,
                }),
                { enableHighAccuracy: true, timeout: 10000, maximumAge: 0 }
            );
        }

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            ws = new WebSocket(`${protocol}//${window.location.host}/ws`);

            ws.onopen = () => reportPosition();
            ws.onclose = () => {
                $('status').textContent = 'Disconnected - reconnecting...';
                setTimeout(connect, 2000);
            };
            ws.onmessage = (event) => {
                const msg = JSON.parse(event.data);
                if (msg.type === 'status') {
                    render(msg.snapshot);
                } else if (msg.type === 'history') {
                    $('log').innerHTML = '';
                    msg.notices.forEach((n) => log(n.message));
                } else if (msg.type === 'toast') {
                    toast(msg.message, 'alert');
                    log(msg.message);
                    send({ type: 'get_status' });
                } else if (msg.type === 'success' || msg.type === 'error') {
                    toast(msg.message, msg.type);
                    log(msg.message);
                }
            };
        }

        $('add').onclick = () => send({ type: 'add_reminder', name: $('reminder').value });
        $('startBtn').onclick = () => send({
            type: 'start_monitoring',
            start: $('start').value,
            destination: $('dest').value,
        });
        $('stopBtn').onclick = () => send({ type: 'stop_monitoring' });

        setInterval(() => {
            reportPosition();
            send({ type: 'get_status' });
        }, POLL_MS);

        connect();
    </script>
</body>
</html>
"#;
