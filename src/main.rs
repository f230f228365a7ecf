use std::sync::Arc;

use actix_web::{
    get, middleware, web::Data, App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use clap::Parser;
use prometheus::{Encoder, TextEncoder};
use tokio::sync::watch;
use tracing::{error, info};

use hub_console_sync::config::Config;
use hub_console_sync::store::session::{SessionMonitor, SessionState};
use hub_console_sync::store::stream::SyncEngine;
use hub_console_sync::store::SyncStore;
use hub_console_sync::{telemetry, Client, Metrics, State};

#[get("/metrics")]
async fn metrics(c: Data<State>, _req: HttpRequest) -> impl Responder {
    let metrics = c.metrics();
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&metrics, &mut buffer).unwrap();
    HttpResponse::Ok().body(buffer)
}

#[get("/health")]
async fn health(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok().json("healthy")
}

#[get("/")]
async fn index(c: Data<State>, _req: HttpRequest) -> impl Responder {
    let report = c.report().await;
    HttpResponse::Ok().json(&report)
}

#[get("/clusters")]
async fn clusters(c: Data<State>, _req: HttpRequest) -> impl Responder {
    HttpResponse::Ok().json(c.clusters())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::parse();
    let registry = prometheus::Registry::new();
    let sync_metrics = Arc::new(Metrics::new()?);
    sync_metrics.register(&registry)?;

    let client = Client::new(config.backend_url.clone(), config.token.clone())?
        .with_metrics(sync_metrics.clone());

    // Sync state shared with the web server
    let store = SyncStore::new(sync_metrics.clone());
    let state = State::new(registry, store.collections(), store.loading());

    let (shutdown, shutdown_rx) = watch::channel(false);
    let engine = SyncEngine::new(
        client.clone(),
        store,
        sync_metrics.clone(),
        state.diagnostics_handle(),
    );
    let engine_task = engine.spawn(shutdown_rx.clone());

    let (monitor, mut session) =
        SessionMonitor::new(client, config.session_interval(), sync_metrics);
    let monitor_task = monitor.spawn(shutdown_rx);

    // Start web server
    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(app_state.clone()))
            .wrap(middleware::Logger::default().exclude("/health"))
            .service(index)
            .service(health)
            .service(metrics)
            .service(clusters)
    })
    .bind(config.bind_addr)?
    .shutdown_timeout(5)
    .run();

    // A headless service cannot re-authenticate; an expired session ends the
    // process through the server's graceful stop.
    let server_handle = server.handle();
    let session_watch = tokio::spawn(async move {
        while session.changed().await.is_ok() {
            if *session.borrow() == SessionState::Expired {
                error!("backend session expired, shutting down");
                server_handle.stop(true).await;
                return;
            }
        }
    });

    server.await?;
    info!("web server stopped, stopping sync tasks");
    let _ = shutdown.send(true);
    let _ = tokio::join!(engine_task, monitor_task);
    session_watch.abort();
    Ok(())
}
