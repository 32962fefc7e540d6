use satlaunch_server::config::ServerConfig;
use satlaunch_server::session_loop::{run_session_loop, SessionCommand};
use satlaunch_server::ws::{router, AppState};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();
    let ws_path = config.ws_path.clone();

    let (session_tx, session_rx) = mpsc::channel::<SessionCommand>(config.command_buffer);

    let app_state = AppState::new(session_tx, &config);
    let app = router(app_state, &ws_path);

    // Spawn session loop
    tokio::spawn(async move {
        run_session_loop(session_rx, config).await;
    });

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting session server on {}{}", listen_addr, ws_path);
    println!("Session server listening on {}{}", listen_addr, ws_path);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
