//! Load test for the session server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect and join the session
//! - Periodically send move messages
//! - Collect each known component kind once, early in the run
//! - Count moved/collected broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 50)
//!   --duration S     Test duration in seconds (default: 30)
//!   --move-rate R    Moves per second per client (default: 5)
//!   --url URL        Server URL (default: ws://127.0.0.1:9001/api/socket)

use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use satlaunch_shared::protocol::{ClientMsg, Position, ServerMsg, KNOWN_COMPONENT_KINDS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    joined: AtomicU64,
    messages_received: AtomicU64,
    moved_received: AtomicU64,
    collected_received: AtomicU64,
    moves_sent: AtomicU64,
    errors: AtomicU64,
    players_seen: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

// === Client task ===

async fn run_client(
    client_id: u32,
    url: String,
    move_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    metrics
        .latency_sum_ms
        .fetch_add(connect_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    let join = ClientMsg::Join {
        username: format!("Bot-{}", client_id),
    };
    if !send(&mut ws, &join).await {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let move_interval = if move_rate > 0.0 {
        Duration::from_secs_f64(1.0 / move_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };
    let mut move_timer = tokio::time::interval(move_interval);
    move_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut rng = ChaCha8Rng::seed_from_u64(client_id as u64);
    let mut pending_kinds: Vec<&str> = KNOWN_COMPONENT_KINDS.to_vec();
    let mut position = Position {
        x: 0.0,
        y: 0.25,
        z: 0.0,
    };
    let mut rotation: f64 = 0.0;
    let test_end = Instant::now() + duration;

    loop {
        if Instant::now() >= test_end {
            break;
        }

        tokio::select! {
            _ = move_timer.tick() => {
                rotation += rng.gen_range(-0.3..0.3_f64);
                position.x += rotation.sin() * 0.2;
                position.z += rotation.cos() * 0.2;

                let msg = ClientMsg::Move {
                    position,
                    rotation,
                    is_moving: true,
                    is_jumping: rng.gen_bool(0.05),
                };
                if send(&mut ws, &msg).await {
                    metrics.moves_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }

                if !pending_kinds.is_empty() && rng.gen_bool(0.1) {
                    let kind = pending_kinds.swap_remove(rng.gen_range(0..pending_kinds.len()));
                    let collect = ClientMsg::Collect {
                        kind: kind.to_string(),
                    };
                    // Send twice; the server should only announce it once
                    if !(send(&mut ws, &collect).await && send(&mut ws, &collect).await) {
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(&text) {
                            Ok(ServerMsg::Sync(_)) => {
                                metrics.joined.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Moved(m)) => {
                                metrics.moved_received.fetch_add(1, Ordering::Relaxed);
                                metrics.players_seen.fetch_add(m.players.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Collected(_)) => {
                                metrics.collected_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(_) => {}
                            Err(e) => {
                                if client_id < 3 {
                                    eprintln!("Client {} could not parse message: {}", client_id, e);
                                }
                                metrics.errors.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if client_id < 3 {
                            eprintln!("Client {} got Close: {:?}", client_id, frame);
                        }
                        break;
                    }
                    None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn send(ws: &mut Ws, msg: &ClientMsg) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return false;
    };
    ws.send(Message::Text(json.into())).await.is_ok()
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 50;
    let mut duration_secs: u64 = 30;
    let mut move_rate: f64 = 5.0;
    let mut url = "ws://127.0.0.1:9001/api/socket".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--move-rate" => {
                i += 1;
                move_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(5.0);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Session Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Move rate: {}/s per client", move_rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::default());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);

        handles.push(tokio::spawn(async move {
            run_client(client_id, url, move_rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            if elapsed >= duration_secs + 5 {
                break;
            }

            println!(
                "[{:3}s] connected={}, joined={}, msgs={}, moved={}, collected={}, moves_sent={}, errors={}",
                elapsed,
                metrics_clone.connected.load(Ordering::Relaxed),
                metrics_clone.joined.load(Ordering::Relaxed),
                metrics_clone.messages_received.load(Ordering::Relaxed),
                metrics_clone.moved_received.load(Ordering::Relaxed),
                metrics_clone.collected_received.load(Ordering::Relaxed),
                metrics_clone.moves_sent.load(Ordering::Relaxed),
                metrics_clone.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }

    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let moved = metrics.moved_received.load(Ordering::Relaxed);
    let collected = metrics.collected_received.load(Ordering::Relaxed);
    let moves_sent = metrics.moves_sent.load(Ordering::Relaxed);
    let players_seen = metrics.players_seen.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total joined: {}", metrics.joined.load(Ordering::Relaxed));
    println!("Total messages received: {}", msgs);
    println!("Total moved messages: {}", moved);
    println!("Total collected messages: {}", collected);
    println!("Total moves sent: {}", moves_sent);
    println!("Total errors: {}", metrics.errors.load(Ordering::Relaxed));
    println!(
        "Average players per moved: {}",
        if moved > 0 { players_seen / moved } else { 0 }
    );

    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    // Every move fans out to every client
    let expected_moved = moves_sent * num_clients as u64;
    println!();
    println!("Messages/sec (total): {:.0}", msgs as f64 / duration_secs as f64);
    if expected_moved > 0 {
        println!(
            "Moved delivery rate: {:.1}%",
            moved as f64 / expected_moved as f64 * 100.0
        );
    }
}
