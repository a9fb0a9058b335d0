//! The main loop: transport in, game tick, transport out.

use std::time::{Duration, Instant};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::game::GameServer;
use crate::tick::TickLoop;
use crate::transport::UdpTransport;

/// Seconds between status lines.
const STATS_INTERVAL_SECS: u64 = 5;

/// Runs the server until `duration` elapses, or forever.
///
/// # Errors
///
/// Fails if the map file cannot be read, the socket cannot be bound, or the
/// transport thread died before shutdown.
pub fn run(config: ServerConfig, duration: Option<Duration>) -> ServerResult<()> {
    let map_data = match &config.map.file {
        Some(path) => {
            let data = std::fs::read(path)?;
            tracing::info!(path = %path.display(), bytes = data.len(), "map loaded");
            data
        }
        None => Vec::new(),
    };

    let mut transport = UdpTransport::bind(config.server.bind_address)?;
    let mut tick_loop = TickLoop::new(config.server.tick_rate);
    let stats_interval = u64::from(config.server.tick_rate) * STATS_INTERVAL_SECS;
    let mut game = GameServer::new(config, map_data);

    tracing::info!(
        addr = %transport.local_addr(),
        tick_rate_hz = 1.0 / tick_loop.dt(),
        ?duration,
        "server started"
    );

    let start = Instant::now();
    let mut last_stats_tick = 0u64;

    while duration.map_or(true, |limit| start.elapsed() < limit) {
        tick_loop.wait_for_next_tick();

        while tick_loop.should_tick() {
            let tick_start = tick_loop.begin_tick();

            while let Some(datagram) = transport.try_recv() {
                game.handle_datagram(datagram.addr, &datagram.data);
            }
            game.tick(tick_loop.dt());
            game.flush(&mut transport);

            tick_loop.end_tick(tick_start);

            let current_tick = tick_loop.tick_count();
            if current_tick - last_stats_tick >= stats_interval {
                last_stats_tick = current_tick;
                let stats = tick_loop.stats();
                tracing::info!(
                    tick = current_tick,
                    uptime_secs = start.elapsed().as_secs_f64(),
                    players = game.players().len(),
                    objects = game.world().objects().len(),
                    avg_tick_us = stats.avg_tick_us,
                    late_percent = stats.late_percent(),
                    "server status"
                );
            }
        }
    }

    let tick_stats = *tick_loop.stats();
    let transport_stats = transport.shutdown()?;
    tracing::info!(
        total_ticks = tick_stats.total_ticks,
        avg_tick_us = tick_stats.avg_tick_us,
        min_tick_us = tick_stats.min_tick_us,
        max_tick_us = tick_stats.max_tick_us,
        late_ticks = tick_stats.late_ticks,
        packets_sent = transport_stats.packets_sent,
        packets_received = transport_stats.packets_received,
        dropped = transport_stats.dropped,
        "server stopped"
    );
    Ok(())
}
