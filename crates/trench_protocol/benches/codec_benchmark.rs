//! # Codec Benchmark
//!
//! The per-tick hot path is one position and one orientation per player, out
//! to every client, plus whatever the clients send in.
//!
//! Run with: `cargo bench --package trench_protocol`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trench_core::Vec3;
use trench_protocol::{
    ByteWriter, CtfState, Direction, InputData, InputFlags, IntelState, ModeState, Packet,
    PacketRegistry, PositionData, Rgb, StateData,
};

/// Benchmark: Encoding a tick's worth of position updates into one reused writer.
fn bench_encode_positions(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_positions");

    for players in [8u8, 16, 32] {
        let packets: Vec<Packet> = (0..players)
            .map(|id| {
                PositionData {
                    player_id: id,
                    position: Vec3::new(f32::from(id), 256.0, 32.0),
                }
                .into()
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(players), &packets, |b, packets| {
            let mut writer = ByteWriter::with_capacity(1024);
            b.iter(|| {
                writer.clear();
                for packet in packets {
                    let _ = packet.encode(&mut writer);
                }
                black_box(writer.len())
            });
        });
    }

    group.finish();
}

/// Benchmark: Registry dispatch for small serverbound packets.
fn bench_decode_input(c: &mut Criterion) {
    let registry = PacketRegistry::for_direction(Direction::Serverbound);
    let bytes = Packet::from(InputData {
        player_id: 4,
        flags: InputFlags::from_bits(InputFlags::UP | InputFlags::FIRE),
    })
    .to_bytes()
    .unwrap_or_default();

    c.bench_function("decode_input_data", |b| {
        b.iter(|| black_box(registry.decode(black_box(&bytes))));
    });
}

/// Benchmark: The largest fixed-layout packet, with nested mode dispatch.
fn bench_state_data(c: &mut Criterion) {
    let registry = PacketRegistry::for_direction(Direction::Clientbound);
    let packet = Packet::from(StateData {
        player_id: 1,
        fog_color: Rgb::new(128, 232, 255),
        state: ModeState::Ctf(CtfState {
            team1_score: 3,
            team2_score: 4,
            cap_limit: 10,
            team1_intel: IntelState::Carried { carrier: 9 },
            team2_intel: IntelState::Dropped {
                position: Vec3::new(400.0, 256.0, 60.0),
            },
            team1_base: Vec3::new(100.0, 256.0, 60.0),
            team2_base: Vec3::new(412.0, 256.0, 60.0),
        }),
    });
    let bytes = packet.to_bytes().unwrap_or_default();

    c.bench_function("encode_state_data", |b| {
        b.iter(|| black_box(packet.to_bytes()));
    });
    c.bench_function("decode_state_data", |b| {
        b.iter(|| black_box(registry.decode(black_box(&bytes))));
    });
}

criterion_group!(
    benches,
    bench_encode_positions,
    bench_decode_input,
    bench_state_data
);
criterion_main!(benches);
