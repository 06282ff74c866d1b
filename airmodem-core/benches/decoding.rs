use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use airmodem_core::dsp::{self, Constellation};
use airmodem_core::ofdm::burst::{decode_from_position, encode_burst, locate_preamble};
use airmodem_core::ofdm::Profile;
use airmodem_core::transmit::build_signal;

fn build_test_signal(payload_len: usize) -> (Vec<f64>, Profile, Constellation) {
    let profile = Profile::standard();
    let constellation = Constellation::new(dsp::ConstellationKind::Qpsk);
    let payload = vec![0x5au8; payload_len];
    let burst = encode_burst(&payload, &profile, &constellation, 1);
    let signal = build_signal(
        profile.sample_rate,
        0.3,
        &burst.p1,
        &burst.p2,
        &burst.ce,
        &burst.data_symbols,
        0.02,
        0.8,
    );
    (signal, profile, constellation)
}

fn benchmark_preamble_detection(c: &mut Criterion) {
    let (signal, profile, _) = build_test_signal(256);

    c.bench_function("locate_preamble_256b_payload", |b| {
        b.iter(|| locate_preamble(black_box(&signal), black_box(&profile)))
    });
}

fn benchmark_full_burst_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_decode_payload_size");
    for size in [64, 256, 1024, 4096].iter() {
        let (signal, profile, constellation) = build_test_signal(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let pos = locate_preamble(black_box(&signal), black_box(&profile)).unwrap();
                decode_from_position(black_box(&signal), pos, &profile, &constellation, 1, None)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_preamble_detection, benchmark_full_burst_decode);
criterion_main!(benches);
