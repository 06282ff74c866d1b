use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use airmodem_core::dsp::{self, Constellation};
use airmodem_core::ofdm::burst::encode_burst;
use airmodem_core::ofdm::Profile;

fn benchmark_burst_encoding(c: &mut Criterion) {
    let profile = Profile::standard();
    let constellation = Constellation::new(dsp::ConstellationKind::Qpsk);
    let payload = vec![0x42u8; 256];

    c.bench_function("encode_burst_256b_qpsk", |b| {
        b.iter(|| encode_burst(black_box(&payload), black_box(&profile), black_box(&constellation), black_box(1)))
    });
}

fn benchmark_burst_encoding_sizes(c: &mut Criterion) {
    let profile = Profile::standard();
    let constellation = Constellation::new(dsp::ConstellationKind::Qpsk);

    let mut group = c.benchmark_group("burst_encoding_payload_size");
    for size in [64, 256, 1024, 4096].iter() {
        let payload = vec![0x7eu8; *size];
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| encode_burst(black_box(&payload), black_box(&profile), black_box(&constellation), black_box(1)))
        });
    }
    group.finish();
}

fn benchmark_fft(c: &mut Criterion) {
    use airmodem_core::dsp::fft;
    let n = 512;
    let re: Vec<f64> = (0..n).map(|i| (i as f64 * 0.01).sin()).collect();
    let im = vec![0.0; n];

    c.bench_function("fft_512", |b| {
        b.iter(|| {
            let mut re = re.clone();
            let mut im = im.clone();
            fft::fft(black_box(&mut re), black_box(&mut im)).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_burst_encoding, benchmark_burst_encoding_sizes, benchmark_fft);
criterion_main!(benches);
