//! Preamble generation and detection (§4.E): Schmidl-Cox P1/P2 and the CE
//! symbol, plus the coarse auto-correlation and fine cross-correlation
//! detectors the streaming receiver drives.

use num_complex::Complex64;

use crate::dsp::fft;
use crate::ofdm::profile::Profile;
use crate::ofdm::symbol::peak_normalize;

/// Deterministic LCG PRNG, normative recipe (§4.E): reproducibility across
/// independent implementations is mandatory, so this must never be
/// replaced with `rand`'s own generators for preamble construction.
struct DeterministicBitStream {
    state: u64,
}

impl DeterministicBitStream {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_bit(&mut self) -> bool {
        self.state = (self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345)) % (1u64 << 31);
        (self.state as f64 / (1u64 << 31) as f64) > 0.5
    }
}

fn pseudo_random_sign(seed: u64, n: usize) -> Vec<f64> {
    let mut stream = DeterministicBitStream::new(seed);
    (0..n).map(|_| if stream.next_bit() { 1.0 } else { -1.0 }).collect()
}

/// Build P1: `+-1` on even in-band subcarriers only, seed 42. Its time
/// domain has two identical halves, enabling auto-correlation detection.
pub fn build_p1(profile: &Profile) -> Vec<f64> {
    build_training_symbol(profile, 42, true)
}

/// Build P2: `+-1` on all in-band subcarriers, seed 43.
pub fn build_p2(profile: &Profile) -> Vec<f64> {
    build_training_symbol(profile, 43, false)
}

/// Build the channel-estimation symbol: `+-1` on all in-band subcarriers,
/// seed 44. Returns `(samples, known_spectrum)` so the receiver can reuse
/// the identical known reference without regenerating it.
pub fn build_ce(profile: &Profile) -> (Vec<f64>, Vec<Complex64>) {
    let (samples, spectrum) = build_training_symbol_with_spectrum(profile, 44, false);
    (samples, spectrum)
}

fn build_training_symbol(profile: &Profile, seed: u64, even_only: bool) -> Vec<f64> {
    build_training_symbol_with_spectrum(profile, seed, even_only).0
}

fn build_training_symbol_with_spectrum(
    profile: &Profile,
    seed: u64,
    even_only: bool,
) -> (Vec<f64>, Vec<Complex64>) {
    let band_len = profile.sub_end - profile.sub_start + 1;
    let signs = pseudo_random_sign(seed, band_len);

    let mut spectrum = vec![Complex64::new(0.0, 0.0); profile.fft_size];
    for (i, k) in (profile.sub_start..=profile.sub_end).enumerate() {
        if even_only && k % 2 != 0 {
            continue;
        }
        spectrum[k] = Complex64::new(signs[i], 0.0);
    }

    let mut spectrum_sym = spectrum.clone();
    let n = spectrum_sym.len();
    for k in 1..n / 2 {
        spectrum_sym[n - k] = spectrum_sym[k].conj();
    }
    spectrum_sym[0] = Complex64::new(0.0, 0.0);
    spectrum_sym[n / 2].im = 0.0;

    let mut re: Vec<f64> = spectrum_sym.iter().map(|c| c.re).collect();
    let mut im: Vec<f64> = spectrum_sym.iter().map(|c| c.im).collect();
    fft::ifft(&mut re, &mut im).expect("profile FFT size is always a power of two");

    let cp = re[re.len() - profile.cp_len..].to_vec();
    let mut samples = cp;
    samples.extend_from_slice(&re);
    peak_normalize(&mut samples, 0.8);

    (samples, spectrum_sym)
}

/// Result of the coarse auto-correlation scan.
#[derive(Debug, Clone, Copy)]
pub struct CoarseMatch {
    pub position: usize,
    pub metric: f64,
}

/// Coarse, streaming-friendly O(n) auto-correlation detector over a whole
/// buffer (a non-incremental convenience wrapper; `AutoCorrelationScanner`
/// below is the incremental form the streaming receiver actually drives).
pub fn coarse_detect(signal: &[f64], half_len: usize) -> Option<CoarseMatch> {
    let mut scanner = AutoCorrelationScanner::new(half_len);
    let mut best: Option<CoarseMatch> = None;
    for d in 0..signal.len().saturating_sub(2 * half_len) {
        let window = &signal[d..d + 2 * half_len];
        let metric = scanner.metric_for_window(window);
        if metric > 0.5 && best.map_or(true, |b| metric > b.metric) {
            best = Some(CoarseMatch { position: d, metric });
        }
    }
    best
}

/// Incremental auto-correlation scanner: `P(d) = sum s[d+m]*s[d+m+N/2]`,
/// `R_a`, `R_b` over `m in [0, N/2)`, updated by one add/subtract per step
/// as the window slides, per §4.E.
pub struct AutoCorrelationScanner {
    half_len: usize,
    window: std::collections::VecDeque<f64>,
    p: f64,
    ra: f64,
    rb: f64,
}

impl AutoCorrelationScanner {
    pub fn new(half_len: usize) -> Self {
        Self {
            half_len,
            window: std::collections::VecDeque::with_capacity(2 * half_len),
            p: 0.0,
            ra: 0.0,
            rb: 0.0,
        }
    }

    /// Metric for one fixed window position, computed from scratch. Used
    /// by the batch convenience wrapper `coarse_detect`.
    pub fn metric_for_window(&self, window: &[f64]) -> f64 {
        debug_assert_eq!(window.len(), 2 * self.half_len);
        let (first, second) = window.split_at(self.half_len);
        let p: f64 = first.iter().zip(second.iter()).map(|(a, b)| a * b).sum();
        let ra: f64 = first.iter().map(|a| a * a).sum();
        let rb: f64 = second.iter().map(|b| b * b).sum();
        Self::metric_from(p, ra, rb)
    }

    fn metric_from(p: f64, ra: f64, rb: f64) -> f64 {
        if ra * rb <= 0.0 {
            0.0
        } else {
            (p * p) / (ra * rb)
        }
    }

    /// Feed one new sample and slide the window forward by one position.
    /// Returns the metric for the new window once `2*half_len` samples
    /// have been seen; `None` while still filling the initial window.
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        let n = 2 * self.half_len;
        if self.window.len() < n {
            self.window.push_back(sample);
            if self.window.len() == n {
                let (first, second): (Vec<f64>, Vec<f64>) =
                    (self.window.iter().take(self.half_len).copied().collect(), self.window.iter().skip(self.half_len).copied().collect());
                self.p = first.iter().zip(second.iter()).map(|(a, b)| a * b).sum();
                self.ra = first.iter().map(|a| a * a).sum();
                self.rb = second.iter().map(|b| b * b).sum();
                return Some(Self::metric_from(self.p, self.ra, self.rb));
            }
            return None;
        }

        let s0 = self.window[0];
        let smid = self.window[self.half_len];
        self.p += smid * sample - s0 * smid;
        self.ra += smid * smid - s0 * s0;
        self.rb += sample * sample - smid * smid;
        self.window.pop_front();
        self.window.push_back(sample);
        Some(Self::metric_from(self.p, self.ra, self.rb))
    }
}

/// Fine cross-correlation detector around a coarse estimate (§4.E).
/// Returns the best offset (absolute position in `signal`) and its metric.
pub fn fine_detect(signal: &[f64], p1: &[f64], coarse_pos: usize, radius: usize) -> CoarseMatch {
    let e_t: f64 = p1.iter().map(|v| v * v).sum();
    let lo = coarse_pos.saturating_sub(radius);
    let hi = (coarse_pos + radius).min(signal.len().saturating_sub(p1.len()));

    let mut best_pos = coarse_pos;
    let mut best_metric = f64::NEG_INFINITY;
    for d in lo..=hi {
        let window = &signal[d..d + p1.len()];
        let cross: f64 = window.iter().zip(p1.iter()).map(|(a, b)| a * b).sum();
        let energy: f64 = window.iter().map(|v| v * v).sum();
        let denom = (e_t * energy).sqrt();
        let metric = if denom > 0.0 { cross / denom } else { 0.0 };
        if metric > best_metric {
            best_metric = metric;
            best_pos = d;
        }
    }
    CoarseMatch { position: best_pos, metric: best_metric }
}

/// Channel estimation (§4.E): `H[k] = Y[k] * conj(X_known[k]) / |X_known[k]|^2`
/// for in-band bins with nonzero known energy; `None` holes are linearly
/// interpolated across neighboring estimated bins.
pub fn estimate_channel(
    ce_samples: &[f64],
    profile: &Profile,
    known_spectrum: &[Complex64],
) -> Vec<Complex64> {
    let body = &ce_samples[profile.cp_len..];
    let (mut re, mut im) = (body.to_vec(), vec![0.0; body.len()]);
    fft::fft(&mut re, &mut im).expect("profile FFT size is always a power of two");
    let y: Vec<Complex64> = re.iter().zip(im.iter()).map(|(&r, &i)| Complex64::new(r, i)).collect();

    let mut h: Vec<Option<Complex64>> = vec![None; profile.fft_size];
    for k in profile.sub_start..=profile.sub_end {
        let known_pow = known_spectrum[k].norm_sqr();
        if known_pow > 1e-10 {
            h[k] = Some(y[k] * known_spectrum[k].conj() / known_pow);
        }
    }

    interpolate_holes(&mut h, profile);
    h.into_iter().map(|v| v.unwrap_or(Complex64::new(0.0, 0.0))).collect()
}

fn interpolate_holes(h: &mut [Option<Complex64>], profile: &Profile) {
    let band: Vec<usize> = (profile.sub_start..=profile.sub_end).collect();
    for (i, &k) in band.iter().enumerate() {
        if h[k].is_some() {
            continue;
        }
        let prev = band[..i].iter().rev().find_map(|&j| h[j].map(|v| (j, v)));
        let next = band[i + 1..].iter().find_map(|&j| h[j].map(|v| (j, v)));
        h[k] = match (prev, next) {
            (Some((pj, pv)), Some((nj, nv))) => {
                let t = (k - pj) as f64 / (nj - pj) as f64;
                Some(pv + (nv - pv) * t)
            }
            (Some((_, pv)), None) => Some(pv),
            (None, Some((_, nv))) => Some(nv),
            (None, None) => None,
        };
    }
}

/// Fraction of in-band subcarriers whose estimated `|H[k]|^2` is above
/// tolerance; used by the receiver to decide `ChannelUnobservable`.
pub fn observable_fraction(channel: &[Complex64], profile: &Profile) -> f64 {
    let total = profile.sub_end - profile.sub_start + 1;
    let good = (profile.sub_start..=profile.sub_end)
        .filter(|&k| channel[k].norm_sqr() > 1e-10)
        .count();
    good as f64 / total as f64
}
