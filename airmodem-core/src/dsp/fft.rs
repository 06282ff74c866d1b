//! Radix-2 in-place Cooley-Tukey FFT/IFFT over separate real/imaginary
//! slices, used by the OFDM symbol codec for subcarrier mapping and
//! demapping.

use crate::errors::DspError;

fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

fn bit_reverse_permute(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }
}

fn transform(re: &mut [f64], im: &mut [f64], inverse: bool) -> Result<(), DspError> {
    let n = re.len();
    if n != im.len() || n == 0 || !is_power_of_two(n) {
        return Err(DspError::InvalidFftSize { size: n });
    }

    bit_reverse_permute(re, im);

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2usize;
    while len <= n {
        let half = len / 2;
        let angle_step = sign * 2.0 * std::f64::consts::PI / len as f64;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let angle = angle_step * k as f64;
                let (wr, wi) = (angle.cos(), angle.sin());
                let even_idx = start + k;
                let odd_idx = start + k + half;
                let odd_re = re[odd_idx] * wr - im[odd_idx] * wi;
                let odd_im = re[odd_idx] * wi + im[odd_idx] * wr;
                re[odd_idx] = re[even_idx] - odd_re;
                im[odd_idx] = im[even_idx] - odd_im;
                re[even_idx] += odd_re;
                im[even_idx] += odd_im;
            }
        }
        len <<= 1;
    }

    if inverse {
        let scale = 1.0 / n as f64;
        for (r, i) in re.iter_mut().zip(im.iter_mut()) {
            *r *= scale;
            *i *= scale;
        }
    }

    Ok(())
}

/// Forward FFT in place. `re`/`im` must have equal, power-of-two length.
pub fn fft(re: &mut [f64], im: &mut [f64]) -> Result<(), DspError> {
    transform(re, im, false)
}

/// Inverse FFT in place (includes the 1/N scaling).
pub fn ifft(re: &mut [f64], im: &mut [f64]) -> Result<(), DspError> {
    transform(re, im, true)
}

/// `real_fft(x) = fft(x, zeros)`; returns the real/imaginary parts.
pub fn real_fft(x: &[f64]) -> Result<(Vec<f64>, Vec<f64>), DspError> {
    let mut re = x.to_vec();
    let mut im = vec![0.0; x.len()];
    fft(&mut re, &mut im)?;
    Ok((re, im))
}

/// `real_ifft(R, I)` runs the inverse transform and discards the imaginary part.
pub fn real_ifft(re: &[f64], im: &[f64]) -> Result<Vec<f64>, DspError> {
    let mut re = re.to_vec();
    let mut im = im.to_vec();
    ifft(&mut re, &mut im)?;
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_random_length_16() {
        let mut re: Vec<f64> = (0..16).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut im = vec![0.0; 16];
        let orig = re.clone();

        fft(&mut re, &mut im).unwrap();
        ifft(&mut re, &mut im).unwrap();

        for (a, b) in re.iter().zip(orig.iter()) {
            assert!((a - b).abs() < 1e-10, "{} vs {}", a, b);
        }
        for v in &im {
            assert!(v.abs() < 1e-10);
        }
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut re = vec![0.0; 6];
        let mut im = vec![0.0; 6];
        assert!(matches!(
            fft(&mut re, &mut im),
            Err(DspError::InvalidFftSize { size: 6 })
        ));
    }

    #[test]
    fn rejects_zero_length() {
        let mut re: Vec<f64> = vec![];
        let mut im: Vec<f64> = vec![];
        assert!(fft(&mut re, &mut im).is_err());
    }

    #[test]
    fn rejects_length_two_edge_case() {
        // FFT_SIZE = 2 is a power of two and must be *accepted* here; the
        // spec's boundary requirement is about OFDM FFT_SIZE choices
        // elsewhere, not this primitive.
        let mut re = vec![1.0, -1.0];
        let mut im = vec![0.0, 0.0];
        assert!(fft(&mut re, &mut im).is_ok());
    }

    #[test]
    fn dc_signal_has_energy_only_at_bin_zero() {
        let x = vec![1.0; 8];
        let (re, im) = real_fft(&x).unwrap();
        assert!((re[0] - 8.0).abs() < 1e-10);
        for k in 1..8 {
            assert!(re[k].abs() < 1e-9 && im[k].abs() < 1e-9);
        }
    }
}
