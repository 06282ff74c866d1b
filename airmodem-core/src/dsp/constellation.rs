//! Gray-coded constellations: BPSK, QPSK, 16-QAM, 64-QAM.

use num_complex::Complex64;

/// Constellation kind, named by bits-per-symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ConstellationKind {
    Bpsk,
    Qpsk,
    Qam16,
    Qam64,
}

impl ConstellationKind {
    pub fn bits_per_symbol(self) -> usize {
        match self {
            ConstellationKind::Bpsk => 1,
            ConstellationKind::Qpsk => 2,
            ConstellationKind::Qam16 => 4,
            ConstellationKind::Qam64 => 6,
        }
    }

    fn order(self) -> usize {
        match self {
            ConstellationKind::Bpsk => 2,
            ConstellationKind::Qpsk => 2,
            ConstellationKind::Qam16 => 4,
            ConstellationKind::Qam64 => 8,
        }
    }
}

fn gray(x: u32) -> u32 {
    x ^ (x >> 1)
}

/// An ordered, unit-average-power, Gray-coded constellation: point at
/// index `i` is the symbol whose bits, interpreted MSB-first, equal `i`.
#[derive(Debug, Clone)]
pub struct Constellation {
    kind: ConstellationKind,
    points: Vec<Complex64>,
}

impl Constellation {
    pub fn new(kind: ConstellationKind) -> Self {
        let points = match kind {
            ConstellationKind::Bpsk => {
                // {(±1, 0)}, Gray-trivial (one bit).
                vec![Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)]
            }
            ConstellationKind::Qpsk => {
                // {(±1, ±1)}, indexed by 2-bit Gray code on (row, col).
                let order = kind.order();
                lattice(order)
            }
            ConstellationKind::Qam16 | ConstellationKind::Qam64 => lattice(kind.order()),
        };
        let normalized = normalize_unit_power(points);
        Self { kind, points: normalized }
    }

    pub fn kind(&self) -> ConstellationKind {
        self.kind
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.kind.bits_per_symbol()
    }

    pub fn points(&self) -> &[Complex64] {
        &self.points
    }

    /// Map `bits[0..bps-1]`, MSB-first, to the constellation point at that index.
    pub fn map(&self, bits: &[u8]) -> Complex64 {
        debug_assert_eq!(bits.len(), self.bits_per_symbol());
        let index = bits.iter().fold(0usize, |acc, &b| (acc << 1) | (b as usize & 1));
        self.points[index]
    }

    /// Nearest-neighbor demap: argmin over `|x - p|^2`, ties to the lowest index.
    pub fn demap(&self, x: Complex64) -> Vec<u8> {
        let mut best_idx = 0usize;
        let mut best_dist = f64::INFINITY;
        for (i, p) in self.points.iter().enumerate() {
            let dist = (x - p).norm_sqr();
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }
        let bps = self.bits_per_symbol();
        (0..bps).rev().map(|shift| ((best_idx >> shift) & 1) as u8).collect()
    }
}

/// QAM lattice at odd coordinates, Gray-coded by the recipe:
/// `{(2*gray(col) - order + 1, 2*gray(row) - order + 1) : row, col in [0, order)}`
/// ordered so that index `row * order + col` lands at that point (MSB-first
/// bits of the index split into the row/col halves).
fn lattice(order: usize) -> Vec<Complex64> {
    let mut points = Vec::with_capacity(order * order);
    for row in 0..order {
        for col in 0..order {
            let i = (2 * gray(col as u32) as i64) - order as i64 + 1;
            let q = (2 * gray(row as u32) as i64) - order as i64 + 1;
            points.push(Complex64::new(i as f64, q as f64));
        }
    }
    points
}

fn normalize_unit_power(points: Vec<Complex64>) -> Vec<Complex64> {
    let mean_power: f64 = points.iter().map(|p| p.norm_sqr()).sum::<f64>() / points.len() as f64;
    let scale = if mean_power > 0.0 { 1.0 / mean_power.sqrt() } else { 1.0 };
    points.into_iter().map(|p| p * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_average_power() {
        for kind in [
            ConstellationKind::Bpsk,
            ConstellationKind::Qpsk,
            ConstellationKind::Qam16,
            ConstellationKind::Qam64,
        ] {
            let c = Constellation::new(kind);
            let mean_power: f64 =
                c.points().iter().map(|p| p.norm_sqr()).sum::<f64>() / c.points().len() as f64;
            assert!((mean_power - 1.0).abs() < 1e-9, "{:?}: {}", kind, mean_power);
        }
    }

    #[test]
    fn qam64_round_trip_every_index() {
        let c = Constellation::new(ConstellationKind::Qam64);
        let bps = c.bits_per_symbol();
        for index in 0..64usize {
            let bits: Vec<u8> = (0..bps).rev().map(|shift| ((index >> shift) & 1) as u8).collect();
            let point = c.map(&bits);
            let demapped = c.demap(point);
            let recovered = demapped.iter().fold(0usize, |acc, &b| (acc << 1) | (b as usize));
            assert_eq!(recovered, index);
        }
    }

    #[test]
    fn qpsk_noise_free_round_trip() {
        let c = Constellation::new(ConstellationKind::Qpsk);
        for bits in [[0u8, 0], [0, 1], [1, 0], [1, 1]] {
            let point = c.map(&bits);
            assert_eq!(c.demap(point), bits.to_vec());
        }
    }

    #[test]
    fn demap_ties_break_to_lowest_index() {
        let c = Constellation::new(ConstellationKind::Bpsk);
        // Exactly on the boundary: equidistant from both points.
        let midpoint = (c.points()[0] + c.points()[1]) / 2.0;
        let bits = c.demap(midpoint);
        let idx = bits.iter().fold(0usize, |acc, &b| (acc << 1) | (b as usize));
        assert_eq!(idx, 0);
    }
}
