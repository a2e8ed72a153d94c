//! Smooth 2D value noise. Random values live on the integer lattice and get blended with a
//! quintic fade, so the result is continuous with a continuous first derivative.

/// A deterministic value in [0, 1] that varies smoothly with both coordinates. Non-finite input
/// gives 0.5.
pub fn value_noise(x: f64, y: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return 0.5;
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = fade(x - x0);
    let ty = fade(y - y0);
    let ix = x0 as i64;
    let iy = y0 as i64;

    let bottom = lerp(lattice(ix, iy), lattice(ix.wrapping_add(1), iy), tx);
    let top = lerp(
        lattice(ix, iy.wrapping_add(1)),
        lattice(ix.wrapping_add(1), iy.wrapping_add(1)),
        tx,
    );
    lerp(bottom, top, ty).clamp(0.0, 1.0)
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

// A pseudorandom value in [0, 1] for each lattice point
fn lattice(x: i64, y: i64) -> f64 {
    let mut h = (x as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
    // splitmix64 finalizer
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    ((h >> 11) as f64) / ((1u64 << 53) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    #[test]
    fn bounded_and_deterministic() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let x = rng.gen_range(-10_000.0..10_000.0);
            let y = rng.gen_range(0.0..500.0);
            let n = value_noise(x, y);
            assert!((0.0..=1.0).contains(&n), "noise({}, {}) = {}", x, y, n);
            assert_eq!(n, value_noise(x, y));
        }
        assert_eq!(value_noise(f64::NAN, 1.0), 0.5);
    }

    #[test]
    fn lattice_points() {
        // The fade is exactly 0 at integers, so the noise there is just the lattice value
        assert_eq!(value_noise(3.0, -7.0), lattice(3, -7));
    }

    #[test]
    fn continuous() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..1000 {
            let x = rng.gen_range(0.0..10_000.0);
            let y = rng.gen_range(0.0..100.0);
            // The steepest the quintic fade gets is 1.875, per unit of input, per axis
            let step = 1e-4;
            let diff = (value_noise(x + step, y + step) - value_noise(x, y)).abs();
            assert!(diff < 4.0 * step, "jumped by {} near ({}, {})", diff, x, y);
        }
    }

    #[test]
    fn varies() {
        let samples: Vec<f64> = (0..100).map(|i| value_noise(0.5, i as f64 * 0.37)).collect();
        let min = samples.iter().cloned().fold(f64::MAX, f64::min);
        let max = samples.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max - min > 0.1);
    }
}
