use super::FftPlan;
use crate::error::ConfigError;
use num_complex::Complex32;
use std::f64::consts::PI;

/// Iterative in-place radix-2 decimation-in-time Cooley–Tukey transform.
///
/// Bit-reversal permutation and twiddle factors are computed once at plan
/// time, so a transform performs no allocation and no recursion.
pub struct Radix2 {
    n: usize,
    bitrev: Vec<usize>,
    //
    // e^{-2πik/n} for k in [0, n/2).
    //
    twiddles: Vec<Complex32>,
}

impl Radix2 {
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if n == 0 || !n.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(n));
        }

        let bits = n.trailing_zeros();
        let bitrev = (0..n)
            .map(|i| {
                if bits == 0 {
                    i
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        //
        // Twiddles are computed in f64 to keep rounding error flat across sizes.
        //
        let twiddles = (0..n / 2)
            .map(|k| {
                let angle = -2.0 * PI * (k as f64) / (n as f64);
                Complex32::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();

        Ok(Self {
            n,
            bitrev,
            twiddles,
        })
    }

    fn run(&self, buffer: &mut [Complex32], inverse: bool) {
        assert_eq!(
            buffer.len(),
            self.n,
            "FFT buffer length does not match plan size"
        );

        //
        // n = 1 is its own transform.
        //
        if self.n == 1 {
            return;
        }

        for (i, &j) in self.bitrev.iter().enumerate() {
            if j > i {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= self.n {
            let half = len / 2;
            let stride = self.n / len;

            for block in buffer.chunks_exact_mut(len) {
                let (lo, hi) = block.split_at_mut(half);
                for k in 0..half {
                    let w = self.twiddles[k * stride];
                    let w = if inverse { w.conj() } else { w };
                    let t = hi[k] * w;
                    hi[k] = lo[k] - t;
                    lo[k] += t;
                }
            }

            len <<= 1;
        }

        if inverse {
            let scale = 1.0 / self.n as f32;
            for x in buffer.iter_mut() {
                *x *= scale;
            }
        }
    }
}

impl FftPlan for Radix2 {
    fn xform_inplace(&self, buffer: &mut [Complex32]) {
        self.run(buffer, false);
    }

    fn inverse_inplace(&self, buffer: &mut [Complex32]) {
        self.run(buffer, true);
    }

    fn name(&self) -> String {
        format!("Radix2({})", self.n)
    }

    fn size(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn naive_dft(input: &[Complex32]) -> Vec<Complex32> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .fold(Complex32::zero(), |acc, (t, &x)| {
                        let angle = -2.0 * std::f32::consts::PI * (k * t) as f32 / n as f32;
                        acc + x * Complex32::from_polar(1.0, angle)
                    })
            })
            .collect()
    }

    fn test_signal(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| {
                let t = i as f32;
                Complex32::new((t * 0.7).sin() + 0.25 * (t * 2.3).cos(), (t * 0.1).cos() * 0.5)
            })
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert!(Radix2::new(0).is_err());
        assert!(Radix2::new(12).is_err());
        assert!(Radix2::new(1).is_ok());
    }

    #[test]
    fn size_one_returns_input_unchanged() {
        let plan = Radix2::new(1).unwrap();
        let mut buf = vec![Complex32::new(0.75, -0.5)];
        plan.xform_inplace(&mut buf);
        assert_eq!(buf[0], Complex32::new(0.75, -0.5));
    }

    #[test]
    fn matches_naive_dft_for_all_small_powers_of_two() {
        for bits in 1..=9 {
            let n = 1usize << bits;
            let plan = Radix2::new(n).unwrap();
            let input = test_signal(n);
            let expected = naive_dft(&input);

            let mut buf = input.clone();
            plan.xform_inplace(&mut buf);

            let tolerance = 1e-3 * n as f32;
            for (k, (got, want)) in buf.iter().zip(&expected).enumerate() {
                assert!(
                    (got - want).norm() < tolerance,
                    "n={n} bin {k}: got {got}, want {want}"
                );
            }
        }
    }

    #[test]
    fn inverse_round_trip() {
        for bits in 0..=10 {
            let n = 1usize << bits;
            let plan = Radix2::new(n).unwrap();
            let input = test_signal(n);

            let mut buf = input.clone();
            plan.xform_inplace(&mut buf);
            plan.inverse_inplace(&mut buf);

            for (got, want) in buf.iter().zip(&input) {
                assert!((got - want).norm() < 1e-4, "n={n}: {got} vs {want}");
            }
        }
    }

    #[test]
    fn pure_tone_lands_in_bin_two() {
        let plan = Radix2::new(8).unwrap();
        let mut buf: Vec<Complex32> = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0]
            .iter()
            .map(|&x| Complex32::new(x, 0.0))
            .collect();
        plan.xform_inplace(&mut buf);

        assert!((buf[2].norm() - 4.0).abs() < 1e-5);
        assert!((buf[6].norm() - 4.0).abs() < 1e-5);
        for k in [0, 1, 3, 4, 5, 7] {
            assert!(buf[k].norm() < 1e-5, "bin {k} = {}", buf[k]);
        }
    }

    #[test]
    fn silence_yields_zero_bins() {
        let plan = Radix2::new(32).unwrap();
        let mut buf = vec![Complex32::zero(); 32];
        plan.xform_inplace(&mut buf);
        assert!(buf.iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn dc_lands_in_bin_zero() {
        let plan = Radix2::new(16).unwrap();
        let mut buf = vec![Complex32::new(0.5, 0.0); 16];
        plan.xform_inplace(&mut buf);
        assert!((buf[0].re - 8.0).abs() < 1e-5);
        assert!(buf[1..].iter().all(|c| c.norm() < 1e-5));
    }
}
