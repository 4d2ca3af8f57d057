//! FFT-based cross-correlation of micro windows against a macro window.
//!
//! Uses the convolution theorem: corr(a, b) = IFFT(FFT(a) * conj(FFT(b))).
//! The macro window's spectrum is computed once and reused for every micro
//! window slid through it, so the per-window cost is one forward and one
//! inverse FFT over the micro data.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Correlates micro windows against one fixed macro window.
pub struct MacroCorrelator {
    fft_len: usize,
    macro_len: usize,
    micro_len: usize,
    macro_spectrum: Vec<Complex<f64>>,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

/// Best alignment of a micro window within the macro window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMatch {
    /// Sample offset of the match start within the macro window.
    pub position: usize,
    /// Raw correlation magnitude at the peak (IFFT-scaled sum, not
    /// energy-normalized, so the acceptance threshold is meaningful).
    pub peak: f64,
}

impl MacroCorrelator {
    /// Prepare a correlator for the given macro window and micro length.
    ///
    /// Panics if either length is zero or the micro window is longer than
    /// the macro window; window math upstream guarantees both.
    pub fn new(macro_samples: &[f64], micro_len: usize) -> Self {
        assert!(!macro_samples.is_empty(), "empty macro window");
        assert!(
            micro_len > 0 && micro_len <= macro_samples.len(),
            "micro window length {} outside macro window of {}",
            micro_len,
            macro_samples.len()
        );

        // Pad so the full linear correlation fits without wrap-around.
        let correlation_len = macro_samples.len() + micro_len - 1;
        let fft_len = correlation_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);

        let mut macro_spectrum: Vec<Complex<f64>> = macro_samples
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        macro_spectrum.resize(fft_len, Complex::new(0.0, 0.0));
        fft.process(&mut macro_spectrum);

        Self {
            fft_len,
            macro_len: macro_samples.len(),
            micro_len,
            macro_spectrum,
            fft,
            ifft,
        }
    }

    /// Correlate one micro window and return its best alignment.
    ///
    /// Only positions where the micro window lies fully inside the macro
    /// window are scanned, so the returned position is a valid linear
    /// (not circular) correlation offset.
    pub fn best_match(&self, micro_samples: &[f64]) -> WindowMatch {
        assert_eq!(
            micro_samples.len(),
            self.micro_len,
            "micro window length drifted"
        );

        let mut micro_spectrum: Vec<Complex<f64>> = micro_samples
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        micro_spectrum.resize(self.fft_len, Complex::new(0.0, 0.0));
        self.fft.process(&mut micro_spectrum);

        // corr[n] = sum_k macro[n + k] * micro[k]
        let mut product: Vec<Complex<f64>> = self
            .macro_spectrum
            .iter()
            .zip(micro_spectrum.iter())
            .map(|(a, b)| a * b.conj())
            .collect();
        self.ifft.process(&mut product);

        // rustfft does not normalize the inverse transform.
        let scale = 1.0 / self.fft_len as f64;
        let valid = self.macro_len - self.micro_len + 1;

        let mut best_position = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (position, value) in product.iter().take(valid).enumerate() {
            let value = value.re * scale;
            if value > best_value {
                best_value = value;
                best_position = position;
            }
        }

        WindowMatch {
            position: best_position,
            peak: best_value,
        }
    }
}
