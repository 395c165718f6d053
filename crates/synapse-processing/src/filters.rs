//! Digital filters for the conditioning cascade
//!
//! Everything is built from biquad sections. The notch is a single
//! section; the Butterworth bandpass is a cascade of highpass and
//! lowpass sections with the exact pole quality factors for the
//! requested order. Filters are applied zero-phase: forward over an
//! odd-extended copy of the window, then backward, so no stage shifts
//! the signal in time.

use std::f32::consts::PI;

use synapse_core::{SynapseError, SynapseResult};

/// Coefficients for one normalized biquad section
///
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Notch section at `freq` Hz with quality factor `q`
    pub fn notch(freq: f32, q: f32, rate_hz: f32) -> Self {
        let omega = 2.0 * PI * freq / rate_hz;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        BiquadCoeffs {
            b0: 1.0 / a0,
            b1: -2.0 * cos_omega / a0,
            b2: 1.0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Lowpass section at `cutoff` Hz with quality factor `q`
    pub fn lowpass(cutoff: f32, q: f32, rate_hz: f32) -> Self {
        let omega = 2.0 * PI * cutoff / rate_hz;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        let b1 = 1.0 - cos_omega;
        let b0 = b1 / 2.0;
        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Highpass section at `cutoff` Hz with quality factor `q`
    pub fn highpass(cutoff: f32, q: f32, rate_hz: f32) -> Self {
        let omega = 2.0 * PI * cutoff / rate_hz;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        let b0 = (1.0 + cos_omega) / 2.0;
        BiquadCoeffs {
            b0: b0 / a0,
            b1: -2.0 * b0 / a0,
            b2: b0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Quality factors of the biquad sections of an even-order Butterworth
/// filter: Q_k = 1 / (2 sin(pi (2k+1) / (2N)))
fn butterworth_section_qs(order: usize) -> Vec<f32> {
    let n = order as f32;
    (0..order / 2)
        .map(|k| {
            let angle = PI * (2.0 * k as f32 + 1.0) / (2.0 * n);
            1.0 / (2.0 * angle.sin())
        })
        .collect()
}

/// One biquad with running state (Direct Form I)
#[derive(Debug, Clone)]
struct BiquadSection {
    coeffs: BiquadCoeffs,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadSection {
    fn new(coeffs: BiquadCoeffs) -> Self {
        BiquadSection {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Set the section state to its steady-state response for a
    /// constant input, and return that steady-state output so cascaded
    /// sections can be primed in turn. Without this, a pole close to
    /// z = 1 (the 1 Hz highpass at EEG rates) rings for hundreds of
    /// samples off the zero state.
    fn prime(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let denom = 1.0 + c.a1 + c.a2;
        let output = if denom.abs() > f32::EPSILON {
            input * (c.b0 + c.b1 + c.b2) / denom
        } else {
            0.0
        };
        self.x1 = input;
        self.x2 = input;
        self.y1 = output;
        self.y2 = output;
        output
    }

    fn process_sample(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

}

/// Run a biquad cascade over a signal once, in order. Each section is
/// primed to steady state for the first sample, with the priming level
/// propagated through the cascade.
fn run_cascade(sections: &mut [BiquadSection], data: &mut [f32]) {
    let Some(&first) = data.first() else {
        return;
    };
    let mut level = first;
    for section in sections.iter_mut() {
        level = section.prime(level);
    }
    for sample in data.iter_mut() {
        let mut value = *sample;
        for section in sections.iter_mut() {
            value = section.process_sample(value);
        }
        *sample = value;
    }
}

/// Samples for the slowest pole pair to settle: the pole magnitude of
/// a normalized section is `sqrt(a2)` (complex-conjugate pair), and
/// residual transients decay as that magnitude per sample.
fn settle_len(coeffs: &[BiquadCoeffs]) -> usize {
    let mut longest = 0.0f32;
    for c in coeffs {
        let radius = c.a2.abs().sqrt().min(0.9999);
        if radius > 0.0 {
            longest = longest.max(-1.0 / radius.ln());
        }
    }
    (6.0 * longest).ceil() as usize
}

/// Apply a cascade forward and backward over an odd-extended copy of
/// the signal, producing a zero-phase result of the original length.
pub(crate) fn filtfilt(coeffs: &[BiquadCoeffs], data: &[f32]) -> Vec<f32> {
    let n = data.len();
    if n < 2 || coeffs.is_empty() {
        return data.to_vec();
    }

    // Odd extension at both ends, sized so the slowest pole's edge
    // transient decays inside the pad instead of the window
    let pad = (3 * (2 * coeffs.len() + 1)).max(settle_len(coeffs)).min(n - 1);
    let first = data[0];
    let last = data[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        extended.push(2.0 * first - data[i]);
    }
    extended.extend_from_slice(data);
    for i in 1..=pad {
        extended.push(2.0 * last - data[n - 1 - i]);
    }

    let mut sections: Vec<BiquadSection> =
        coeffs.iter().map(|&c| BiquadSection::new(c)).collect();

    run_cascade(&mut sections, &mut extended);
    extended.reverse();
    run_cascade(&mut sections, &mut extended);
    extended.reverse();

    extended[pad..pad + n].to_vec()
}

/// Zero-phase notch filter for mains interference
#[derive(Debug, Clone, Copy)]
pub struct NotchFilter {
    freq: f32,
    q: f32,
}

impl NotchFilter {
    pub fn new(freq: f32, q: f32) -> Self {
        NotchFilter { freq, q }
    }

    /// Filter one window at the given sampling rate
    pub fn apply(&self, data: &[f32], rate_hz: u32) -> SynapseResult<Vec<f32>> {
        let rate = rate_hz as f32;
        if self.freq >= rate / 2.0 {
            return Err(SynapseError::config(format!(
                "notch frequency {} Hz at or above Nyquist for rate {} Hz",
                self.freq, rate_hz
            )));
        }
        let coeffs = [BiquadCoeffs::notch(self.freq, self.q, rate)];
        Ok(filtfilt(&coeffs, data))
    }
}

/// Zero-phase Butterworth bandpass, realized as a highpass/lowpass
/// cascade of the requested order on each side
#[derive(Debug, Clone, Copy)]
pub struct BandpassFilter {
    low: f32,
    high: f32,
    order: usize,
}

impl BandpassFilter {
    pub fn new(low: f32, high: f32, order: usize) -> SynapseResult<Self> {
        if order == 0 || order % 2 != 0 {
            return Err(SynapseError::config(format!(
                "bandpass order {} must be a positive even number",
                order
            )));
        }
        if low <= 0.0 || low >= high {
            return Err(SynapseError::config(format!(
                "bandpass edges [{}, {}] Hz are not an increasing positive pair",
                low, high
            )));
        }
        Ok(BandpassFilter { low, high, order })
    }

    /// Filter one window at the given sampling rate
    pub fn apply(&self, data: &[f32], rate_hz: u32) -> SynapseResult<Vec<f32>> {
        let rate = rate_hz as f32;
        if self.high >= rate / 2.0 {
            return Err(SynapseError::config(format!(
                "bandpass high edge {} Hz at or above Nyquist for rate {} Hz",
                self.high, rate_hz
            )));
        }

        let mut coeffs = Vec::with_capacity(self.order);
        for q in butterworth_section_qs(self.order) {
            coeffs.push(BiquadCoeffs::highpass(self.low, q, rate));
        }
        for q in butterworth_section_qs(self.order) {
            coeffs.push(BiquadCoeffs::lowpass(self.high, q, rate));
        }
        Ok(filtfilt(&coeffs, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / rate).sin())
            .collect()
    }

    fn rms(data: &[f32]) -> f32 {
        (data.iter().map(|x| x * x).sum::<f32>() / data.len() as f32).sqrt()
    }

    #[test]
    fn test_butterworth_qs_fourth_order() {
        let qs = butterworth_section_qs(4);
        assert_eq!(qs.len(), 2);
        assert!((qs[0] - 1.3066).abs() < 1e-3);
        assert!((qs[1] - 0.5412).abs() < 1e-3);
    }

    #[test]
    fn test_notch_attenuates_mains_tone() {
        let filter = NotchFilter::new(50.0, 30.0);
        let input = tone(50.0, 250.0, 500, 1.0);
        let output = filter.apply(&input, 250).unwrap();
        assert_eq!(output.len(), input.len());
        assert!(rms(&output) < 0.2 * rms(&input));
    }

    #[test]
    fn test_notch_preserves_in_band_tone() {
        let filter = NotchFilter::new(50.0, 30.0);
        let input = tone(10.0, 250.0, 500, 1.0);
        let output = filter.apply(&input, 250).unwrap();
        assert!(rms(&output) > 0.9 * rms(&input));
    }

    #[test]
    fn test_bandpass_removes_dc() {
        let filter = BandpassFilter::new(1.0, 40.0, 4).unwrap();
        let input = vec![64.0; 500];
        let output = filter.apply(&input, 250).unwrap();
        assert_eq!(output.len(), input.len());
        assert!(rms(&output) < 0.05 * 64.0);
        // The slow highpass pole must not leave a residual anywhere in
        // the window, mid-window included
        assert!(output.iter().all(|x| x.abs() < 0.5));
    }

    #[test]
    fn test_bandpass_removes_offset_under_tone() {
        let filter = BandpassFilter::new(1.0, 40.0, 4).unwrap();
        let input: Vec<f32> = tone(10.0, 250.0, 500, 1.0)
            .into_iter()
            .map(|x| x + 64.0)
            .collect();
        let output = filter.apply(&input, 250).unwrap();
        let mean = output.iter().sum::<f32>() / output.len() as f32;
        assert!(mean.abs() < 0.5);
        // The tone itself passes
        assert!(rms(&output) > 0.6);
    }

    #[test]
    fn test_bandpass_passes_alpha_tone() {
        let filter = BandpassFilter::new(1.0, 40.0, 4).unwrap();
        let input = tone(10.0, 250.0, 500, 1.0);
        let output = filter.apply(&input, 250).unwrap();
        assert!(rms(&output) > 0.7 * rms(&input));
    }

    #[test]
    fn test_bandpass_rejects_high_frequency() {
        let filter = BandpassFilter::new(1.0, 40.0, 4).unwrap();
        let input = tone(100.0, 250.0, 500, 1.0);
        let output = filter.apply(&input, 250).unwrap();
        assert!(rms(&output) < 0.1 * rms(&input));
    }

    #[test]
    fn test_bandpass_edge_above_nyquist_is_config_error() {
        let filter = BandpassFilter::new(1.0, 40.0, 4).unwrap();
        let input = tone(5.0, 60.0, 120, 1.0);
        let err = filter.apply(&input, 60).unwrap_err();
        assert!(matches!(err, SynapseError::Configuration { .. }));
    }

    #[test]
    fn test_invalid_order_rejected_at_construction() {
        assert!(BandpassFilter::new(1.0, 40.0, 3).is_err());
        assert!(BandpassFilter::new(1.0, 40.0, 0).is_err());
        assert!(BandpassFilter::new(40.0, 1.0, 4).is_err());
    }

    #[test]
    fn test_filtfilt_preserves_length() {
        let coeffs = [BiquadCoeffs::notch(50.0, 30.0, 250.0)];
        for len in [2usize, 10, 100, 500] {
            let input = tone(10.0, 250.0, len, 1.0);
            assert_eq!(filtfilt(&coeffs, &input).len(), len);
        }
    }
}
