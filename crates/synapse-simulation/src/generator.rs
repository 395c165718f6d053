//! Synthetic EEG signal generation
//!
//! A sum of sinusoidal components plus Gaussian background noise,
//! centered in the device's 7-bit amplitude range and quantized per
//! sample. Good enough to exercise every stage of the pipeline with
//! known spectral content.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// One sinusoidal component of the synthetic signal
#[derive(Debug, Clone, Copy)]
pub struct ToneComponent {
    pub freq_hz: f32,
    pub amplitude: f32,
}

/// Generator state for a continuous synthetic signal
#[derive(Debug)]
pub struct SignalModel {
    tones: Vec<ToneComponent>,
    noise_amplitude: f32,
    dc_offset: f32,
    rate_hz: u32,
    sample_index: u64,
    rng: StdRng,
    noise: Normal<f32>,
}

impl SignalModel {
    /// Model with explicit components; `seed` makes runs reproducible
    pub fn new(
        tones: Vec<ToneComponent>,
        noise_amplitude: f32,
        rate_hz: u32,
        seed: u64,
    ) -> Self {
        SignalModel {
            tones,
            noise_amplitude,
            dc_offset: 63.0,
            rate_hz: rate_hz.max(1),
            sample_index: 0,
            rng: StdRng::seed_from_u64(seed),
            noise: Normal::new(0.0, 1.0).expect("unit normal is always valid"),
        }
    }

    /// A resting-state style model: dominant alpha with a little theta
    /// and mild background noise
    pub fn resting_alpha(rate_hz: u32, seed: u64) -> Self {
        Self::new(
            vec![
                ToneComponent { freq_hz: 10.0, amplitude: 40.0 },
                ToneComponent { freq_hz: 6.0, amplitude: 8.0 },
            ],
            2.0,
            rate_hz,
            seed,
        )
    }

    /// A pure tone model for spectral tests
    pub fn pure_tone(freq_hz: f32, amplitude: f32, rate_hz: u32) -> Self {
        Self::new(
            vec![ToneComponent { freq_hz, amplitude }],
            0.0,
            rate_hz,
            0,
        )
    }

    /// Nominal sampling rate of the generated signal
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Produce the next sample as a 7-bit amplitude byte
    pub fn next_byte(&mut self) -> u8 {
        let t = self.sample_index as f32 / self.rate_hz as f32;
        self.sample_index += 1;

        let mut value = self.dc_offset;
        for tone in &self.tones {
            value += tone.amplitude * (2.0 * std::f32::consts::PI * tone.freq_hz * t).sin();
        }
        if self.noise_amplitude > 0.0 {
            value += self.noise_amplitude * self.noise.sample(&mut self.rng);
        }

        value.round().clamp(0.0, 127.0) as u8
    }

    /// Fill a buffer with consecutive samples
    pub fn fill(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self.next_byte();
        }
    }
}
