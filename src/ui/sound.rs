/// Sound engine: procedural sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::synth;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_roll: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_attack: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_slide: Arc<Vec<u8>>,
        sfx_pop: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let wav = |samples: Vec<f32>| Arc::new(synth::make_wav(&samples));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: wav(synth::gen_chirp(320.0, 620.0, 0.09)),
                sfx_roll: wav(synth::gen_chirp(480.0, 900.0, 0.11)),
                sfx_land: wav(synth::gen_thud()),
                sfx_attack: wav(synth::gen_swish()),
                sfx_hit: wav(synth::gen_hit()),
                sfx_slide: wav(synth::gen_hiss()),
                sfx_pop: wav(synth::gen_chirp(900.0, 1400.0, 0.04)),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_jump(&self, double: bool) {
            self.play(if double { &self.sfx_roll } else { &self.sfx_jump });
        }
        pub fn play_land(&self) { self.play(&self.sfx_land); }
        pub fn play_attack(&self) { self.play(&self.sfx_attack); }
        pub fn play_hit(&self) { self.play(&self.sfx_hit); }
        pub fn play_slide(&self) { self.play(&self.sfx_slide); }
        pub fn play_pop(&self) { self.play(&self.sfx_pop); }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: all produce Vec<f32> mono samples
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// White noise in [-1, 1] from a fixed seed, so buffers are reproducible.
    fn noise(n: usize, seed: u64) -> Vec<f32> {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..n).map(|_| rng.f32() * 2.0 - 1.0).collect()
    }

    /// Sine sweep from `from` to `to` Hz with a linear fade.
    pub fn gen_chirp(from: f32, to: f32, duration: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * 0.25
            })
            .collect()
    }

    /// Landing: low sine with a noise transient.
    pub fn gen_thud() -> Vec<f32> {
        let n = sample_count(0.08);
        let grit = noise(n, 7);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 90.0 * TAU).sin();
                let env = (1.0 - t).powf(2.0);
                (tone * 0.7 + grit[i] * 0.3 * (1.0 - t).powf(6.0)) * env * 0.35
            })
            .collect()
    }

    /// Attack: band of noise that rises then falls.
    pub fn gen_swish() -> Vec<f32> {
        let n = sample_count(0.12);
        let raw = noise(n, 11);
        let mut prev = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                // One-pole low-pass softens the hiss.
                prev += (raw[i] - prev) * (0.15 + 0.5 * t);
                let env = (t * std::f32::consts::PI).sin();
                prev * env * 0.3
            })
            .collect()
    }

    /// Player hit: harsh descending square-ish tone.
    pub fn gen_hit() -> Vec<f32> {
        let n = sample_count(0.18);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (420.0 - 260.0 * t) / SAMPLE_RATE as f32;
                let wave = (phase * TAU).sin().signum() * 0.6 + (phase * 2.0 * TAU).sin() * 0.4;
                wave * (1.0 - t).powf(0.7) * 0.2
            })
            .collect()
    }

    /// Slide: filtered noise that fades out slowly.
    pub fn gen_hiss() -> Vec<f32> {
        let n = sample_count(0.25);
        let raw = noise(n, 23);
        let mut prev = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                prev += (raw[i] - prev) * 0.08;
                prev * (1.0 - t).powf(1.5) * 0.5
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn generators_stay_in_range() {
            for samples in [gen_chirp(300.0, 600.0, 0.1), gen_thud(), gen_swish(), gen_hit(), gen_hiss()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
            }
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self, _double: bool) {}
    pub fn play_land(&self) {}
    pub fn play_attack(&self) {}
    pub fn play_hit(&self) {}
    pub fn play_slide(&self) {}
    pub fn play_pop(&self) {}
}
