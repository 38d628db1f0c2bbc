/// Sound sink: procedural retro sound effects via rodio, keyed by `GameEvent`.
///
/// Every effect is rendered to an in-memory WAV buffer once at startup;
/// playback is fire-and-forget on a detached rodio `Sink`, so the game loop
/// never waits on audio.
///
/// Without the "sound" feature `SoundEngine` is a stub that plays nothing.

use crate::sim::event::GameEvent;

/// One sound effect per family of events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Shot,
    EnemyHit,
    EnemyDown,
    Spawn,
    Theft,
    Pickup,
    Crystal,
    PlayerHurt,
    PlayerDown,
    Push,
    Sink,
    ExitOpen,
    LevelClear,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub const ALL: [Sfx; 13] = [
        Sfx::Shot, Sfx::EnemyHit, Sfx::EnemyDown, Sfx::Spawn, Sfx::Theft,
        Sfx::Pickup, Sfx::Crystal, Sfx::PlayerHurt, Sfx::PlayerDown,
        Sfx::Push, Sfx::Sink, Sfx::ExitOpen, Sfx::LevelClear,
    ];

    pub fn for_event(event: &GameEvent) -> Sfx {
        match event {
            GameEvent::PlayerFired | GameEvent::EnemyFired { .. } => Sfx::Shot,
            GameEvent::EnemyHit { .. } => Sfx::EnemyHit,
            GameEvent::EnemyDied { .. } => Sfx::EnemyDown,
            GameEvent::EnemySpawned { .. } => Sfx::Spawn,
            GameEvent::PickupStolen { .. } => Sfx::Theft,
            GameEvent::PickupCollected { .. } => Sfx::Pickup,
            GameEvent::CrystalCollected { .. } => Sfx::Crystal,
            GameEvent::PlayerHit { .. } => Sfx::PlayerHurt,
            GameEvent::PlayerDied => Sfx::PlayerDown,
            GameEvent::ObstaclePushed { .. } => Sfx::Push,
            GameEvent::ObstacleSunk { .. } => Sfx::Sink,
            GameEvent::ExitRevealed => Sfx::ExitOpen,
            GameEvent::LevelCompleted => Sfx::LevelClear,
        }
    }
}

/// Effects to play for one tick's events: each effect at most once.
pub fn effects_for(events: &[GameEvent]) -> Vec<Sfx> {
    let mut out: Vec<Sfx> = Vec::with_capacity(events.len());
    for sfx in events.iter().map(Sfx::for_event) {
        if !out.contains(&sfx) {
            out.push(sfx);
        }
    }
    out
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by `Sfx as usize`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter().map(|&s| Arc::new(make_wav(&render(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    fn render(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Shot => sweep(1400.0, 500.0, 0.07, 0.2),
            Sfx::EnemyHit => noise_burst(0.06, 350.0, 0.25),
            Sfx::EnemyDown => {
                let mut s = noise_burst(0.08, 250.0, 0.3);
                s.extend(sweep(500.0, 120.0, 0.18, 0.25));
                s
            }
            Sfx::Spawn => notes(&[(220.0, 0.05), (330.0, 0.05)], 0.2),
            Sfx::Theft => notes(&[(660.0, 0.04), (440.0, 0.06)], 0.2),
            Sfx::Pickup => notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.06)], 0.25),
            Sfx::Crystal => notes(&[(1568.0, 0.04), (2093.0, 0.08)], 0.22),
            Sfx::PlayerHurt => sweep(300.0, 150.0, 0.1, 0.3),
            Sfx::PlayerDown => notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.2)], 0.3),
            Sfx::Push => sweep(160.0, 120.0, 0.05, 0.2),
            Sfx::Sink => sweep(400.0, 60.0, 0.2, 0.25),
            Sfx::ExitOpen => notes(&[(784.0, 0.08), (1047.0, 0.15)], 0.3),
            Sfx::LevelClear => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sequence of notes, sine plus a touch of octave, each fading out.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = sample_count(dur);
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
                wave * env * volume
            }));
        }
        samples
    }

    /// Linear frequency glide from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                let freq = from + (to - from) * k;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - k).powf(0.7) * volume
            })
            .collect()
    }

    /// LCG noise mixed with a low tone.
    fn noise_burst(duration: f32, tone: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let wave = (t * tone * TAU).sin();
                (noise * 0.6 + wave * 0.4) * (1.0 - k) * volume
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * u32::from(bits) / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&(bits / 8).to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API — stub when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    /// Play the effects for one tick's events.
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in effects_for(events) {
            self.play(sfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::GoodieKind;
    use crate::domain::grid::Pos;

    #[test]
    fn both_shots_share_an_effect() {
        assert_eq!(Sfx::for_event(&GameEvent::PlayerFired), Sfx::Shot);
        assert_eq!(Sfx::for_event(&GameEvent::EnemyFired { at: Pos::new(1, 1) }), Sfx::Shot);
    }

    #[test]
    fn effects_deduplicated_in_first_seen_order() {
        let events = [
            GameEvent::CrystalCollected { remaining: 1 },
            GameEvent::PlayerFired,
            GameEvent::EnemyFired { at: Pos::new(2, 2) },
            GameEvent::PickupCollected { kind: GoodieKind::Ammo },
        ];
        assert_eq!(effects_for(&events), vec![Sfx::Crystal, Sfx::Shot, Sfx::Pickup]);
    }

    #[test]
    fn all_table_matches_discriminants() {
        for (i, sfx) in Sfx::ALL.iter().enumerate() {
            assert_eq!(*sfx as usize, i);
        }
    }
}
