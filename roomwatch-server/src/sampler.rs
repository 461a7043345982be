//! Samplers produce the measured values for one room on one tick.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Default probability of a leak being reported on any one reading.
pub const DEFAULT_LEAK_PROBABILITY: f64 = 0.05;

/// The measured values for one room, before they are stamped into a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temperature: f64,
    pub humidity: f64,
    pub leak_detected: bool,
}

/// A source of sensor values.
///
/// Implementations decide how values evolve between ticks. The generator
/// calls [`Sampler::sample`] once per room per tick, in registry order.
pub trait Sampler: Send + fmt::Debug {
    fn sample(&mut self, room: &str) -> Sample;
}

/// Independent uniform draws on every tick.
///
/// Temperature is drawn from [20, 30], humidity from [40, 60], and both are
/// rounded to one decimal place.
#[derive(Debug)]
pub struct UniformSampler {
    rng: StdRng,
    leak_probability: f64,
}

impl UniformSampler {
    /// Create a sampler seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a deterministic sampler.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            leak_probability: DEFAULT_LEAK_PROBABILITY,
        }
    }

    /// Set the leak probability, clamped to [0, 1].
    pub fn leak_probability(mut self, p: f64) -> Self {
        self.leak_probability = clamp_probability(p);
        self
    }
}

impl Default for UniformSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for UniformSampler {
    fn sample(&mut self, _room: &str) -> Sample {
        Sample {
            temperature: round1(self.rng.gen_range(20.0..=30.0)),
            humidity: round1(self.rng.gen_range(40.0..=60.0)),
            leak_detected: self.rng.gen_bool(self.leak_probability),
        }
    }
}

/// A bounded random walk per room.
///
/// Each room starts at a random point and moves by a small step every tick,
/// staying inside [18, 33] degrees and [40, 80] percent.
#[derive(Debug)]
pub struct RandomWalkSampler {
    rng: StdRng,
    leak_probability: f64,
    rooms: HashMap<String, (f64, f64)>,
}

impl RandomWalkSampler {
    const TEMPERATURE: (f64, f64) = (18.0, 33.0);
    const HUMIDITY: (f64, f64) = (40.0, 80.0);
    const TEMPERATURE_STEP: f64 = 0.5;
    const HUMIDITY_STEP: f64 = 1.5;

    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            leak_probability: 0.1,
            rooms: HashMap::new(),
        }
    }

    /// Set the leak probability, clamped to [0, 1].
    pub fn leak_probability(mut self, p: f64) -> Self {
        self.leak_probability = clamp_probability(p);
        self
    }
}

impl Default for RandomWalkSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomWalkSampler {
    fn sample(&mut self, room: &str) -> Sample {
        let (t_min, t_max) = Self::TEMPERATURE;
        let (h_min, h_max) = Self::HUMIDITY;

        let (temperature, humidity) = match self.rooms.get(room) {
            Some(&(t, h)) => {
                let dt = self.rng.gen_range(-Self::TEMPERATURE_STEP..=Self::TEMPERATURE_STEP);
                let dh = self.rng.gen_range(-Self::HUMIDITY_STEP..=Self::HUMIDITY_STEP);
                ((t + dt).clamp(t_min, t_max), (h + dh).clamp(h_min, h_max))
            }
            None => (
                self.rng.gen_range(t_min..=t_max),
                self.rng.gen_range(h_min..=h_max),
            ),
        };
        self.rooms.insert(room.to_string(), (temperature, humidity));

        Sample {
            temperature: round1(temperature),
            humidity: round1(humidity),
            leak_detected: self.rng.gen_bool(self.leak_probability),
        }
    }
}

/// Always returns the same values. Useful for demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSampler(pub Sample);

impl Sampler for ConstantSampler {
    fn sample(&mut self, _room: &str) -> Sample {
        self.0
    }
}

/// Which sampler a server should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Independent uniform draws.
    #[default]
    Uniform,
    /// Bounded random walk.
    Walk,
}

impl SamplerKind {
    /// Build a boxed sampler of this kind.
    pub fn build(self, seed: Option<u64>, leak_probability: f64) -> Box<dyn Sampler> {
        match (self, seed) {
            (SamplerKind::Uniform, Some(seed)) => {
                Box::new(UniformSampler::seeded(seed).leak_probability(leak_probability))
            }
            (SamplerKind::Uniform, None) => {
                Box::new(UniformSampler::new().leak_probability(leak_probability))
            }
            (SamplerKind::Walk, Some(seed)) => {
                Box::new(RandomWalkSampler::seeded(seed).leak_probability(leak_probability))
            }
            (SamplerKind::Walk, None) => {
                Box::new(RandomWalkSampler::new().leak_probability(leak_probability))
            }
        }
    }
}

impl FromStr for SamplerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(SamplerKind::Uniform),
            "walk" | "random-walk" => Ok(SamplerKind::Walk),
            other => Err(format!("unknown sampler `{}` (expected uniform or walk)", other)),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_values_stay_in_range() {
        let mut sampler = UniformSampler::seeded(7);
        for _ in 0..1000 {
            let s = sampler.sample("Lobby");
            assert!((20.0..=30.0).contains(&s.temperature), "{}", s.temperature);
            assert!((40.0..=60.0).contains(&s.humidity), "{}", s.humidity);
        }
    }

    #[test]
    fn uniform_values_have_one_decimal() {
        let mut sampler = UniformSampler::seeded(11);
        for _ in 0..100 {
            let s = sampler.sample("Lobby");
            assert_eq!(round1(s.temperature), s.temperature);
            assert_eq!(round1(s.humidity), s.humidity);
        }
    }

    #[test]
    fn seeded_samplers_are_deterministic() {
        let mut a = UniformSampler::seeded(42);
        let mut b = UniformSampler::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.sample("Lobby"), b.sample("Lobby"));
        }
    }

    #[test]
    fn leak_probability_extremes() {
        let mut never = UniformSampler::seeded(1).leak_probability(0.0);
        let mut always = UniformSampler::seeded(1).leak_probability(1.0);
        for _ in 0..100 {
            assert!(!never.sample("Lobby").leak_detected);
            assert!(always.sample("Lobby").leak_detected);
        }
    }

    #[test]
    fn leak_probability_is_clamped() {
        let mut sampler = UniformSampler::seeded(1).leak_probability(7.0);
        assert!(sampler.sample("Lobby").leak_detected);
    }

    #[test]
    fn random_walk_moves_in_small_bounded_steps() {
        let mut sampler = RandomWalkSampler::seeded(3);
        let mut previous = sampler.sample("Lobby");
        for _ in 0..500 {
            let next = sampler.sample("Lobby");
            assert!((18.0..=33.0).contains(&next.temperature));
            assert!((40.0..=80.0).contains(&next.humidity));
            // rounding to one decimal can add at most 0.1 to the raw step
            assert!((next.temperature - previous.temperature).abs() <= 0.6 + 1e-9);
            assert!((next.humidity - previous.humidity).abs() <= 1.6 + 1e-9);
            previous = next;
        }
    }

    #[test]
    fn random_walk_tracks_rooms_independently() {
        let mut sampler = RandomWalkSampler::seeded(5);
        sampler.sample("Lobby");
        sampler.sample("Kitchen");
        assert_eq!(sampler.rooms.len(), 2);
    }

    #[test]
    fn sampler_kind_parses() {
        assert_eq!("uniform".parse::<SamplerKind>(), Ok(SamplerKind::Uniform));
        assert_eq!("Walk".parse::<SamplerKind>(), Ok(SamplerKind::Walk));
        assert!("gaussian".parse::<SamplerKind>().is_err());
    }
}
