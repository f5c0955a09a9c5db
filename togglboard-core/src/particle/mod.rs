//! Particle cloud device adapter.

mod client;
mod events;
mod types;

pub use client::{EventStream, ParticleClient, DEFAULT_PARTICLE_URL};
pub use events::{SseEvent, SseParser, TRIGGER_EVENTS};
