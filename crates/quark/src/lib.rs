//! Term bookkeeping and past-exam archive for a student organization.
//!
//! The [`terms`] module keys academic periods and keeps a single current term;
//! [`exams`] decides which uploaded exams are listed. Both sit on repository traits
//! implemented by [`memory::MemoryStore`] and publish side effects through
//! [`events::EventPublisher`].

pub mod config;
pub mod error;
pub mod events;
pub mod exams;
pub mod memory;
pub mod repository;
pub mod telemetry;
pub mod terms;
