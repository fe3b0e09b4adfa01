//! Core of the search-augmented chat assistant: port traits, search
//! augmentation, the transcript store and the turn runtime. No platform code.

pub mod ports;
pub mod event_bus;
pub mod augmenter;
pub mod compaction;
pub mod repository;
pub mod transcript;
pub mod context;
pub mod credentials;
pub mod runtime;
