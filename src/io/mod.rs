//! Configuration input.

pub mod settings;

pub use settings::PublisherSettings;
