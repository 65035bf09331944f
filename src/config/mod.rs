pub mod mixer;

pub use mixer::MixerConfig;
