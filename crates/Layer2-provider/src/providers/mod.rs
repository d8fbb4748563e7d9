//! Provider implementations

pub mod moonshot;

pub use moonshot::MoonshotProvider;
