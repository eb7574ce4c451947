pub mod autoencoder;
pub mod spec;

pub use autoencoder::{AutoEncoder, NamedParam};
pub use spec::{AutoEncoderSpec, LayerSpec};
