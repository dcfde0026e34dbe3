pub mod provider;
pub mod settings;

pub use provider::*;
pub use settings::*;
