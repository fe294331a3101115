//! Block log domain.

pub mod chain;
pub mod error;
pub mod factory;

pub use chain::ChainState;
pub use error::{BlockLogError, BlockLogResult};
pub use factory::{BlockFactory, DefaultBlockFactory};
