pub mod mock_engine;
pub mod signal_helpers;

pub use mock_engine::*;
pub use mock_relay::*;
pub use signal_helpers::*;
