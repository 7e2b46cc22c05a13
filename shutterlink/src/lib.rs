pub use shutterlink_core::model::PeerId;

pub mod model {
    pub use shutterlink_core::model::*;
}

pub mod codec {
    pub use shutterlink_core::codec::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use shutterlink_client::*;
}
