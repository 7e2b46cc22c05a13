mod event;
mod room_client;

pub use event::RoomEvent;
pub use room_client::{JoinedRoom, RoomClient};
