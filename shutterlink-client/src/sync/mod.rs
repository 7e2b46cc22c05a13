mod object_sync;

pub use object_sync::{ObjectSync, RemoteApply};
