use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Opaque handle to a remote renderable media stream.
///
/// The core only plumbs this through to the embedding application; it never
/// inspects or decodes the media itself.
#[derive(Clone)]
pub struct MediaSurface {
    track: Arc<TrackRemote>,
}

impl MediaSurface {
    pub fn new(track: Arc<TrackRemote>) -> Self {
        Self { track }
    }

    pub fn track(&self) -> &Arc<TrackRemote> {
        &self.track
    }
}

impl fmt::Debug for MediaSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSurface").finish_non_exhaustive()
    }
}
