//! Local capture devices.
//!
//! Device access sits outside the voice client: the camera preview is
//! opened directly against the platform, and a denial surfaces as
//! [`VoiceError::DeviceAccess`].

use crate::error::VoiceError;
use parley_types::Control;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Requested capture size for the camera preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

/// A live capture stream.
pub trait MediaStream: Send + 'static {
    /// Stops every track of the stream. Calling it twice is harmless.
    fn stop(&mut self);

    /// Whether the stream still has live tracks.
    fn is_live(&self) -> bool;
}

/// Platform access to capture devices.
pub trait MediaDevices: Send + Sync + 'static {
    /// Opens a video-only camera stream.
    fn open_camera(
        &self,
        constraints: VideoConstraints,
    ) -> impl Future<Output = Result<Box<dyn MediaStream>, VoiceError>> + Send;
}

/// Owns an open camera stream and stops it when dropped.
pub struct CameraPreview {
    stream: Box<dyn MediaStream>,
}

impl CameraPreview {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream }
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_live()
    }
}

impl std::fmt::Debug for CameraPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraPreview")
            .field("live", &self.stream.is_live())
            .finish()
    }
}

impl Drop for CameraPreview {
    fn drop(&mut self) {
        self.stream.stop();
        debug!("camera preview stopped");
    }
}

/// In-process stand-in for platform devices.
///
/// Tracks how many streams are live so callers can verify that every
/// opened stream is eventually stopped.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevices {
    deny_camera: Arc<AtomicBool>,
    live_streams: Arc<AtomicUsize>,
}

impl SimulatedDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent camera requests fail as if permission was refused.
    pub fn deny_camera(&self, deny: bool) {
        self.deny_camera.store(deny, Ordering::SeqCst);
    }

    /// Number of streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

impl MediaDevices for SimulatedDevices {
    async fn open_camera(
        &self,
        constraints: VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, VoiceError> {
        if self.deny_camera.load(Ordering::SeqCst) {
            return Err(VoiceError::device_denied(
                Control::Camera,
                "permission denied by user",
            ));
        }

        info!(
            width = constraints.width,
            height = constraints.height,
            "opened simulated camera stream"
        );
        self.live_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedStream {
            live: true,
            live_streams: Arc::clone(&self.live_streams),
        }))
    }
}

struct SimulatedStream {
    live: bool,
    live_streams: Arc<AtomicUsize>,
}

impl MediaStream for SimulatedStream {
    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preview_stops_stream_on_drop() {
        let devices = SimulatedDevices::new();
        let stream = devices
            .open_camera(VideoConstraints::default())
            .await
            .expect("camera should open");
        assert_eq!(devices.live_streams(), 1);

        let preview = CameraPreview::new(stream);
        assert!(preview.is_live());
        drop(preview);
        assert_eq!(devices.live_streams(), 0);
    }

    #[tokio::test]
    async fn denied_camera_reports_device_error() {
        let devices = SimulatedDevices::new();
        devices.deny_camera(true);

        let err = match devices.open_camera(VideoConstraints::default()).await {
            Ok(_) => panic!("camera should be denied"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            VoiceError::DeviceAccess {
                device: Control::Camera,
                ..
            }
        ));
        assert_eq!(devices.live_streams(), 0);
    }
}
