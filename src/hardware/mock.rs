//! Mock camera SDK for tests and the demo binary.

use super::sdk::{
    CameraCallback, CameraHandle, CameraParameters, CameraSdk, FaultKind, HardwareError,
};
use super::Frame;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockStream {
    Closed,
    Running,
    Suspended,
}

struct MockInner {
    stream: MockStream,
    params: Option<CameraParameters>,
    callback: Option<Arc<dyn CameraCallback>>,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    flash: bool,
    open_error: Option<HardwareError>,
    still_bytes: Vec<u8>,
    opens: u64,
    closes: u64,
    sequence: u64,
}

impl Default for MockInner {
    fn default() -> Self {
        Self {
            stream: MockStream::Closed,
            params: None,
            callback: None,
            zoom: 1.0,
            min_zoom: 1.0,
            max_zoom: 8.0,
            flash: false,
            open_error: None,
            still_bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            opens: 0,
            closes: 0,
            sequence: 0,
        }
    }
}

/// Mock SDK implementation.
///
/// Open state, zoom, and flash are tracked so tests can assert against
/// them, and events can be injected from any thread via [`emit_frame`]
/// and [`emit_error`] to simulate the SDK's capture threads.
///
/// [`emit_frame`]: MockCamera::emit_frame
/// [`emit_error`]: MockCamera::emit_error
#[derive(Clone, Default)]
pub struct MockCamera {
    inner: Arc<Mutex<MockInner>>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `open` call fail with `error`.
    pub fn reject_open(&self, error: HardwareError) {
        self.inner.lock().open_error = Some(error);
    }

    /// Sets the bytes returned by `capture_still`.
    pub fn set_still_bytes(&self, bytes: Vec<u8>) {
        self.inner.lock().still_bytes = bytes;
    }

    /// Invokes the registered callback's frame path, as the SDK would
    /// from one of its capture threads. No-op when nothing is open.
    pub fn emit_frame(&self, frame: Option<Frame>, decoded: Option<String>) {
        let callback = self.inner.lock().callback.clone();
        if let Some(callback) = callback {
            callback.on_frame(frame, decoded);
        }
    }

    /// Invokes the registered callback's error path.
    pub fn emit_error(&self, kind: FaultKind, detail: &str) {
        let callback = self.inner.lock().callback.clone();
        if let Some(callback) = callback {
            callback.on_error(kind, detail.to_string());
        }
    }

    /// Builds a synthetic frame with a fresh sequence number.
    pub fn synthesize_frame(&self, width: u32, height: u32) -> Frame {
        let mut inner = self.inner.lock();
        inner.sequence += 1;
        let pixels = (0..(width * height) as usize)
            .map(|i| ((i as u64 ^ inner.sequence) % 256) as u8)
            .collect();
        Frame::new(pixels, width, height, inner.sequence)
    }

    /// Returns whether the sensor is currently open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().stream != MockStream::Closed
    }

    /// Returns whether the stream is suspended.
    pub fn is_suspended(&self) -> bool {
        self.inner.lock().stream == MockStream::Suspended
    }

    /// Returns the flash state the handle last applied.
    pub fn flash(&self) -> bool {
        self.inner.lock().flash
    }

    /// Returns the parameters passed to the last `open`.
    pub fn params(&self) -> Option<CameraParameters> {
        self.inner.lock().params
    }

    /// Returns how many times the sensor was opened.
    pub fn opens(&self) -> u64 {
        self.inner.lock().opens
    }

    /// Returns how many times the sensor was closed.
    pub fn closes(&self) -> u64 {
        self.inner.lock().closes
    }
}

impl CameraSdk for MockCamera {
    fn open(
        &self,
        params: &CameraParameters,
        callback: Arc<dyn CameraCallback>,
    ) -> Result<Box<dyn CameraHandle>, HardwareError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.open_error.take() {
            return Err(error);
        }
        if inner.stream != MockStream::Closed {
            return Err(HardwareError::OpenFailed("sensor already open".into()));
        }
        inner.stream = MockStream::Running;
        inner.params = Some(*params);
        inner.callback = Some(callback);
        inner.opens += 1;
        tracing::info!(mode = %params.mode, ratio = %params.aspect_ratio, "MockCamera opened");
        Ok(Box::new(MockHandle {
            inner: Arc::clone(&self.inner),
            open: true,
        }))
    }
}

struct MockHandle {
    inner: Arc<Mutex<MockInner>>,
    open: bool,
}

impl CameraHandle for MockHandle {
    fn suspend(&mut self) {
        let mut inner = self.inner.lock();
        if inner.stream == MockStream::Running {
            inner.stream = MockStream::Suspended;
        }
    }

    fn resume(&mut self) {
        let mut inner = self.inner.lock();
        if inner.stream == MockStream::Suspended {
            inner.stream = MockStream::Running;
        }
    }

    fn set_zoom(&mut self, level: f32) {
        let mut inner = self.inner.lock();
        inner.zoom = level.clamp(inner.min_zoom, inner.max_zoom);
    }

    fn zoom(&self) -> f32 {
        self.inner.lock().zoom
    }

    fn min_zoom(&self) -> f32 {
        self.inner.lock().min_zoom
    }

    fn max_zoom(&self) -> f32 {
        self.inner.lock().max_zoom
    }

    fn set_flash(&mut self, enabled: bool) {
        self.inner.lock().flash = enabled;
    }

    fn flash(&self) -> bool {
        self.inner.lock().flash
    }

    fn capture_still(&mut self) -> Result<Vec<u8>, HardwareError> {
        let inner = self.inner.lock();
        if inner.stream == MockStream::Closed {
            return Err(HardwareError::CaptureFailed("sensor closed".into()));
        }
        Ok(inner.still_bytes.clone())
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut inner = self.inner.lock();
        inner.stream = MockStream::Closed;
        inner.callback = None;
        inner.closes += 1;
        tracing::info!("MockCamera closed");
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{AspectRatio, CameraMode};

    struct RecordingCallback {
        frames: Mutex<Vec<Option<String>>>,
    }

    impl CameraCallback for RecordingCallback {
        fn on_frame(&self, _frame: Option<Frame>, decoded: Option<String>) {
            self.frames.lock().push(decoded);
        }

        fn on_error(&self, _kind: FaultKind, _detail: String) {}
    }

    fn params() -> CameraParameters {
        CameraParameters {
            mode: CameraMode::BarcodeScan,
            aspect_ratio: AspectRatio::Square,
        }
    }

    #[test]
    fn test_open_close_lifecycle() {
        let sdk = MockCamera::new();
        let callback = Arc::new(RecordingCallback {
            frames: Mutex::new(Vec::new()),
        });

        assert!(!sdk.is_open());

        let mut handle = sdk.open(&params(), callback).unwrap();
        assert!(sdk.is_open());
        assert_eq!(sdk.opens(), 1);

        handle.suspend();
        assert!(sdk.is_suspended());
        handle.resume();
        assert!(!sdk.is_suspended());

        handle.close();
        assert!(!sdk.is_open());
        assert_eq!(sdk.closes(), 1);

        // close is idempotent
        handle.close();
        assert_eq!(sdk.closes(), 1);
    }

    #[test]
    fn test_rejected_open() {
        let sdk = MockCamera::new();
        sdk.reject_open(HardwareError::PermissionDenied);

        let callback = Arc::new(RecordingCallback {
            frames: Mutex::new(Vec::new()),
        });
        let result = sdk.open(&params(), callback);
        assert!(matches!(result, Err(HardwareError::PermissionDenied)));
    }

    #[test]
    fn test_emit_reaches_callback() {
        let sdk = MockCamera::new();
        let callback = Arc::new(RecordingCallback {
            frames: Mutex::new(Vec::new()),
        });
        let registered: Arc<dyn CameraCallback> = callback.clone();
        let _handle = sdk.open(&params(), registered).unwrap();

        sdk.emit_frame(None, Some("ABC123".into()));
        assert_eq!(callback.frames.lock().as_slice(), &[Some("ABC123".into())]);
    }

    #[test]
    fn test_emit_after_close_is_dropped() {
        let sdk = MockCamera::new();
        let callback = Arc::new(RecordingCallback {
            frames: Mutex::new(Vec::new()),
        });
        let registered: Arc<dyn CameraCallback> = callback.clone();
        let mut handle = sdk.open(&params(), registered).unwrap();
        handle.close();

        sdk.emit_frame(None, Some("LATE".into()));
        assert!(callback.frames.lock().is_empty());
    }

    #[test]
    fn test_zoom_clamped() {
        let sdk = MockCamera::new();
        let callback = Arc::new(RecordingCallback {
            frames: Mutex::new(Vec::new()),
        });
        let mut handle = sdk.open(&params(), callback).unwrap();

        handle.set_zoom(100.0);
        assert_eq!(handle.zoom(), handle.max_zoom());
        handle.set_zoom(0.0);
        assert_eq!(handle.zoom(), handle.min_zoom());
    }
}
