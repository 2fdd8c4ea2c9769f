//! Webcam capture.
//!
//! Cross-platform capture through nokhwa. Frames are grabbed on a background
//! thread; only the latest frame is retained, tagged with a monotonically
//! increasing frame number so downstream consumers can skip frames they have
//! already processed. Nothing buffers: a missed frame is a stale frame.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;

/// One captured video frame.
#[derive(Clone)]
pub struct VideoFrame {
    /// RGBA pixel data.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonically increasing capture counter.
    pub frame_number: u64,
}

/// Information about an available camera.
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Webcam capture handle. Dropping it stops and joins the capture thread.
pub struct Webcam {
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl Webcam {
    /// Enumerate attached cameras.
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(list) => list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open a camera and start capturing on a background thread.
    pub fn open(camera_index: u32) -> Result<Self, String> {
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));

        let latest_clone = latest.clone();
        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();

        let thread_handle = std::thread::Builder::new()
            .name("webcam-capture".to_string())
            .spawn(move || {
                Self::capture_thread(camera_index, latest_clone, running_clone, frame_count_clone);
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        Ok(Self {
            latest,
            running,
            frame_count,
            thread_handle: Some(thread_handle),
        })
    }

    fn capture_thread(
        camera_index: u32,
        latest: Arc<Mutex<Option<VideoFrame>>>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        log::info!("Webcam capture thread started (camera {})", camera_index);

        let index = CameraIndex::Index(camera_index);
        let requested = RequestedFormat::new::<RgbAFormat>(
            RequestedFormatType::HighestResolution(nokhwa::utils::Resolution::new(640, 480)),
        );

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Preferred camera format unavailable: {:?}", e);
                let fallback = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                match Camera::new(index, fallback) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::error!("Failed to open camera: {:?}", e2);
                        running.store(false, Ordering::Release);
                        return;
                    }
                }
            }
        };

        if let Err(e) = camera.open_stream() {
            log::error!("Failed to open camera stream: {:?}", e);
            running.store(false, Ordering::Release);
            return;
        }

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(raw) => match raw.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        let frame_number = frame_count.fetch_add(1, Ordering::Relaxed) + 1;
                        let frame = VideoFrame {
                            width: image.width(),
                            height: image.height(),
                            data: image.into_raw(),
                            frame_number,
                        };
                        *latest.lock() = Some(frame);
                    }
                    Err(e) => {
                        log::warn!("Failed to decode frame: {:?}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }

        log::info!("Webcam capture thread stopped");
    }

    /// Latest captured frame, if any has arrived yet.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.latest.lock().clone()
    }

    /// Whether the capture thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Total frames captured so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Stop capturing and join the thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        self.stop();
    }
}
