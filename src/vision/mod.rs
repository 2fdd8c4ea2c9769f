//! Hand-gesture recognition.
//!
//! Runs a MediaPipe-style hand landmark model through ONNX Runtime on a
//! background thread and classifies the 21 landmarks into the gesture
//! vocabulary that drives the scene. The classification itself is a pure
//! function over normalized landmark coordinates; only the model session
//! lives on the thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use ndarray::Array4;
use parking_lot::Mutex;

use crate::config::GestureTuning;

/// MediaPipe hand landmark indices.
/// See: https://google.github.io/mediapipe/solutions/hands.html
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

/// One hand landmark in normalized image coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Classified hand pose. `None` means a hand was seen but matched no pose;
/// the palm position is still valid and keeps steering the scene rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Pinch,
    Fist,
    Open,
    None,
}

/// A classified gesture: pose plus normalized palm position.
#[derive(Clone, Copy, Debug)]
pub struct Gesture {
    pub kind: GestureKind,
    /// Palm center (middle-finger MCP), x and y in [0, 1].
    pub palm: [f32; 2],
}

/// Classify 21 normalized landmarks into a gesture.
///
/// Pinch wins over everything (thumb and index tips together), then the
/// average fingertip-to-wrist spread separates fist from open palm. Poses in
/// the dead band between the fist and open thresholds report
/// `GestureKind::None`.
pub fn classify_hand(points: &[Landmark; 21], tuning: &GestureTuning) -> Gesture {
    let wrist = points[landmarks::WRIST];
    let thumb = points[landmarks::THUMB_TIP];
    let index = points[landmarks::INDEX_TIP];
    let palm = points[landmarks::MIDDLE_MCP];

    let pinch_distance = (thumb.x - index.x).hypot(thumb.y - index.y);

    let tips = [
        points[landmarks::INDEX_TIP],
        points[landmarks::MIDDLE_TIP],
        points[landmarks::RING_TIP],
        points[landmarks::PINKY_TIP],
    ];
    let spread = tips
        .iter()
        .map(|tip| (tip.x - wrist.x).hypot(tip.y - wrist.y))
        .sum::<f32>()
        / tips.len() as f32;

    let kind = if pinch_distance < tuning.pinch_max_distance {
        GestureKind::Pinch
    } else if spread < tuning.fist_max_spread {
        GestureKind::Fist
    } else if spread > tuning.open_min_spread {
        GestureKind::Open
    } else {
        GestureKind::None
    };

    Gesture {
        kind,
        palm: [palm.x, palm.y],
    }
}

/// Result of processing one video frame.
#[derive(Clone, Default)]
pub struct VisionResult {
    /// Frame number the result corresponds to; consumers skip anything not
    /// newer than the last number they handled.
    pub frame_number: u64,
    /// The detected gesture, or `None` when no hand was found.
    pub gesture: Option<Gesture>,
}

/// Frame handed to the inference thread.
struct FrameData {
    /// RGBA pixel data.
    data: Vec<u8>,
    width: u32,
    height: u32,
    frame_number: u64,
}

/// Model input edge length (MediaPipe hand landmark models take square
/// inputs).
const INPUT_SIZE: u32 = 224;

/// Background gesture detector.
///
/// Frames go in through a small bounded channel (`try_send`, stale frames
/// dropped) and only the most recent result is kept. A missing or unloadable
/// model leaves the detector in a permanent not-ready state: the scene then
/// runs without gesture control.
pub struct GestureDetector {
    latest: Arc<Mutex<VisionResult>>,
    frame_sender: Option<Sender<FrameData>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl GestureDetector {
    pub fn new(tuning: GestureTuning) -> Result<Self, String> {
        let latest = Arc::new(Mutex::new(VisionResult::default()));
        let running = Arc::new(AtomicBool::new(false));
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded::<FrameData>(2);

        let latest_clone = latest.clone();
        let running_clone = running.clone();

        let thread_handle = std::thread::Builder::new()
            .name("gesture-vision".to_string())
            .spawn(move || {
                Self::inference_thread(frame_receiver, latest_clone, running_clone, tuning);
            })
            .map_err(|e| format!("Failed to spawn vision thread: {}", e))?;

        Ok(Self {
            latest,
            frame_sender: Some(frame_sender),
            running,
            thread_handle: Some(thread_handle),
        })
    }

    fn inference_thread(
        frame_receiver: Receiver<FrameData>,
        latest: Arc<Mutex<VisionResult>>,
        running: Arc<AtomicBool>,
        tuning: GestureTuning,
    ) {
        log::info!("Vision thread started");

        let mut session = match Self::init_ort() {
            Ok(s) => {
                running.store(true, Ordering::Release);
                log::info!("Hand landmark model loaded");
                Some(s)
            }
            Err(e) => {
                log::warn!("Vision unavailable: {}. Running without gesture control.", e);
                None
            }
        };

        while let Ok(frame) = frame_receiver.recv() {
            if let Some(ref mut session) = session {
                match Self::detect(session, &frame, &tuning) {
                    Ok(gesture) => {
                        *latest.lock() = VisionResult {
                            frame_number: frame.frame_number,
                            gesture,
                        };
                    }
                    Err(e) => {
                        log::warn!("Inference error: {}", e);
                    }
                }
            }
        }

        running.store(false, Ordering::Release);
        log::info!("Vision thread stopped");
    }

    fn init_ort() -> Result<ort::session::Session, String> {
        let model_path = Self::find_model()?;
        log::info!("Hand landmark model: {:?}", model_path);

        ort::init()
            .with_name("GestureTree")
            .commit()
            .map_err(|e| format!("Failed to initialize ORT: {}", e))?;

        ort::session::Session::builder()
            .map_err(|e| format!("Failed to create session builder: {}", e))?
            .with_intra_threads(2)
            .map_err(|e| format!("Failed to set threads: {}", e))?
            .commit_from_file(&model_path)
            .map_err(|e| format!("Failed to load hand landmark model: {}", e))
    }

    /// Locate `models/hand_landmark.onnx` next to the executable or under
    /// the current directory.
    fn find_model() -> Result<PathBuf, String> {
        const MODEL_FILE: &str = "hand_landmark.onnx";

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(exe) = std::env::current_exe() {
            let mut dir = exe.parent().map(|p| p.to_path_buf());
            // Walk up a few levels to cover `cargo run` from target/.
            for _ in 0..3 {
                if let Some(d) = dir {
                    candidates.push(d.join("models").join(MODEL_FILE));
                    dir = d.parent().map(|p| p.to_path_buf());
                } else {
                    break;
                }
            }
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("models").join(MODEL_FILE));
        }

        candidates
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| {
                format!(
                    "{} not found. Place the ONNX hand landmark model in a 'models' directory.",
                    MODEL_FILE
                )
            })
    }

    /// Run the model on one frame and classify the result.
    fn detect(
        session: &mut ort::session::Session,
        frame: &FrameData,
        tuning: &GestureTuning,
    ) -> Result<Option<Gesture>, String> {
        let input = preprocess_nhwc(frame, INPUT_SIZE, INPUT_SIZE);

        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| format!("Failed to create input array: {}", e))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| format!("Failed to create tensor: {}", e))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| format!("Inference failed: {}", e))?;

        // The landmark model emits a 63-float tensor (21 x/y/z points in
        // input-pixel space) and a scalar hand-presence score. Match outputs
        // by element count so the export's output order doesn't matter.
        let mut points: Option<[Landmark; 21]> = None;
        let mut score = 0.0f32;

        for (_, value) in outputs.iter() {
            let (_, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| format!("Failed to extract output: {}", e))?;
            match data.len() {
                63 => {
                    let mut lm = [Landmark::default(); 21];
                    for (i, chunk) in data.chunks_exact(3).enumerate().take(21) {
                        lm[i] = Landmark {
                            x: chunk[0] / INPUT_SIZE as f32,
                            y: chunk[1] / INPUT_SIZE as f32,
                            z: chunk[2] / INPUT_SIZE as f32,
                        };
                    }
                    points = Some(lm);
                }
                1 => score = data[0],
                _ => {}
            }
        }

        match points {
            Some(points) if score >= tuning.min_confidence => {
                Ok(Some(classify_hand(&points, tuning)))
            }
            _ => Ok(None),
        }
    }

    /// Send a frame for inference without blocking; a full channel means the
    /// inference thread is behind and the frame is simply dropped.
    pub fn process_frame(&self, data: &[u8], width: u32, height: u32, frame_number: u64) {
        if let Some(ref sender) = self.frame_sender {
            let _ = sender.try_send(FrameData {
                data: data.to_vec(),
                width,
                height,
                frame_number,
            });
        }
    }

    /// Most recent result.
    pub fn latest(&self) -> VisionResult {
        self.latest.lock().clone()
    }

    /// Whether the model loaded and the thread is processing frames.
    pub fn is_ready(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        self.frame_sender = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for GestureDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resize an RGBA frame to the model input and convert to NHWC float [0, 1].
fn preprocess_nhwc(frame: &FrameData, target_width: u32, target_height: u32) -> Vec<f32> {
    let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];

    let x_ratio = frame.width as f32 / target_width as f32;
    let y_ratio = frame.height as f32 / target_height as f32;

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = (x as f32 * x_ratio) as u32;
            let src_y = (y as f32 * y_ratio) as u32;
            let src_idx = ((src_y * frame.width + src_x) * 4) as usize;

            if src_idx + 2 < frame.data.len() {
                let out_idx = ((y * target_width + x) * 3) as usize;
                output[out_idx] = frame.data[src_idx] as f32 / 255.0;
                output[out_idx + 1] = frame.data[src_idx + 1] as f32 / 255.0;
                output[out_idx + 2] = frame.data[src_idx + 2] as f32 / 255.0;
            }
        }
    }

    output
}
