//! Gesture Tree - a hand-gesture-controlled holiday scene
//!
//! Captures webcam input, runs hand landmark inference, classifies fist,
//! open-hand and pinch gestures, and drives a 3D particle tree of ornaments
//! and uploaded photos rendered with wgpu.

pub mod app;
pub mod camera;
pub mod config;
pub mod photos;
pub mod render;
pub mod scene;
pub mod vision;

pub use app::App;
