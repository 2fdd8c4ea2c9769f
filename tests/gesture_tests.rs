//! Tests for hand landmark classification and the gesture-to-mode mapping.

use gesture_tree::config::GestureTuning;
use gesture_tree::scene::Mode;
use gesture_tree::vision::{classify_hand, landmarks, GestureKind, Landmark};

fn at(x: f32, y: f32) -> Landmark {
    Landmark { x, y, z: 0.0 }
}

/// A neutral hand centered in the frame: wrist at (0.5, 0.7), palm above it,
/// every fingertip at the given distance from the wrist.
fn hand_with_spread(spread: f32) -> [Landmark; 21] {
    let mut points = [at(0.5, 0.5); 21];
    points[landmarks::WRIST] = at(0.5, 0.7);
    points[landmarks::MIDDLE_MCP] = at(0.5, 0.55);

    // Fan the four tracked fingertips out horizontally from the wrist.
    points[landmarks::INDEX_TIP] = at(0.5 - spread, 0.7);
    points[landmarks::MIDDLE_TIP] = at(0.5, 0.7 - spread);
    points[landmarks::RING_TIP] = at(0.5 + spread, 0.7);
    points[landmarks::PINKY_TIP] = at(0.5, 0.7 + spread);

    // Thumb well away from the index tip so no pinch registers.
    points[landmarks::THUMB_TIP] = at(0.2, 0.9);
    points
}

#[test]
fn curled_fingers_classify_as_fist() {
    let tuning = GestureTuning::default();
    let gesture = classify_hand(&hand_with_spread(0.1), &tuning);
    assert_eq!(gesture.kind, GestureKind::Fist);
}

#[test]
fn extended_fingers_classify_as_open() {
    let tuning = GestureTuning::default();
    let gesture = classify_hand(&hand_with_spread(0.45), &tuning);
    assert_eq!(gesture.kind, GestureKind::Open);
}

#[test]
fn spread_between_thresholds_is_no_pose() {
    let tuning = GestureTuning::default();
    // Dead band between the fist and open thresholds.
    let gesture = classify_hand(&hand_with_spread(0.3), &tuning);
    assert_eq!(gesture.kind, GestureKind::None);
}

#[test]
fn touching_thumb_and_index_classify_as_pinch() {
    let tuning = GestureTuning::default();

    // Open-hand spread, but thumb and index tips together: pinch wins.
    let mut points = hand_with_spread(0.45);
    points[landmarks::THUMB_TIP] = points[landmarks::INDEX_TIP];
    points[landmarks::THUMB_TIP].x += 0.01;

    let gesture = classify_hand(&points, &tuning);
    assert_eq!(gesture.kind, GestureKind::Pinch);
}

#[test]
fn fist_threshold_is_exclusive() {
    let tuning = GestureTuning::default();
    // Exactly at the threshold the spread is not below it.
    let gesture = classify_hand(&hand_with_spread(tuning.fist_max_spread), &tuning);
    assert_ne!(gesture.kind, GestureKind::Fist);
}

#[test]
fn palm_position_comes_from_the_middle_mcp() {
    let tuning = GestureTuning::default();
    let mut points = hand_with_spread(0.45);
    points[landmarks::MIDDLE_MCP] = at(0.25, 0.8);

    let gesture = classify_hand(&points, &tuning);
    assert_eq!(gesture.palm, [0.25, 0.8]);
}

#[test]
fn gestures_map_to_their_display_modes() {
    assert_eq!(Mode::from_gesture(GestureKind::Fist), Some(Mode::Tree));
    assert_eq!(Mode::from_gesture(GestureKind::Open), Some(Mode::Scatter));
    assert_eq!(Mode::from_gesture(GestureKind::Pinch), Some(Mode::Focus));
    assert_eq!(Mode::from_gesture(GestureKind::None), None);
}
