//! Shared data contracts for detection records and detection files.

pub mod detection;
pub mod file;

pub use detection::{
    compact_grasps, compact_objects, GraspDetection, ObjectDetection, COORD_LIMIT,
    GRASP_ROW_LEN, OBJECT_ROW_LEN,
};
pub use file::{DetectionFile, DetectionFileError};
