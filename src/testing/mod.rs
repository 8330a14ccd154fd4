//! Testing utilities for CrabShutter
//!
//! Provides synthetic capture files and a scriptable in-memory camera so the
//! session can be driven end to end without hardware.

pub mod mock_device;
pub mod synthetic_data;

pub use mock_device::{MockCalls, MockDevice};
pub use synthetic_data::{synthetic_jpeg, synthetic_rgb, synthetic_video_bytes};
