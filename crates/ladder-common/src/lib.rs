#![doc = "Common types shared across the ladder PLC workspace."]

pub mod config;
pub mod error;
pub mod faults;
pub mod iec_types;
pub mod image;
pub mod metrics;
pub mod mode;
pub mod value;

pub use config::*;
pub use error::*;
pub use faults::*;
pub use iec_types::*;
pub use image::*;
pub use metrics::*;
pub use mode::*;
pub use value::*;
