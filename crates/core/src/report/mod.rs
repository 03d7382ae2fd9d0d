//! Report projection: normalize, filter, sort.

pub mod projector;
pub mod timestamp;

pub use projector::{project, render_meta, Projection, ReportFilter, ReportSettings};
pub use timestamp::{parse_instant, render_in_zone};
