//! Pure per-fix computation: filtering, smoothing, distance and road outline.

pub mod accumulator;
pub mod road_polygon;
pub mod sample_filter;
pub mod smoother;

pub use accumulator::{DistanceAccumulator, BOOST_MULTIPLIER};
pub use road_polygon::road_buffer_polygon;
pub use sample_filter::{FilterDecision, FilterThresholds, SampleFilter};
pub use smoother::Smoother;
