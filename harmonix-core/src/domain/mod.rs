//! Domain types shared by every stage of the detector.

pub mod bar;
pub mod bar_point;
pub mod direction;
pub mod timeframe;

pub use bar::Bar;
pub use bar_point::BarPoint;
pub use direction::SwingDirection;
pub use timeframe::Timeframe;
