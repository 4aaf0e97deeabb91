pub mod arc;
pub mod point;

pub use arc::BoundaryArc;
pub use point::BoundaryPoint;
