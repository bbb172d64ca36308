mod backend;
mod backends;
mod result;

pub use backend::DetectorBackend;
pub use backends::{select_backend, StubBackend};
pub use result::{BoundingBox, Detection, CLASS_BUS, CLASS_CAR, CLASS_MOTORCYCLE, CLASS_TRUCK};
