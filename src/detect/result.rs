/// COCO class ids for the vehicle allow-list.
pub const CLASS_CAR: u32 = 2;
pub const CLASS_MOTORCYCLE: u32 = 3;
pub const CLASS_BUS: u32 = 5;
pub const CLASS_TRUCK: u32 = 7;

/// One object localized by the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Model class id (COCO taxonomy for the default weights).
    pub class_id: u32,
    /// Detection confidence in 0..=1.
    pub confidence: f32,
    /// Pixel-space bounding box.
    pub bbox: BoundingBox,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}
