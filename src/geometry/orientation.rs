//! Sensor orientation remapping.
//!
//! Camera frames arrive rotated by the sensor mounting angle and are rotated
//! upright before inference. Decoded boxes live in the model's input frame;
//! each supported orientation maps them back with a fixed axis swap and
//! reflection about the input tensor's width or height. The input size used
//! here is the model input extent, never the original image size.

use crate::geometry::BoxXyxy;

/// Clockwise sensor rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorOrientation {
    Deg0,
    /// The common phone mounting; decoded boxes are already in place.
    #[default]
    Deg90,
    Deg180,
    Deg270,
    /// Any other angle. Boxes pass through untransformed.
    Unsupported(i32),
}

impl SensorOrientation {
    /// Maps a degree value to an orientation without normalizing it.
    ///
    /// `-90` or `450` are reported as `Unsupported`, not folded into range.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            270 => Self::Deg270,
            other => Self::Unsupported(other),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
            Self::Unsupported(d) => d,
        }
    }

    /// Remaps a box decoded in input-tensor space.
    #[inline]
    pub fn apply(self, b: BoxXyxy, input_width: f32, input_height: f32) -> BoxXyxy {
        match self {
            Self::Deg0 => rotate_0(b, input_height),
            Self::Deg90 => b,
            Self::Deg180 => rotate_180(b, input_width),
            Self::Deg270 => rotate_270(b, input_width, input_height),
            Self::Unsupported(_) => b,
        }
    }
}

impl From<i32> for SensorOrientation {
    fn from(degrees: i32) -> Self {
        Self::from_degrees(degrees)
    }
}

fn rotate_0(b: BoxXyxy, h: f32) -> BoxXyxy {
    BoxXyxy::new(h - b.y1, b.x0, h - b.y0, b.x1)
}

fn rotate_180(b: BoxXyxy, w: f32) -> BoxXyxy {
    BoxXyxy::new(b.y0, w - b.x1, b.y1, w - b.x0)
}

fn rotate_270(b: BoxXyxy, w: f32, h: f32) -> BoxXyxy {
    BoxXyxy::new(w - b.x1, h - b.y1, w - b.x0, h - b.y0)
}
