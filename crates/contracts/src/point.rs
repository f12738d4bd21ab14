//! Point cloud contracts
//!
//! Decoded output of one hardware delivery.

use serde::{Deserialize, Serialize};

use crate::DeviceHandle;

/// A single decoded return
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X (meters)
    pub x: f32,

    /// Y (meters)
    pub y: f32,

    /// Z (meters)
    pub z: f32,

    /// Reflectivity normalized to `[0, 1]`
    pub intensity: f32,
}

/// Points decoded from one callback invocation
///
/// `points` keeps arrival order within the delivery.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloudBatch {
    /// Originating device
    pub handle: DeviceHandle,

    /// Decoded points
    pub points: Vec<Point>,
}

impl PointCloudBatch {
    /// Number of points in the batch
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the batch carries no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Point layout tag passed by the SDK with every delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// `i32 x, y, z` (mm) + `u8 reflectivity`
    Cartesian,
    /// `u32 depth, u16 theta, u16 phi` + `u8 reflectivity`
    Spherical,
    /// Cartesian + `u8 tag`
    ExtendCartesian,
    /// Spherical + `u8 tag`
    ExtendSpherical,
    /// Two returns per record, cartesian
    DualExtendCartesian,
    /// Two returns per record, spherical
    DualExtendSpherical,
    /// Gyro + accelerometer sample
    Imu,
    /// Three returns per record, cartesian
    TripleExtendCartesian,
    /// Three returns per record, spherical
    TripleExtendSpherical,
    /// Value not known to this build
    Unknown(u8),
}

impl From<u8> for DataType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Cartesian,
            1 => Self::Spherical,
            2 => Self::ExtendCartesian,
            3 => Self::ExtendSpherical,
            4 => Self::DualExtendCartesian,
            5 => Self::DualExtendSpherical,
            6 => Self::Imu,
            7 => Self::TripleExtendCartesian,
            8 => Self::TripleExtendSpherical,
            other => Self::Unknown(other),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Cartesian => 0,
            DataType::Spherical => 1,
            DataType::ExtendCartesian => 2,
            DataType::ExtendSpherical => 3,
            DataType::DualExtendCartesian => 4,
            DataType::DualExtendSpherical => 5,
            DataType::Imu => 6,
            DataType::TripleExtendCartesian => 7,
            DataType::TripleExtendSpherical => 8,
            DataType::Unknown(other) => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_u8() {
        assert_eq!(DataType::from(0), DataType::Cartesian);
        assert_eq!(DataType::from(2), DataType::ExtendCartesian);
        assert_eq!(DataType::from(6), DataType::Imu);
        assert_eq!(DataType::from(42), DataType::Unknown(42));
        assert_eq!(u8::from(DataType::Unknown(42)), 42);
        assert_eq!(u8::from(DataType::TripleExtendSpherical), 8);
    }

    #[test]
    fn test_batch_serialization() {
        let batch = PointCloudBatch {
            handle: 3,
            points: vec![Point {
                x: 1.0,
                y: -0.5,
                z: 0.25,
                intensity: 1.0,
            }],
        };
        let json = serde_json::to_string(&batch).unwrap();
        let back: PointCloudBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch);
        assert_eq!(back.len(), 1);
    }
}
