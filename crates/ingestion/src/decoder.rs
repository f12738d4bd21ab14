//! Sample decoder
//!
//! Converts packed SDK point records into [`Point`]s. The SDK reports
//! millimeters and an 8-bit reflectivity; output is meters and `[0, 1]`.
//! Sensor-supplied ranges are not validated.

use std::mem::{align_of, size_of};

use bytemuck::{Pod, Zeroable};
use contracts::{DataType, DeviceHandle, Point, PointCloudBatch};

/// Cartesian record (`data_type` 0)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct RawPoint {
    /// X (mm)
    pub x: i32,
    /// Y (mm)
    pub y: i32,
    /// Z (mm)
    pub z: i32,
    /// Reflectivity `0..=255`
    pub reflectivity: u8,
}

/// Extended cartesian record (`data_type` 2)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct ExtendRawPoint {
    /// X (mm)
    pub x: i32,
    /// Y (mm)
    pub y: i32,
    /// Z (mm)
    pub z: i32,
    /// Reflectivity `0..=255`
    pub reflectivity: u8,
    /// Return / noise tag, not decoded
    pub tag: u8,
}

/// Dual-return record (`data_type` 4), returns in firing order
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DualExtendRawPoint {
    pub returns: [ExtendRawPoint; 2],
}

/// Triple-return record (`data_type` 7), returns in firing order
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct TripleExtendRawPoint {
    pub returns: [ExtendRawPoint; 3],
}

// SDK records are packed; the boundary reinterprets raw bytes in place.
const _: () = assert!(size_of::<RawPoint>() == 13 && align_of::<RawPoint>() == 1);
const _: () = assert!(size_of::<ExtendRawPoint>() == 14 && align_of::<ExtendRawPoint>() == 1);
const _: () =
    assert!(size_of::<DualExtendRawPoint>() == 28 && align_of::<DualExtendRawPoint>() == 1);
const _: () =
    assert!(size_of::<TripleExtendRawPoint>() == 42 && align_of::<TripleExtendRawPoint>() == 1);

impl RawPoint {
    pub fn new(x: i32, y: i32, z: i32, reflectivity: u8) -> Self {
        Self {
            x,
            y,
            z,
            reflectivity,
        }
    }
}

impl ExtendRawPoint {
    pub fn new(x: i32, y: i32, z: i32, reflectivity: u8, tag: u8) -> Self {
        Self {
            x,
            y,
            z,
            reflectivity,
            tag,
        }
    }
}

/// One cartesian return
pub trait RawSample {
    /// `(x, y, z)` in millimeters
    fn position_mm(&self) -> [i32; 3];

    fn reflectivity(&self) -> u8;
}

impl RawSample for RawPoint {
    #[inline]
    fn position_mm(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    fn reflectivity(&self) -> u8 {
        self.reflectivity
    }
}

impl RawSample for ExtendRawPoint {
    #[inline]
    fn position_mm(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    fn reflectivity(&self) -> u8 {
        self.reflectivity
    }
}

/// A packed SDK record holding one or more cartesian returns
pub trait RawRecord: Pod {
    /// Layout tag the SDK uses for this record
    const DATA_TYPE: DataType;

    /// Points produced per record
    const RETURNS: usize;

    /// Append this record's returns to `points`, in order
    fn decode_into(&self, points: &mut Vec<Point>);
}

impl RawRecord for RawPoint {
    const DATA_TYPE: DataType = DataType::Cartesian;
    const RETURNS: usize = 1;

    #[inline]
    fn decode_into(&self, points: &mut Vec<Point>) {
        points.push(decode_point(self));
    }
}

impl RawRecord for ExtendRawPoint {
    const DATA_TYPE: DataType = DataType::ExtendCartesian;
    const RETURNS: usize = 1;

    #[inline]
    fn decode_into(&self, points: &mut Vec<Point>) {
        points.push(decode_point(self));
    }
}

impl RawRecord for DualExtendRawPoint {
    const DATA_TYPE: DataType = DataType::DualExtendCartesian;
    const RETURNS: usize = 2;

    #[inline]
    fn decode_into(&self, points: &mut Vec<Point>) {
        let returns = self.returns;
        points.extend(returns.iter().map(decode_point));
    }
}

impl RawRecord for TripleExtendRawPoint {
    const DATA_TYPE: DataType = DataType::TripleExtendCartesian;
    const RETURNS: usize = 3;

    #[inline]
    fn decode_into(&self, points: &mut Vec<Point>) {
        let returns = self.returns;
        points.extend(returns.iter().map(decode_point));
    }
}

/// Decode one return
#[inline]
pub fn decode_point<S: RawSample>(raw: &S) -> Point {
    let [x, y, z] = raw.position_mm();
    Point {
        x: x as f32 / 1000.0,
        y: y as f32 / 1000.0,
        z: z as f32 / 1000.0,
        intensity: f32::from(raw.reflectivity()) / 255.0,
    }
}

/// Decode records in order into a batch for `handle`
///
/// Multi-return records contribute every return, first to last.
pub fn decode_samples<S: RawRecord>(handle: DeviceHandle, samples: &[S]) -> PointCloudBatch {
    let mut points = Vec::with_capacity(samples.len() * S::RETURNS);
    for sample in samples {
        sample.decode_into(&mut points);
    }
    PointCloudBatch { handle, points }
}

/// Size in bytes of one record of `data_type`, if it carries cartesian returns
pub fn record_size(data_type: DataType) -> Option<usize> {
    match data_type {
        DataType::Cartesian => Some(size_of::<RawPoint>()),
        DataType::ExtendCartesian => Some(size_of::<ExtendRawPoint>()),
        DataType::DualExtendCartesian => Some(size_of::<DualExtendRawPoint>()),
        DataType::TripleExtendCartesian => Some(size_of::<TripleExtendRawPoint>()),
        _ => None,
    }
}

fn decode_as<S: RawRecord>(handle: DeviceHandle, bytes: &[u8]) -> Option<PointCloudBatch> {
    let samples: &[S] = bytemuck::try_cast_slice(bytes).ok()?;
    Some(decode_samples(handle, samples))
}

/// Decode a raw delivery buffer
///
/// Returns `None` for spherical and IMU layouts, unknown tags, or when
/// `bytes` is not a whole number of records.
pub fn decode_buffer(
    handle: DeviceHandle,
    data_type: DataType,
    bytes: &[u8],
) -> Option<PointCloudBatch> {
    match data_type {
        DataType::Cartesian => decode_as::<RawPoint>(handle, bytes),
        DataType::ExtendCartesian => decode_as::<ExtendRawPoint>(handle, bytes),
        DataType::DualExtendCartesian => decode_as::<DualExtendRawPoint>(handle, bytes),
        DataType::TripleExtendCartesian => decode_as::<TripleExtendRawPoint>(handle, bytes),
        _ => None,
    }
}
