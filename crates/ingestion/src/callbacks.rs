//! C-ABI entry points registered with the SDK
//!
//! Both run on SDK-owned threads. They check liveness before reading any
//! pointer and never keep a pointer past their own return.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::slice;

use contracts::{DataType, DeviceInfoCallback, PointCloudCallback};
use tracing::trace;

use crate::binding;
use crate::decoder;

/// Point delivery callback
///
/// # Safety
/// When non-null, `data` must point at `data_num` records of the layout
/// named by `data_type`, valid for the duration of the call.
pub unsafe extern "C" fn on_point_cloud(handle: u8, data: *mut u8, data_num: u32, data_type: u8) {
    let Some(pipeline) = binding::bound() else {
        trace!(handle, "point callback with no bound scanner");
        return;
    };
    let Some(in_flight) = pipeline.enter() else {
        return;
    };

    let data_type = DataType::from(data_type);
    let Some(len) = decoder::record_size(data_type)
        .and_then(|size| size.checked_mul(data_num as usize))
    else {
        pipeline.reject_points(&in_flight, handle, data_type);
        return;
    };

    let bytes: &[u8] = if data.is_null() || len == 0 {
        &[]
    } else {
        // SAFETY: the caller guarantees `data_num` records of this layout;
        // records are packed with alignment 1.
        unsafe { slice::from_raw_parts(data.cast_const(), len) }
    };
    pipeline.ingest_points(&in_flight, handle, data_type, bytes);
}

/// Device info callback
///
/// # Safety
/// When non-null, `broadcast_code` must point at a NUL-terminated string
/// valid for the duration of the call.
pub unsafe extern "C" fn on_device_info(handle: u8, broadcast_code: *mut c_char, connected: u8) {
    let Some(pipeline) = binding::bound() else {
        trace!(handle, "device callback with no bound scanner");
        return;
    };
    let Some(in_flight) = pipeline.enter() else {
        return;
    };

    let code = if broadcast_code.is_null() {
        String::new()
    } else {
        // SAFETY: the caller guarantees a NUL-terminated string.
        unsafe { CStr::from_ptr(broadcast_code) }
            .to_string_lossy()
            .into_owned()
    };
    pipeline.ingest_device(&in_flight, handle, code, connected != 0);
}

// Signatures must match the SDK contract exactly.
pub(crate) const POINT_CALLBACK: PointCloudCallback = on_point_cloud;
pub(crate) const DEVICE_CALLBACK: DeviceInfoCallback = on_device_info;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DualExtendRawPoint, ExtendRawPoint, RawPoint, TripleExtendRawPoint};
    use crate::pipeline::Pipeline;
    use std::ffi::CString;
    use std::sync::Arc;

    fn with_bound_pipeline(f: impl FnOnce(&Arc<Pipeline>)) {
        let _lock = binding::test_lock();
        let pipeline = Arc::new(Pipeline::new(8, 8));
        binding::bind(&pipeline).unwrap();
        f(&pipeline);
        binding::unbind(&pipeline);
    }

    #[test]
    fn test_point_callback_decodes() {
        with_bound_pipeline(|pipeline| {
            pipeline.coordinator.activate();
            let mut raws = [RawPoint::new(1000, 2000, 3000, 255), RawPoint::new(-1, 0, 1, 0)];
            unsafe { on_point_cloud(4, raws.as_mut_ptr().cast(), raws.len() as u32, 0) };

            let batch = pipeline.points.receiver().try_recv().unwrap();
            assert_eq!(batch.handle, 4);
            assert_eq!(batch.len(), 2);
            assert_eq!(batch.points[0].z, 3.0);
            assert_eq!(batch.points[0].intensity, 1.0);
        });
    }

    #[test]
    fn test_point_callback_multi_return_layouts() {
        with_bound_pipeline(|pipeline| {
            pipeline.coordinator.activate();
            let ret = |x: i32| ExtendRawPoint::new(x, 0, 0, 255, 0);

            let mut dual = [
                DualExtendRawPoint {
                    returns: [ret(1000), ret(2000)],
                },
                DualExtendRawPoint {
                    returns: [ret(3000), ret(4000)],
                },
            ];
            unsafe { on_point_cloud(1, dual.as_mut_ptr().cast(), dual.len() as u32, 4) };

            let mut triple = [TripleExtendRawPoint {
                returns: [ret(-1000), ret(-2000), ret(-3000)],
            }];
            unsafe { on_point_cloud(2, triple.as_mut_ptr().cast(), 1, 7) };

            let rx = pipeline.points.receiver();
            let batch = rx.try_recv().unwrap();
            assert_eq!(batch.handle, 1);
            let xs: Vec<f32> = batch.points.iter().map(|p| p.x).collect();
            assert_eq!(xs, vec![1.0, 2.0, 3.0, 4.0]);

            let batch = rx.try_recv().unwrap();
            assert_eq!(batch.handle, 2);
            let xs: Vec<f32> = batch.points.iter().map(|p| p.x).collect();
            assert_eq!(xs, vec![-1.0, -2.0, -3.0]);
            assert!(batch.points.iter().all(|p| p.intensity == 1.0));

            let snapshot = pipeline.snapshot();
            assert_eq!(snapshot.batches_received, 2);
            assert_eq!(snapshot.unsupported_batches, 0);
        });
    }

    #[test]
    fn test_stale_callback_does_not_touch_buffer() {
        with_bound_pipeline(|pipeline| {
            // dangling pointer: must not be dereferenced while not live
            let dangling = std::ptr::NonNull::<u8>::dangling().as_ptr();
            unsafe { on_point_cloud(0, dangling, 1_000_000, 0) };
            unsafe { on_device_info(0, dangling.cast(), 1) };

            assert_eq!(pipeline.snapshot().stale_callbacks, 2);
            assert!(pipeline.points.is_empty());
            assert!(pipeline.registry.is_empty());
        });
    }

    #[test]
    fn test_device_callback_null_code() {
        with_bound_pipeline(|pipeline| {
            pipeline.coordinator.activate();
            unsafe { on_device_info(2, std::ptr::null_mut(), 1) };
            assert_eq!(pipeline.registry.get(2).as_deref(), Some(""));

            let code = CString::new("3GGDJ6K00100").unwrap();
            unsafe { on_device_info(2, code.as_ptr().cast_mut(), 1) };
            assert_eq!(pipeline.registry.get(2).as_deref(), Some("3GGDJ6K00100"));
            assert_eq!(pipeline.events.len(), 2);
        });
    }

    #[test]
    fn test_unsupported_and_empty_deliveries() {
        with_bound_pipeline(|pipeline| {
            pipeline.coordinator.activate();
            unsafe { on_point_cloud(0, std::ptr::null_mut(), 0, 0) };
            unsafe { on_point_cloud(0, std::ptr::null_mut(), 10, 6) };

            let snapshot = pipeline.snapshot();
            assert_eq!(snapshot.batches_received, 1);
            assert_eq!(snapshot.unsupported_batches, 1);
            assert!(pipeline.points.receiver().try_recv().unwrap().is_empty());
        });
    }

    #[test]
    fn test_unbound_callbacks_are_noops() {
        let _lock = binding::test_lock();
        unsafe { on_point_cloud(0, std::ptr::null_mut(), 5, 0) };
        unsafe { on_device_info(0, std::ptr::null_mut(), 0) };
    }
}
