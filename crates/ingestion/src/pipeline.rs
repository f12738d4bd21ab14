//! Shared ingestion state
//!
//! Everything the SDK callbacks touch: registry, both streams, counters and
//! the shutdown coordinator. Owned by a [`Scanner`](crate::Scanner) and
//! reachable from the C-ABI entry points while bound.

use contracts::{DataType, DeviceEvent, DeviceHandle, DeviceIdentity, PointCloudBatch};
use tracing::{debug, trace};

use crate::decoder;
use crate::metrics::{IngestionMetrics, MetricsSnapshot};
use crate::registry::DeviceRegistry;
use crate::shutdown::{InFlight, ShutdownCoordinator};
use crate::stream::{BoundedStream, SendOutcome};

#[derive(Debug)]
pub(crate) struct Pipeline {
    pub(crate) registry: DeviceRegistry,
    pub(crate) points: BoundedStream<PointCloudBatch>,
    pub(crate) events: BoundedStream<DeviceEvent>,
    pub(crate) metrics: IngestionMetrics,
    pub(crate) coordinator: ShutdownCoordinator,
}

impl Pipeline {
    pub(crate) fn new(point_capacity: usize, event_capacity: usize) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            points: BoundedStream::new("point_cloud", point_capacity),
            events: BoundedStream::new("device_event", event_capacity),
            metrics: IngestionMetrics::new(),
            coordinator: ShutdownCoordinator::new(),
        }
    }

    /// Liveness check for a callback; counts the rejection
    #[inline]
    pub(crate) fn enter(&self) -> Option<InFlight<'_>> {
        let guard = self.coordinator.enter();
        if guard.is_none() {
            self.metrics.record_stale();
            trace!("callback ignored, pipeline not running");
        }
        guard
    }

    /// Decode one point delivery and queue it
    pub(crate) fn ingest_points(
        &self,
        in_flight: &InFlight<'_>,
        handle: DeviceHandle,
        data_type: DataType,
        bytes: &[u8],
    ) -> SendOutcome {
        let Some(batch) = decoder::decode_buffer(handle, data_type, bytes) else {
            self.reject_points(in_flight, handle, data_type);
            return SendOutcome::Dropped;
        };
        self.metrics.record_batch(batch.len());
        trace!(handle, points = batch.len(), "point batch decoded");
        self.points.try_send(batch)
    }

    /// Count a delivery whose layout cannot be decoded
    pub(crate) fn reject_points(
        &self,
        _in_flight: &InFlight<'_>,
        handle: DeviceHandle,
        data_type: DataType,
    ) {
        self.metrics.record_unsupported(u8::from(data_type));
        debug!(handle, data_type = ?data_type, "unsupported point data type, batch discarded");
    }

    /// Apply a device transition to the registry, then publish it
    ///
    /// The registry reflects the event before any consumer can observe it.
    pub(crate) fn ingest_device(
        &self,
        _in_flight: &InFlight<'_>,
        handle: DeviceHandle,
        broadcast_code: String,
        connected: bool,
    ) -> SendOutcome {
        if connected {
            self.registry.upsert(handle, broadcast_code.clone());
        } else {
            self.registry.remove(handle);
        }
        self.metrics.record_event();
        debug!(handle, code = %broadcast_code, connected, "device event");

        self.events.try_send(DeviceEvent {
            device: DeviceIdentity::new(handle, broadcast_code),
            connected,
        })
    }

    /// Close both streams; queued items stay receivable
    pub(crate) fn close_streams(&self) {
        self.points.close();
        self.events.close();
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.metrics.batches_received(),
            batches_dropped: self.points.dropped(),
            points_received: self.metrics.points_received(),
            events_received: self.metrics.events_received(),
            events_dropped: self.events.dropped(),
            stale_callbacks: self.metrics.stale_callbacks(),
            unsupported_batches: self.metrics.unsupported_batches(),
            point_queue_len: self.points.len(),
            event_queue_len: self.events.len(),
        }
    }
}
