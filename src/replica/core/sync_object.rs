use crate::replica::core::network_reader::{DecodeError, NetworkReader};
use crate::replica::core::network_writer::NetworkWriter;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

/// A change tracked container that participates in its owning component's
/// dirty bit aggregation. Dirty stays set from the first mutation until
/// `clear_changes` acknowledges the flush.
pub trait SyncObject: Debug {
    fn is_dirty(&self) -> bool;
    fn clear_changes(&mut self);
    fn on_serialize_all(&self, writer: &mut NetworkWriter);
    fn on_serialize_delta(&self, writer: &mut NetworkWriter);
    fn on_deserialize_all(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError>;
    fn on_deserialize_delta(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError>;
}

/// Shared handle so application code and the owning component see the same
/// collection. The mutex doubles as the flush lock: a serialize-then-clear
/// pass holds it across both steps.
#[derive(Debug, Clone)]
pub struct SyncObjectHandle(Arc<Mutex<dyn SyncObject + Send>>);

impl SyncObjectHandle {
    pub fn new<T: SyncObject + Send + 'static>(sync_object: T) -> Self {
        SyncObjectHandle(Arc::new(Mutex::new(sync_object)))
    }

    pub fn lock(&self) -> MutexGuard<'_, dyn SyncObject + Send + 'static> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: SyncObject + Send + 'static> From<Arc<Mutex<T>>> for SyncObjectHandle {
    fn from(sync_object: Arc<Mutex<T>>) -> Self {
        SyncObjectHandle(sync_object)
    }
}
