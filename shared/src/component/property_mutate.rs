use std::sync::{Arc, RwLock};

/// Sink for field-level change notifications.
///
/// Implemented by the host-side dirty-mask channel; generated property
/// accessors only ever see the [`PropertyMutator`] wrapper.
pub trait PropertyMutate: Send + Sync {
    /// Records that the field at `property_index` changed.
    /// Returns false if the underlying tracker has gone away.
    fn mutate(&mut self, property_index: u8) -> bool;
}

/// Cloneable handle a [`Property`](super::property::Property) holds to reach
/// its component's dirty-mask tracker
#[derive(Clone)]
pub struct PropertyMutator {
    inner: Arc<RwLock<dyn PropertyMutate>>,
}

impl PropertyMutator {
    pub fn new<M: PropertyMutate + 'static>(mutator: M) -> Self {
        Self {
            inner: Arc::new(RwLock::new(mutator)),
        }
    }

    pub fn clone_new(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }

    pub fn mutate(&mut self, property_index: u8) -> bool {
        let Ok(mut inner) = self.inner.as_ref().write() else {
            return false;
        };
        inner.mutate(property_index)
    }
}
