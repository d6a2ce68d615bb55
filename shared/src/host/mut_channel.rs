use std::sync::{Arc, RwLock};

use crate::component::{diff_mask::DiffMask, property_mutate::PropertyMutate};

use super::error::DiffHandlerError;

/// Shared dirty mask for one component instance.
///
/// The sender half is handed (via a `PropertyMutator`) to the component's
/// generated accessors; the receiver half stays with the coordinator, which
/// reads the accumulated mask at flush time and clears it for the next
/// interval.
#[derive(Clone)]
pub struct MutChannel {
    mask: Arc<RwLock<DiffMask>>,
}

impl MutChannel {
    pub fn new_channel() -> (MutSender, MutReceiver) {
        let channel = Self {
            mask: Arc::new(RwLock::new(DiffMask::new())),
        };
        (
            MutSender {
                mask: channel.mask.clone(),
            },
            MutReceiver { mask: channel.mask },
        )
    }
}

// MutSender
#[derive(Clone)]
pub struct MutSender {
    mask: Arc<RwLock<DiffMask>>,
}

impl PropertyMutate for MutSender {
    fn mutate(&mut self, property_index: u8) -> bool {
        let Ok(mut mask) = self.mask.as_ref().write() else {
            return false;
        };
        mask.set_bit(property_index, true);
        true
    }
}

// MutReceiver
#[derive(Clone)]
pub struct MutReceiver {
    mask: Arc<RwLock<DiffMask>>,
}

impl MutReceiver {
    /// Copy of the current mask
    pub fn mask(&self) -> DiffMask {
        let Ok(mask) = self.mask.as_ref().read() else {
            panic!("Mask held on current thread");
        };
        *mask
    }

    pub fn is_clear(&self) -> bool {
        let Ok(mask) = self.mask.as_ref().read() else {
            panic!("Mask held on current thread");
        };
        mask.is_clear()
    }

    pub fn clear(&self) {
        let Ok(mut mask) = self.mask.as_ref().write() else {
            panic!("Mask held on current thread");
        };
        mask.clear();
    }

    /// Merges changes a relaying host applied from a remote delta, so they
    /// propagate onward to its own observers
    pub fn or_mask(&self, other_mask: &DiffMask) {
        let Ok(mut mask) = self.mask.as_ref().write() else {
            panic!("Mask held on current thread");
        };
        mask.or(other_mask);
    }

    /// Copies the current mask and clears it in one step, the per-flush
    /// handoff
    pub fn take_mask(&self) -> DiffMask {
        let Ok(mut mask) = self.mask.as_ref().write() else {
            panic!("Mask held on current thread");
        };
        let taken = *mask;
        mask.clear();
        taken
    }

    // Non-panicking twins

    pub fn try_mask(&self) -> Result<DiffMask, DiffHandlerError> {
        let mask = self
            .mask
            .as_ref()
            .read()
            .map_err(|_| DiffHandlerError::MaskLockReentrant)?;
        Ok(*mask)
    }

    pub fn try_take_mask(&self) -> Result<DiffMask, DiffHandlerError> {
        let mut mask = self
            .mask
            .as_ref()
            .write()
            .map_err(|_| DiffHandlerError::MaskLockReentrant)?;
        let taken = *mask;
        mask.clear();
        Ok(taken)
    }
}
