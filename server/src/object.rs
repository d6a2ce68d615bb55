use mimic_shared::{PartitionId, Replicate, Vec3};

use crate::user::UserKey;

/// Server-side record of one replicated object: its optional owning
/// connection, its ordered component list, and the state visibility
/// strategies read (position, partition)
pub struct ObjectRecord {
    owner: Option<UserKey>,
    components: Vec<Box<dyn Replicate>>,
    position: Option<Vec3>,
    partition: Option<PartitionId>,
}

impl ObjectRecord {
    pub(crate) fn new() -> Self {
        Self {
            owner: None,
            components: Vec::new(),
            position: None,
            partition: None,
        }
    }

    pub fn owner(&self) -> Option<UserKey> {
        self.owner
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    pub fn partition(&self) -> Option<PartitionId> {
        self.partition
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn set_owner(&mut self, owner: Option<UserKey>) {
        self.owner = owner;
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = Some(position);
    }

    pub(crate) fn set_partition(&mut self, partition: Option<PartitionId>) {
        self.partition = partition;
    }

    pub(crate) fn push_component(&mut self, component: Box<dyn Replicate>) -> u8 {
        self.components.push(component);
        (self.components.len() - 1) as u8
    }

    pub(crate) fn component(&self, index: u8) -> Option<&dyn Replicate> {
        self.components.get(index as usize).map(|c| c.as_ref())
    }

    pub(crate) fn component_mut(&mut self, index: u8) -> Option<&mut Box<dyn Replicate>> {
        self.components.get_mut(index as usize)
    }

    pub(crate) fn components(&self) -> &[Box<dyn Replicate>] {
        &self.components
    }
}
