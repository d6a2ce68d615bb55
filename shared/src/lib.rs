//! # Mimic Shared
//! Common functionality shared between mimic-server & mimic-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bigmap;
mod channel;
mod component;
mod host;
mod messages;
mod pose;
mod protocol;
mod remote_call;
mod serde;
mod types;

pub use bigmap::{BigMap, BigMapKey};
pub use channel::ChannelKind;
pub use component::{
    component_kinds::{ComponentKind, ComponentKinds, ComponentSchema, FieldSchema},
    diff_mask::{DiffMask, MAX_FIELDS},
    error::ComponentError,
    property::{ChangeHook, Property},
    property_mutate::{PropertyMutate, PropertyMutator},
    replicate::Replicate,
};
pub use host::{
    error::DiffHandlerError,
    global_diff_handler::GlobalDiffHandler,
    mut_channel::{MutChannel, MutReceiver, MutSender},
};
pub use messages::packet_type::PacketType;
pub use pose::{Pose, Quat, Vec3};
pub use protocol::{Protocol, ProtocolBuilder, ProtocolError};
pub use remote_call::{
    descriptor::{CallContext, CallKind, CallTrampoline, GuardPolicy, RemoteCallDescriptor, RoleGuard},
    error::RemoteCallError,
    func_id::FuncId,
    registry::{DispatchOutcome, RemoteCallRegistry},
};
pub use serde::{ByteReader, ByteWriter, Serde, SerdeErr};
pub use types::{ComponentIndex, HostType, ObjectId, PartitionId, Tick};
