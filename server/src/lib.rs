//! # Mimic Server
//! Replicates server-owned objects to the set of clients observing them, and
//! dispatches authorized remote calls. One [`Server::send_all_updates`] call
//! per simulation tick flushes dirty state to every connection in scope.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod object;
mod observer;
mod room;
mod server;
mod server_config;
mod transport;
mod user;
mod user_scope;
mod visibility;

pub use error::ServerError;
pub use object::ObjectRecord;
pub use observer::ObserverManager;
pub use room::{Room, RoomKey, RoomMut, RoomRef};
pub use server::Server;
pub use server_config::ServerConfig;
pub use transport::UserPacketSender;
pub use user::{User, UserKey, UserMut, UserRef};
pub use user_scope::UserScopeRef;
pub use visibility::{
    OwnerVisibility, PartitionVisibility, ProximityVisibility, RoomVisibility, Visibility,
    VisibilityCtx,
};
