//! Driver transports implementing [`SyncChannel`](crate::application::sync_channel::SyncChannel).
//!
//! Only the in-process [`loopback`] driver ships here.  It follows the same
//! observable contract as the real driver (duplicate ids dropped, full state
//! broadcast on change) so sessions can be exercised without one.

pub mod loopback;

pub use loopback::LoopbackDriver;
