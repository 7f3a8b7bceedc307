//! Infrastructure layer for the driver client.
//!
//! Contains the adapters that touch the outside world: driver transports and
//! file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `vdd_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod storage;
pub mod transport;
