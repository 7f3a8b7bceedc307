//! Domain entities for the Virtual Display Driver client.
//!
//! This module contains pure state-model logic with no infrastructure
//! dependencies.
//!
//! # Ownership
//!
//! The tree is strictly owned top-down: a [`registry::MonitorRegistry`] owns
//! its monitors, a [`monitor::Monitor`] owns its modes, and a [`mode::Mode`]
//! owns its [`refresh_rate::RefreshRateSet`].  Nothing points back to its
//! owner, so any check that needs context (is this id used elsewhere? is this
//! resolution duplicated on the monitor?) is answered by the owner.
//!
//! # Advisory validity
//!
//! Every entity accepts provisionally invalid states while it is being
//! edited.  Whether the tree is fit to hand to the driver is answered only by
//! the pure functions in [`validity`], which recompute the answer from the
//! current structure on every call.

/// The ordered, duplicate-free refresh rates of one mode.
pub mod refresh_rate;

/// A resolution plus its refresh rates.
pub mod mode;

/// A single virtual monitor.
pub mod monitor;

/// The owning collection of all monitors for one client session.
pub mod registry;

/// On-demand structural checks over the whole tree.
pub mod validity;
