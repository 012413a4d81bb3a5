//! Observer Module
//!
//! Lifecycle events and the bus that delivers them to policies.
//!
//! The manager and the expiring store both publish into the same
//! [`ObserverDispatch`], so every policy sees a uniform stream whether an
//! entry left through deletion, expiry or forced eviction.

mod dispatch;
mod events;

pub use dispatch::ObserverDispatch;
pub use events::{EventKind, EventKindSet, EventPayload, ObservationEvent};

use crate::error::ObserverError;

// == Observer ==
/// Receives lifecycle events for the kinds it declares.
pub trait Observer: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Event kinds this observer wants delivered.
    fn supported_observations(&self) -> EventKindSet;

    fn observe(&mut self, event: &ObservationEvent) -> Result<(), ObserverError>;
}
