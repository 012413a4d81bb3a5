//! Observer Dispatch
//!
//! Ordered event bus. Each subscription snapshots the observer's declared
//! event kinds at registration; `publish` walks subscriptions in
//! registration order and delivers only matching kinds.

use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use super::{EventKindSet, ObservationEvent, Observer};
use crate::strategies::Policies;

/// Where a subscription delivers to.
enum Target {
    Admission,
    Eviction,
    Ttl,
    External(Box<dyn Observer>),
}

struct Subscription {
    name: &'static str,
    kinds: EventKindSet,
    target: Target,
}

// == Observer Dispatch ==
/// Delivers events to the three policies and any external observers.
///
/// The policies stay owned by the manager, so `publish` borrows them for the
/// duration of one delivery. A failing or panicking observer is logged and
/// skipped; later observers still receive the event.
pub struct ObserverDispatch {
    subscriptions: Vec<Subscription>,
}

impl ObserverDispatch {
    // == Constructor ==
    /// Subscribes the admission, eviction and TTL policies, in that order.
    pub fn new(policies: &Policies) -> Self {
        let subscriptions = vec![
            Subscription {
                name: policies.admission.name(),
                kinds: policies.admission.supported_observations(),
                target: Target::Admission,
            },
            Subscription {
                name: policies.eviction.name(),
                kinds: policies.eviction.supported_observations(),
                target: Target::Eviction,
            },
            Subscription {
                name: policies.ttl.name(),
                kinds: policies.ttl.supported_observations(),
                target: Target::Ttl,
            },
        ];

        Self { subscriptions }
    }

    // == Subscribe ==
    /// Appends an external observer after everything already registered.
    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.subscriptions.push(Subscription {
            name: observer.name(),
            kinds: observer.supported_observations(),
            target: Target::External(observer),
        });
    }

    /// Number of registered observers, including ones with empty filters.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    // == Publish ==
    /// Delivers `event` to every subscriber whose filter contains its kind.
    ///
    /// Returns the number of observers that handled it successfully.
    pub fn publish(&mut self, policies: &mut Policies, event: &ObservationEvent) -> usize {
        let mut delivered = 0;

        for sub in self.subscriptions.iter_mut() {
            if !sub.kinds.contains(event.kind) {
                continue;
            }

            let target = &mut sub.target;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match target {
                Target::Admission => policies.admission.observe(event),
                Target::Eviction => policies.eviction.observe(event),
                Target::Ttl => policies.ttl.observe(event),
                Target::External(observer) => observer.observe(event),
            }));

            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    warn!(
                        observer = sub.name,
                        key = %event.key,
                        kind = %event.kind,
                        "Observer failed: {}",
                        err
                    );
                }
                Err(_) => {
                    error!(
                        observer = sub.name,
                        key = %event.key,
                        kind = %event.kind,
                        "Observer panicked, event dropped for this observer"
                    );
                }
            }
        }

        delivered
    }
}
