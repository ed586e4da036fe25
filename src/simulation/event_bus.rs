//! Synchronous publish/subscribe bus for game events
//!
//! Listeners are registered per [`EventKind`] and invoked in registration
//! order on the publishing thread before `publish` returns. Payload-carrying
//! listeners are keyed by the payload's `TypeId` as well as the kind, so a
//! listener registered for `T` only ever sees a `T`.
//!
//! The bus is single-threaded and is shared by `Rc` between the components
//! that need it; nothing reaches it through a global.

use log::{debug, warn};
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use super::game_state::ExperienceGain;

/// Maximum nesting of `publish` calls made from inside listeners
pub const MAX_DISPATCH_DEPTH: usize = 8;

/// Kinds of event carried on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RedLightViolation,
    GoalReached,
    GoalCompleted,
    ExperienceGained,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::RedLightViolation => "RED_LIGHT_VIOLATION",
            EventKind::GoalReached => "GOAL_REACHED",
            EventKind::GoalCompleted => "GOAL_COMPLETED",
            EventKind::ExperienceGained => "EXPERIENCE_GAINED",
        };
        f.write_str(name)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of a successful publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Number of listeners invoked
    Delivered(usize),
    /// Nobody was listening; logged as a warning
    NoSubscribers,
}

impl Delivery {
    pub fn listener_count(&self) -> usize {
        match self {
            Delivery::Delivered(n) => *n,
            Delivery::NoSubscribers => 0,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("publishing {kind} exceeded the nesting limit of {limit}")]
    ReentryLimit { kind: EventKind, limit: usize },

    #[error("{kind} has listeners for {expected} but was published with {found}")]
    PayloadMismatch {
        kind: EventKind,
        expected: &'static str,
        found: &'static str,
    },
}

/// Binds an event kind to its payload type at compile time
pub trait BusEvent: 'static {
    const KIND: EventKind;
    type Payload: 'static;
}

/// `GOAL_COMPLETED` carrying the index of the completed goal
pub struct GoalCompleted;

impl BusEvent for GoalCompleted {
    const KIND: EventKind = EventKind::GoalCompleted;
    type Payload = usize;
}

/// `EXPERIENCE_GAINED` carrying the progress snapshot before the award
pub struct ExperienceGained;

impl BusEvent for ExperienceGained {
    const KIND: EventKind = EventKind::ExperienceGained;
    type Payload = ExperienceGain;
}

type Listener = Rc<dyn Fn()>;
type PayloadListener<T> = Rc<dyn Fn(&T)>;

struct Registration {
    id: SubscriptionId,
    listener: Listener,
}

struct TypedRegistration {
    id: SubscriptionId,
    payload_type: TypeId,
    payload_name: &'static str,
    /// Always a `PayloadListener<T>` where `TypeId::of::<T>() == payload_type`
    listener: Rc<dyn Any>,
}

/// Decrements the dispatch depth when a publish call unwinds or returns
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[derive(Default)]
pub struct EventBus {
    plain: RefCell<HashMap<EventKind, Vec<Registration>>>,
    typed: RefCell<HashMap<EventKind, Vec<TypedRegistration>>>,
    next_id: Cell<u64>,
    depth: Cell<usize>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("plain_kinds", &self.plain.borrow().len())
            .field("typed_kinds", &self.typed.borrow().len())
            .field("depth", &self.depth.get())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_subscription(&self) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        SubscriptionId(id)
    }

    /// Register a parameterless listener
    pub fn subscribe(&self, kind: EventKind, listener: impl Fn() + 'static) -> SubscriptionId {
        let id = self.next_subscription();
        self.plain
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Registration {
                id,
                listener: Rc::new(listener),
            });
        id
    }

    /// Register a listener that receives a payload of type `T`
    pub fn subscribe_with<T: 'static>(
        &self,
        kind: EventKind,
        listener: impl Fn(&T) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription();
        let listener: PayloadListener<T> = Rc::new(listener);
        self.typed
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(TypedRegistration {
                id,
                payload_type: TypeId::of::<T>(),
                payload_name: type_name::<T>(),
                listener: Rc::new(listener),
            });
        id
    }

    /// Register a listener for a [`BusEvent`]; payload type checked at compile time
    pub fn subscribe_event<E: BusEvent>(
        &self,
        listener: impl Fn(&E::Payload) + 'static,
    ) -> SubscriptionId {
        self.subscribe_with::<E::Payload>(E::KIND, listener)
    }

    /// Remove one registration. Returns false when the id was not registered
    /// for this kind.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        if let Some(list) = self.plain.borrow_mut().get_mut(&kind) {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                list.remove(pos);
                return true;
            }
        }
        if let Some(list) = self.typed.borrow_mut().get_mut(&kind) {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of listeners currently registered for a kind (both registries)
    pub fn listener_count(&self, kind: EventKind) -> usize {
        let plain = self.plain.borrow().get(&kind).map_or(0, Vec::len);
        let typed = self.typed.borrow().get(&kind).map_or(0, Vec::len);
        plain + typed
    }

    fn enter(&self, kind: EventKind) -> Result<DepthGuard<'_>, DispatchError> {
        let depth = self.depth.get();
        if depth >= MAX_DISPATCH_DEPTH {
            return Err(DispatchError::ReentryLimit {
                kind,
                limit: MAX_DISPATCH_DEPTH,
            });
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard(&self.depth))
    }

    /// Invoke every parameterless listener for `kind`
    pub fn publish(&self, kind: EventKind) -> Result<Delivery, DispatchError> {
        let _guard = self.enter(kind)?;

        // Snapshot so listeners may (un)subscribe while we dispatch
        let listeners: Vec<Listener> = self
            .plain
            .borrow()
            .get(&kind)
            .map(|list| list.iter().map(|r| Rc::clone(&r.listener)).collect())
            .unwrap_or_default();

        if listeners.is_empty() {
            warn!("Event {} has no subscribers.", kind);
            return Ok(Delivery::NoSubscribers);
        }

        debug!("Publishing {} to {} listener(s)", kind, listeners.len());
        for listener in &listeners {
            listener();
        }
        Ok(Delivery::Delivered(listeners.len()))
    }

    /// Invoke every listener registered for `kind` with payload type `T`
    pub fn publish_with<T: 'static>(
        &self,
        kind: EventKind,
        payload: T,
    ) -> Result<Delivery, DispatchError> {
        let _guard = self.enter(kind)?;

        let (listeners, other_type) = {
            let typed = self.typed.borrow();
            let Some(list) = typed.get(&kind).filter(|list| !list.is_empty()) else {
                warn!("Event {} has no subscribers.", kind);
                return Ok(Delivery::NoSubscribers);
            };
            let listeners: Vec<PayloadListener<T>> = list
                .iter()
                .filter(|r| r.payload_type == TypeId::of::<T>())
                .filter_map(|r| r.listener.downcast_ref::<PayloadListener<T>>().cloned())
                .collect();
            (listeners, list[0].payload_name)
        };

        if listeners.is_empty() {
            return Err(DispatchError::PayloadMismatch {
                kind,
                expected: other_type,
                found: type_name::<T>(),
            });
        }

        debug!("Publishing {} to {} typed listener(s)", kind, listeners.len());
        for listener in &listeners {
            listener(&payload);
        }
        Ok(Delivery::Delivered(listeners.len()))
    }

    /// Publish a [`BusEvent`]; payload type checked at compile time
    pub fn publish_event<E: BusEvent>(
        &self,
        payload: E::Payload,
    ) -> Result<Delivery, DispatchError> {
        self.publish_with::<E::Payload>(E::KIND, payload)
    }
}
