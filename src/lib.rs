//! tocsin — synchronous in-process message bus with hierarchical topic
//! routing, paired with a cancellable action stack for escape/undo-last-
//! opened semantics.
//!
//! Publishing a deep topic (`a:b:c`) also notifies subscribers of its
//! broader prefixes (`a`, `a:b`). The action stack resolves the most
//! recently opened live entry on demand, falling back to a host-supplied
//! default action when nothing is open; string-typed actions execute by
//! publishing through the bus.

/// Common error types.
pub mod error;
/// Pub/Sub: TopicRegistry, Channel, topic-path parsing.
pub mod pubsub;
/// Sequential named-task queue.
pub mod queue;
/// Cancellable action stack (escape stack).
pub mod stack;
/// Per-module state tracking on top of the bus.
pub mod state;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Operation errors and result types.
pub use error::{StackError, StackResult};
/// Topic registry, channels, subscription ids, path helpers.
pub use pubsub::{
    ancestor_paths, detect_delimiter, ends_with_wildcard, strip_wildcard, Channel, Delimiter,
    SubscriberFn, SubscriptionId, TopicRegistry,
};
/// Sequential task runner.
pub use queue::{TaskFn, TaskQueue};
/// Action stack API.
pub use stack::{Action, ActionFn, ActionStack, DefaultActionFn};
/// Module state tracking.
pub use state::{State, StateFn, StateMachine, StateSpec};
