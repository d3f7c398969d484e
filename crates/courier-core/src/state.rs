//! Request-scoped state.
//!
//! Each request carries a single typed state slot stored in its
//! [`http::Extensions`]. The application sets it where the request is
//! created (for example, to the authenticated caller) and any stage further
//! down the pipeline can read it without the stages in between knowing.
//!
//! The slot is keyed by a type private to this module, so it can never
//! collide with other extensions on the same request.
//!
//! # Example
//!
//! ```
//! use courier_core::{Request, RequestStateExt};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Caller {
//!     user_id: String,
//! }
//!
//! let mut request = Request::default();
//! request.set_state(Caller { user_id: "u-1".to_string() });
//!
//! assert_eq!(request.state::<Caller>().user_id, "u-1");
//!
//! // Reading with another type yields that type's default.
//! assert_eq!(request.state::<u32>(), 0);
//!
//! request.clear_state();
//! assert_eq!(request.state::<Caller>(), Caller::default());
//! ```

use std::any::Any;
use std::sync::Arc;

/// Name of the state slot, used in diagnostics.
pub const STATE_SLOT: &str = "courier_core::state::State";

/// Holder stored in the request extensions.
#[derive(Clone)]
struct StateSlot(Arc<dyn Any + Send + Sync>);

impl std::fmt::Debug for StateSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(STATE_SLOT)
    }
}

/// Typed state access on a request.
///
/// None of these operations can fail: a missing value and a value of a
/// different type are both reported as absence.
pub trait RequestStateExt {
    /// Stores `value` in the state slot, replacing any previous value.
    fn set_state<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self;

    /// Returns a clone of the stored value, or `T::default()` when the slot
    /// is empty or holds a different type.
    fn state<T: Any + Send + Sync + Clone + Default>(&self) -> T;

    /// Borrows the stored value if it is a `T`.
    fn state_ref<T: Any + Send + Sync>(&self) -> Option<&T>;

    /// Returns true if the slot holds any value.
    fn has_state(&self) -> bool;

    /// Empties the slot. No-op if it was already empty.
    fn clear_state(&mut self) -> &mut Self;
}

impl<B> RequestStateExt for http::Request<B> {
    fn set_state<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.extensions_mut().insert(StateSlot(Arc::new(value)));
        self
    }

    fn state<T: Any + Send + Sync + Clone + Default>(&self) -> T {
        self.state_ref::<T>().cloned().unwrap_or_default()
    }

    fn state_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions()
            .get::<StateSlot>()
            .and_then(|slot| slot.0.downcast_ref::<T>())
    }

    fn has_state(&self) -> bool {
        self.extensions().get::<StateSlot>().is_some()
    }

    fn clear_state(&mut self) -> &mut Self {
        self.extensions_mut().remove::<StateSlot>();
        self
    }
}
