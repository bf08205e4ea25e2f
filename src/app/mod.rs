//! Application state layer.
//!
//! - `state` - [`AppState`], the owner of the current project
//! - `history` - bounded undo/redo stacks
//! - `observers` - listener registry and [`Subscription`] handles
//! - `propagation` - column rename/delete rewriting
//! - `error` - [`StateError`]

mod error;
mod history;
mod observers;
mod propagation;
mod state;

pub use error::{StateError, StateResult};
pub use history::History;
pub use observers::Subscription;
pub use state::AppState;
