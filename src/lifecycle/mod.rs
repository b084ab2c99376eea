//! Container lifecycle
//!
//! A container moves through three states, once each:
//!
//! ```text
//! Uninitialised
//!    ↓  init()     1. field injections of every stored instance
//!    ↓             2. deferred classes constructed in the order they were added
//!    ↓             3. post-construct hooks of every instance
//! Initialised
//!    ↓  destroy()  4. destroy hooks of every instance
//!    ↓             5. injected fields cleared
//!    ↓             6. store emptied
//! Destroyed
//! ```
//!
//! `get`, `has` and the `add` family work in the first two states. Anything added to an
//! initialised container is wired straight away.

mod manager;
mod state;

pub(crate) use manager::LifecycleManager;
pub use state::State;
