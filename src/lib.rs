//! # Wirekit
//!
//! A minimal dependency injection container for single-threaded application bootstrap.
//!
//! ## Features
//!
//! - **Field injection**: dependencies are assigned into `Option<Shared<T>>` fields, looked up
//!   by name, by type, or by the field's own name
//! - **Constructor injection**: classes are constructed from stored values passed positionally
//! - **Lifecycle hooks**: post-construct methods after wiring, destroy methods before teardown
//! - **Named instances**: several instances of one type, told apart by name
//!
//! Rules are registered once per type in a process-wide registry and shared by every container.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Once;
//! use wirekit::prelude::*;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     database: Option<Shared<Database>>,
//!     cache: Option<Shared<String>>,
//!     started: bool,
//! }
//!
//! struct Reports {
//!     users: Shared<UserService>,
//! }
//!
//! fn register_rules() {
//!     static ONCE: Once = Once::new();
//!     ONCE.call_once(|| {
//!         registry::rules::<UserService>()
//!             .inject("database", Query::of_type::<Database>(), |s, db| s.database = db)
//!             .inject("cache", Query::Field, |s, cache| s.cache = cache)
//!             .post_construct("start", |s| {
//!                 s.started = true;
//!                 Ok(())
//!             });
//!         registry::rules::<Reports>().constructor([Key::of::<UserService>()], |args| {
//!             Ok(Reports {
//!                 users: args.get(0)?,
//!             })
//!         });
//!     });
//! }
//!
//! fn main() -> wirekit::Result<()> {
//!     register_rules();
//!
//!     let mut container = ContainerBuilder::create();
//!     container.add(Database { url: "postgres://localhost".into() })?;
//!     container.add_named("cache", String::from("redis://localhost"))?;
//!     let users = container.add(UserService { database: None, cache: None, started: false })?;
//!     container.add_class(Class::of::<Reports>())?;
//!
//!     container.init()?;
//!     assert!(users.borrow().started);
//!     assert_eq!(users.borrow().database.as_ref().unwrap().borrow().url, "postgres://localhost");
//!     assert!(container.get_type::<Reports>().is_some());
//!
//!     container.destroy()?;
//!     assert!(users.borrow().database.is_none());
//!     Ok(())
//! }
//! ```

pub mod di;
pub mod error;
pub mod lifecycle;

// Re-export core types
pub use di::{Args, Class, Container, ContainerBuilder, Instance, Key, Query, Shared, TypeKey};
pub use error::{ContainerError, HookResult, Result};
pub use lifecycle::State;

/// Prelude module for convenient imports
///
/// ```
/// use wirekit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::di::registry;
    pub use crate::di::{
        Args, Class, Container, ContainerBuilder, Instance, Key, Query, Shared, TypeKey,
    };
    pub use crate::error::{ContainerError, HookResult, Result};
    pub use crate::lifecycle::State;
}
