mod builder;
mod constructor;
mod container;
mod instance;
mod key;
pub mod registry;
mod resolver;

pub use builder::ContainerBuilder;
pub use constructor::{Args, Class};
pub use container::Container;
pub use instance::{Instance, Shared};
pub use key::{Key, Query, TypeKey};
pub use registry::{InjectionTarget, Rules};
