use crate::di::TypeKey;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle to a container-managed value.
///
/// Injected fields hold these handles, so a dependency is shared between the container and
/// every instance it was injected into.
pub type Shared<T> = Rc<RefCell<T>>;

/// A type-erased stored value together with the identity of its concrete type.
#[derive(Clone)]
pub struct Instance {
    value: Rc<dyn Any>,
    class: TypeKey,
}

impl Instance {
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_shared(Rc::new(RefCell::new(value)))
    }

    pub fn from_shared<T: 'static>(shared: Shared<T>) -> Self {
        Self {
            value: shared,
            class: TypeKey::of::<T>(),
        }
    }

    /// Concrete type of the stored value.
    pub fn class(&self) -> TypeKey {
        self.class
    }

    /// Recover the typed handle, or `None` if the value is not a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Shared<T>> {
        Rc::clone(&self.value).downcast::<RefCell<T>>().ok()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<RefCell<T>>()
    }

    /// Whether both handles point at the same stored value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// The `RefCell<T>` behind this instance, for rule closures that know `T`.
    pub(crate) fn cell(&self) -> &dyn Any {
        &*self.value
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .finish_non_exhaustive()
    }
}
