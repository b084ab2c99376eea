use crate::di::{Instance, Key, Shared, TypeKey, registry};
use crate::error::{ContainerError, Result};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

pub(crate) type Factory = Arc<dyn Fn(&Args) -> Result<Instance> + Send + Sync>;

/// A class reference added to a container in place of a ready instance.
///
/// The container constructs it during `init`, or immediately when added to an initialised
/// container, passing the values stored under `params` positionally.
#[derive(Clone)]
pub struct Class {
    key: TypeKey,
    params: Vec<Key>,
    factory: Option<Factory>,
}

impl Class {
    /// Class reference for `T` using its registered constructor rule.
    ///
    /// Without a rule the parameter list is empty and construction fails with
    /// [`ContainerError::NoConstructor`].
    pub fn of<T: 'static>() -> Self {
        let key = TypeKey::of::<T>();
        match registry::target(key).and_then(|target| target.constructor.clone()) {
            Some(rule) => Self {
                key,
                params: rule.params,
                factory: Some(rule.factory),
            },
            None => Self {
                key,
                params: Vec::new(),
                factory: None,
            },
        }
    }

    /// Class reference for `T` built with `Default`, unless a constructor rule is registered.
    pub fn with_default<T: Default + 'static>() -> Self {
        let class = Self::of::<T>();
        if class.factory.is_some() {
            return class;
        }
        Self {
            factory: Some(Arc::new(|_: &Args| -> Result<Instance> {
                Ok(Instance::new(T::default()))
            })),
            ..class
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Declared constructor parameter keys, in positional order.
    pub fn params(&self) -> &[Key] {
        &self.params
    }

    pub(crate) fn construct(&self, args: &Args) -> Result<Instance> {
        let factory = self.factory.as_ref().ok_or(ContainerError::NoConstructor {
            class: self.key.name(),
        })?;
        factory(args)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("key", &self.key.name())
            .field("params", &self.params)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// Resolved constructor arguments, in the order the parameters were declared.
pub struct Args {
    class: String,
    values: Vec<(Key, Instance)>,
}

impl Args {
    pub(crate) fn new(class: String, values: Vec<(Key, Instance)>) -> Self {
        Self { class, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, as a handle to a `T`.
    pub fn get<T: 'static>(&self, index: usize) -> Result<Shared<T>> {
        let (key, instance) =
            self.values
                .get(index)
                .ok_or_else(|| ContainerError::ArgumentOutOfRange {
                    class: self.class.clone(),
                    index,
                })?;
        instance
            .downcast::<T>()
            .ok_or_else(|| ContainerError::DowncastFailed {
                key: key.clone(),
                expected: type_name::<T>(),
            })
    }

    /// The untyped argument at `index`.
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).map(|(_, instance)| instance)
    }
}
