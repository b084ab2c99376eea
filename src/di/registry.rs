//! Process-wide injection metadata.
//!
//! Rules are registered against a concrete type, normally once from a setup function that runs
//! before any container is built, and are shared by every container holding instances of that
//! type. Lists are append-only: registering the same hook twice makes it fire twice. Rules are
//! attached to the exact type only; nothing is inherited through wrappers or newtypes.
//!
//! ```
//! use std::sync::Once;
//! use wirekit::di::{Query, Shared, registry};
//!
//! struct Database;
//!
//! struct UserService {
//!     database: Option<Shared<Database>>,
//!     ready: bool,
//! }
//!
//! fn register_rules() {
//!     static ONCE: Once = Once::new();
//!     ONCE.call_once(|| {
//!         registry::rules::<UserService>()
//!             .inject("database", Query::of_type::<Database>(), |s, db| s.database = db)
//!             .post_construct("start", |s| {
//!                 s.ready = true;
//!                 Ok(())
//!             });
//!     });
//! }
//! # register_rules();
//! ```

use crate::di::constructor::{Args, Factory};
use crate::di::{Instance, Key, Query, Shared, TypeKey};
use crate::error::{ContainerError, HookResult, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::cell::{RefCell, RefMut};
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

static REGISTRY: LazyLock<DashMap<TypeId, Arc<InjectionTarget>>> = LazyLock::new(DashMap::new);

type Setter = Arc<dyn Fn(&dyn Any, Option<&Instance>) -> Result<()> + Send + Sync>;
type HookFn = Arc<dyn Fn(&dyn Any) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct FieldInjection {
    pub(crate) field: &'static str,
    pub(crate) query: Query,
    pub(crate) apply: Setter,
}

#[derive(Clone)]
pub(crate) struct FieldRemoval {
    pub(crate) field: &'static str,
    pub(crate) apply: Setter,
}

#[derive(Clone)]
pub(crate) struct Hook {
    pub(crate) method: &'static str,
    pub(crate) run: HookFn,
}

#[derive(Clone)]
pub(crate) struct ConstructorRule {
    pub(crate) params: Vec<Key>,
    pub(crate) factory: Factory,
}

/// Everything registered against one type.
#[derive(Clone)]
pub struct InjectionTarget {
    pub(crate) class: TypeKey,
    pub(crate) field_injections: Vec<FieldInjection>,
    pub(crate) removal_hooks: Vec<FieldRemoval>,
    pub(crate) post_construct_hooks: Vec<Hook>,
    pub(crate) destroy_hooks: Vec<Hook>,
    pub(crate) constructor: Option<ConstructorRule>,
}

impl InjectionTarget {
    fn new(class: TypeKey) -> Self {
        Self {
            class,
            field_injections: Vec::new(),
            removal_hooks: Vec::new(),
            post_construct_hooks: Vec::new(),
            destroy_hooks: Vec::new(),
            constructor: None,
        }
    }

    pub fn class(&self) -> TypeKey {
        self.class
    }

    /// Injected fields with their queries, in registration order.
    pub fn injected_fields(&self) -> Vec<(&'static str, &Query)> {
        self.field_injections
            .iter()
            .map(|injection| (injection.field, &injection.query))
            .collect()
    }

    pub fn post_construct_methods(&self) -> Vec<&'static str> {
        self.post_construct_hooks.iter().map(|h| h.method).collect()
    }

    pub fn destroy_methods(&self) -> Vec<&'static str> {
        self.destroy_hooks.iter().map(|h| h.method).collect()
    }

    /// Constructor parameter keys, present only for constructor-injected types.
    pub fn constructor_params(&self) -> Option<&[Key]> {
        self.constructor.as_ref().map(|rule| rule.params.as_slice())
    }
}

/// Snapshot of the rules registered for `class`, or `None` if it never registered any.
///
/// Later registrations against the same type do not change a snapshot already handed out.
pub fn target(class: TypeKey) -> Option<Arc<InjectionTarget>> {
    REGISTRY.get(&class.id()).map(|entry| Arc::clone(entry.value()))
}

pub fn is_registered<C: 'static>() -> bool {
    REGISTRY.contains_key(&TypeId::of::<C>())
}

fn update<C: 'static>(f: impl FnOnce(&mut InjectionTarget)) {
    let mut entry = REGISTRY
        .entry(TypeId::of::<C>())
        .or_insert_with(|| Arc::new(InjectionTarget::new(TypeKey::of::<C>())));
    f(Arc::make_mut(entry.value_mut()));
}

fn borrow_target<C: 'static>(cell: &dyn Any) -> Result<RefMut<'_, C>> {
    let cell = cell
        .downcast_ref::<RefCell<C>>()
        .ok_or_else(|| ContainerError::DowncastFailed {
            key: Key::of::<C>(),
            expected: type_name::<C>(),
        })?;
    cell.try_borrow_mut()
        .map_err(|_| ContainerError::InstanceBusy {
            class: type_name::<C>(),
        })
}

/// Register an injection into `field` of `C`.
///
/// `setter` is called with the resolved dependency during `init`, and with `None` when the
/// container is destroyed.
pub fn register_field_injection<C, D, F>(field: &'static str, query: Query, setter: F)
where
    C: 'static,
    D: 'static,
    F: Fn(&mut C, Option<Shared<D>>) + Send + Sync + 'static,
{
    let apply: Setter = Arc::new(
        move |cell: &dyn Any, dependency: Option<&Instance>| -> Result<()> {
            let value = match dependency {
                Some(instance) => Some(instance.downcast::<D>().ok_or_else(|| {
                    ContainerError::DowncastFailed {
                        key: Key::Type(instance.class()),
                        expected: type_name::<D>(),
                    }
                })?),
                None => None,
            };
            let mut target = borrow_target::<C>(cell)?;
            setter(&mut *target, value);
            Ok(())
        },
    );

    tracing::debug!(
        "Registered field injection {}.{} ({:?})",
        type_name::<C>(),
        field,
        query
    );
    update::<C>(|target| {
        target.field_injections.push(FieldInjection {
            field,
            query,
            apply: Arc::clone(&apply),
        });
        target.removal_hooks.push(FieldRemoval { field, apply });
    });
}

fn hook<C, F>(method: &'static str, body: F) -> Hook
where
    C: 'static,
    F: Fn(&mut C) -> HookResult + Send + Sync + 'static,
{
    let run: HookFn = Arc::new(move |cell: &dyn Any| -> Result<()> {
        let mut target = borrow_target::<C>(cell)?;
        body(&mut *target).map_err(|source| ContainerError::HookFailed {
            class: type_name::<C>(),
            hook: method,
            source,
        })
    });
    Hook { method, run }
}

/// Register a method to run after the container has wired every instance.
pub fn register_post_construct<C, F>(method: &'static str, body: F)
where
    C: 'static,
    F: Fn(&mut C) -> HookResult + Send + Sync + 'static,
{
    tracing::debug!("Registered post-construct {}::{}", type_name::<C>(), method);
    let hook = hook::<C, F>(method, body);
    update::<C>(|target| target.post_construct_hooks.push(hook));
}

/// Register a method to run when the container is destroyed, before injected fields are cleared.
pub fn register_destroy<C, F>(method: &'static str, body: F)
where
    C: 'static,
    F: Fn(&mut C) -> HookResult + Send + Sync + 'static,
{
    tracing::debug!("Registered destroy {}::{}", type_name::<C>(), method);
    let hook = hook::<C, F>(method, body);
    update::<C>(|target| target.destroy_hooks.push(hook));
}

/// Register how to construct `C` from the values stored under `params`.
///
/// A type has at most one constructor rule; registering another replaces it.
pub fn register_constructor<C, K, F>(params: impl IntoIterator<Item = K>, factory: F)
where
    C: 'static,
    K: Into<Key>,
    F: Fn(&Args) -> Result<C> + Send + Sync + 'static,
{
    let params: Vec<Key> = params.into_iter().map(Into::into).collect();
    let factory: Factory =
        Arc::new(move |args: &Args| -> Result<Instance> { factory(args).map(Instance::new) });

    tracing::debug!(
        "Registered constructor for {} with {} parameters",
        type_name::<C>(),
        params.len()
    );
    update::<C>(|target| {
        if target.constructor.is_some() {
            tracing::warn!("Replacing constructor rule for {}", type_name::<C>());
        }
        target.constructor = Some(ConstructorRule { params, factory });
    });
}

/// Fluent wrapper over the `register_*` functions for one type.
pub struct Rules<C> {
    _class: PhantomData<fn() -> C>,
}

pub fn rules<C: 'static>() -> Rules<C> {
    Rules {
        _class: PhantomData,
    }
}

impl<C: 'static> Rules<C> {
    pub fn inject<D, F>(self, field: &'static str, query: Query, setter: F) -> Self
    where
        D: 'static,
        F: Fn(&mut C, Option<Shared<D>>) + Send + Sync + 'static,
    {
        register_field_injection::<C, D, F>(field, query, setter);
        self
    }

    pub fn post_construct<F>(self, method: &'static str, body: F) -> Self
    where
        F: Fn(&mut C) -> HookResult + Send + Sync + 'static,
    {
        register_post_construct::<C, F>(method, body);
        self
    }

    pub fn on_destroy<F>(self, method: &'static str, body: F) -> Self
    where
        F: Fn(&mut C) -> HookResult + Send + Sync + 'static,
    {
        register_destroy::<C, F>(method, body);
        self
    }

    pub fn constructor<K, F>(self, params: impl IntoIterator<Item = K>, factory: F) -> Self
    where
        K: Into<Key>,
        F: Fn(&Args) -> Result<C> + Send + Sync + 'static,
    {
        register_constructor::<C, K, F>(params, factory);
        self
    }
}
