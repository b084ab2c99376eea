use crate::di::{Class, Instance, Key, Shared, TypeKey, resolver};
use crate::error::{ContainerError, Result};
use crate::lifecycle::{LifecycleManager, State};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// A class reference waiting to be constructed by `init`.
#[derive(Clone, Debug)]
pub(crate) struct Deferred {
    pub(crate) name: Option<String>,
    pub(crate) class: Class,
}

impl Deferred {
    /// Name used in errors: the registration name if given, else the type name.
    pub(crate) fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{name}'"),
            None => self.class.key().name().to_string(),
        }
    }
}

/// Single-threaded dependency injection container.
///
/// Holds instances keyed by type or by name, wires their registered field and constructor
/// injections on [`init`](Container::init), and tears them down on
/// [`destroy`](Container::destroy).
pub struct Container {
    label: Option<String>,
    by_type: HashMap<TypeKey, Instance>,
    by_name: HashMap<String, Instance>,
    deferred: VecDeque<Deferred>,
    state: State,
}

impl Container {
    pub fn new() -> Self {
        Self {
            label: None,
            by_type: HashMap::new(),
            by_name: HashMap::new(),
            deferred: VecDeque::new(),
            state: State::Uninitialised,
        }
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new()
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("container")
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Add `value` keyed by its type, replacing any instance of the same type.
    pub fn add<T: 'static>(&mut self, value: T) -> Result<Shared<T>> {
        let shared = Rc::new(RefCell::new(value));
        self.add_shared(Rc::clone(&shared))?;
        Ok(shared)
    }

    /// Add `value` under `name`. Several names may hold instances of the same type.
    pub fn add_named<T: 'static>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<Shared<T>> {
        let shared = Rc::new(RefCell::new(value));
        self.add_shared_named(name, Rc::clone(&shared))?;
        Ok(shared)
    }

    pub fn add_shared<T: 'static>(&mut self, shared: Shared<T>) -> Result<()> {
        self.add_instance(None, Instance::from_shared(shared))
    }

    pub fn add_shared_named<T: 'static>(
        &mut self,
        name: impl Into<String>,
        shared: Shared<T>,
    ) -> Result<()> {
        self.add_instance(Some(name.into()), Instance::from_shared(shared))
    }

    /// Add a ready instance. On an initialised container its injections are resolved and its
    /// post-construct hooks run before this returns; the instance stays stored if that fails.
    pub fn add_instance(&mut self, name: Option<String>, instance: Instance) -> Result<()> {
        self.ensure_not_destroyed()?;
        self.store(name, instance.clone());
        if self.state == State::Initialised {
            self.wire_late(&instance)?;
        }
        Ok(())
    }

    /// Add a class to be constructed, keyed by its type once built.
    pub fn add_class(&mut self, class: Class) -> Result<()> {
        self.add_deferred(Deferred { name: None, class })
    }

    pub fn add_class_named(&mut self, name: impl Into<String>, class: Class) -> Result<()> {
        self.add_deferred(Deferred {
            name: Some(name.into()),
            class,
        })
    }

    fn add_deferred(&mut self, deferred: Deferred) -> Result<()> {
        self.ensure_not_destroyed()?;
        if self.state != State::Initialised {
            tracing::debug!("Deferring construction of {}", deferred.label());
            self.defer(deferred.name, deferred.class);
            return Ok(());
        }

        let instance = resolver::construct(self, &deferred)?;
        self.store(deferred.name, instance.clone());
        self.wire_late(&instance)
    }

    fn wire_late(&self, instance: &Instance) -> Result<()> {
        tracing::debug!("Wiring late addition {}", instance.class());
        resolver::inject(self, instance)?;
        LifecycleManager::new(vec![instance.clone()]).call_post_construct()
    }

    fn ensure_not_destroyed(&self) -> Result<()> {
        if self.state == State::Destroyed {
            return Err(ContainerError::ContainerDestroyed);
        }
        Ok(())
    }

    fn store(&mut self, name: Option<String>, instance: Instance) {
        match name {
            Some(name) => {
                self.by_name.insert(name, instance);
            }
            None => {
                self.by_type.insert(instance.class(), instance);
            }
        }
    }

    fn defer(&mut self, name: Option<String>, class: Class) {
        self.deferred.push_back(Deferred { name, class });
    }

    /// The instance stored under `key`, or `None`.
    pub fn get(&self, key: impl Into<Key>) -> Option<Instance> {
        self.lookup(&key.into()).cloned()
    }

    /// Typed form of [`get`](Container::get); `None` also when the stored value is not a `T`.
    pub fn get_as<T: 'static>(&self, key: impl Into<Key>) -> Option<Shared<T>> {
        self.lookup(&key.into())?.downcast::<T>()
    }

    /// The instance stored under the type `T`.
    pub fn get_type<T: 'static>(&self) -> Option<Shared<T>> {
        self.get_as::<T>(Key::of::<T>())
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.lookup(&key.into()).is_some()
    }

    pub(crate) fn lookup(&self, key: &Key) -> Option<&Instance> {
        match key {
            Key::Name(name) => self.by_name.get(name),
            Key::Type(ty) => self.by_type.get(ty),
        }
    }

    /// Every stored instance: type-keyed first, then name-keyed.
    pub(crate) fn instances(&self) -> Vec<Instance> {
        self.by_type
            .values()
            .chain(self.by_name.values())
            .cloned()
            .collect()
    }

    /// Number of stored instances, not counting classes awaiting construction.
    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of classes waiting for `init` to construct them.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Wire every stored instance, construct deferred classes and run post-construct hooks.
    ///
    /// The container becomes [`State::Initialised`] only if every step succeeds. A failure
    /// leaves it uninitialised without undoing injections already made.
    pub fn init(&mut self) -> Result<()> {
        if self.state != State::Uninitialised {
            return Err(ContainerError::AlreadyInitialised);
        }

        let span = tracing::debug_span!("init", container = %self.label());
        let _enter = span.enter();

        let snapshot = self.instances();
        tracing::info!("Resolving injections for {} instances...", snapshot.len());
        for instance in &snapshot {
            resolver::inject(self, instance)?;
        }

        tracing::info!("Constructing {} deferred classes...", self.deferred.len());
        while let Some(deferred) = self.deferred.front() {
            let instance = resolver::construct(self, deferred)?;
            let name = deferred.name.clone();
            self.deferred.pop_front();
            self.store(name, instance.clone());
            resolver::inject(self, &instance)?;
        }

        LifecycleManager::new(self.instances()).call_post_construct()?;

        self.state = State::Initialised;
        tracing::info!("Container '{}' initialised ({} instances)", self.label(), self.len());
        Ok(())
    }

    /// Run destroy hooks, clear injected fields and empty the store.
    ///
    /// Destroy hooks run before any field is cleared so they can still use their dependencies.
    /// The first failing hook aborts the call: the container stays initialised and keeps its
    /// instances.
    pub fn destroy(&mut self) -> Result<()> {
        match self.state {
            State::Uninitialised => return Err(ContainerError::NotInitialised),
            State::Destroyed => return Err(ContainerError::AlreadyDestroyed),
            State::Initialised => {}
        }

        let span = tracing::debug_span!("destroy", container = %self.label());
        let _enter = span.enter();

        let manager = LifecycleManager::new(self.instances());
        manager.call_destroy()?;
        manager.call_field_removal()?;

        self.by_type.clear();
        self.by_name.clear();
        self.deferred.clear();
        self.state = State::Destroyed;
        tracing::info!("Container '{}' destroyed", self.label());
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("label", &self.label())
            .field("state", &self.state)
            .field("by_type", &self.by_type.len())
            .field("by_name", &self.by_name.keys().collect::<Vec<_>>())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Settings {
        level: u8,
    }

    #[test]
    fn test_add_and_get_by_type() {
        let mut container = Container::new();
        let settings = container.add(Settings { level: 3 }).unwrap();

        let found = container.get_type::<Settings>().unwrap();
        assert!(Rc::ptr_eq(&settings, &found));
        assert!(container.has(Key::of::<Settings>()));
        assert_eq!(container.state(), State::Uninitialised);
    }

    #[test]
    fn test_missing_keys_are_absent() {
        let container = Container::new();
        assert!(container.get("nothing").is_none());
        assert!(container.get_type::<Settings>().is_none());
        assert!(!container.has("nothing"));
        assert!(container.is_empty());
    }

    #[test]
    fn test_names_take_precedence_over_types() {
        let mut container = Container::new();
        container.add_named("primary", Settings { level: 1 }).unwrap();
        container.add_named("backup", Settings { level: 2 }).unwrap();

        assert!(container.get_type::<Settings>().is_none());
        assert_eq!(
            container.get_as::<Settings>("backup").unwrap().borrow().level,
            2
        );
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_type_keyed_add_replaces_previous_instance() {
        let mut container = Container::new();
        container.add(Settings { level: 1 }).unwrap();
        container.add(Settings { level: 9 }).unwrap();

        assert_eq!(container.len(), 1);
        assert_eq!(container.get_type::<Settings>().unwrap().borrow().level, 9);
    }

    #[test]
    fn test_get_as_wrong_type_is_none() {
        let mut container = Container::new();
        container.add_named("settings", Settings { level: 1 }).unwrap();
        assert!(container.get_as::<String>("settings").is_none());
        assert!(container.get("settings").is_some());
    }

    #[test]
    fn test_classes_wait_for_init() {
        #[derive(Default)]
        struct Lazy;

        let mut container = Container::with_label("test");
        container.add_class(Class::with_default::<Lazy>()).unwrap();
        assert_eq!(container.pending(), 1);
        assert!(container.get_type::<Lazy>().is_none());

        container.init().unwrap();
        assert_eq!(container.pending(), 0);
        assert!(container.get_type::<Lazy>().is_some());
        assert_eq!(container.label(), "test");
    }

    #[test]
    fn test_state_transitions() {
        let mut container = Container::new();
        assert!(matches!(
            container.destroy(),
            Err(ContainerError::NotInitialised)
        ));

        container.init().unwrap();
        assert!(matches!(
            container.init(),
            Err(ContainerError::AlreadyInitialised)
        ));
        assert_eq!(container.state(), State::Initialised);

        container.destroy().unwrap();
        assert_eq!(container.state(), State::Destroyed);
        assert!(matches!(
            container.destroy(),
            Err(ContainerError::AlreadyDestroyed)
        ));
        assert!(matches!(
            container.init(),
            Err(ContainerError::AlreadyInitialised)
        ));
    }

    #[test]
    fn test_add_after_destroy_fails_and_store_stays_empty() {
        let mut container = Container::new();
        container.add(Settings { level: 1 }).unwrap();
        container.init().unwrap();
        container.destroy().unwrap();
        assert!(container.is_empty());

        assert!(matches!(
            container.add(Settings { level: 2 }),
            Err(ContainerError::ContainerDestroyed)
        ));
        assert!(matches!(
            container.add_class(Class::with_default::<String>()),
            Err(ContainerError::ContainerDestroyed)
        ));
        assert!(container.is_empty());
        assert_eq!(container.pending(), 0);
    }

    #[test]
    fn test_failing_destroy_hook_aborts_destroy() {
        struct Journal {
            closes: u32,
        }
        crate::di::registry::rules::<Journal>().on_destroy("close", |j| {
            j.closes += 1;
            Err(anyhow::anyhow!("disk full"))
        });

        let mut container = Container::new();
        let journal = container.add(Journal { closes: 0 }).unwrap();
        container.init().unwrap();

        let err = container.destroy().unwrap_err();
        assert!(matches!(err, ContainerError::HookFailed { hook: "close", .. }));
        assert_eq!(journal.borrow().closes, 1);
        assert_eq!(container.state(), State::Initialised);
        assert!(container.get_type::<Journal>().is_some());
    }
}
