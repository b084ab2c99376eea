use crate::di::{Class, Container, Instance};
use crate::error::Result;

enum Pending {
    Instance(Option<String>, Instance),
    Class(Option<String>, Class),
}

/// Builder for constructing a dependency injection container
///
/// [`ContainerBuilder::create`] returns an empty container directly. The fluent form collects
/// a label and the initial contents first.
///
/// # Example
/// ```
/// use wirekit::{Class, ContainerBuilder};
///
/// #[derive(Default)]
/// struct Clock;
///
/// let mut container = ContainerBuilder::new()
///     .label("app")
///     .add(String::from("config"))
///     .add_class(Class::with_default::<Clock>())
///     .build()
///     .unwrap();
///
/// container.init().unwrap();
/// assert!(container.get_type::<Clock>().is_some());
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    label: Option<String>,
    items: Vec<Pending>,
}

impl ContainerBuilder {
    /// Create a new, uninitialised container
    pub fn create() -> Container {
        Container::new()
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Label reported in logs and `Debug` output
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn add<T: 'static>(mut self, value: T) -> Self {
        self.items.push(Pending::Instance(None, Instance::new(value)));
        self
    }

    pub fn add_named<T: 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.items
            .push(Pending::Instance(Some(name.into()), Instance::new(value)));
        self
    }

    pub fn add_instance(mut self, name: Option<String>, instance: Instance) -> Self {
        self.items.push(Pending::Instance(name, instance));
        self
    }

    pub fn add_class(mut self, class: Class) -> Self {
        self.items.push(Pending::Class(None, class));
        self
    }

    pub fn add_class_named(mut self, name: impl Into<String>, class: Class) -> Self {
        self.items.push(Pending::Class(Some(name.into()), class));
        self
    }

    /// Build the container, still uninitialised
    ///
    /// Items go through the container's regular `add*` path in the order they were given.
    pub fn build(self) -> Result<Container> {
        let mut container = match self.label {
            Some(label) => Container::with_label(label),
            None => Container::new(),
        };
        for item in self.items {
            match item {
                Pending::Instance(name, instance) => container.add_instance(name, instance)?,
                Pending::Class(None, class) => container.add_class(class)?,
                Pending::Class(Some(name), class) => container.add_class_named(name, class)?,
            }
        }
        Ok(container)
    }
}
