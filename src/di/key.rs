use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a concrete type, as used for type-keyed storage.
///
/// Two keys are equal when their `TypeId`s are; the name is carried for diagnostics only.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Selector for a stored instance: either a name or a type identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Type(TypeKey),
}

impl Key {
    pub fn name(name: impl Into<String>) -> Self {
        Key::Name(name.into())
    }

    pub fn of<T: 'static>() -> Self {
        Key::Type(TypeKey::of::<T>())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "'{name}'"),
            Key::Type(ty) => write!(f, "type {ty}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<TypeKey> for Key {
    fn from(ty: TypeKey) -> Self {
        Key::Type(ty)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// How a field injection computes its lookup key.
///
/// The key is computed each time the injection is resolved, not when the rule is registered.
#[derive(Clone, Debug, Default)]
pub enum Query {
    /// Look up an instance registered under this name.
    Name(String),
    /// Call the function and look up whatever key it produces.
    Deferred(fn() -> Key),
    /// Use the field's own name as a name key.
    #[default]
    Field,
}

impl Query {
    pub fn name(name: impl Into<String>) -> Self {
        Query::Name(name.into())
    }

    /// Type-keyed lookup of `T`, evaluated lazily.
    pub fn of_type<T: 'static>() -> Self {
        Query::Deferred(Key::of::<T>)
    }

    pub fn resolve(&self, field: &str) -> Key {
        match self {
            Query::Name(name) => Key::Name(name.clone()),
            Query::Deferred(produce) => produce(),
            Query::Field => Key::Name(field.to_string()),
        }
    }
}
