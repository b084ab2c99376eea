use crate::di::Key;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContainerError>;

/// Result type returned by user post-construct and destroy hooks.
pub type HookResult = anyhow::Result<()>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("cannot add elements to a destroyed context")]
    ContainerDestroyed,

    #[error("the container is already initialised")]
    AlreadyInitialised,

    #[error("the container is already destroyed")]
    AlreadyDestroyed,

    #[error("the container hasn't been initialised")]
    NotInitialised,

    #[error("unable to resolve injection {key} for field '{field}' of {class}")]
    UnresolvedInjection {
        class: &'static str,
        field: &'static str,
        key: Key,
    },

    #[error("couldn't find constructor parameter {key} for injection into {class}")]
    MissingConstructorParameter { class: String, key: Key },

    #[error("no constructor registered for {class}")]
    NoConstructor { class: &'static str },

    #[error("constructor of {class} asked for argument #{index} beyond its declared parameters")]
    ArgumentOutOfRange { class: String, index: usize },

    #[error("failed to downcast {key} to {expected}")]
    DowncastFailed { key: Key, expected: &'static str },

    #[error("instance of {class} is already borrowed")]
    InstanceBusy { class: &'static str },

    #[error("hook '{hook}' failed for {class}: {source}")]
    HookFailed {
        class: &'static str,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ContainerError {
    /// The lookup key this error is about, if it names one.
    pub fn key(&self) -> Option<&Key> {
        match self {
            ContainerError::UnresolvedInjection { key, .. }
            | ContainerError::MissingConstructorParameter { key, .. }
            | ContainerError::DowncastFailed { key, .. } => Some(key),
            _ => None,
        }
    }
}
