use std::fmt;

/// Where a container is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Uninitialised,
    Initialised,
    /// Terminal; the store is empty and rejects additions.
    Destroyed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Uninitialised => "uninitialised",
            State::Initialised => "initialised",
            State::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
