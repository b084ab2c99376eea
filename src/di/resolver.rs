//! Turns registered rules into wired instances.

use crate::di::container::Deferred;
use crate::di::{Args, Container, Instance, registry};
use crate::error::{ContainerError, Result};

/// Resolve every field injection registered for the instance's type against `container`.
///
/// Stops at the first query with no matching entry; fields set before that stay set.
pub(crate) fn inject(container: &Container, instance: &Instance) -> Result<()> {
    let Some(target) = registry::target(instance.class()) else {
        return Ok(());
    };

    for injection in &target.field_injections {
        let key = injection.query.resolve(injection.field);
        tracing::debug!(
            "Injecting {} into {}.{}",
            key,
            target.class(),
            injection.field
        );
        let dependency =
            container
                .lookup(&key)
                .ok_or_else(|| ContainerError::UnresolvedInjection {
                    class: target.class().name(),
                    field: injection.field,
                    key: key.clone(),
                })?;
        (injection.apply)(instance.cell(), Some(dependency))?;
    }
    Ok(())
}

/// Build a deferred class from the values currently stored under its parameter keys.
pub(crate) fn construct(container: &Container, deferred: &Deferred) -> Result<Instance> {
    let params = deferred.class.params();
    if let Some(missing) = params.iter().find(|key| !container.has(*key)) {
        return Err(ContainerError::MissingConstructorParameter {
            class: deferred.label(),
            key: missing.clone(),
        });
    }

    let values = params
        .iter()
        .filter_map(|key| {
            container
                .lookup(key)
                .map(|instance| (key.clone(), instance.clone()))
        })
        .collect();

    tracing::debug!(
        "Constructing {} with {} arguments",
        deferred.label(),
        params.len()
    );
    deferred
        .class
        .construct(&Args::new(deferred.label(), values))
}
