//! Lifecycle Manager
//!
//! Runs the registered hooks of a set of instances, one pass at a time.

use crate::di::{Instance, InjectionTarget, registry};
use crate::error::Result;
use std::sync::Arc;

/// An instance paired with the rules registered for its type
struct Managed {
    instance: Instance,
    target: Arc<InjectionTarget>,
}

/// Executes lifecycle hook passes over a snapshot of container instances
///
/// Instances whose type registered no rules are dropped from the snapshot up front. Within a
/// pass, instances are visited in snapshot order and each instance's hooks in registration
/// order.
pub(crate) struct LifecycleManager {
    managed: Vec<Managed>,
}

impl LifecycleManager {
    pub(crate) fn new(instances: Vec<Instance>) -> Self {
        let managed = instances
            .into_iter()
            .filter_map(|instance| {
                registry::target(instance.class()).map(|target| Managed { instance, target })
            })
            .collect();
        Self { managed }
    }

    /// Execute all post-construct hooks
    ///
    /// Stops at the first failing hook.
    pub(crate) fn call_post_construct(&self) -> Result<()> {
        tracing::info!("Calling post-construct hooks...");

        for managed in &self.managed {
            for hook in &managed.target.post_construct_hooks {
                tracing::debug!("Post-construct: {}::{}", managed.target.class(), hook.method);
                if let Err(e) = (hook.run)(managed.instance.cell()) {
                    tracing::error!(
                        "Post-construct failed for {}::{}: {}",
                        managed.target.class(),
                        hook.method,
                        e
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Post-construct complete ({} hooks executed)",
            self.post_construct_hook_count()
        );
        Ok(())
    }

    /// Execute all destroy hooks
    ///
    /// Stops at the first failing hook; fields are not cleared by this pass.
    pub(crate) fn call_destroy(&self) -> Result<()> {
        tracing::info!("Calling destroy hooks...");

        for managed in &self.managed {
            for hook in &managed.target.destroy_hooks {
                tracing::debug!("Destroying: {}::{}", managed.target.class(), hook.method);
                if let Err(e) = (hook.run)(managed.instance.cell()) {
                    tracing::error!(
                        "Destroy failed for {}::{}: {}",
                        managed.target.class(),
                        hook.method,
                        e
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Destroy complete ({} hooks executed)",
            self.destroy_hook_count()
        );
        Ok(())
    }

    /// Set every injected field back to `None`
    pub(crate) fn call_field_removal(&self) -> Result<()> {
        for managed in &self.managed {
            for removal in &managed.target.removal_hooks {
                tracing::debug!("Clearing {}.{}", managed.target.class(), removal.field);
                if let Err(e) = (removal.apply)(managed.instance.cell(), None) {
                    tracing::error!(
                        "Clearing {}.{} failed: {}",
                        managed.target.class(),
                        removal.field,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn post_construct_hook_count(&self) -> usize {
        self.managed
            .iter()
            .map(|m| m.target.post_construct_hooks.len())
            .sum()
    }

    pub(crate) fn destroy_hook_count(&self) -> usize {
        self.managed
            .iter()
            .map(|m| m.target.destroy_hooks.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Query, Shared};
    use crate::error::ContainerError;
    use std::sync::{Arc, Mutex};

    struct Socket;

    struct Client {
        socket: Option<Shared<Socket>>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    fn register_client() {
        registry::rules::<Client>()
            .inject("socket", Query::of_type::<Socket>(), |c, s| c.socket = s)
            .post_construct("open", |c| {
                c.log.lock().unwrap().push("open");
                Ok(())
            })
            .post_construct("handshake", |c| {
                c.log.lock().unwrap().push("handshake");
                Ok(())
            })
            .on_destroy("flush", |c| {
                assert!(c.socket.is_some());
                c.log.lock().unwrap().push("flush");
                Ok(())
            })
            .on_destroy("close", |c| {
                c.log.lock().unwrap().push("close");
                Ok(())
            });
    }

    #[test]
    fn test_lifecycle_passes() {
        register_client();

        let log = Arc::new(Mutex::new(Vec::new()));
        let client = Instance::new(Client {
            socket: None,
            log: Arc::clone(&log),
        });
        let socket = Instance::new(Socket);
        let target = registry::target(client.class()).unwrap();
        (target.field_injections[0].apply)(client.cell(), Some(&socket)).unwrap();

        let manager = LifecycleManager::new(vec![client.clone(), socket]);
        assert_eq!(manager.post_construct_hook_count(), 2);
        assert_eq!(manager.destroy_hook_count(), 2);

        manager.call_post_construct().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["open", "handshake"]);

        manager.call_destroy().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["open", "handshake", "flush", "close"]
        );

        manager.call_field_removal().unwrap();
        assert!(client.downcast::<Client>().unwrap().borrow().socket.is_none());
    }

    #[test]
    fn test_post_construct_stops_at_first_failure() {
        struct Flaky {
            runs: u32,
        }
        registry::rules::<Flaky>()
            .post_construct("fail", |_| Err(anyhow::anyhow!("boom")))
            .post_construct("after", |f| {
                f.runs += 1;
                Ok(())
            });

        let flaky = Instance::new(Flaky { runs: 0 });
        let err = LifecycleManager::new(vec![flaky.clone()])
            .call_post_construct()
            .unwrap_err();
        assert!(matches!(err, ContainerError::HookFailed { hook: "fail", .. }));
        assert_eq!(flaky.downcast::<Flaky>().unwrap().borrow().runs, 0);
    }

    #[test]
    fn test_destroy_stops_at_first_failure() {
        struct Drain {
            closes: u32,
        }
        registry::rules::<Drain>()
            .on_destroy("flush", |_| Err(anyhow::anyhow!("disk full")))
            .on_destroy("close", |d| {
                d.closes += 1;
                Ok(())
            });

        let drain = Instance::new(Drain { closes: 0 });
        let err = LifecycleManager::new(vec![drain.clone()])
            .call_destroy()
            .unwrap_err();
        assert!(matches!(err, ContainerError::HookFailed { hook: "flush", .. }));
        assert_eq!(drain.downcast::<Drain>().unwrap().borrow().closes, 0);
    }

    #[test]
    fn test_field_removal_reports_busy_instance() {
        struct Pipe;
        struct Reader {
            pipe: Option<Shared<Pipe>>,
        }
        registry::rules::<Reader>().inject("pipe", Query::of_type::<Pipe>(), |r, p| r.pipe = p);

        let reader = Instance::new(Reader { pipe: None });
        let manager = LifecycleManager::new(vec![reader.clone()]);
        let held = reader.downcast::<Reader>().unwrap();
        let _guard = held.borrow_mut();

        let err = manager.call_field_removal().unwrap_err();
        assert!(matches!(err, ContainerError::InstanceBusy { .. }));
    }
}
