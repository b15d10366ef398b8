//! Ordered, token-addressable hook lists

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::HookError;

/// Point in the session lifecycle a hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    /// Before the radio starts discovering
    Before,
    /// After the radio has stopped
    After,
}

/// Handle returned when a hook is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookToken {
    stage: HookStage,
    id: u64,
}

impl HookToken {
    pub fn stage(&self) -> HookStage {
        self.stage
    }
}

type HookFn = dyn Fn() -> Result<(), HookError> + Send + Sync;

/// A zero-argument lifecycle action
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    /// Wrap an action that cannot fail
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(move || {
            f();
            Ok(())
        }))
    }

    /// Wrap an action that may fail; a failure aborts the rest of its batch
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn() -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn run(&self) -> Result<(), HookError> {
        (self.0)()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

/// Hooks for one lifecycle stage, kept in registration order
#[derive(Debug)]
pub struct HookList {
    stage: HookStage,
    hooks: Vec<(HookToken, Hook)>,
    next_id: u64,
}

impl HookList {
    pub fn new(stage: HookStage) -> Self {
        Self {
            stage,
            hooks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn stage(&self) -> HookStage {
        self.stage
    }

    /// Append a hook, returns the token that removes it
    pub fn add(&mut self, hook: Hook) -> HookToken {
        let token = HookToken {
            stage: self.stage,
            id: self.next_id,
        };
        self.next_id += 1;
        self.hooks.push((token, hook));
        token
    }

    /// Remove the hook registered under `token`
    ///
    /// Returns false if the token is unknown or belongs to another stage.
    pub fn remove(&mut self, token: HookToken) -> bool {
        if token.stage != self.stage {
            return false;
        }
        let before = self.hooks.len();
        self.hooks.retain(|(t, _)| *t != token);
        self.hooks.len() != before
    }

    /// Copy of the current hooks, stable against later mutation
    pub fn snapshot(&self) -> Vec<Hook> {
        self.hooks.iter().map(|(_, hook)| hook.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Run hooks in order, stopping at the first failure
pub fn run_hooks(hooks: &[Hook]) -> Result<(), HookError> {
    hooks.iter().try_for_each(Hook::run)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn logging_hook(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Hook {
        let log = Arc::clone(log);
        Hook::new(move || log.lock().unwrap().push(name))
    }

    // ==================== Ordering Tests ====================

    #[test]
    fn hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = HookList::new(HookStage::Before);
        list.add(logging_hook(&log, "h1"));
        list.add(logging_hook(&log, "h2"));
        list.add(logging_hook(&log, "h3"));

        run_hooks(&list.snapshot()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn failing_hook_aborts_rest_of_batch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = HookList::new(HookStage::After);
        list.add(logging_hook(&log, "h1"));
        list.add(Hook::fallible(|| Err(HookError::new("boom"))));
        list.add(logging_hook(&log, "h3"));

        let result = run_hooks(&list.snapshot());

        assert_eq!(result, Err(HookError::new("boom")));
        assert_eq!(*log.lock().unwrap(), vec!["h1"]);
    }

    // ==================== Removal Tests ====================

    #[test]
    fn remove_by_token_removes_only_that_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = HookList::new(HookStage::Before);
        list.add(logging_hook(&log, "h1"));
        let token = list.add(logging_hook(&log, "h2"));
        list.add(logging_hook(&log, "h3"));

        assert!(list.remove(token));
        assert!(!list.remove(token));

        run_hooks(&list.snapshot()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h3"]);
    }

    #[test]
    fn identical_closures_are_removed_independently() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = HookList::new(HookStage::Before);
        let first = list.add(logging_hook(&log, "same"));
        list.add(logging_hook(&log, "same"));

        list.remove(first);

        assert_eq!(list.len(), 1);
    }

    #[test]
    fn token_from_other_stage_is_rejected() {
        let mut before = HookList::new(HookStage::Before);
        let mut after = HookList::new(HookStage::After);
        before.add(Hook::new(|| {}));
        let after_token = after.add(Hook::new(|| {}));

        assert_eq!(after_token.stage(), HookStage::After);
        assert!(!before.remove(after_token));
        assert_eq!(before.len(), 1);
    }

    // ==================== Snapshot Tests ====================

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = HookList::new(HookStage::Before);
        let token = list.add(logging_hook(&log, "h1"));

        let snapshot = list.snapshot();
        list.remove(token);
        list.add(logging_hook(&log, "h2"));

        run_hooks(&snapshot).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["h1"]);
    }

    #[test]
    fn empty_list_runs_nothing() {
        let list = HookList::new(HookStage::After);
        assert!(list.is_empty());
        assert!(run_hooks(&list.snapshot()).is_ok());
    }
}
