//! Credential pool with round-robin rotation
//!
//! Each action owns an ordered list of API keys. Taking a key pops the head and
//! appends it back to the tail, so a pool of N keys hands each key out once every
//! N calls, in insertion order.

use crate::models::ActionKind;
use crate::utils::error::{AppError, AppResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Rotating credential pools keyed by action
#[derive(Debug, Default)]
pub struct KeyPool {
    pools: Mutex<HashMap<ActionKind, VecDeque<String>>>,
}

impl KeyPool {
    pub fn new<I, K>(pools: I) -> Self
    where
        I: IntoIterator<Item = (ActionKind, K)>,
        K: IntoIterator<Item = String>,
    {
        let pools = pools
            .into_iter()
            .map(|(action, keys)| (action, keys.into_iter().collect()))
            .collect();

        Self {
            pools: Mutex::new(pools),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActionKind, VecDeque<String>>> {
        // Rotation leaves the deque consistent at every step, so a poisoned lock is still usable
        self.pools.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the next credential for `action` and move it to the back of the pool
    pub fn next_key(&self, action: ActionKind) -> AppResult<String> {
        let mut pools = self.lock();
        let pool = pools
            .get_mut(&action)
            .filter(|pool| !pool.is_empty())
            .ok_or(AppError::NoCredentials(action))?;

        let key = pool.pop_front().ok_or(AppError::NoCredentials(action))?;
        pool.push_back(key.clone());

        debug!("Rotated credential pool for '{}' ({} keys)", action, pool.len());
        Ok(key)
    }

    /// Number of credentials configured for `action`
    pub fn len(&self, action: ActionKind) -> usize {
        self.lock().get(&action).map(VecDeque::len).unwrap_or(0)
    }

    pub fn is_empty(&self, action: ActionKind) -> bool {
        self.len(action) == 0
    }

    /// Current pool order for `action`
    pub fn snapshot(&self, action: ActionKind) -> Vec<String> {
        self.lock()
            .get(&action)
            .map(|pool| pool.iter().cloned().collect())
            .unwrap_or_default()
    }
}
