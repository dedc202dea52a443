// Copyright 2018-2020 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use super::sweeper::Sweeper;
use super::Store;
use crate::error::Result;

/// Called with the key and the value of every entry the sweeper evicts.
pub type ExpiredCallback = Box<dyn Fn(&str, &[u8]) + Send + Sync>;

struct DataObject {
    value: Vec<u8>,
    expiration: Instant,
}

impl DataObject {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expiration
    }
}

struct Shared {
    objects: Mutex<HashMap<String, DataObject>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    on_expired: Option<ExpiredCallback>,
}

impl Shared {
    fn remove_expired(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<(String, DataObject)> = {
            let mut objects = self.objects.lock();
            let keys: Vec<String> =
                objects.iter().filter(|(_, object)| object.is_expired(now)).map(|(key, _)| key.clone()).collect();
            keys.into_iter().filter_map(|key| objects.remove(&key).map(|object| (key, object))).collect()
        };

        if !expired.is_empty() {
            cdebug!(STORE, "Removed {} expired objects", expired.len());
        }
        if let Some(on_expired) = &self.on_expired {
            for (key, object) in &expired {
                on_expired(key, &object.value);
            }
        }
        expired.len()
    }
}

/// A key/value map whose entries expire `ttl` after their last access.
pub struct DataStore {
    shared: Arc<Shared>,
    sweeper: Mutex<Sweeper>,
}

impl DataStore {
    pub fn new(ttl: Duration, sweep_interval: Duration, on_expired: Option<ExpiredCallback>) -> Result<Self> {
        Self::with_clock(ttl, sweep_interval, Arc::new(SystemClock), on_expired)
    }

    pub fn with_clock(
        ttl: Duration,
        sweep_interval: Duration,
        clock: Arc<dyn Clock>,
        on_expired: Option<ExpiredCallback>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            objects: Mutex::new(HashMap::new()),
            ttl,
            clock,
            on_expired,
        });
        let sweeper = {
            let shared = Arc::clone(&shared);
            Sweeper::spawn("store.sweeper", sweep_interval, move || {
                shared.remove_expired();
            })?
        };
        Ok(DataStore {
            shared,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Evicts every expired entry and notifies the expiry callback for each of
    /// them after the lock is released. Returns the number of evicted entries.
    pub fn remove_expired(&self) -> usize {
        self.shared.remove_expired()
    }

    pub fn stop(&self) {
        self.sweeper.lock().stop();
    }

    pub fn len(&self) -> usize {
        self.shared.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.objects.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.shared.objects.lock().keys().cloned().collect()
    }

    pub fn expiration(&self, key: &str) -> Option<Instant> {
        self.shared.objects.lock().get(key).map(|object| object.expiration)
    }
}

impl Store for DataStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.shared.clock.now();
        let mut objects = self.shared.objects.lock();
        let expired = objects.get(key)?.is_expired(now);
        if expired {
            objects.remove(key);
            return None
        }
        let object = objects.get_mut(key)?;
        object.expiration = now + self.shared.ttl;
        Some(object.value.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> bool {
        let now = self.shared.clock.now();
        let mut objects = self.shared.objects.lock();
        if let Some(object) = objects.get(key) {
            if !object.is_expired(now) {
                return false
            }
        }
        objects.insert(key.to_string(), DataObject {
            value,
            expiration: now + self.shared.ttl,
        });
        true
    }

    fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.shared.objects.lock().remove(key).map(|object| object.value)
    }

    fn refresh(&self, key: &str) -> bool {
        let now = self.shared.clock.now();
        let mut objects = self.shared.objects.lock();
        let expired = match objects.get(key) {
            Some(object) => object.is_expired(now),
            None => return false,
        };
        if expired {
            objects.remove(key);
            return false
        }
        match objects.get_mut(key) {
            Some(object) => {
                object.expiration = now + self.shared.ttl;
                true
            }
            None => false,
        }
    }
}
