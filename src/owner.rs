use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Resolves numeric uid/gid values to user and group names, caching
/// results so a walk over a large tree asks the OS once per owner.
pub(crate) struct OwnerCache {
    users: Mutex<LruCache<u32, String>>,
    groups: Mutex<LruCache<u32, String>>,
}

impl OwnerCache {
    pub(crate) fn new() -> Self {
        let capacity = NonZeroUsize::new(256).unwrap();
        Self {
            users: Mutex::new(LruCache::new(capacity)),
            groups: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Name for `uid`, falling back to the numeric value when the OS
    /// has no matching account.
    pub(crate) fn user(&self, uid: u32) -> String {
        let mut cache = self.users.lock().unwrap();
        if let Some(name) = cache.get(&uid) {
            return name.clone();
        }
        let name = lookup_user(uid).unwrap_or_else(|| uid.to_string());
        cache.put(uid, name.clone());
        name
    }

    /// Name for `gid`, falling back to the numeric value when the OS
    /// has no matching group.
    pub(crate) fn group(&self, gid: u32) -> String {
        let mut cache = self.groups.lock().unwrap();
        if let Some(name) = cache.get(&gid) {
            return name.clone();
        }
        let name = lookup_group(gid).unwrap_or_else(|| gid.to_string());
        cache.put(gid, name.clone());
        name
    }
}

#[cfg(unix)]
fn lookup_user(uid: u32) -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid))
        .ok()
        .flatten()
        .map(|u| u.name)
}

#[cfg(unix)]
fn lookup_group(gid: u32) -> Option<String> {
    nix::unistd::Group::from_gid(nix::unistd::Gid::from_raw(gid))
        .ok()
        .flatten()
        .map(|g| g.name)
}

#[cfg(not(unix))]
fn lookup_user(_uid: u32) -> Option<String> {
    None
}

#[cfg(not(unix))]
fn lookup_group(_gid: u32) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_numbers() {
        let owners = OwnerCache::new();
        // Improbably large ids have no account on any sane system.
        assert_eq!(owners.user(u32::MAX - 7), (u32::MAX - 7).to_string());
        assert_eq!(owners.group(u32::MAX - 7), (u32::MAX - 7).to_string());
    }

    #[cfg(unix)]
    #[test]
    fn repeated_lookups_hit_the_cache() {
        let owners = OwnerCache::new();
        let first = owners.user(0);
        let second = owners.user(0);
        assert_eq!(first, second);
        assert_eq!(owners.users.lock().unwrap().len(), 1);
    }
}
