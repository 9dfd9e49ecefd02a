//! Whitelist registry: optional purchase gating.
//!
//! When gating is disabled every address passes. All mutations are
//! admin-only and idempotent: re-adding a member or removing a non-member
//! leaves the set unchanged and is not an error.

use std::collections::BTreeSet;

use launchpool_types::{Address, LaunchpoolError, Result, constants};

/// Set of addresses permitted to buy while gating is enabled.
#[derive(Debug, Clone)]
pub struct WhitelistRegistry {
    admin: Address,
    enabled: bool,
    members: BTreeSet<Address>,
}

impl WhitelistRegistry {
    /// Empty registry with gating disabled.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            enabled: false,
            members: BTreeSet::new(),
        }
    }

    fn authorize(&self, caller: Address) -> Result<()> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(LaunchpoolError::Unauthorized(caller))
        }
    }

    /// Hand the admin role to another address.
    pub fn set_admin(&mut self, caller: Address, new_admin: Address) -> Result<()> {
        self.authorize(caller)?;
        self.admin = new_admin;
        Ok(())
    }

    pub fn set_enabled(&mut self, caller: Address, enabled: bool) -> Result<()> {
        self.authorize(caller)?;
        if self.enabled != enabled {
            tracing::info!(enabled, "Whitelist gating toggled");
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Add one address. Returns whether the set changed.
    pub fn add(&mut self, caller: Address, who: Address) -> Result<bool> {
        self.authorize(caller)?;
        let inserted = self.members.insert(who);
        tracing::debug!(address = %who, inserted, "Whitelist add");
        Ok(inserted)
    }

    /// Remove one address. Returns whether the set changed.
    pub fn remove(&mut self, caller: Address, who: Address) -> Result<bool> {
        self.authorize(caller)?;
        let removed = self.members.remove(&who);
        tracing::debug!(address = %who, removed, "Whitelist remove");
        Ok(removed)
    }

    /// Add a batch of addresses. Returns how many were new.
    ///
    /// # Errors
    /// `WhitelistBatchTooLarge` if the batch exceeds
    /// [`constants::MAX_WHITELIST_BATCH`]; the set is left unchanged.
    pub fn add_many<I>(&mut self, caller: Address, batch: I) -> Result<usize>
    where
        I: IntoIterator<Item = Address>,
    {
        self.authorize(caller)?;
        let batch: Vec<Address> = batch.into_iter().collect();
        if batch.len() > constants::MAX_WHITELIST_BATCH {
            return Err(LaunchpoolError::WhitelistBatchTooLarge {
                size: batch.len(),
                max: constants::MAX_WHITELIST_BATCH,
            });
        }
        let before = self.members.len();
        self.members.extend(batch);
        let added = self.members.len() - before;
        tracing::debug!(added, total = self.members.len(), "Whitelist batch add");
        Ok(added)
    }

    /// Whether `who` may buy right now. Always true while gating is off.
    #[must_use]
    pub fn is_whitelisted(&self, who: &Address) -> bool {
        !self.enabled || self.members.contains(who)
    }

    /// Gate check for the purchase path.
    pub fn check(&self, who: Address) -> Result<()> {
        if self.is_whitelisted(&who) {
            Ok(())
        } else {
            Err(LaunchpoolError::NotWhitelisted(who))
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Explicit membership, ignoring whether gating is on.
    #[must_use]
    pub fn contains(&self, who: &Address) -> bool {
        self.members.contains(who)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WhitelistRegistry, Address) {
        let admin = Address::derive("deployer");
        (WhitelistRegistry::new(admin), admin)
    }

    #[test]
    fn disabled_gating_admits_everyone() {
        let (wl, _) = setup();
        assert!(!wl.is_enabled());
        assert!(wl.is_whitelisted(&Address::random()));
        assert!(wl.check(Address::random()).is_ok());
    }

    #[test]
    fn enabled_gating_requires_membership() {
        let (mut wl, admin) = setup();
        let alice = Address::derive("alice");
        wl.set_enabled(admin, true).unwrap();
        assert!(!wl.is_whitelisted(&alice));
        assert!(matches!(
            wl.check(alice),
            Err(LaunchpoolError::NotWhitelisted(a)) if a == alice
        ));
        wl.add(admin, alice).unwrap();
        assert!(wl.is_whitelisted(&alice));
    }

    #[test]
    fn add_remove_add_cycle() {
        let (mut wl, admin) = setup();
        let a1 = Address::derive("addr1");
        wl.set_enabled(admin, true).unwrap();
        wl.add(admin, a1).unwrap();
        assert!(wl.is_whitelisted(&a1));
        wl.remove(admin, a1).unwrap();
        assert!(!wl.is_whitelisted(&a1));
    }

    #[test]
    fn mutations_are_idempotent() {
        let (mut wl, admin) = setup();
        let alice = Address::derive("alice");
        assert!(wl.add(admin, alice).unwrap());
        assert!(!wl.add(admin, alice).unwrap());
        assert_eq!(wl.len(), 1);

        assert!(wl.remove(admin, alice).unwrap());
        assert!(!wl.remove(admin, alice).unwrap());
        assert!(wl.is_empty());
    }

    #[test]
    fn add_many_counts_new_members() {
        let (mut wl, admin) = setup();
        let a1 = Address::derive("addr1");
        let a2 = Address::derive("addr2");
        let a3 = Address::derive("addr3");
        wl.add(admin, a1).unwrap();
        let added = wl.add_many(admin, [a1, a2, a3, a2]).unwrap();
        assert_eq!(added, 2);
        assert!(wl.contains(&a1) && wl.contains(&a2) && wl.contains(&a3));
    }

    #[test]
    fn add_many_rejects_oversized_batch() {
        let (mut wl, admin) = setup();
        let batch: Vec<Address> = (0..=constants::MAX_WHITELIST_BATCH)
            .map(|i| Address::derive(&format!("investor-{i}")))
            .collect();
        let err = wl.add_many(admin, batch).unwrap_err();
        assert!(matches!(err, LaunchpoolError::WhitelistBatchTooLarge { .. }));
        assert!(wl.is_empty());
    }

    #[test]
    fn non_admin_rejected_everywhere() {
        let (mut wl, _) = setup();
        let mallory = Address::derive("mallory");
        assert!(matches!(
            wl.set_enabled(mallory, true),
            Err(LaunchpoolError::Unauthorized(_))
        ));
        assert!(wl.add(mallory, mallory).is_err());
        assert!(wl.remove(mallory, mallory).is_err());
        assert!(wl.add_many(mallory, [mallory]).is_err());
        assert!(wl.set_admin(mallory, mallory).is_err());
        assert!(!wl.is_enabled());
        assert!(wl.is_empty());
    }

    #[test]
    fn admin_handover() {
        let (mut wl, admin) = setup();
        let next = Address::derive("next-operator");
        wl.set_admin(admin, next).unwrap();
        assert_eq!(wl.admin(), next);
        assert!(wl.set_enabled(admin, true).is_err());
        assert!(wl.set_enabled(next, true).is_ok());
    }
}
