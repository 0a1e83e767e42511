use sharelite::{ExpiredError, SelfAware, SelfRef, Shared};
use std::cell::Cell;

#[test]
fn expired_iff_no_owners_remain() {
    let a = Shared::new(1);
    let observer = Shared::downgrade(&a);
    let second = observer.clone();
    let b = a.clone();
    assert!(!observer.expired());
    drop(a);
    assert!(!observer.expired());
    drop(b);
    assert!(observer.expired());
    assert!(second.expired());
}

#[test]
fn upgrade_adds_an_owner() {
    let a = Shared::new(5);
    let observer = Shared::downgrade(&a);
    assert_eq!(observer.strong_count(), 1);
    let b = observer.upgrade().unwrap();
    assert_eq!(a.strong_count(), 2);
    assert!(Shared::ptr_eq(&a, &b));
}

#[test]
fn upgrade_after_expiry_is_none() {
    let a = Shared::new(5);
    let observer = Shared::downgrade(&a);
    drop(a);
    assert!(observer.upgrade().is_none());
    assert_eq!(observer.strong_count(), 0);
}

#[test]
fn promotion_failure_is_typed() {
    let a = Shared::new(1);
    let observer = Shared::downgrade(&a);
    let promoted = Shared::<i32>::try_from(&observer).unwrap();
    drop((a, promoted));
    assert_eq!(Shared::<i32>::try_from(&observer), Err(ExpiredError));
}

#[test]
fn weak_count_tracks_observers() {
    let a = Shared::new(1);
    assert_eq!(a.weak_count(), 0);
    let first = Shared::downgrade(&a);
    let second = first.clone();
    assert_eq!(a.weak_count(), 2);
    assert_eq!(first.weak_count(), 2);
    drop(second);
    assert_eq!(a.weak_count(), 1);
    drop(a);
    assert_eq!(first.weak_count(), 1);
    assert_eq!(first.strong_count(), 0);
}

#[test]
fn value_dropped_while_observers_remain() {
    struct Probe<'a> {
        drops: &'a Cell<usize>,
    }
    impl Drop for Probe<'_> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    let drops = Cell::new(0);
    let a = Shared::new(Probe { drops: &drops });
    let observer = Shared::downgrade(&a);
    drop(a);
    // the value goes with the last owner, the block stays for the observer
    assert_eq!(drops.get(), 1);
    assert_eq!(observer.strong_count(), 0);
    assert_eq!(observer.weak_count(), 1);
}

#[test]
fn counter_scenario() {
    let a = Shared::new(0u32);
    let b = a.clone();
    assert_eq!(a.strong_count(), 2);
    drop(b);
    assert_eq!(a.strong_count(), 1);
    let observer = Shared::downgrade(&a);
    drop(a);
    assert!(observer.expired());
    assert!(observer.upgrade().is_none());
}

struct Watcher<'a> {
    refused: &'a Cell<bool>,
    this: SelfRef<Watcher<'a>>,
}

impl<'a> SelfAware for Watcher<'a> {
    fn self_ref(&self) -> &SelfRef<Watcher<'a>> {
        &self.this
    }
}

impl Drop for Watcher<'_> {
    fn drop(&mut self) {
        if let Some(observer) = self.weak_from_self() {
            self.refused.set(observer.upgrade().is_none());
        }
    }
}

// Observers uniformly see the value as dead for the whole release window,
// including from within the value's own destructor.
#[test]
fn promotion_refused_while_value_drops() {
    let refused = Cell::new(false);
    let watcher = Shared::new_aware(Watcher {
        refused: &refused,
        this: SelfRef::new(),
    });
    drop(watcher);
    assert!(refused.get());
}
