use crate::{shared::Shared, weak::Weak, ExpiredError};
use alloc::boxed::Box;
use core::{cell::Cell, fmt};

/// The self-reference slot embedded in types that opt into [`SelfAware`].
///
/// The slot starts unbound and is bound at most once, by the first
/// [`Shared<T>`] that takes ownership of the object (see
/// [`Shared::new_aware`] and [`Shared::from_box_aware`]). It stores a
/// [`Weak<T>`], never an owner, so the object does not keep itself alive.
/// A bound slot counts as one observer in [`Shared::weak_count`].
pub struct SelfRef<T> {
    slot: Cell<Option<Weak<T>>>,
}

impl<T> SelfRef<T> {
    /// Creates an unbound slot, ready to be embedded in a field.
    #[inline]
    pub const fn new() -> SelfRef<T> {
        SelfRef {
            slot: Cell::new(None),
        }
    }

    // First bind wins; the slot never rebinds.
    pub(crate) fn bind(&self, observer: Weak<T>) {
        let slot = self.slot.take();
        if slot.is_none() {
            self.slot.set(Some(observer));
        } else {
            self.slot.set(slot);
        }
    }

    fn get(&self) -> Option<Weak<T>> {
        let slot = self.slot.take();
        let observer = slot.clone();
        self.slot.set(slot);
        observer
    }
}

impl<T> Default for SelfRef<T> {
    #[inline]
    fn default() -> SelfRef<T> {
        SelfRef::new()
    }
}

impl<T> fmt::Debug for SelfRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SelfRef")
    }
}

/// Capability for objects that hand out handles to themselves.
///
/// A type opts in by embedding a [`SelfRef<T>`] field and pointing
/// [`SelfAware::self_ref`] at it; construction then goes through
/// [`Shared::new_aware`] or [`Shared::from_box_aware`], which bind the
/// slot. Afterwards any `&self` can mint an owning handle without being
/// passed one, and without forming a reference cycle.
///
/// # Examples
///
/// ```
/// use sharelite::{SelfAware, SelfRef, Shared};
///
/// struct Session {
///     id: u32,
///     this: SelfRef<Session>,
/// }
///
/// impl SelfAware for Session {
///     fn self_ref(&self) -> &SelfRef<Session> {
///         &self.this
///     }
/// }
///
/// let session = Shared::new_aware(Session { id: 7, this: SelfRef::new() });
/// let again = session.shared_from_self().unwrap();
/// assert_eq!(again.id, 7);
/// assert!(Shared::ptr_eq(&session, &again));
/// ```
pub trait SelfAware: Sized {
    /// Accessor for the slot embedded in the type.
    fn self_ref(&self) -> &SelfRef<Self>;

    /// Returns an owning handle to this object.
    ///
    /// Fails with [`ExpiredError`] if no [`Shared<T>`][Shared] has ever
    /// owned the object (it was built without an owning constructor), or
    /// while the object is being destroyed.
    fn shared_from_self(&self) -> Result<Shared<Self>, ExpiredError> {
        self.self_ref()
            .get()
            .and_then(|observer| observer.upgrade())
            .ok_or(ExpiredError)
    }

    /// Returns an observer of this object, or `None` if no owner has ever
    /// existed.
    fn weak_from_self(&self) -> Option<Weak<Self>> {
        self.self_ref().get()
    }
}

impl<T: SelfAware> Shared<T> {
    /// Like [`Shared::new`], additionally binding the value's self-reference
    /// slot so the value can mint handles to itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use sharelite::{SelfAware, SelfRef, Shared};
    ///
    /// struct Task {
    ///     this: SelfRef<Task>,
    /// }
    ///
    /// impl SelfAware for Task {
    ///     fn self_ref(&self) -> &SelfRef<Task> {
    ///         &self.this
    ///     }
    /// }
    ///
    /// let task = Shared::new_aware(Task { this: SelfRef::new() });
    /// assert_eq!(task.weak_count(), 1); // the bound slot
    /// assert!(task.weak_from_self().is_some());
    /// ```
    #[inline]
    pub fn new_aware(value: T) -> Shared<T> {
        let this = Shared::new(value);
        this.self_ref().bind(Shared::downgrade(&this));
        this
    }

    /// Like [`Shared::from_box`], additionally binding the value's
    /// self-reference slot.
    #[inline]
    pub fn from_box_aware(value: Box<T>) -> Shared<T> {
        let this = Shared::from_box(value);
        this.self_ref().bind(Shared::downgrade(&this));
        this
    }
}
