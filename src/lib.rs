#![no_std]
//! # Sharelite: shared ownership with weak references and aliasing
//!
//! Sharelite is a single-threaded shared-ownership library for Rust. A
//! [`Shared<T>`] handle keeps a heap value alive; a [`Weak<T>`] handle
//! observes it without owning it and can be promoted back to an owner for
//! as long as the value lives. On top of the usual strong/weak pair the
//! crate adds two things `std::rc` does not have: a handle may point at a
//! *sub-object* of the allocation that keeps it alive
//! ([`Shared::project`]), and a type may mint handles to itself from a
//! plain `&self` by opting into [`SelfAware`].
//!
//! ## Why use Sharelite?
//!
//! - Aliasing: [`Shared::project`] turns a handle to a struct into a
//!   handle to one of its fields, a slice element, or a trait-object view,
//!   while the whole allocation stays alive
//! - [`Shared::from_box`] adopts an existing allocation instead of moving
//!   the value into a fresh one, and [`Shared::with_finalizer`] runs a
//!   caller-supplied finalizer in place of the plain drop
//! - Objects can hand out owning handles to themselves without creating a
//!   reference cycle ([`SelfAware`])
//! - Promotion failure is a typed error ([`ExpiredError`]) for callers
//!   that want a hard failure, and an `Option` for callers that don't
//! - It supports `no_std` with extern alloc
//!
//! ## Why not use Sharelite?
//!
//! - The counters are not atomic: handles are `!Send` and `!Sync` and
//!   cannot cross threads. Use `std::sync::Arc` for that.
//! - Like every non-tracing reference counter, cycles of strong handles
//!   leak. Break cycles with [`Weak<T>`].
//! - It does not convert to and from raw pointers; an aliased handle
//!   cannot be reconstituted from its value pointer alone.
//!
//! ## Comparison
//!
//! |                              | sharelite::Shared | std::rc::Rc |
//! | ---------------------------- | :---------------: | :---------: |
//! | Weak references              |        ✅         |     ✅      |
//! | Aliased (sub-object) handles |        ✅         |     ❌      |
//! | Custom finalizer             |        ✅         |     ❌      |
//! | Adopt an existing `Box`      |        ✅         |     ❌      |
//! | Typed promotion failure      |        ✅         |     ❌      |
//! | Raw-pointer round trip       |        ❌         |     ✅      |
//!
//! A quick tour:
//!
//! ```
//! use sharelite::Shared;
//!
//! let tree = Shared::new(vec![1, 2, 3]);
//! let branch = Shared::project(tree.clone(), |v| &v[1]);
//! let observer = Shared::downgrade(&tree);
//!
//! assert_eq!(*branch, 2);
//! drop(tree);
//! // the projected handle still keeps the vector alive
//! assert!(!observer.expired());
//! drop(branch);
//! assert!(observer.expired());
//! ```
//!
//! ### Features
//!
//! By default, Sharelite uses a counter size of half the word size for
//! 64-bit systems, with the `usize-for-small-platforms` feature enabled.
//! This is because overflowing a 32-bit counter is harder compared to
//! overflowing 16-bit counters. If you wish to use the half register size
//! on other platforms, you can disable the default features by setting
//! `default-features = false`. This will result in the use of 16-bit
//! counters on 32-bit platforms and 8-bit counters on 16-bit platforms.
//! Both the strong and the weak count use the selected size.

#![warn(missing_docs, missing_debug_implementations)]
extern crate alloc;

use core::fmt;

// Counter definition

#[cfg(target_pointer_width = "64")]
pub(crate) use u32 as ucount;

#[cfg(all(
    not(target_pointer_width = "64"),
    feature = "usize-for-small-platforms"
))]
pub(crate) use usize as ucount;

#[cfg(all(
    target_pointer_width = "32",
    not(feature = "usize-for-small-platforms")
))]
pub(crate) use u16 as ucount;

#[cfg(all(
    target_pointer_width = "16",
    not(feature = "usize-for-small-platforms")
))]
pub(crate) use u8 as ucount;

#[cfg(all(target_pointer_width = "8", not(feature = "usize-for-small-platforms")))]
pub(crate) use usize as ucount;

mod aware;
mod block;
mod shared;
mod weak;

pub use aware::*;
pub use shared::*;
pub use weak::*;

/// The error returned when promoting a [`Weak<T>`] whose managed value has
/// already been dropped.
///
/// [`Weak::upgrade`] reports the same condition as `None` instead; the
/// fallible conversion exists for callers that treat an expired observer
/// as a hard failure.
///
/// # Examples
///
/// ```
/// use sharelite::{ExpiredError, Shared};
///
/// let five = Shared::new(5);
/// let observer = Shared::downgrade(&five);
/// drop(five);
///
/// assert_eq!(Shared::<i32>::try_from(&observer), Err(ExpiredError));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredError;

impl fmt::Display for ExpiredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("managed value already dropped")
    }
}

impl core::error::Error for ExpiredError {}
