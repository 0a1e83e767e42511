use crate::ucount;
use alloc::boxed::Box;
use branches::{assume, unlikely};
use core::{
    cell::Cell,
    mem::{ManuallyDrop, MaybeUninit},
    ptr::{self, NonNull},
};

// Shared bookkeeping for one managed allocation. `strong` counts the owning
// handles; the managed value is dropped when it reaches zero. `weak` counts
// the observers; the block itself is freed once both counts are zero. The two
// function pointers erase the concrete block layout so handles only ever deal
// in `*mut Header`.
pub(crate) struct Header {
    pub(crate) strong: Cell<ucount>,
    pub(crate) weak: Cell<ucount>,
    pub(crate) drop_value: unsafe fn(*mut Header),
    pub(crate) drop_block: unsafe fn(*mut Header),
}

impl Header {
    fn new(
        strong: ucount,
        weak: ucount,
        drop_value: unsafe fn(*mut Header),
        drop_block: unsafe fn(*mut Header),
    ) -> Header {
        Header {
            strong: Cell::new(strong),
            weak: Cell::new(weak),
            drop_value,
            drop_block,
        }
    }

    // Adds an owning reference. Callers guarantee at least one owner already
    // exists; minting the first owner goes through the allocating
    // constructors instead.
    #[inline]
    pub(crate) fn increment_strong(&self) {
        let count = self.strong.get();
        unsafe { assume(count != 0) };
        let count = count.wrapping_add(1);
        if unlikely(count == 0) {
            panic!("reference counter overflow");
        }
        self.strong.set(count);
    }

    // Adds an observer. Unlike the strong count, zero is a valid starting
    // point here.
    #[inline]
    pub(crate) fn increment_weak(&self) {
        let count = self.weak.get().wrapping_add(1);
        if unlikely(count == 0) {
            panic!("reference counter overflow");
        }
        self.weak.set(count);
    }
}

// One-allocation block: the value lives inline next to the counts. `Header`
// comes first so a block pointer doubles as a header pointer.
#[repr(C)]
pub(crate) struct ValueBlock<T> {
    header: Header,
    value: MaybeUninit<T>,
}

impl<T> ValueBlock<T> {
    // Allocates a block owning `value`, with a single strong reference.
    pub(crate) fn allocate(value: T) -> (NonNull<Header>, NonNull<T>) {
        Self::allocate_raw(
            Header::new(1, 0, Self::drop_value, Self::drop_block),
            MaybeUninit::new(value),
        )
    }

    // Allocates a block with no owner and one observer, leaving the value
    // slot unset. Lets callers hand out observers before the value exists;
    // dropping the observer without ever minting an owner frees the block
    // without running a destructor for the unset slot.
    pub(crate) fn allocate_unset() -> (NonNull<Header>, NonNull<T>) {
        Self::allocate_raw(
            Header::new(0, 1, Self::drop_value, Self::drop_block),
            MaybeUninit::uninit(),
        )
    }

    fn allocate_raw(header: Header, value: MaybeUninit<T>) -> (NonNull<Header>, NonNull<T>) {
        let block = Box::into_raw(Box::new(ValueBlock { header, value }));
        // Safety: box is always not null
        unsafe {
            (
                NonNull::new_unchecked(block as *mut Header),
                NonNull::new_unchecked((*block).value.as_mut_ptr()),
            )
        }
    }

    unsafe fn drop_value(header: *mut Header) {
        let block = header as *mut ValueBlock<T>;
        ptr::drop_in_place((*block).value.as_mut_ptr());
    }

    unsafe fn drop_block(header: *mut Header) {
        // the value slot is MaybeUninit, so this frees storage only
        drop(Box::from_raw(header as *mut ValueBlock<T>));
    }
}

// Two-allocation block: points at a value that was allocated separately and
// carries the finalizer that takes the box back when the last owner goes
// away.
#[repr(C)]
pub(crate) struct PtrBlock<T: ?Sized, F: FnOnce(Box<T>)> {
    header: Header,
    ptr: NonNull<T>,
    finalizer: ManuallyDrop<F>,
}

impl<T: ?Sized, F: FnOnce(Box<T>)> PtrBlock<T, F> {
    // Takes over `value`, recording `finalizer` to run on release.
    pub(crate) fn adopt(value: Box<T>, finalizer: F) -> (NonNull<Header>, NonNull<T>) {
        // Safety: Box::into_raw never returns null
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(value)) };
        let block = Box::into_raw(Box::new(PtrBlock {
            header: Header::new(1, 0, Self::drop_value, Self::drop_block),
            ptr,
            finalizer: ManuallyDrop::new(finalizer),
        }));
        // Safety: same as above
        (unsafe { NonNull::new_unchecked(block as *mut Header) }, ptr)
    }

    unsafe fn drop_value(header: *mut Header) {
        let block = header as *mut PtrBlock<T, F>;
        let finalizer = ManuallyDrop::take(&mut (*block).finalizer);
        finalizer(Box::from_raw((*block).ptr.as_ptr()));
    }

    unsafe fn drop_block(header: *mut Header) {
        // the finalizer was taken when the value was released
        drop(Box::from_raw(header as *mut PtrBlock<T, F>));
    }
}
