use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr;

use std::alloc::{self, alloc};

use crate::error::{AllocError, OnError};
use crate::opt::branch_hints::likely;

/// Debug-mode check for the valid alignment.
/// This function is only available in debug builds.
///
/// Conditions:
///
/// - `align` of `T` must not be zero.
///
/// - `align` of `T` must be a power of two.
#[cfg(debug_assertions)]
const fn debug_assert_valid_alignment(align: usize) {
    assert!(align.is_power_of_two(), "Alignment must be a power of two");
}

/// Debug-mode check for the valid allocation size.
/// This function is only available in debug builds.
///
/// Conditions:
///
/// - `size` must be greater than `0`.
#[cfg(debug_assertions)]
const fn debug_assert_non_zero_size(size: usize) {
    assert!(size > 0, "Allocation size must be greater than 0");
}

/// Debug-mode check to check the allocation state.
/// This function is only available in debug builds.
///
/// Conditions:
///
/// - The pointer must not be null.
///
#[cfg(debug_assertions)]
const fn debug_assert_allocated<T>(instance: &UnsafeBufferPointer<T>) {
    assert!(!instance.ptr.is_null(), "Pointer must not be null");
}

/// Debug-mode check to check the allocation state.
/// This function is only available in debug builds.
///
/// Conditions:
///
/// - The pointer must be null.
///
#[cfg(debug_assertions)]
const fn debug_assert_not_allocated<T>(instance: &UnsafeBufferPointer<T>) {
    assert!(instance.ptr.is_null(), "Pointer must be null");
}

/// An indirect reference to _one or more_ values of type `T` consecutively in memory,
/// with methods for managing the underlying memory directly.
///
/// It guarantees proper `size` and `alignment` of `T` when storing or accessing values,
/// but it doesn't guarantee safe operations with measures such as null pointer checks or
/// bounds checking.
///
/// It doesn't store any metadata about its allocated memory, such as the number of
/// allocated or initialized elements, therefore it doesn't offer automatic memory
/// management: the owner is responsible for deallocating with the same `count` that was
/// allocated, and for dropping non-trivial elements before deallocation.
///
/// Limited checks for invariants are done in debug mode only.
///
/// It uses the registered `#[global_allocator]` to allocate memory.
pub(crate) struct UnsafeBufferPointer<T> {
    ptr: *mut T,
    _marker: PhantomData<T>,
}

impl<T> UnsafeBufferPointer<T> {
    pub(crate) const T_SIZE: usize = size_of::<T>();
    pub(crate) const T_ALIGN: usize = align_of::<T>();
    pub(crate) const T_MAX_ALLOC_SIZE: usize = (isize::MAX as usize + 1) - Self::T_ALIGN;

    /// Creates a new `UnsafeBufferPointer` without allocating memory.
    ///
    /// The pointer is set to `null`.
    #[must_use]
    #[inline]
    pub(crate) const fn new() -> Self {
        UnsafeBufferPointer {
            ptr: ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// Checks if the pointer of `UnsafeBufferPointer` is null.
    #[must_use]
    #[inline(always)]
    pub(crate) const fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Creates a new layout for the specified `count` of type `T`.
    ///
    /// This method checks for **overflow** and valid layout **size** in release-mode, and
    /// for _non-zero_ size and valid alignment in debug-mode.
    ///
    /// The _resulted size_ must be greater than `0`, this implies that `T` can't be `ZST`,
    /// and the alignment must be power of 2, which implies it can't be zero also.
    #[inline(always)]
    fn make_layout(count: usize, on_err: OnError) -> Result<Layout, AllocError> {
        #[cfg(debug_assertions)]
        debug_assert_valid_alignment(Self::T_ALIGN);

        if let Some(size) = count.checked_mul(Self::T_SIZE) {
            #[cfg(debug_assertions)]
            debug_assert_non_zero_size(size);

            if Self::T_MAX_ALLOC_SIZE > size {
                let layout = unsafe { Layout::from_size_align_unchecked(size, Self::T_ALIGN) };
                return Ok(layout);
            }
        }

        Err(on_err.overflow())
    }

    /// Allocates memory space for `count` values of type `T`, without initializing it.
    ///
    /// Allocation errors are handled according to the error handling context `on_err`.
    ///
    /// Note that the process may be terminated even if the allocation was successful,
    /// because detecting memory allocation failures at the process-level is
    /// platform-specific. On systems that allow overcommit, allocation is always reported
    /// to be successful, but the process may become a target for termination later.
    ///
    /// # Safety
    ///
    /// - Pointer must be `null` before calling this method.
    ///   Calling this method with a non-null pointer causes memory leaks, as access to the
    ///   previously allocated memory space will be lost without freeing it.
    ///
    /// - `count` must be greater than `0`, and `T` can't be `ZST`.
    pub(crate) unsafe fn allocate(
        &mut self,
        count: usize,
        on_err: OnError,
    ) -> Result<(), AllocError> {
        #[cfg(debug_assertions)]
        debug_assert_not_allocated(self);

        let layout = Self::make_layout(count, on_err)?;

        let ptr = unsafe { alloc(layout) as *mut T };

        if likely(!ptr.is_null()) {
            self.ptr = ptr;
            return Ok(());
        }

        Err(on_err.alloc_err(layout))
    }

    /// Deallocates the memory space pointed to by the pointer.
    ///
    /// This method doesn't call `drop` on the initialized elements.
    ///
    /// The pointer is set to `null` after deallocation.
    ///
    /// # Safety
    ///
    /// - Pointer must be allocated before calling this method.
    ///
    /// - `count` must be the same count used to allocate the memory space.
    ///
    /// - Initialized elements will not be dropped before deallocating memory.
    ///   This might cause memory leaks if `T` is not of trivial type, or if the elements
    ///   are not dropped properly before calling this method.
    pub(crate) unsafe fn deallocate(&mut self, count: usize) {
        #[cfg(debug_assertions)]
        debug_assert_allocated(self);

        // Already validated when allocated, so it must not fail.
        let layout = unsafe {
            Layout::from_size_align_unchecked(count.unchecked_mul(Self::T_SIZE), Self::T_ALIGN)
        };

        unsafe { alloc::dealloc(self.ptr as *mut u8, layout) };

        self.ptr = ptr::null_mut();
    }

    /// Returns a raw pointer to the element at the specified offset `at`.
    ///
    /// # Safety
    ///
    /// - Pointer must be allocated before calling this method.
    ///
    /// - `at` must be within the bounds of the allocated memory space.
    #[must_use]
    #[inline(always)]
    pub(crate) const unsafe fn ptr_at(&self, at: usize) -> *mut T {
        #[cfg(debug_assertions)]
        debug_assert_allocated(self);

        unsafe { self.ptr.add(at) }
    }
}
