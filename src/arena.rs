use crate::alloc::UnsafeBufferPointer;
use crate::error::OnError;
use crate::opt::branch_hints::unlikely;

/// Block-allocated storage for uniformly-sized records.
///
/// Slots are handed out uninitialized and must be initialized with `ptr::write` before
/// use. Once a slot is handed out, its address is stable for the arena's lifetime: blocks
/// are never resized, compacted, or released before the arena itself is dropped.
///
/// Recycled slots are reused LIFO, so the most recently vacated slot (hot in cache) is
/// handed out first.
///
/// Dropping the arena releases the backing blocks without running destructors; ownership
/// of record destruction belongs to the caller.
pub(crate) struct NodeArena<T> {
    /// Base pointers of the backing blocks. Growing this list moves the base pointers
    /// around, never the blocks themselves.
    blocks: Vec<UnsafeBufferPointer<T>>,
    /// Base of the block currently being bumped. Null until the first allocation.
    current: *mut T,
    /// Bump cursor within the current block.
    next_index: usize,
    /// Slots per block.
    block_size: usize,
    /// Recycled slots.
    free: Vec<*mut T>,
}

impl<T> NodeArena<T> {
    /// Creates an arena that allocates blocks of `block_size` slots.
    ///
    /// No memory is allocated until the first slot is requested.
    ///
    /// # Panics
    ///
    /// If `block_size` is `0`.
    #[must_use]
    pub(crate) fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "Arena block size must be greater than 0");
        NodeArena {
            blocks: Vec::new(),
            current: core::ptr::null_mut(),
            // Forces a block allocation on the first `allocate` call.
            next_index: block_size,
            block_size,
            free: Vec::new(),
        }
    }

    /// Returns a pointer to a fresh, uninitialized slot.
    ///
    /// Prefers a recycled slot; otherwise bumps within the current block; otherwise
    /// allocates a new block and resumes bumping. Out-of-memory is fatal.
    pub(crate) fn allocate(&mut self) -> *mut T {
        if let Some(slot) = self.free.pop() {
            return slot;
        }

        if unlikely(self.next_index == self.block_size) {
            let mut block = UnsafeBufferPointer::new();
            let _ = unsafe { block.allocate(self.block_size, OnError::Panic) };
            self.current = unsafe { block.ptr_at(0) };
            self.blocks.push(block);
            self.next_index = 0;
        }

        // The current block has at least one vacant slot past the cursor.
        let slot = unsafe { self.current.add(self.next_index) };
        self.next_index += 1;
        slot
    }

    /// Appends `slot` to the free-list for later reuse.
    ///
    /// The caller must have already destroyed the record held by the slot; the arena
    /// never runs destructors. No current operation vacates nodes, so this is the hook a
    /// future removal path would call.
    #[allow(dead_code)]
    pub(crate) fn recycle(&mut self, slot: *mut T) {
        self.free.push(slot);
    }

    /// Current number of recycled slots awaiting reuse.
    #[cfg(test)]
    pub(crate) fn free_list_len(&self) -> usize {
        self.free.len()
    }

    /// Number of backing blocks allocated so far.
    #[cfg(test)]
    pub(crate) fn allocated_blocks(&self) -> usize {
        self.blocks.len()
    }
}

impl<T> Drop for NodeArena<T> {
    fn drop(&mut self) {
        // Records are not destructed here; only the backing memory is released.
        for block in &mut self.blocks {
            unsafe { block.deallocate(self.block_size) };
        }
    }
}
