//! Type-safe opaque handles
//!
//! Handles provide a safe way to reference records without direct pointers.
//! A handle is a monotonically increasing integer issued by a
//! [`HandleAllocator`]. Handles are never recycled: once the record behind a
//! handle is gone, every later lookup with that handle fails.
//!
//! `0` is reserved as the null handle. Counter exhaustion is not handled; a
//! 64-bit counter is not expected to wrap within a process lifetime.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A type-safe handle to a record of type T
#[repr(transparent)]
pub struct Handle<T> {
    bits: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Raw value of the null handle
    pub const NULL_BITS: u64 = 0;

    /// Create an invalid/null handle
    #[inline]
    pub const fn null() -> Self {
        Self::from_bits(Self::NULL_BITS)
    }

    /// Check if this handle is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == Self::NULL_BITS
    }

    /// Check if this handle was issued by an allocator
    #[inline]
    pub const fn is_valid(&self) -> bool {
        !self.is_null()
    }

    /// Convert to raw bits for serialization
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }

    /// Reinterpret as a handle of a different type sharing the same handle space
    #[inline]
    pub const fn cast<U>(self) -> Handle<U> {
        Handle::from_bits(self.bits)
    }
}

// Manual trait implementations to avoid T bounds
impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.bits.cmp(&other.bits)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = core::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        if self.is_null() {
            write!(f, "Handle<{}>(null)", short)
        } else {
            write!(f, "Handle<{}>({})", short, self.bits)
        }
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "#{}", self.bits)
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits)
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_bits)
    }
}

/// Issues monotonically increasing handles. No recycling.
///
/// The counter is atomic so one allocator can be shared (behind an `Arc`)
/// by several stores that must never hand out colliding handles.
pub struct HandleAllocator<T> {
    next: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HandleAllocator<T> {
    /// Create a new allocator whose first handle is 1
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            _marker: PhantomData,
        }
    }

    /// Create an allocator whose first handle is `first` (clamped to 1)
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
            _marker: PhantomData,
        }
    }

    /// Allocate a fresh handle
    pub fn next(&self) -> Handle<T> {
        Handle::from_bits(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The handle the next call to [`next`](Self::next) would return
    pub fn peek(&self) -> Handle<T> {
        Handle::from_bits(self.next.load(Ordering::Relaxed))
    }

    /// Check whether a handle could have come from this allocator
    pub fn has_issued(&self, handle: Handle<T>) -> bool {
        handle.is_valid() && handle.to_bits() < self.next.load(Ordering::Relaxed)
    }
}

impl<T> Default for HandleAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandleAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleAllocator")
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    #[test]
    fn test_handle_allocation() {
        let alloc: HandleAllocator<Widget> = HandleAllocator::new();
        let h1 = alloc.next();
        let h2 = alloc.next();

        assert_eq!(h1.to_bits(), 1);
        assert_eq!(h2.to_bits(), 2);
        assert!(h1 < h2);
        assert!(alloc.has_issued(h1));
        assert!(!alloc.has_issued(alloc.peek()));
    }

    #[test]
    fn test_null_handle() {
        let null: Handle<Widget> = Handle::default();
        assert!(null.is_null());
        assert!(!null.is_valid());
        assert_eq!(format!("{}", null), "null");
    }

    #[test]
    fn test_starting_at_clamps_zero() {
        let alloc: HandleAllocator<Widget> = HandleAllocator::starting_at(0);
        assert_eq!(alloc.next().to_bits(), 1);

        let alloc: HandleAllocator<Widget> = HandleAllocator::starting_at(500);
        assert_eq!(alloc.next().to_bits(), 500);
    }

    #[test]
    fn test_handle_serializes_as_integer() {
        let handle: Handle<Widget> = Handle::from_bits(42);
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "42");

        let back: Handle<Widget> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
