use bytes::Bytes;
use std::fmt;

/// An immutable view over a cached value.
///
/// Construction copies the input bytes, so no caller can mutate the cached
/// contents afterwards. Clones are cheap (reference-counted), which lets the
/// store, the single-flight waiters, and the HTTP layer share one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteView {
    b: Bytes,
}

impl ByteView {
    /// Copies `b` into a new view.
    pub fn from_bytes(b: &[u8]) -> Self {
        Self {
            b: Bytes::copy_from_slice(b),
        }
    }

    /// Takes ownership of `v` without copying.
    pub fn from_vec(v: Vec<u8>) -> Self {
        Self { b: Bytes::from(v) }
    }

    /// Length in bytes, used for budget accounting.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Returns a defensive copy of the contents. Mutating the returned
    /// buffer never alters the view.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.b.to_vec()
    }

    /// Borrows the contents without copying. The view stays immutable
    /// because `Bytes` hands out shared read-only storage.
    pub fn as_bytes(&self) -> &[u8] {
        &self.b
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.b))
    }
}

impl From<Bytes> for ByteView {
    fn from(b: Bytes) -> Self {
        Self { b }
    }
}
