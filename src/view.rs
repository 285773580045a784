//! Zero-copy views
//!
//! A `View` borrows bytes owned by the engine. It is handed to callbacks only,
//! always under a higher-ranked lifetime (`for<'v> FnMut(View<'v>)`), so it
//! cannot be stored, returned, or sent anywhere that outlives the callback.
//! Copy the bytes out (`to_bytes`, `to_vec`) to keep them.
//!
//! ```compile_fail
//! use kvbridge::{Config, Database, View};
//!
//! let db = Database::open("blackhole", &Config::default()).unwrap();
//! let mut kept: Option<View<'_>> = None;
//! db.get_keys(|key| kept = Some(key)).unwrap();
//! ```

use std::fmt;
use std::ops::Deref;
use std::os::raw::c_char;
use std::str::Utf8Error;

use bytes::Bytes;

/// Read-only view over engine-owned memory
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct View<'a> {
    data: &'a [u8],
}

impl<'a> View<'a> {
    /// Build a view from a raw `(pointer, length)` pair handed out by the engine
    ///
    /// A null pointer yields an empty view.
    ///
    /// # Safety
    ///
    /// When non-null, `ptr` must be valid for reads of `len` bytes for all of
    /// `'a`, and the memory must not be written during that time.
    pub(crate) unsafe fn from_raw_parts(ptr: *const c_char, len: usize) -> Self {
        if ptr.is_null() {
            return Self { data: &[] };
        }
        Self {
            data: std::slice::from_raw_parts(ptr.cast::<u8>(), len),
        }
    }

    /// The viewed bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Interpret the bytes as UTF-8
    pub fn to_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.data)
    }

    /// Copy the bytes into an owned buffer
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data)
    }

    /// Copy the bytes into a `Vec`
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

impl Deref for View<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl AsRef<[u8]> for View<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl PartialEq<[u8]> for View<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.data == other
    }
}

impl PartialEq<&[u8]> for View<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.data == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for View<'_> {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.data == &other[..]
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.data) {
            Ok(s) => write!(f, "View({:?})", s),
            Err(_) => write!(f, "View({:?})", self.data),
        }
    }
}
