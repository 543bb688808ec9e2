//! Types to parse and emit version bitmaps used in Hello messages.

use crate::error::{Error, Result};
use crate::version::Version;
use byteorder::{ByteOrder, NetworkEndian};

/// A buffer representing a bitmap.
#[derive(Debug)]
pub struct Bitmap<T: AsRef<[u8]>> {
    inner: T,
}

impl<T: AsRef<[u8]>> Bitmap<T> {
    /// Imbue a raw octet buffer with a bitmap buffer structure.
    pub fn new(buffer: T) -> Self {
        Bitmap { inner: buffer }
    }

    /// Shorthand for a combination of [new] and [check_len].
    ///
    /// [new]: #method.new
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Self> {
        let buf = Self::new(buffer);
        buf.check_len()?;
        Ok(buf)
    }

    /// Ensure that no accessor method will panic if called.
    pub fn check_len(&self) -> Result<()> {
        let len = self.inner.as_ref().len();
        if len < 4 {
            Err(Error::TooShort {
                needed: 4,
                available: len,
            })
        } else {
            Ok(())
        }
    }

    /// Consume the bitmap, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Return the set of versions this crate negotiates that are present in
    /// this bitmap. Bits for versions this crate doesn't know about are
    /// ignored.
    #[inline]
    pub fn versions(&self) -> Vec<Version> {
        Version::set_from_bitmap(self.bitmap())
    }

    /// Return the bitmap
    #[inline]
    pub fn bitmap(&self) -> u32 {
        let data = self.inner.as_ref();
        NetworkEndian::read_u32(&data[0..4])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Bitmap<T> {
    /// Set the bitmap.
    #[inline]
    pub fn set_bitmap(&mut self, value: u32) {
        let data = self.inner.as_mut();
        NetworkEndian::write_u32(&mut data[0..4], value)
    }

    /// Compute the bitmap from the given versions and set it.
    pub fn set_bitmap_from_versions(&mut self, versions: &[Version]) {
        self.set_bitmap(Version::bitmap_from_set(versions))
    }
}

/// A high level representation of a bitmap.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BitmapRepr(pub u32);

impl BitmapRepr {
    /// Parse a bitmap buffer and return a high-level representation.
    pub fn parse<T>(buffer: &Bitmap<T>) -> Result<Self>
    where
        T: AsRef<[u8]>,
    {
        Ok(BitmapRepr(buffer.bitmap()))
    }

    /// Return the length of a buffer that will be emitted from this high-level representation.
    pub fn length(&self) -> usize {
        4
    }

    /// Emit a high-level representation of a bitmap into a buffer.
    pub fn emit<T>(&self, buffer: &mut Bitmap<&mut T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]> + ?Sized,
    {
        buffer.set_bitmap(self.0)
    }

    /// The versions this crate negotiates that this bitmap names.
    pub fn versions(&self) -> Vec<Version> {
        Version::set_from_bitmap(self.0)
    }
}
