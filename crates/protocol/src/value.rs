//! The [`Value`] trait: a bidirectional mapping between user types and
//! raw buffer contents.

use bytes::BytesMut;

use crate::buffer::{put_ascii_i64, put_ascii_u64};

/// A type that can be written to and read from a memcached value payload.
///
/// Integers are encoded as decimal ASCII; strings and raw byte payloads are
/// passed through unchanged. `read_from_buffer` consumes the entire
/// readable slice (a memcached value has no internal framing of its own) and
/// returns `None` when the bytes cannot be interpreted as `Self`.
pub trait Value: Sized {
    /// Appends this value's wire representation to `dst`.
    fn write_to_buffer(&self, dst: &mut BytesMut);

    /// Parses a value from `bytes`, the complete payload of a `VA`
    /// response. Returns `None` if `bytes` cannot be interpreted as `Self`.
    fn read_from_buffer(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_value_for_uint {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Value for $t {
                fn write_to_buffer(&self, dst: &mut BytesMut) {
                    put_ascii_u64(dst, u64::from(*self));
                }

                fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
                    std::str::from_utf8(bytes).ok()?.parse().ok()
                }
            }
        )+
    };
}

macro_rules! impl_value_for_int {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Value for $t {
                fn write_to_buffer(&self, dst: &mut BytesMut) {
                    put_ascii_i64(dst, i64::from(*self));
                }

                fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
                    std::str::from_utf8(bytes).ok()?.parse().ok()
                }
            }
        )+
    };
}

impl_value_for_uint!(u8, u16, u32, u64);
impl_value_for_int!(i8, i16, i32, i64);

impl Value for usize {
    fn write_to_buffer(&self, dst: &mut BytesMut) {
        put_ascii_u64(dst, *self as u64);
    }

    fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok()?.parse().ok()
    }
}

impl Value for isize {
    fn write_to_buffer(&self, dst: &mut BytesMut) {
        put_ascii_i64(dst, *self as i64);
    }

    fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok()?.parse().ok()
    }
}

impl Value for String {
    fn write_to_buffer(&self, dst: &mut BytesMut) {
        dst.extend_from_slice(self.as_bytes());
    }

    fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }
}

impl Value for Vec<u8> {
    fn write_to_buffer(&self, dst: &mut BytesMut) {
        dst.extend_from_slice(self);
    }

    fn read_from_buffer(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }
}
