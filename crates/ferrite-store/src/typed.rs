//! Typed put/get adapters over the byte-level entry API.
//!
//! Each pair delegates to [`BlockStore::put_raw`] / [`BlockStore::get_raw`]
//! with the matching tag. Getters verify both the stored tag and the exact
//! value width; any mismatch yields the caller's default.

use ferrite_bus::MemoryBus;

use crate::error::StoreError;
use crate::store::BlockStore;
use crate::types::DataType;

macro_rules! scalar_accessors {
    ($($put:ident / $get:ident: $ty:ty as $tag:ident),* $(,)?) => {
        impl<B: MemoryBus> BlockStore<B> {
            $(
                #[doc = concat!("Stores a `", stringify!($ty), "` under `key` with the `", stringify!($tag), "` tag.")]
                pub fn $put(&mut self, key: &str, value: $ty) -> Result<(), StoreError> {
                    self.put_raw(key, DataType::$tag, &value.to_le_bytes())
                }

                #[doc = concat!("Reads the `", stringify!($tag), "`-tagged value under `key`, or `default`.")]
                pub fn $get(&mut self, key: &str, default: $ty) -> $ty {
                    match self.get_raw(key, DataType::$tag) {
                        Some(raw) if raw.len() == core::mem::size_of::<$ty>() => {
                            <$ty>::from_le_bytes(
                                raw.as_ref().try_into().expect("length checked above"),
                            )
                        }
                        _ => default,
                    }
                }
            )*
        }
    };
}

scalar_accessors! {
    put_char / get_char: i8 as Char,
    put_uchar / get_uchar: u8 as UChar,
    put_short / get_short: i16 as Short,
    put_ushort / get_ushort: u16 as UShort,
    put_int / get_int: i32 as Int,
    put_uint / get_uint: u32 as UInt,
    put_long / get_long: i32 as Long,
    put_ulong / get_ulong: u32 as ULong,
    put_long64 / get_long64: i64 as Long64,
    put_ulong64 / get_ulong64: u64 as ULong64,
    put_float / get_float: f32 as Float,
    put_double / get_double: f64 as Double,
}

impl<B: MemoryBus> BlockStore<B> {
    /// Stores a `bool` under `key`.
    pub fn put_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.put_raw(key, DataType::Bool, &[u8::from(value)])
    }

    /// Reads the `Bool`-tagged value under `key`, or `default`.
    pub fn get_bool(&mut self, key: &str, default: bool) -> bool {
        match self.get_raw(key, DataType::Bool) {
            Some(raw) if raw.len() == 1 => raw[0] != 0,
            _ => default,
        }
    }

    /// Stores a string under `key`.
    ///
    /// The trailing null byte is persisted with the value, so an empty
    /// string occupies one value byte.
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut buf = Vec::with_capacity(value.len() + 1);
        buf.extend_from_slice(value.as_bytes());
        buf.push(0);
        self.put_raw(key, DataType::String, &buf)
    }

    /// Reads the `String`-tagged value under `key`, or `default`.
    ///
    /// Returns the stored bytes up to, but excluding, the null terminator.
    pub fn get_string(&mut self, key: &str, default: &str) -> String {
        match self.get_raw(key, DataType::String) {
            Some(raw) if !raw.is_empty() => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                match std::str::from_utf8(&raw[..end]) {
                    Ok(text) => text.to_string(),
                    Err(_) => default.to_string(),
                }
            }
            _ => default.to_string(),
        }
    }

    /// Stores a raw byte buffer under `key`.
    pub fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.put_raw(key, DataType::Bytes, value)
    }

    /// Copies the `Bytes`-tagged value under `key` into `out`.
    ///
    /// Returns the number of bytes copied — `min(stored, out.len())` — or 0
    /// when the key is absent or not tagged `Bytes`.
    pub fn get_bytes(&mut self, key: &str, out: &mut [u8]) -> usize {
        match self.get_raw(key, DataType::Bytes) {
            Some(raw) => {
                let n = raw.len().min(out.len());
                out[..n].copy_from_slice(&raw[..n]);
                n
            }
            None => 0,
        }
    }
}
