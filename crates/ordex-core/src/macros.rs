/// Implement [`EntityCodec`](crate::traits::EntityCodec) for serde types using
/// the crate's CBOR serializer.
#[macro_export]
macro_rules! impl_cbor_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::traits::EntityCodec for $ty {
                fn marshal(&self) -> ::std::result::Result<
                    ::std::vec::Vec<u8>,
                    $crate::serialize::SerializeError,
                > {
                    $crate::serialize::serialize(self)
                }

                fn unmarshal(bytes: &[u8]) -> ::std::result::Result<
                    Self,
                    $crate::serialize::SerializeError,
                > {
                    $crate::serialize::deserialize(bytes)
                }
            }
        )+
    };
}
