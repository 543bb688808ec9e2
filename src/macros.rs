//! Declares `enum_with_unknown!`, used throughout the codec to turn a raw
//! wire byte/short into an enum that round-trips unrecognized values instead
//! of rejecting them outright. Lifted from the `smoltcp` convention `ofpkt`
//! itself already follows for `openflow::Kind`, `hello::Kind`, etc.

macro_rules! enum_with_unknown {
    (
        $( #[$enum_attr:meta] )*
        pub doc enum $name:ident($ty:ty) {
            $( $( #[$variant_attr:meta] )* $variant:ident = $value:expr ),+
        }
    ) => {
        enum_with_unknown!(
            $( #[$enum_attr] )*
            pub enum $name($ty) {
                $( $( #[$variant_attr] )* $variant = $value ),+
            }
        );
    };
    (
        $( #[$enum_attr:meta] )*
        pub enum $name:ident($ty:ty) {
            $( $( #[$variant_attr:meta] )* $variant:ident = $value:expr ),+
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $( #[$enum_attr] )*
        pub enum $name {
            $( $( #[$variant_attr] )* $variant ),+,
            /// An unrecognized value, preserved so round-tripping never loses
            /// information the peer sent.
            Unknown($ty)
        }

        impl ::core::convert::From<$ty> for $name {
            fn from(value: $ty) -> Self {
                match value {
                    $( $value => $name::$variant ),+,
                    other => $name::Unknown(other)
                }
            }
        }

        impl ::core::convert::From<$name> for $ty {
            fn from(value: $name) -> Self {
                match value {
                    $( $name::$variant => $value ),+,
                    $name::Unknown(other) => other
                }
            }
        }
    }
}
