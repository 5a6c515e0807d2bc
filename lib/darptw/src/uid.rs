/// Dense integer identifiers handed out by position (client order, request order, arena slot).
pub trait IntUid: Copy + Eq + Ord {
    type Raw;
    fn new(raw: Self::Raw) -> Self;
    fn raw(&self) -> Self::Raw;
    fn index(&self) -> usize;
}

#[macro_export]
macro_rules! _impl_define_index_type {
    ($name:ident, $type:ty) => {
        #[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Ord, PartialOrd)]
        pub struct $name($type);

        impl $crate::IntUid for $name {
            type Raw = $type;

            #[inline]
            fn new(raw: $type) -> Self {
                return Self(raw)
            }

            #[inline]
            fn raw(&self) -> Self::Raw {
                return self.0
            }

            #[inline]
            fn index(&self) -> usize {
                return self.0 as usize
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(i: usize) -> Self {
                ::std::debug_assert!(i <= <$type>::max_value() as usize);
                return Self(i as $type)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }
    }
}

#[macro_export]
macro_rules! define_u32_index_type { ($name:ident) => { $crate::_impl_define_index_type!{$name, u32} } }
#[macro_export]
macro_rules! define_u16_index_type { ($name:ident) => { $crate::_impl_define_index_type!{$name, u16} } }
