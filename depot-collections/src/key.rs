//! Key trait for storage slots.
//!
//! Node-based structures in this crate link their nodes by storage key
//! rather than by pointer. A reserved sentinel (`NONE`) stands in for a
//! null link so nodes stay small and `Copy`.

/// A copyable storage key with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use depot_collections::Key;
///
/// let key: usize = 7;
/// assert!(key.is_some());
/// assert!(usize::NONE.is_none());
/// ```
pub trait Key: Copy + Eq {
    /// Sentinel value representing "no key" / null link.
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Returns `true` if this is NOT the sentinel value.
    #[inline]
    fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Converts the sentinel to `None`, anything else to `Some(self)`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

macro_rules! impl_key_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Key for $ty {
                const NONE: Self = <$ty>::MAX;
            }
        )*
    };
}

impl_key_for_unsigned!(u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_key_sentinel {
        ($($ty:ty => $name:ident),*) => {
            $(
                #[test]
                fn $name() {
                    assert!(<$ty>::NONE.is_none());
                    assert!(!<$ty>::NONE.is_some());
                    assert!((0 as $ty).is_some());
                    assert!((<$ty>::MAX - 1).is_some());
                }
            )*
        };
    }

    test_key_sentinel!(
        u16 => u16_sentinel,
        u32 => u32_sentinel,
        u64 => u64_sentinel,
        usize => usize_sentinel
    );

    #[test]
    fn into_option_maps_sentinel() {
        assert_eq!(usize::NONE.into_option(), None);
        assert_eq!(3usize.into_option(), Some(3));
    }
}
