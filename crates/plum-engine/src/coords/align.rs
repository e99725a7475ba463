/// Texture-friendly size for a dimension: the smallest power of two `>= n`.
///
/// `align(0) == 0`. Sizes above `2^31` saturate to `2^31`; no decodable image
/// reaches that range.
#[inline]
pub fn align(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    n.checked_next_power_of_two().unwrap_or(1 << 31)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn align_small_values() {
        assert_eq!(align(0), 0);
        assert_eq!(align(1), 1);
        assert_eq!(align(2), 2);
        assert_eq!(align(3), 4);
        assert_eq!(align(17), 32);
        assert_eq!(align(64), 64);
        assert_eq!(align(65), 128);
    }

    proptest! {
        #[test]
        fn align_is_a_covering_power_of_two(d in 1u32..=(1 << 31)) {
            let a = align(d);
            prop_assert!(a >= d);
            prop_assert!(a.is_power_of_two());
            prop_assert!(a / 2 < d);
        }

        #[test]
        fn align_is_idempotent(d in 0u32..=(1 << 31)) {
            prop_assert_eq!(align(align(d)), align(d));
        }
    }
}
