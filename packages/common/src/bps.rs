//! Basis-point arithmetic (10000 bps = 100%).

use cosmwasm_std::Uint128;

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `amount · bps / 10000`, rounded down.
pub fn apply_bps(amount: Uint128, bps: u64) -> Uint128 {
    amount.multiply_ratio(bps as u128, BPS_DENOMINATOR)
}

/// Absolute deviation of `observed` from `expected`, in basis points of
/// `expected`, rounded down. Returns `None` when `expected` is zero.
pub fn deviation_bps(observed: Uint128, expected: Uint128) -> Option<u128> {
    if expected.is_zero() {
        return None;
    }
    let diff = if observed >= expected {
        observed - expected
    } else {
        expected - observed
    };
    Some(diff.multiply_ratio(BPS_DENOMINATOR, expected).u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(Uint128::new(1000), 50), Uint128::new(5));
        assert_eq!(apply_bps(Uint128::new(1000), 10_000), Uint128::new(1000));
        assert_eq!(apply_bps(Uint128::zero(), 300), Uint128::zero());
    }

    #[test]
    fn test_deviation_bps() {
        // 2% over
        assert_eq!(
            deviation_bps(Uint128::new(1_020_000), Uint128::new(1_000_000)),
            Some(200)
        );
        // 0.5% under
        assert_eq!(
            deviation_bps(Uint128::new(995_000), Uint128::new(1_000_000)),
            Some(50)
        );
        assert_eq!(deviation_bps(Uint128::new(1), Uint128::zero()), None);
    }
}
