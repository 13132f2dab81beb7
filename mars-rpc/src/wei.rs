//! Wei quantity rendering.

use crate::error::RpcError;

const WEI_PER_MARS: u128 = 1_000_000_000_000_000_000;
// Six fractional digits are shown, so round at 1e12 wei.
const WEI_PER_MICRO: u128 = 1_000_000_000_000;

/// Render a hex wei quantity as a human MARS amount.
///
/// At most six fractional digits, trailing zeros trimmed:
/// `0xde0b6b3a7640000` is `"1"`, `0x16345785d8a0000` is `"0.1"`.
pub fn wei_to_mars(hex_wei: &str) -> Result<String, RpcError> {
    let digits = hex_wei.strip_prefix("0x").unwrap_or(hex_wei);
    if digits.is_empty() {
        return Err(RpcError::InvalidResponse(format!("bad wei quantity: {}", hex_wei)));
    }
    let wei = u128::from_str_radix(digits, 16)
        .map_err(|_| RpcError::InvalidResponse(format!("bad wei quantity: {}", hex_wei)))?;

    let whole = wei / WEI_PER_MARS;
    let micros = (wei % WEI_PER_MARS) / WEI_PER_MICRO;

    if micros == 0 {
        return Ok(whole.to_string());
    }

    let frac = format!("{:06}", micros);
    let frac = frac.trim_end_matches('0');
    Ok(format!("{}.{}", whole, frac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_mars() {
        assert_eq!(wei_to_mars("0xde0b6b3a7640000").unwrap(), "1");
    }

    #[test]
    fn test_tenth_of_a_mars() {
        assert_eq!(wei_to_mars("0x16345785d8a0000").unwrap(), "0.1");
    }

    #[test]
    fn test_zero() {
        assert_eq!(wei_to_mars("0x0").unwrap(), "0");
    }

    #[test]
    fn test_sub_micro_dust_is_dropped() {
        // 1 wei is below the six-digit display resolution.
        assert_eq!(wei_to_mars("0x1").unwrap(), "0");
        // 1e12 wei is exactly one display micro.
        assert_eq!(wei_to_mars("0xe8d4a51000").unwrap(), "0.000001");
    }

    #[test]
    fn test_mixed_whole_and_fraction() {
        // 1.5 MARS = 1_500_000_000_000_000_000 wei
        assert_eq!(wei_to_mars("0x14d1120d7b160000").unwrap(), "1.5");
        // 2.25 MARS
        assert_eq!(wei_to_mars("0x1f399b1438a10000").unwrap(), "2.25");
    }

    #[test]
    fn test_missing_prefix_is_accepted() {
        assert_eq!(wei_to_mars("de0b6b3a7640000").unwrap(), "1");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(wei_to_mars("0x").is_err());
        assert!(wei_to_mars("xyz").is_err());
    }
}
