//! Display helpers and unit conversion

use crate::error::WalletError;
use crate::network::MAX_DECIMALS;

const PREFIX_LEN: usize = 6;
const SUFFIX_LEN: usize = 4;

/// `0xABCDEF1234567890` -> `0xABCD...7890`. Inputs shorter than the prefix
/// or suffix contribute what they have, so `0x12` -> `0x12...0x12`.
pub fn formatted_address(address: Option<&str>) -> String {
    let Some(address) = address.filter(|a| !a.is_empty()) else {
        return String::new();
    };

    let chars: Vec<char> = address.chars().collect();
    let prefix: String = chars.iter().take(PREFIX_LEN).collect();
    let suffix: String = chars[chars.len().saturating_sub(SUFFIX_LEN)..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Four decimal places; non-finite values render as zero.
pub fn formatted_balance(balance: f64) -> String {
    if !balance.is_finite() {
        return "0.0000".to_string();
    }
    format!("{:.4}", balance)
}

/// Convert a hex quantity in the smallest unit into whole native units.
pub fn wei_to_native(hex: &str, decimals: u8) -> Result<f64, WalletError> {
    if decimals > MAX_DECIMALS {
        return Err(WalletError::InvalidBalance(format!(
            "unsupported decimals: {}",
            decimals
        )));
    }

    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidBalance(hex.to_string()))?;

    // Some nodes answer "0x" for zero
    let raw = if digits.is_empty() {
        0
    } else {
        u128::from_str_radix(digits, 16)
            .map_err(|_| WalletError::InvalidBalance(hex.to_string()))?
    };

    let scale = 10u128.pow(u32::from(decimals));
    let whole = (raw / scale) as f64;
    let fraction = (raw % scale) as f64 / scale as f64;

    Ok(whole + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_address() {
        assert_eq!(formatted_address(None), "");
        assert_eq!(formatted_address(Some("0xABCDEF1234567890")), "0xABCD...7890");
        assert_eq!(
            formatted_address(Some("0x1234567890123456789012345678901234567890")),
            "0x1234...7890"
        );
        assert_eq!(formatted_address(Some("")), "");
    }

    #[test]
    fn test_formatted_address_short_input() {
        assert_eq!(formatted_address(Some("0x1234")), "0x1234...1234");
        assert_eq!(formatted_address(Some("0x12")), "0x12...0x12");
        assert_eq!(formatted_address(Some("0x1234abcd")), "0x1234...abcd");
    }

    #[test]
    fn test_formatted_balance() {
        assert_eq!(formatted_balance(f64::NAN), "0.0000");
        assert_eq!(formatted_balance(f64::INFINITY), "0.0000");
        assert_eq!(formatted_balance(1.23456), "1.2346");
        assert_eq!(formatted_balance(0.0), "0.0000");
        assert_eq!(formatted_balance(42.5), "42.5000");
    }

    #[test]
    fn test_wei_to_native() {
        assert_eq!(wei_to_native("0xde0b6b3a7640000", 18).unwrap(), 1.0);
        assert_eq!(wei_to_native("0x0", 18).unwrap(), 0.0);
        assert_eq!(wei_to_native("0x", 18).unwrap(), 0.0);
        // 1.5 units at 6 decimals
        assert_eq!(wei_to_native("0x16e360", 6).unwrap(), 1.5);
        assert_eq!(wei_to_native("0xff", 0).unwrap(), 255.0);
    }

    #[test]
    fn test_wei_to_native_rejects_garbage() {
        assert!(wei_to_native("1000", 18).is_err());
        assert!(wei_to_native("0xnothex", 18).is_err());
        assert!(wei_to_native("0x1", 39).is_err());
    }
}
