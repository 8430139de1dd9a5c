// Renders results the way printf's %g conversion would: fixed notation while
// the decimal exponent fits the conventional window, scientific otherwise,
// trailing zeros trimmed either way.

/// Significant digits used when the server is started without a setting.
pub const DEFAULT_DIGITS: u32 = 12;

/// Upper bound on the configurable precision.
#[cfg(debug_assertions)]
pub const MAX_DIGITS: u32 = 30;
#[cfg(not(debug_assertions))]
pub const MAX_DIGITS: u32 = 15;

/// Clamps a requested digit count into `[1, MAX_DIGITS]`. Zero and negative
/// requests reset to the default, excessive ones saturate.
pub fn clamp_digits(digits: i64) -> u32 {
  if digits <= 0 {
    DEFAULT_DIGITS
  } else if digits > i64::from(MAX_DIGITS) {
    MAX_DIGITS
  } else {
    digits as u32
  }
}

/// Formats a finite value at `digits` significant digits, `%.{digits}g`
/// style.
pub fn significant(value: f64, digits: u32) -> String {
  debug_assert!(value.is_finite());
  let digits = digits.clamp(1, MAX_DIGITS) as usize;
  // Round through the exponential formatter, then lay the digit string out by
  // hand; re-rounding in a second float-to-decimal pass could shift the
  // exponent.
  let rounded = format!("{:.*e}", digits - 1, value);
  // "d.ddde±X" always carries an exponent.
  let (mantissa, exponent) = rounded.split_once('e').unwrap();
  let exponent: i32 = exponent.parse().unwrap();
  let sign = if mantissa.starts_with('-') { "-" } else { "" };
  let digits_string: String = mantissa.chars().filter(char::is_ascii_digit).collect();

  if exponent < -4 || exponent >= digits as i32 {
    let mantissa = digits_string.trim_end_matches('0');
    let (first, rest) = mantissa.split_at(1);
    let exponent_sign = if exponent < 0 { '-' } else { '+' };
    let exponent = exponent.unsigned_abs();
    if rest.is_empty() {
      format!("{sign}{first}e{exponent_sign}{exponent:02}")
    } else {
      format!("{sign}{first}.{rest}e{exponent_sign}{exponent:02}")
    }
  } else if exponent >= 0 {
    let (integer, fraction) = digits_string.split_at(exponent as usize + 1);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
      format!("{sign}{integer}")
    } else {
      format!("{sign}{integer}.{fraction}")
    }
  } else {
    let fraction = digits_string.trim_end_matches('0');
    if fraction.is_empty() {
      // Everything rounded away.
      format!("{sign}0")
    } else {
      format!("{sign}0.{}{}", "0".repeat(-(exponent + 1) as usize), fraction)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integers_lose_their_fraction() {
    assert_eq!("421", significant(421.0, 12));
    assert_eq!("2", significant(2.0, 12));
    assert_eq!("0", significant(0.0, 12));
    assert_eq!("-0", significant(-0.0, 12));
    assert_eq!("10000000", significant(1e7, 12));
    assert_eq!("-3628800", significant(-3628800.0, 12));
  }

  #[test]
  fn fractions_trim_trailing_zeros() {
    assert_eq!("0.5", significant(0.5, 12));
    assert_eq!("3.14159265359", significant(std::f64::consts::PI, 12));
    assert_eq!("0.0349065850399", significant(0.034906585039886591, 12));
    assert_eq!("1.0471975512", significant(1.0471975511965979, 12));
    assert_eq!("-0.416146836547", significant(-0.41614683654714241, 12));
  }

  #[test]
  fn scientific_outside_the_window() {
    assert_eq!("4.43749076323e+14", significant(443749076323000.0, 12));
    assert_eq!("1.23456789012e+14", significant(123456789012345.0, 12));
    assert_eq!("1e-07", significant(1e-7, 12));
    assert_eq!("-1e+20", significant(-1e20, 12));
    assert_eq!("1e+100", significant(1e100, 12));
  }

  #[test]
  fn rounding_can_move_the_exponent() {
    assert_eq!("1e+03", significant(999.9999, 3));
    assert_eq!("1e+02", significant(99.99, 2));
    assert_eq!("0.001", significant(0.00099999, 2));
  }

  #[test]
  fn precision_bounds() {
    assert_eq!("3", significant(std::f64::consts::PI, 1));
    assert_eq!("3.14159265358979", significant(std::f64::consts::PI, 15));
    assert_eq!(DEFAULT_DIGITS, clamp_digits(0));
    assert_eq!(DEFAULT_DIGITS, clamp_digits(-3));
    assert_eq!(1, clamp_digits(1));
    assert_eq!(MAX_DIGITS, clamp_digits(1000));
  }
}
