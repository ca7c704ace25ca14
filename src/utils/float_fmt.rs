//! Short float formatting for weight logs and the sample JSON output.

/// Format `x` with at most `digits` significant digits, picking plain decimal
/// notation for moderate magnitudes and exponent notation otherwise, with
/// trailing zeros removed. Mirrors the `%g`-style output the score log and
/// sample records use.
pub fn format_significant(x: f64, digits: usize) -> String {
  if x == 0.0 {
    return "0".to_owned();
  }
  if !x.is_finite() {
    return format!("{x}");
  }

  let digits = digits.max(1);
  let exp_form = format!("{:.*e}", digits - 1, x);
  let (mantissa, exponent) = exp_form
    .split_once('e')
    .expect("exponent notation always contains 'e'");
  let exponent: i32 = exponent.parse().expect("exponent is an integer");

  if exponent >= -4 && exponent < digits as i32 {
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    trim_trailing_zeros(&format!("{x:.decimals$}"))
  } else {
    format!("{}e{exponent:+03}", trim_trailing_zeros(mantissa))
  }
}

fn trim_trailing_zeros(s: &str) -> String {
  if s.contains('.') {
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
  } else {
    s.to_owned()
  }
}
