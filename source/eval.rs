// Recursive-descent interpreter for infix arithmetic:
//
//   expression := term   { (+|-) term }
//   term       := factor { (*|/|^) factor }
//   factor     := '(' expression ')' | token
//   token      := [+|-]? ( number | identifier )
//
// `^` shares the level, precedence and left associativity of `*` and `/`
// (2*3^2 is 36, not 18). Existing clients rely on this, don't fix it.

use crate::{format, func};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  DivideByZero,
  Syntax,
  UnknownFunction,
  NotANumber,
  Infinity,
}

impl ErrorKind {
  /// The canonical response payload for this error.
  pub fn message(self) -> &'static str {
    match self {
      ErrorKind::DivideByZero => "Divide by zero.",
      ErrorKind::Syntax => "Syntax error.",
      ErrorKind::UnknownFunction => "Function not defined.",
      ErrorKind::NotANumber => "Nan.",
      ErrorKind::Infinity => "Infinity.",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    formatter.write_str(self.message())
  }
}

/// One evaluation in flight. State is owned by the caller for the duration of
/// a single request and never shared.
pub struct Evaluator<'input> {
  input: &'input [u8],
  cursor: usize,
  // Current character; 0 is end of input.
  ch: u8,
  // First error wins and everything downstream short-circuits to 0.0.
  error: Option<ErrorKind>,
}

impl<'input> Evaluator<'input> {
  pub fn new(input: &'input [u8]) -> Self {
    let mut evaluator = Self {
      input,
      cursor: 0,
      ch: 0,
      error: None,
    };
    evaluator.advance();
    evaluator
  }

  /// Consumes the whole input. Trailing garbage after a well-formed
  /// expression is a syntax error.
  pub fn evaluate(&mut self) -> Result<f64, ErrorKind> {
    let value = self.expression();
    self.classify(value);
    if self.ch != 0 {
      self.fail(ErrorKind::Syntax);
    }
    match self.error {
      Some(kind) => Err(kind),
      None => Ok(value),
    }
  }

  // Reads the next character, skipping blanks. Once the input is exhausted
  // (or a stray NUL shows up) `ch` stays 0 and this becomes a no-op.
  pub(crate) fn advance(&mut self) {
    loop {
      let byte = self.input.get(self.cursor).copied().unwrap_or(0);
      self.ch = byte;
      if byte == 0 {
        return;
      }
      self.cursor += 1;
      if !matches!(byte, b' ' | b'\t') {
        return;
      }
    }
  }

  pub(crate) fn failed(&self) -> bool {
    self.error.is_some()
  }

  pub(crate) fn fail(&mut self, kind: ErrorKind) {
    self.error.get_or_insert(kind);
  }

  /// Maps a non-finite value onto the error cell; the value is passed through
  /// so call sites stay expression-shaped.
  pub(crate) fn classify(&mut self, value: f64) -> f64 {
    if value.is_nan() {
      self.fail(ErrorKind::NotANumber);
    } else if value.is_infinite() {
      self.fail(ErrorKind::Infinity);
    }
    value
  }

  pub(crate) fn expression(&mut self) -> f64 {
    if self.failed() {
      return 0.0;
    }
    let mut x = self.term();
    loop {
      match self.ch {
        b'+' => {
          self.advance();
          x += self.term();
        }
        b'-' => {
          self.advance();
          x -= self.term();
        }
        _ => break,
      }
    }
    x
  }

  fn term(&mut self) -> f64 {
    if self.failed() {
      return 0.0;
    }
    let mut x = self.factor();
    loop {
      match self.ch {
        b'*' => {
          self.advance();
          x *= self.factor();
        }
        b'/' => {
          self.advance();
          let y = self.factor();
          if y == 0.0 {
            self.fail(ErrorKind::DivideByZero);
            return 0.0;
          }
          x /= y;
        }
        b'^' => {
          self.advance();
          let y = self.factor();
          x = func::pow(self, x, y);
        }
        _ => break,
      }
    }
    x
  }

  fn factor(&mut self) -> f64 {
    if self.failed() {
      return 0.0;
    }
    if self.ch != b'(' {
      return self.token();
    }
    self.advance();
    let x = self.expression();
    if self.ch != b')' {
      self.fail(ErrorKind::Syntax);
      return 0.0;
    }
    self.advance();
    x
  }

  fn token(&mut self) -> f64 {
    if self.failed() {
      return 0.0;
    }
    let mut sign = b'+';
    if self.ch == b'+' || self.ch == b'-' {
      sign = self.ch;
      self.advance();
    }
    let result = if self.ch.is_ascii_digit() {
      self.number()
    } else if self.ch.is_ascii_alphabetic() {
      let mut name = Vec::new();
      while self.ch.is_ascii_alphabetic() {
        name.push(self.ch);
        self.advance();
      }
      func::apply(self, &name)
    } else {
      self.fail(ErrorKind::Syntax);
      0.0
    };
    if sign == b'+' {
      result
    } else {
      -result
    }
  }

  fn number(&mut self) -> f64 {
    let mut x = f64::from(self.ch - b'0');
    loop {
      self.advance();
      if !self.ch.is_ascii_digit() {
        break;
      }
      x = x * 10.0 + f64::from(self.ch - b'0');
    }
    if self.ch == b'.' {
      self.advance();
      // A fraction needs at least one digit; "1." is not a number.
      if !self.ch.is_ascii_digit() {
        self.fail(ErrorKind::Syntax);
        return 0.0;
      }
      let mut scale = 1.0;
      loop {
        scale /= 10.0;
        x += scale * f64::from(self.ch - b'0');
        self.advance();
        if !self.ch.is_ascii_digit() {
          break;
        }
      }
    }
    self.classify(x)
  }

  /// Parses a parenthesised, comma-separated argument list of exactly N
  /// values. Wrong punctuation anywhere is a syntax error.
  pub(crate) fn arguments<const N: usize>(&mut self) -> [f64; N] {
    let mut values = [0.0; N];
    if self.failed() {
      return values;
    }
    if self.ch != b'(' {
      self.fail(ErrorKind::Syntax);
      return values;
    }
    self.advance();
    values[0] = self.expression();
    for index in 1..N {
      if self.ch != b',' {
        self.fail(ErrorKind::Syntax);
        return values;
      }
      self.advance();
      values[index] = self.expression();
    }
    if self.ch != b')' {
      self.fail(ErrorKind::Syntax);
      return values;
    }
    self.advance();
    values
  }
}

/// Evaluates one expression.
pub fn evaluate(input: &[u8]) -> Result<f64, ErrorKind> {
  Evaluator::new(input).evaluate()
}

/// Evaluates one request and renders the response payload: the value at
/// `digits` significant digits, or the canonical error message.
pub fn answer(input: &[u8], digits: u32) -> String {
  match evaluate(input) {
    Ok(value) => format::significant(value, digits),
    Err(kind) => kind.message().to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn answer12(input: &str) -> String {
    answer(input.as_bytes(), 12)
  }

  #[test]
  fn arithmetic() {
    assert_eq!("421", answer12("(105+312)+2*(5-3)"));
    assert_eq!("418", answer12("(105+312)+2/(5-3)"));
    assert_eq!("5", answer12("1+2*(5-3)"));
    assert_eq!("2", answer12("1+2/(5-3)"));
    assert_eq!("1.5", answer12("0.75*2"));
    assert_eq!("8", answer12("2^3"));
    assert_eq!("1", answer12("0^0"));
  }

  #[test]
  fn caret_binds_like_multiplication() {
    assert_eq!("36", answer12("2*3^2"));
    assert_eq!("64", answer12("2^3^2"));
  }

  #[test]
  fn unary_sign() {
    assert_eq!("-2", answer12("-2"));
    assert_eq!("3", answer12("5+-2"));
    assert_eq!("-10", answer12("5*-2"));
    assert_eq!("-3.14159265359", answer12("-pi"));
    assert_eq!("Syntax error.", answer12("--5"));
  }

  #[test]
  fn blanks_are_invisible() {
    assert_eq!("7", answer12(" 3 +\t4 "));
    // A blank between digits does not end the number.
    assert_eq!("12", answer12("1 2"));
  }

  #[test]
  fn functions_and_constants() {
    assert_eq!("3.14159265359", answer12("pi"));
    assert_eq!("2.71828182846", answer12("e"));
    assert_eq!("2", answer12("abs(-2)"));
    assert_eq!("1.41421356237", answer12("sqrt(2)"));
    assert_eq!("0.909297426826", answer12("sin(2)"));
    assert_eq!("-0.416146836547", answer12("cos(2)"));
    assert_eq!("-2.18503986326", answer12("tan(2)"));
    assert_eq!("0.523598775598", answer12("asin(0.5)"));
    assert_eq!("1.0471975512", answer12("acos(0.5)"));
    assert_eq!("0.463647609001", answer12("atan(0.5)"));
    assert_eq!("7.38905609893", answer12("exp(2)"));
    assert_eq!("0.69314718056", answer12("ln(2)"));
    assert_eq!("0.301029995664", answer12("log(2)"));
    assert_eq!("114.591559026", answer12("deg(2)"));
    assert_eq!("0.0349065850399", answer12("rad(2)"));
    assert_eq!("3628800", answer12("n(10)"));
    assert_eq!("20", answer12("nPr(5,2)"));
    assert_eq!("10", answer12("nCr(5,2)"));
    assert_eq!("4.43749076323e+14", answer12("nCr(50,22)*5"));
  }

  #[test]
  fn errors() {
    assert_eq!("Divide by zero.", answer12("5/0"));
    assert_eq!("Divide by zero.", answer12("5/(3-3)"));
    assert_eq!("Syntax error.", answer12("sin(5"));
    assert_eq!("Syntax error.", answer12("nCr(5)"));
    assert_eq!("Syntax error.", answer12("nCr(5,2,)"));
    assert_eq!("Syntax error.", answer12(""));
    assert_eq!("Syntax error.", answer12("1."));
    assert_eq!("Syntax error.", answer12(".5"));
    assert_eq!("Syntax error.", answer12("1)"));
    assert_eq!("Syntax error.", answer12("(1"));
    assert_eq!("Function not defined.", answer12("nofunc(5)"));
    assert_eq!("Function not defined.", answer12("abcdefgh"));
    assert_eq!("Nan.", answer12("sqrt(-5)"));
    assert_eq!("Nan.", answer12("0^-1"));
    assert_eq!("Nan.", answer12("n(0.5)"));
    assert_eq!("Infinity.", answer12("10^1000000"));
    assert_eq!("Infinity.", answer12("n(5000)"));
    assert_eq!("Infinity.", answer12("n(-5000)"));
  }

  #[test]
  fn first_error_is_sticky() {
    // The division fails before the trailing garbage is seen.
    assert_eq!("Divide by zero.", answer12("1/0)"));
    assert_eq!("Function not defined.", answer12("nofunc(5)+1/0"));
  }

  #[test]
  fn evaluate_returns_values() {
    assert_eq!(Ok(3.0), evaluate(b"1+2"));
    assert_eq!(Ok(-6.0), evaluate(b"n(-3)"));
    assert_eq!(Err(ErrorKind::DivideByZero), evaluate(b"1/0"));
    assert_eq!(Err(ErrorKind::Syntax), evaluate(b"1+"));
  }

  #[test]
  fn precision_follows_the_digit_setting() {
    assert_eq!("3.1", answer("pi".as_bytes(), 2));
    assert_eq!("3.14159265358979", answer("pi".as_bytes(), 15));
  }
}
