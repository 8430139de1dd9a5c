// The function and constant catalogue. Entries are matched case-sensitively
// against the alphabetic run the evaluator hands over; the arity lives on the
// entry, so argument parsing never guesses.

use crate::eval::{ErrorKind, Evaluator};
use once_cell::sync::Lazy;
use std::{collections::HashMap, f64::consts, str};

// Names on the wire are at most this long.
pub(crate) const MAX_NAME: usize = 4;

#[derive(Clone, Copy)]
enum Kind {
  Constant(f64),
  Unary(fn(f64) -> Result<f64, ErrorKind>),
  Binary(fn(f64, f64) -> Result<f64, ErrorKind>),
}

struct Function {
  name: &'static str,
  kind: Kind,
}

const FUNCTIONS: &[Function] = &[
  Function { name: "pi", kind: Kind::Constant(consts::PI) },
  Function { name: "e", kind: Kind::Constant(consts::E) },
  Function { name: "abs", kind: Kind::Unary(|x| Ok(x.abs())) },
  Function { name: "sqrt", kind: Kind::Unary(sqrt) },
  Function { name: "sin", kind: Kind::Unary(|x| Ok(x.sin())) },
  Function { name: "cos", kind: Kind::Unary(|x| Ok(x.cos())) },
  Function { name: "tan", kind: Kind::Unary(|x| Ok(x.tan())) },
  Function { name: "asin", kind: Kind::Unary(|x| Ok(x.asin())) },
  Function { name: "acos", kind: Kind::Unary(|x| Ok(x.acos())) },
  Function { name: "atan", kind: Kind::Unary(|x| Ok(x.atan())) },
  Function { name: "exp", kind: Kind::Unary(|x| Ok(x.exp())) },
  Function { name: "ln", kind: Kind::Unary(ln) },
  Function { name: "log", kind: Kind::Unary(log) },
  Function { name: "rad", kind: Kind::Unary(|x| Ok(x * consts::PI / 180.0)) },
  Function { name: "deg", kind: Kind::Unary(|x| Ok(x * 180.0 / consts::PI)) },
  Function { name: "n", kind: Kind::Unary(factorial) },
  Function { name: "nPr", kind: Kind::Binary(permutation) },
  Function { name: "nCr", kind: Kind::Binary(combination) },
];

static INDEX: Lazy<HashMap<&'static str, &'static Function>> =
  Lazy::new(|| FUNCTIONS.iter().map(|function| (function.name, function)).collect());

/// Looks `name` up and runs it, parsing its argument list off the evaluator.
/// Unknown names, domain errors and non-finite results all land in the
/// evaluator's error cell.
pub(crate) fn apply(evaluator: &mut Evaluator, name: &[u8]) -> f64 {
  // Catalogue names never exceed MAX_NAME, so longer runs can't match.
  let function = str::from_utf8(name)
    .ok()
    .filter(|name| name.len() <= MAX_NAME)
    .and_then(|name| INDEX.get(name));
  let function = match function {
    Some(function) => function,
    None => {
      evaluator.fail(ErrorKind::UnknownFunction);
      return 0.0;
    }
  };
  let result = match function.kind {
    Kind::Constant(value) => Ok(value),
    Kind::Unary(function) => {
      let [x] = evaluator.arguments();
      if evaluator.failed() {
        return 0.0;
      }
      function(x)
    }
    Kind::Binary(function) => {
      let [x, y] = evaluator.arguments();
      if evaluator.failed() {
        return 0.0;
      }
      function(x, y)
    }
  };
  match result {
    Ok(value) => evaluator.classify(value),
    Err(kind) => {
      evaluator.fail(kind);
      0.0
    }
  }
}

/// Exponentiation as the `^` operator sees it: a zero base with a negative
/// exponent is a domain error, everything else defers to `pow` and the
/// result classification.
pub(crate) fn pow(evaluator: &mut Evaluator, x: f64, y: f64) -> f64 {
  if evaluator.failed() {
    return 0.0;
  }
  if x == 0.0 && y < 0.0 {
    evaluator.fail(ErrorKind::NotANumber);
    return 0.0;
  }
  let result = x.powf(y);
  evaluator.classify(result)
}

// No complex results: a negative radicand is a domain error.
fn sqrt(x: f64) -> Result<f64, ErrorKind> {
  if x < 0.0 {
    return Err(ErrorKind::NotANumber);
  }
  Ok(x.sqrt())
}

fn ln(x: f64) -> Result<f64, ErrorKind> {
  if x < 0.0 {
    return Err(ErrorKind::NotANumber);
  }
  // The pole at zero is reported as a division by zero, not as infinity.
  if x == 0.0 {
    return Err(ErrorKind::DivideByZero);
  }
  Ok(x.ln())
}

fn log(x: f64) -> Result<f64, ErrorKind> {
  if x < 0.0 {
    return Err(ErrorKind::NotANumber);
  }
  if x == 0.0 {
    return Err(ErrorKind::DivideByZero);
  }
  Ok(x.log10())
}

// n! over the integers, iteratively. n(-3) is -(3!), a convention the wire
// protocol keeps. Saturates to infinity around |n| >= 171.
fn factorial(n: f64) -> Result<f64, ErrorKind> {
  if n.fract() != 0.0 {
    return Err(ErrorKind::NotANumber);
  }
  let negative = n < 0.0;
  let mut n = n.abs();
  let mut result = 1.0;
  while n > 0.0 {
    result *= n;
    if result.is_infinite() {
      break;
    }
    n -= 1.0;
  }
  Ok(if negative { -result } else { result })
}

// nPr = n! / (n-r)!
fn permutation(n: f64, r: f64) -> Result<f64, ErrorKind> {
  if n < 0.0 || r < 0.0 || n < r {
    return Err(ErrorKind::NotANumber);
  }
  Ok(factorial(n)? / factorial(n - r)?)
}

// nCr = n! / (r! (n-r)!)
fn combination(n: f64, r: f64) -> Result<f64, ErrorKind> {
  if n < 0.0 || r < 0.0 || n < r {
    return Err(ErrorKind::NotANumber);
  }
  Ok(factorial(n)? / (factorial(r)? * factorial(n - r)?))
}
