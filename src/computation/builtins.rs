//! The fixed builtin function library.
//!
//! Every function checks its own arity and argument kinds. Domain violations
//! of the logarithms, `sqrt` and the `growth` overflow guard raise
//! `EvalError::Domain`; everything else follows native `f64` semantics.

use super::context::EvalError;

/// Builtin names, in the order they are documented.
pub const BUILTIN_NAMES: [&str; 12] = [
    "sqrt", "sin", "cos", "tan", "abs", "round", "floor", "ceil", "exp", "ln", "log", "growth",
];

/// Default magnitude beyond which `growth` overflows (or underflows to zero).
pub const DEFAULT_GROWTH_EXPONENT_LIMIT: f64 = 700.0;

/// An evaluated call argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Number(f64),
    Text(&'a str),
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Dispatches `name(args)`.
pub fn call(name: &str, args: &[Arg<'_>], growth_limit: f64) -> Result<f64, EvalError> {
    match name {
        "sqrt" => {
            let x = unary(name, args)?;
            if x < 0.0 {
                return Err(domain(name, format!("square root of negative value {}", x)));
            }
            Ok(x.sqrt())
        }
        "sin" => angle(name, args).map(f64::sin),
        "cos" => angle(name, args).map(f64::cos),
        "tan" => angle(name, args).map(f64::tan),
        "abs" => unary(name, args).map(f64::abs),
        "round" => unary(name, args).map(f64::round_ties_even),
        "floor" => unary(name, args).map(f64::floor),
        "ceil" => unary(name, args).map(f64::ceil),
        "exp" => unary(name, args).map(f64::exp),
        "ln" => {
            let x = unary(name, args)?;
            if x <= 0.0 {
                return Err(domain(name, format!("logarithm of non-positive value {}", x)));
            }
            Ok(x.ln())
        }
        "log" => log(args),
        "growth" => growth(args, growth_limit),
        _ => Err(EvalError::UnknownFunction { name: name.to_string() }),
    }
}

fn domain(function: &str, message: String) -> EvalError {
    EvalError::Domain { function: function.to_string(), message }
}

fn arity(function: &str, expected: &'static str, args: &[Arg<'_>]) -> EvalError {
    EvalError::Arity { function: function.to_string(), expected, found: args.len() }
}

fn number(function: &str, arg: &Arg<'_>) -> Result<f64, EvalError> {
    match arg {
        Arg::Number(n) => Ok(*n),
        Arg::Text(text) => Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: format!("expected a number, got '{}'", text),
        }),
    }
}

fn text<'a>(function: &str, arg: &Arg<'a>) -> Result<&'a str, EvalError> {
    match arg {
        Arg::Text(text) => Ok(text.trim()),
        Arg::Number(n) => Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: format!("expected a quoted unit name, got {}", n),
        }),
    }
}

fn unary(function: &str, args: &[Arg<'_>]) -> Result<f64, EvalError> {
    match args {
        [x] => number(function, x),
        _ => Err(arity(function, "1", args)),
    }
}

/// `f(angle)` in radians, or `f(angle, 'degrees' | 'radians')`.
fn angle(function: &str, args: &[Arg<'_>]) -> Result<f64, EvalError> {
    let (value, unit) = match args {
        [x] => (number(function, x)?, "radians"),
        [x, unit] => (number(function, x)?, text(function, unit)?),
        _ => return Err(arity(function, "1 or 2", args)),
    };

    if unit.eq_ignore_ascii_case("radians") {
        Ok(value)
    } else if unit.eq_ignore_ascii_case("degrees") {
        Ok(value.to_radians())
    } else {
        Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: format!("unknown angle unit '{}', expected 'degrees' or 'radians'", unit),
        })
    }
}

/// `log(x)` is base 10; `log(x, base)` uses the given base.
fn log(args: &[Arg<'_>]) -> Result<f64, EvalError> {
    const NAME: &str = "log";
    let (x, base) = match args {
        [x] => (number(NAME, x)?, None),
        [x, base] => (number(NAME, x)?, Some(number(NAME, base)?)),
        _ => return Err(arity(NAME, "1 or 2", args)),
    };

    if x <= 0.0 {
        return Err(domain(NAME, format!("logarithm of non-positive value {}", x)));
    }
    match base {
        None => Ok(x.log10()),
        Some(b) if b <= 0.0 || b == 1.0 => Err(domain(NAME, format!("invalid logarithm base {}", b))),
        Some(b) => Ok(x.ln() / b.ln()),
    }
}

/// `growth(rate, period, unit)` = e^(rate * period_in_years).
fn growth(args: &[Arg<'_>], limit: f64) -> Result<f64, EvalError> {
    const NAME: &str = "growth";
    let [rate, period, unit] = args else {
        return Err(arity(NAME, "3", args));
    };
    let rate = number(NAME, rate)?;
    let period = number(NAME, period)?;
    let unit = text(NAME, unit)?;

    let periods_per_year = match unit.to_ascii_lowercase().as_str() {
        "years" | "year" => 1.0,
        "months" | "month" => 12.0,
        "weeks" | "week" => 52.0,
        "days" | "day" => 365.0,
        other => {
            return Err(EvalError::InvalidArgument {
                function: NAME.to_string(),
                message: format!("unknown time unit '{}', expected years, months, weeks or days", other),
            })
        }
    };

    let exponent = rate * (period / periods_per_year);
    if exponent > limit {
        return Err(domain(NAME, format!("exponent {} exceeds overflow limit {}", exponent, limit)));
    }
    if exponent < -limit {
        return Ok(0.0);
    }
    Ok(exponent.exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LIMIT: f64 = DEFAULT_GROWTH_EXPONENT_LIMIT;

    fn num(args: &[f64]) -> Vec<Arg<'static>> {
        args.iter().map(|&n| Arg::Number(n)).collect()
    }

    #[rstest]
    #[case("sqrt", vec![16.0], 4.0)]
    #[case("abs", vec![-3.5], 3.5)]
    #[case("floor", vec![2.7], 2.0)]
    #[case("ceil", vec![2.1], 3.0)]
    #[case("round", vec![2.5], 2.0)]
    #[case("round", vec![3.5], 4.0)]
    #[case("round", vec![-1.4], -1.0)]
    #[case("exp", vec![0.0], 1.0)]
    #[case("ln", vec![1.0], 0.0)]
    #[case("log", vec![1000.0], 3.0)]
    #[case("log", vec![100.0, 10.0], 2.0)]
    #[case("sin", vec![0.0], 0.0)]
    #[case("cos", vec![0.0], 1.0)]
    fn test_numeric_builtins(#[case] name: &str, #[case] args: Vec<f64>, #[case] expected: f64) {
        let got = call(name, &num(&args), LIMIT).unwrap();
        assert!((got - expected).abs() < 1e-12, "{}({:?}) = {}", name, args, got);
    }

    #[test]
    fn test_log_with_base_two() {
        let got = call("log", &num(&[100.0, 2.0]), LIMIT).unwrap();
        assert!((got - 6.643856).abs() < 1e-6);
    }

    #[rstest]
    #[case("log", vec![0.0, 2.0])]
    #[case("log", vec![-5.0])]
    #[case("log", vec![10.0, 1.0])]
    #[case("log", vec![10.0, -2.0])]
    #[case("ln", vec![0.0])]
    #[case("sqrt", vec![-1.0])]
    fn test_domain_errors(#[case] name: &str, #[case] args: Vec<f64>) {
        let err = call(name, &num(&args), LIMIT).unwrap_err();
        assert!(matches!(err, EvalError::Domain { .. }), "got {:?}", err);
    }

    #[test]
    fn test_angles_in_degrees() {
        let args = [Arg::Number(90.0), Arg::Text("degrees")];
        assert!((call("sin", &args, LIMIT).unwrap() - 1.0).abs() < 1e-12);

        let args = [Arg::Number(std::f64::consts::PI), Arg::Text("radians")];
        assert!((call("cos", &args, LIMIT).unwrap() + 1.0).abs() < 1e-12);

        let args = [Arg::Number(1.0), Arg::Text("gradians")];
        assert!(matches!(call("tan", &args, LIMIT), Err(EvalError::InvalidArgument { .. })));
    }

    #[rstest]
    #[case(0.05, 1.0, "years", 1.051)]
    #[case(0.10, 2.0, "years", 1.221)]
    #[case(0.05, 6.0, "months", 1.025)]
    #[case(0.05, 12.0, "months", 1.051)]
    #[case(0.05, 52.0, "weeks", 1.051)]
    #[case(0.05, 365.0, "days", 1.051)]
    fn test_growth(#[case] rate: f64, #[case] period: f64, #[case] unit: &str, #[case] expected: f64) {
        let args = [Arg::Number(rate), Arg::Number(period), Arg::Text(unit)];
        let got = call("growth", &args, LIMIT).unwrap();
        assert!((got - expected).abs() < 1e-3, "got {}", got);
    }

    #[test]
    fn test_growth_guards() {
        let over = [Arg::Number(800.0), Arg::Number(1.0), Arg::Text("years")];
        assert!(matches!(call("growth", &over, LIMIT), Err(EvalError::Domain { .. })));

        let under = [Arg::Number(-800.0), Arg::Number(1.0), Arg::Text("years")];
        assert_eq!(call("growth", &under, LIMIT).unwrap(), 0.0);

        let bad_unit = [Arg::Number(0.1), Arg::Number(1.0), Arg::Text("fortnights")];
        assert!(matches!(call("growth", &bad_unit, LIMIT), Err(EvalError::InvalidArgument { .. })));
    }

    #[test]
    fn test_arity_and_unknown_functions() {
        assert_eq!(
            call("sqrt", &num(&[1.0, 2.0]), LIMIT).unwrap_err(),
            EvalError::Arity { function: "sqrt".into(), expected: "1", found: 2 }
        );
        // `exp` is strictly single-argument; the growth form has its own name.
        assert!(matches!(call("exp", &num(&[0.05, 1.0]), LIMIT), Err(EvalError::Arity { .. })));
        assert_eq!(
            call("max", &num(&[1.0]), LIMIT).unwrap_err(),
            EvalError::UnknownFunction { name: "max".into() }
        );
        assert!(matches!(
            call("abs", &[Arg::Text("years")], LIMIT),
            Err(EvalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_exp_overflow_is_native_infinity() {
        assert!(call("exp", &num(&[1000.0]), LIMIT).unwrap().is_infinite());
    }
}
