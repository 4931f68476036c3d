use crate::lang::ast::{BinOpKind, Expr};
use crate::lang::error::{DomainError, EvalResult, ParseError, ParseResult};
use crate::lang::lexer::Lexer;
use crate::lang::parser::Parser;
use num_complex::Complex64;
use std::f64::consts;

/// Built-in constants resolvable without a variable binding.
pub const CONSTANTS: &[&str] = &["pi", "e", "tau"];

/// Known function names with their accepted argument counts.
const FUNCTIONS: &[(&str, usize, usize)] = &[
    ("sin", 1, 1),
    ("cos", 1, 1),
    ("tan", 1, 1),
    ("asin", 1, 1),
    ("acos", 1, 1),
    ("atan", 1, 1),
    ("sinh", 1, 1),
    ("cosh", 1, 1),
    ("tanh", 1, 1),
    ("exp", 1, 1),
    ("sqrt", 1, 1),
    ("abs", 1, 1),
    ("ln", 1, 1),
    ("log", 1, 2),
    ("floor", 1, 1),
    ("ceil", 1, 1),
    ("round", 1, 1),
    ("sign", 1, 1),
];

/// A parsed, validated expression ready for repeated evaluation over a
/// grid. Immutable once compiled.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    expr: Expr,
}

impl CompiledExpr {
    /// Lex, parse, and validate an expression. `allowed_vars` is the set of
    /// free variables the coordinate system supplies; anything else that is
    /// not a known constant or function is a `ParseError`.
    pub fn compile(source: &str, allowed_vars: &[&str]) -> ParseResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        let expr = Parser::new(tokens).parse_expression()?;
        validate(&expr, allowed_vars)?;
        Ok(Self { expr })
    }

    /// Evaluate with real arithmetic. Undefined results (division by zero,
    /// log of non-positive, sqrt of negative, non-finite values) are
    /// `DomainError`s, not panics.
    pub fn eval_real(&self, vars: &[(&str, f64)]) -> EvalResult<f64> {
        let v = eval_real(&self.expr, vars)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(DomainError::NonFinite)
        }
    }

    /// Evaluate with complex arithmetic. `i` resolves to the imaginary unit.
    pub fn eval_complex(&self, vars: &[(&str, Complex64)]) -> EvalResult<Complex64> {
        let v = eval_complex(&self.expr, vars)?;
        if v.re.is_finite() && v.im.is_finite() {
            Ok(v)
        } else {
            Err(DomainError::NonFinite)
        }
    }
}

fn validate(expr: &Expr, allowed_vars: &[&str]) -> ParseResult<()> {
    match expr {
        Expr::Number(_, _) => Ok(()),
        Expr::Ident(name, span) => {
            if allowed_vars.contains(&name.as_str()) || CONSTANTS.contains(&name.as_str()) {
                Ok(())
            } else if FUNCTIONS.iter().any(|(f, _, _)| f == name) {
                Err(ParseError::new(format!(
                    "'{}' is a function and needs arguments, e.g. {}(x)",
                    name, name
                ))
                .with_span(*span))
            } else {
                Err(ParseError::new(format!(
                    "unknown variable '{}' (expected one of: {})",
                    name,
                    allowed_vars.join(", ")
                ))
                .with_span(*span))
            }
        }
        Expr::BinOp { lhs, rhs, .. } => {
            validate(lhs, allowed_vars)?;
            validate(rhs, allowed_vars)
        }
        Expr::Neg { operand, .. } => validate(operand, allowed_vars),
        Expr::Call {
            name,
            name_span,
            args,
            ..
        } => {
            match FUNCTIONS.iter().find(|(f, _, _)| f == name) {
                Some((_, min, max)) => {
                    if args.len() < *min || args.len() > *max {
                        return Err(ParseError::new(format!(
                            "{}: expected {} argument{}, got {}",
                            name,
                            if min == max {
                                min.to_string()
                            } else {
                                format!("{}-{}", min, max)
                            },
                            if *max == 1 { "" } else { "s" },
                            args.len()
                        ))
                        .with_span(*name_span));
                    }
                }
                None => {
                    return Err(
                        ParseError::new(format!("unknown function '{}'", name))
                            .with_span(*name_span),
                    )
                }
            }
            for arg in args {
                validate(arg, allowed_vars)?;
            }
            Ok(())
        }
    }
}

// --- Real evaluation ---

fn eval_real(expr: &Expr, vars: &[(&str, f64)]) -> EvalResult<f64> {
    match expr {
        Expr::Number(n, _) => Ok(*n),
        Expr::Ident(name, _) => Ok(lookup_real(name, vars)),
        Expr::Neg { operand, .. } => Ok(-eval_real(operand, vars)?),
        Expr::BinOp { op, lhs, rhs, .. } => {
            let a = eval_real(lhs, vars)?;
            let b = eval_real(rhs, vars)?;
            match op {
                BinOpKind::Add => Ok(a + b),
                BinOpKind::Sub => Ok(a - b),
                BinOpKind::Mul => Ok(a * b),
                BinOpKind::Div => {
                    if b == 0.0 {
                        Err(DomainError::DivisionByZero)
                    } else {
                        Ok(a / b)
                    }
                }
                BinOpKind::Mod => {
                    if b == 0.0 {
                        Err(DomainError::DivisionByZero)
                    } else {
                        Ok(a % b)
                    }
                }
                BinOpKind::Pow => Ok(a.powf(b)),
            }
        }
        Expr::Call { name, args, .. } => {
            let a = eval_real(&args[0], vars)?;
            match name.as_str() {
                "sin" => Ok(a.sin()),
                "cos" => Ok(a.cos()),
                "tan" => Ok(a.tan()),
                "asin" => Ok(a.asin()),
                "acos" => Ok(a.acos()),
                "atan" => Ok(a.atan()),
                "sinh" => Ok(a.sinh()),
                "cosh" => Ok(a.cosh()),
                "tanh" => Ok(a.tanh()),
                "exp" => Ok(a.exp()),
                "abs" => Ok(a.abs()),
                "floor" => Ok(a.floor()),
                "ceil" => Ok(a.ceil()),
                "round" => Ok(a.round()),
                "sign" => Ok(a.signum()),
                "sqrt" => {
                    if a < 0.0 {
                        Err(DomainError::SqrtNegative)
                    } else {
                        Ok(a.sqrt())
                    }
                }
                "ln" => {
                    if a <= 0.0 {
                        Err(DomainError::LogNonPositive)
                    } else {
                        Ok(a.ln())
                    }
                }
                "log" => {
                    if args.len() == 2 {
                        // log(base, x), TI-style
                        let x = eval_real(&args[1], vars)?;
                        if a <= 0.0 || x <= 0.0 {
                            Err(DomainError::LogNonPositive)
                        } else {
                            Ok(x.log(a))
                        }
                    } else if a <= 0.0 {
                        Err(DomainError::LogNonPositive)
                    } else {
                        Ok(a.log10())
                    }
                }
                _ => unreachable!("validated at compile time"),
            }
        }
    }
}

fn lookup_real(name: &str, vars: &[(&str, f64)]) -> f64 {
    for (var, val) in vars {
        if *var == name {
            return *val;
        }
    }
    match name {
        "pi" => consts::PI,
        "e" => consts::E,
        "tau" => consts::TAU,
        _ => unreachable!("validated at compile time"),
    }
}

// --- Complex evaluation ---

fn eval_complex(expr: &Expr, vars: &[(&str, Complex64)]) -> EvalResult<Complex64> {
    match expr {
        Expr::Number(n, _) => Ok(Complex64::new(*n, 0.0)),
        Expr::Ident(name, _) => Ok(lookup_complex(name, vars)),
        Expr::Neg { operand, .. } => Ok(-eval_complex(operand, vars)?),
        Expr::BinOp { op, lhs, rhs, .. } => {
            let a = eval_complex(lhs, vars)?;
            let b = eval_complex(rhs, vars)?;
            match op {
                BinOpKind::Add => Ok(a + b),
                BinOpKind::Sub => Ok(a - b),
                BinOpKind::Mul => Ok(a * b),
                BinOpKind::Div => {
                    if b.norm_sqr() == 0.0 {
                        Err(DomainError::DivisionByZero)
                    } else {
                        Ok(a / b)
                    }
                }
                BinOpKind::Mod => {
                    if b.norm_sqr() == 0.0 {
                        Err(DomainError::DivisionByZero)
                    } else {
                        // Remainder along b: agrees with real % on the real axis
                        Ok(a - b * (a / b).re.trunc())
                    }
                }
                BinOpKind::Pow => Ok(a.powc(b)),
            }
        }
        Expr::Call { name, args, .. } => {
            let a = eval_complex(&args[0], vars)?;
            match name.as_str() {
                "sin" => Ok(a.sin()),
                "cos" => Ok(a.cos()),
                "tan" => Ok(a.tan()),
                "asin" => Ok(a.asin()),
                "acos" => Ok(a.acos()),
                "atan" => Ok(a.atan()),
                "sinh" => Ok(a.sinh()),
                "cosh" => Ok(a.cosh()),
                "tanh" => Ok(a.tanh()),
                "exp" => Ok(a.exp()),
                "sqrt" => Ok(a.sqrt()),
                "abs" => Ok(Complex64::new(a.norm(), 0.0)),
                "floor" => Ok(Complex64::new(a.re.floor(), a.im.floor())),
                "ceil" => Ok(Complex64::new(a.re.ceil(), a.im.ceil())),
                "round" => Ok(Complex64::new(a.re.round(), a.im.round())),
                "sign" => {
                    let n = a.norm();
                    if n == 0.0 {
                        Ok(Complex64::new(0.0, 0.0))
                    } else {
                        Ok(a / n)
                    }
                }
                "ln" => {
                    if a.norm_sqr() == 0.0 {
                        Err(DomainError::LogNonPositive)
                    } else {
                        Ok(a.ln())
                    }
                }
                "log" => {
                    if args.len() == 2 {
                        let x = eval_complex(&args[1], vars)?;
                        if a.norm_sqr() == 0.0 || x.norm_sqr() == 0.0 {
                            Err(DomainError::LogNonPositive)
                        } else {
                            Ok(x.ln() / a.ln())
                        }
                    } else if a.norm_sqr() == 0.0 {
                        Err(DomainError::LogNonPositive)
                    } else {
                        Ok(a.ln() / consts::LN_10)
                    }
                }
                _ => unreachable!("validated at compile time"),
            }
        }
    }
}

fn lookup_complex(name: &str, vars: &[(&str, Complex64)]) -> Complex64 {
    for (var, val) in vars {
        if *var == name {
            return *val;
        }
    }
    match name {
        "pi" => Complex64::new(consts::PI, 0.0),
        "e" => Complex64::new(consts::E, 0.0),
        "tau" => Complex64::new(consts::TAU, 0.0),
        "i" => Complex64::i(),
        _ => unreachable!("validated at compile time"),
    }
}
