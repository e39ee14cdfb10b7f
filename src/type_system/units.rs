//! Rule for dimensional analysis and unit inference over a formula tree.
use super::error::UnitError;
use super::registry::{canonical_base, canonical_label};
use crate::computation::builtins;
use crate::formula::{AstNode, BinaryOperator};
use crate::store::Unit;
use std::collections::BTreeMap;
use std::fmt;

/// Products that reduce to a named unit, checked in either operand order.
const KNOWN_PRODUCTS: [(&str, &str, &str); 4] = [
    ("MW", "hours", "MWh"),
    ("kW", "hours", "kWh"),
    ("USD/kWh", "kWh", "USD"),
    ("USD/year", "years", "USD"),
];

/// A parsed representation of a unit, mapping each base unit to its exponent.
/// Example: "kg*m/s^2" -> { "kg": 1, "m": 1, "s": -2 }
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ParsedUnit {
    terms: BTreeMap<String, i32>,
}

impl ParsedUnit {
    /// Parses a label of the form `a*b^2/c*d`. Dimensionless labels parse to no terms.
    /// Currency symbols are read as their codes, so `$/kWh` parses like `USD/kWh`.
    pub(crate) fn parse(unit: &Unit) -> Option<Self> {
        let mut terms = BTreeMap::new();
        if unit.is_dimensionless() {
            return Some(Self { terms });
        }

        let mut parts = unit.0.split('/');
        if let Some(num_str) = parts.next() {
            Self::parse_product(num_str, 1, &mut terms)?;
        }
        if let Some(den_str) = parts.next() {
            Self::parse_product(den_str, -1, &mut terms)?;
        }
        // Ensure no more than one '/' was present
        if parts.next().is_some() {
            return None;
        }

        terms.retain(|_, exp| *exp != 0);
        Some(Self { terms })
    }

    /// Helper to parse a product of factors (e.g., "kg*m^2").
    fn parse_product(product_str: &str, sign: i32, terms: &mut BTreeMap<String, i32>) -> Option<()> {
        let product_str = product_str.trim();
        if product_str.is_empty() || product_str == "1" {
            return Some(());
        }

        for factor_str in product_str.split('*') {
            let mut factor_parts = factor_str.split('^');
            let base = factor_parts.next()?.trim();
            if base.is_empty() {
                return None;
            }
            let exponent = match factor_parts.next() {
                Some(exp_str) => exp_str.trim().parse::<i32>().ok()?,
                None => 1,
            };
            *terms.entry(canonical_base(base).to_string()).or_insert(0) += exponent * sign;
        }
        Some(())
    }

    fn multiply_by(&mut self, other: &Self) {
        for (base, exponent) in &other.terms {
            *self.terms.entry(base.clone()).or_insert(0) += exponent;
        }
        self.terms.retain(|_, exp| *exp != 0);
    }

    fn divide_by(&mut self, other: &Self) {
        for (base, exponent) in &other.terms {
            *self.terms.entry(base.clone()).or_insert(0) -= exponent;
        }
        self.terms.retain(|_, exp| *exp != 0);
    }

    /// Halves every exponent, or `None` if any exponent is odd.
    fn sqrt(&self) -> Option<Self> {
        let mut terms = BTreeMap::new();
        for (base, &exp) in &self.terms {
            if exp % 2 != 0 {
                return None;
            }
            terms.insert(base.clone(), exp / 2);
        }
        Some(Self { terms })
    }

    fn into_unit(self) -> Unit {
        if self.terms.is_empty() {
            Unit::dimensionless()
        } else {
            Unit(self.to_string())
        }
    }
}

/// Canonical form: factors sorted by base, numerator before an optional denominator.
impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (num_terms, den_terms): (Vec<_>, Vec<_>) = self.terms.iter().partition(|&(_, &exp)| exp > 0);

        let format_product = |terms: Vec<(&String, &i32)>| -> String {
            if terms.is_empty() {
                return "1".to_string();
            }
            terms
                .into_iter()
                .map(|(base, &exp)| if exp.abs() == 1 { base.clone() } else { format!("{}^{}", base, exp.abs()) })
                .collect::<Vec<_>>()
                .join("*")
        };

        let num_str = format_product(num_terms);
        if den_terms.is_empty() {
            if num_str == "1" { Ok(()) } else { f.write_str(&num_str) }
        } else {
            write!(f, "{}/{}", num_str, format_product(den_terms))
        }
    }
}

/// True when both labels denote the same unit, ignoring factor order.
pub fn same_unit(a: &Unit, b: &Unit) -> bool {
    match (ParsedUnit::parse(a), ParsedUnit::parse(b)) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => canonical_label(&a.0) == canonical_label(&b.0),
    }
}

fn multiply(left: Unit, right: Unit) -> Unit {
    if left.is_dimensionless() {
        return right;
    }
    if right.is_dimensionless() {
        return left;
    }

    let (l, r) = (canonical_label(&left.0), canonical_label(&right.0));
    for (a, b, product) in KNOWN_PRODUCTS {
        if (l == a && r == b) || (l == b && r == a) {
            return Unit(product.to_string());
        }
    }

    match (ParsedUnit::parse(&left), ParsedUnit::parse(&right)) {
        (Some(mut pl), Some(pr)) => {
            pl.multiply_by(&pr);
            pl.into_unit()
        }
        _ => Unit(format!("{}*{}", l, r)),
    }
}

fn divide(left: Unit, right: Unit) -> Unit {
    if right.is_dimensionless() {
        return left;
    }
    match (ParsedUnit::parse(&left), ParsedUnit::parse(&right)) {
        (Some(mut pl), Some(pr)) => {
            pl.divide_by(&pr);
            pl.into_unit()
        }
        _ if canonical_label(&left.0) == canonical_label(&right.0) => Unit::dimensionless(),
        _ => Unit(format!("{}/{}", left.0.trim(), right.0.trim())),
    }
}

/// Infers the unit of `ast`, looking variables up through `unit_of`.
///
/// Literals are dimensionless, and a dimensionless operand is absorbed by
/// addition and subtraction.
pub fn infer_unit<F>(ast: &AstNode, unit_of: &F) -> Result<Unit, UnitError>
where
    F: Fn(&str) -> Option<Unit>,
{
    match ast {
        AstNode::Literal(_) | AstNode::Text(_) => Ok(Unit::dimensionless()),
        AstNode::Variable(name) => unit_of(name).ok_or_else(|| UnitError::UnknownVariable { name: name.clone() }),
        AstNode::UnaryNegate { operand } => infer_unit(operand, unit_of),
        AstNode::BinaryOp { op, left, right } => {
            let l = infer_unit(left, unit_of)?;
            let r = infer_unit(right, unit_of)?;
            match op {
                BinaryOperator::Add | BinaryOperator::Subtract => {
                    if l.is_dimensionless() {
                        Ok(r)
                    } else if r.is_dimensionless() || same_unit(&l, &r) {
                        Ok(l)
                    } else {
                        Err(UnitError::Mismatch {
                            op: if *op == BinaryOperator::Add { "add" } else { "subtract" },
                            left: l.0,
                            right: r.0,
                        })
                    }
                }
                BinaryOperator::Multiply => Ok(multiply(l, r)),
                BinaryOperator::Divide => Ok(divide(l, r)),
                BinaryOperator::Power => {
                    if !r.is_dimensionless() {
                        return Err(UnitError::InvalidExponent { unit: r.0 });
                    }
                    Ok(l)
                }
            }
        }
        AstNode::Call { name, args } => {
            let mut units = Vec::with_capacity(args.len());
            for arg in args {
                units.push(infer_unit(arg, unit_of)?);
            }
            let first = units.into_iter().next().unwrap_or_else(Unit::dimensionless);

            match name.as_str() {
                "abs" | "round" | "floor" | "ceil" => Ok(first),
                "sqrt" => ParsedUnit::parse(&first)
                    .and_then(|p| p.sqrt())
                    .map(ParsedUnit::into_unit)
                    .ok_or(UnitError::NonIntegralRoot { unit: first.0 }),
                other if builtins::is_builtin(other) => Ok(Unit::dimensionless()),
                other => Err(UnitError::UnknownFunction { name: other.to_string() }),
            }
        }
    }
}
