//! Arithmetic over numbers and arrays, usually fed by chain references

use serde::Deserialize;
use serde_json::{Map, Value};
use super::error::PluginError;
use super::params::{maybe_number, round_to, Params};
use super::{Plugin, PluginInput};

/// An operand of a formula
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormulaArg {
    Number(f64),
    Array(Vec<Option<f64>>),
    Node(FormulaNode),
}

/// One arithmetic operation over two or more operands
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaNode {
    Add(Vec<FormulaArg>),
    Subtract(Vec<FormulaArg>),
    Multiply(Vec<FormulaArg>),
    Divide(Vec<FormulaArg>),
}

/// Evaluated operand; `None` entries are missing values
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Scalar(Option<f64>),
    Vector(Vec<Option<f64>>),
}

impl FormulaArg {
    fn eval(&self) -> Result<Operand, String> {
        match self {
            FormulaArg::Number(n) => Ok(Operand::Scalar(Some(*n))),
            FormulaArg::Array(values) => Ok(Operand::Vector(values.clone())),
            FormulaArg::Node(node) => node.eval(),
        }
    }
}

type Op = fn(f64, f64) -> Option<f64>;

fn add(a: f64, b: f64) -> Option<f64> {
    Some(a + b)
}

fn subtract(a: f64, b: f64) -> Option<f64> {
    Some(a - b)
}

fn multiply(a: f64, b: f64) -> Option<f64> {
    Some(a * b)
}

fn divide(a: f64, b: f64) -> Option<f64> {
    (b != 0.0).then(|| a / b)
}

impl FormulaNode {
    fn operands(&self) -> &[FormulaArg] {
        match self {
            FormulaNode::Add(args)
            | FormulaNode::Subtract(args)
            | FormulaNode::Multiply(args)
            | FormulaNode::Divide(args) => args,
        }
    }

    fn operator(&self) -> Op {
        match self {
            FormulaNode::Add(_) => add,
            FormulaNode::Subtract(_) => subtract,
            FormulaNode::Multiply(_) => multiply,
            FormulaNode::Divide(_) => divide,
        }
    }

    fn eval(&self) -> Result<Operand, String> {
        let [first, rest @ ..] = self.operands() else {
            return Err("an operation needs at least two operands".to_string());
        };
        if rest.is_empty() {
            return Err("an operation needs at least two operands".to_string());
        }
        let op = self.operator();
        let mut acc = first.eval()?;
        for arg in rest {
            acc = combine(acc, arg.eval()?, op)?;
        }
        Ok(acc)
    }
}

fn apply(a: Option<f64>, b: Option<f64>, op: Op) -> Option<f64> {
    op(a?, b?)
}

/// Element-wise combination; scalars broadcast over vectors
fn combine(a: Operand, b: Operand, op: Op) -> Result<Operand, String> {
    Ok(match (a, b) {
        (Operand::Scalar(a), Operand::Scalar(b)) => Operand::Scalar(apply(a, b, op)),
        (Operand::Scalar(a), Operand::Vector(v)) => {
            Operand::Vector(v.into_iter().map(|b| apply(a, b, op)).collect())
        }
        (Operand::Vector(v), Operand::Scalar(b)) => {
            Operand::Vector(v.into_iter().map(|a| apply(a, b, op)).collect())
        }
        (Operand::Vector(x), Operand::Vector(y)) => {
            if x.len() != y.len() {
                return Err(format!("array lengths differ ({} and {})", x.len(), y.len()));
            }
            Operand::Vector(x.into_iter().zip(y).map(|(a, b)| apply(a, b, op)).collect())
        }
    })
}

/// `custom_formula`
///
/// Params: `expression` (a number, an array, or `{add|subtract|multiply|divide: [..]}`),
/// optional `round` (decimals). Division by zero yields null.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomFormula;

impl Plugin for CustomFormula {
    fn name(&self) -> &'static str {
        "custom_formula"
    }

    fn execute(&self, _input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let expression: FormulaArg = serde_json::from_value(p.required("expression")?.clone())
            .map_err(|_| p.error("expression", "expected a number, an array of numbers or an operation"))?;
        let decimals = match p.get("round") {
            None => None,
            Some(_) => Some(p.usize_or("round", 0)? as u32),
        };

        let finish = |v: Option<f64>| maybe_number(v.map(|x| decimals.map_or(x, |d| round_to(x, d))));
        match expression.eval().map_err(|msg| p.error("expression", msg))? {
            Operand::Scalar(v) => Ok(finish(v)),
            Operand::Vector(values) => Ok(Value::Array(values.into_iter().map(finish).collect())),
        }
    }
}
