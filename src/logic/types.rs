//! core types for the logic engine

use std::fmt;

use serde::{Deserialize, Serialize};

use super::time::{AgeUnit, Window};
use super::vital::VitalSign;

/// relational operators supported in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// equality: ==, eq
    Eq,
    /// inequality: !=, ne
    Ne,
    /// less than: <, lt
    Lt,
    /// less than or equal: <=, lte
    Lte,
    /// greater than: >, gt
    Gt,
    /// greater than or equal: >=, gte
    Gte,
    /// left operand absent: "is nil"
    IsNil,
    /// left operand present: "is not nil"
    IsNotNil,
}

impl Operator {
    /// parse operator from string (supports symbol and word forms)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "==" | "eq" => Some(Operator::Eq),
            "!=" | "ne" => Some(Operator::Ne),
            "<" | "lt" => Some(Operator::Lt),
            "<=" | "lte" => Some(Operator::Lte),
            ">" | "gt" => Some(Operator::Gt),
            ">=" | "gte" => Some(Operator::Gte),
            "is nil" => Some(Operator::IsNil),
            "is not nil" => Some(Operator::IsNotNil),
            _ => None,
        }
    }

    /// true for <, <=, >, >=
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }

    /// true for the operators that only test for presence
    pub fn is_presence_test(self) -> bool {
        matches!(self, Operator::IsNil | Operator::IsNotNil)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::IsNil => "is nil",
            Operator::IsNotNil => "is not nil",
        };
        f.write_str(s)
    }
}

/// a clinical code as it appears in `codes` arrays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    #[serde(default)]
    pub system: String,
    pub code: String,
    #[serde(default)]
    pub display: String,
}

impl Code {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: String::new(),
        }
    }
}

/// where a record-backed condition gets its codes from
#[derive(Debug, Clone, PartialEq)]
pub enum CodeSource {
    /// explicit list, checked in order
    Codes(Vec<Code>),
    /// an attribute holding a record entry stored by an earlier state
    Attribute(String),
}

impl fmt::Display for CodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeSource::Codes(codes) => {
                write!(f, "[")?;
                for (i, c) in codes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c.code)?;
                }
                write!(f, "]")
            }
            CodeSource::Attribute(name) => write!(f, "@{}", name),
        }
    }
}

/// a record entry referenced from a subject attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// the entry's primary code (its "type")
    pub code: String,
    /// recorded value, for observations
    #[serde(default)]
    pub value: Option<f64>,
}

/// value of a subject attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Entry(RecordEntry),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&RecordEntry> {
        match self {
            AttrValue::Entry(e) => Some(e),
            _ => None,
        }
    }

    /// short name of the variant, for log messages
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Number(_) => "number",
            AttrValue::Text(_) => "text",
            AttrValue::Entry(_) => "record entry",
        }
    }
}

/// the expected value in an Attribute condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "\"{}\"", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// an immutable condition tree
///
/// built once by [`parse_condition`](super::parse_condition) and evaluated
/// many times; nothing in the tree changes after construction, so a single
/// instance can be shared across threads evaluating different subjects.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Gender(String),
    SocioeconomicStatus(String),
    Race(String),
    Age {
        op: Operator,
        quantity: i64,
        unit: AgeUnit,
    },
    Date {
        op: Operator,
        year: i64,
    },
    Symptom {
        symptom: String,
        op: Operator,
        value: f64,
    },
    Observation {
        source: CodeSource,
        op: Operator,
        value: Option<f64>,
    },
    VitalSign {
        vital_sign: VitalSign,
        op: Operator,
        value: f64,
    },
    ActiveCondition(CodeSource),
    ActiveMedication(CodeSource),
    ActiveCarePlan(CodeSource),
    Attribute {
        attribute: String,
        op: Operator,
        value: Option<Literal>,
    },
    PriorState {
        name: String,
        since: Option<String>,
        within: Option<Window>,
    },
    True,
    False,

    /// every child must be true; all children are evaluated
    And(Vec<Condition>),
    /// any child true; stops at the first true child
    Or(Vec<Condition>),
    Not(Box<Condition>),
    /// at least `minimum` children true; all children are evaluated
    AtLeast {
        minimum: usize,
        conditions: Vec<Condition>,
    },
    /// at most `maximum` children true; all children are evaluated
    AtMost {
        maximum: usize,
        conditions: Vec<Condition>,
    },
}

impl Condition {
    #[allow(clippy::should_implement_trait)]
    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// number of nodes in the tree, including this one
    pub fn node_count(&self) -> usize {
        1 + match self {
            Condition::And(children)
            | Condition::Or(children)
            | Condition::AtLeast {
                conditions: children,
                ..
            }
            | Condition::AtMost {
                conditions: children,
                ..
            } => children.iter().map(Condition::node_count).sum(),
            Condition::Not(inner) => inner.node_count(),
            _ => 0,
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Condition]) -> fmt::Result {
    for (i, c) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

fn write_compare(f: &mut fmt::Formatter<'_>, op: Operator, value: Option<String>) -> fmt::Result {
    match value {
        Some(v) => write!(f, " {} {}", op, v),
        None => write!(f, " {}", op),
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Gender(g) => write!(f, "gender == \"{}\"", g),
            Condition::SocioeconomicStatus(c) => write!(f, "ses == \"{}\"", c),
            Condition::Race(r) => write!(f, "race == \"{}\"", r),
            Condition::Age { op, quantity, unit } => {
                write!(f, "age {} {} {}", op, quantity, unit)
            }
            Condition::Date { op, year } => write!(f, "year {} {}", op, year),
            Condition::Symptom { symptom, op, value } => {
                write!(f, "symptom({}) {} {}", symptom, op, value)
            }
            Condition::Observation { source, op, value } => {
                write!(f, "observation{}", source)?;
                write_compare(f, *op, value.map(|v| v.to_string()))
            }
            Condition::VitalSign {
                vital_sign,
                op,
                value,
            } => write!(f, "vital({}) {} {}", vital_sign, op, value),
            Condition::ActiveCondition(src) => write!(f, "active_condition{}", src),
            Condition::ActiveMedication(src) => write!(f, "active_medication{}", src),
            Condition::ActiveCarePlan(src) => write!(f, "active_careplan{}", src),
            Condition::Attribute {
                attribute,
                op,
                value,
            } => {
                write!(f, "attribute({})", attribute)?;
                write_compare(f, *op, value.as_ref().map(|v| v.to_string()))
            }
            Condition::PriorState {
                name,
                since,
                within,
            } => {
                write!(f, "prior_state({}", name)?;
                if let Some(since) = since {
                    write!(f, ", since {}", since)?;
                }
                if let Some(within) = within {
                    write!(f, ", within {}", within)?;
                }
                write!(f, ")")
            }
            Condition::True => write!(f, "true"),
            Condition::False => write!(f, "false"),
            Condition::And(children) => {
                write!(f, "and(")?;
                write_children(f, children)?;
                write!(f, ")")
            }
            Condition::Or(children) => {
                write!(f, "or(")?;
                write_children(f, children)?;
                write!(f, ")")
            }
            Condition::Not(inner) => write!(f, "not({})", inner),
            Condition::AtLeast {
                minimum,
                conditions,
            } => {
                write!(f, "at_least({}; ", minimum)?;
                write_children(f, conditions)?;
                write!(f, ")")
            }
            Condition::AtMost {
                maximum,
                conditions,
            } => {
                write!(f, "at_most({}; ", maximum)?;
                write_children(f, conditions)?;
                write!(f, ")")
            }
        }
    }
}
