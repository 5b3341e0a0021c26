//! condition builder - converts JSON definitions to condition trees
//!
//! every definition is an object with a `condition_type`:
//! - leaf kinds carry their own fields (`gender`, `operator`, `codes`, ...)
//! - `And`, `Or`, `At Least`, `At Most` carry a `conditions` array
//! - `Not` carries a single `condition`
//!
//! type names are matched case-insensitively, ignoring spaces and
//! underscores. unknown extra fields (e.g. `remarks`) are ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::error::ConfigError;
use super::time::{AgeUnit, TimeUnit, Window};
use super::types::{Code, CodeSource, Condition, Literal, Operator};
use super::vital::VitalSign;

/// named conditions, ordered by name
pub type ConditionLibrary = BTreeMap<String, Condition>;

const ROOT: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Gender,
    SocioeconomicStatus,
    Race,
    Age,
    Date,
    Symptom,
    Observation,
    VitalSign,
    ActiveCondition,
    ActiveMedication,
    ActiveCarePlan,
    Attribute,
    PriorState,
    And,
    Or,
    Not,
    AtLeast,
    AtMost,
    True,
    False,
}

impl Kind {
    /// accepts display names ("At Least") and constant names ("AT_LEAST")
    fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match key.as_str() {
            "gender" => Kind::Gender,
            "socioeconomicstatus" => Kind::SocioeconomicStatus,
            "race" => Kind::Race,
            "age" => Kind::Age,
            "date" => Kind::Date,
            "symptom" => Kind::Symptom,
            "observation" => Kind::Observation,
            "vitalsign" => Kind::VitalSign,
            "activecondition" => Kind::ActiveCondition,
            "activemedication" => Kind::ActiveMedication,
            "activecareplan" => Kind::ActiveCarePlan,
            "attribute" => Kind::Attribute,
            "priorstate" => Kind::PriorState,
            "and" => Kind::And,
            "or" => Kind::Or,
            "not" => Kind::Not,
            "atleast" => Kind::AtLeast,
            "atmost" => Kind::AtMost,
            "true" => Kind::True,
            "false" => Kind::False,
            _ => return None,
        };
        Some(kind)
    }
}

/// build a condition tree from a JSON definition
///
/// # Returns
/// * `Ok(Condition)` - the immutable tree, ready to be evaluated
/// * `Err(ConfigError)` - the first structural problem found, with its path
pub fn parse_condition(json: &JsonValue) -> Result<Condition, ConfigError> {
    let condition = parse_node(json, ROOT)?;
    debug!(nodes = condition.node_count(), "built condition tree");
    Ok(condition)
}

/// build every named definition of a JSON object
pub fn parse_definitions(json: &JsonValue) -> Result<ConditionLibrary, ConfigError> {
    let obj = json.as_object().ok_or_else(|| ConfigError::NotAnObject {
        path: ROOT.to_string(),
        found: describe(json),
    })?;

    let mut library = ConditionLibrary::new();
    for (name, value) in obj {
        let condition = parse_node(value, &format!("{}.{}", ROOT, name))?;
        library.insert(name.clone(), condition);
    }

    debug!(definitions = library.len(), "built condition library");
    Ok(library)
}

fn parse_node(json: &JsonValue, path: &str) -> Result<Condition, ConfigError> {
    let obj = json.as_object().ok_or_else(|| ConfigError::NotAnObject {
        path: path.to_string(),
        found: describe(json),
    })?;
    let fields = Fields { obj, path };

    let type_name = match obj.get("condition_type") {
        Some(JsonValue::String(s)) => s.as_str(),
        Some(_) => return Err(fields.invalid("condition_type", "a string")),
        None => {
            return Err(ConfigError::MissingType {
                path: path.to_string(),
            })
        }
    };

    let kind = Kind::parse(type_name).ok_or_else(|| ConfigError::UnknownType {
        path: path.to_string(),
        name: type_name.to_string(),
    })?;

    let condition = match kind {
        Kind::Gender => Condition::Gender(fields.string("gender")?),
        Kind::SocioeconomicStatus => Condition::SocioeconomicStatus(fields.string("category")?),
        Kind::Race => Condition::Race(fields.string("race")?),
        Kind::Age => {
            let op = fields.numeric_operator()?;
            let quantity = fields.integer("quantity")?;
            let unit_name = fields.str("unit")?;
            let unit = AgeUnit::parse(unit_name).ok_or_else(|| ConfigError::UnsupportedUnit {
                path: path.to_string(),
                unit: unit_name.to_string(),
                context: "Age logic",
            })?;
            Condition::Age { op, quantity, unit }
        }
        Kind::Date => Condition::Date {
            op: fields.numeric_operator()?,
            year: fields.integer("year")?,
        },
        Kind::Symptom => Condition::Symptom {
            symptom: fields.string("symptom")?,
            op: fields.numeric_operator()?,
            value: fields.number("value")?,
        },
        Kind::Observation => {
            let op = fields.operator()?;
            let value = fields.opt_number("value")?;
            if value.is_none() && op.is_ordering() {
                return Err(fields.inapplicable(op, "an omitted value"));
            }
            Condition::Observation {
                source: fields.code_source()?,
                op,
                value,
            }
        }
        Kind::VitalSign => {
            let name = fields.str("vital_sign")?;
            let vital_sign = name
                .parse::<VitalSign>()
                .map_err(|_| ConfigError::UnknownVitalSign {
                    path: path.to_string(),
                    name: name.to_string(),
                })?;
            Condition::VitalSign {
                vital_sign,
                op: fields.numeric_operator()?,
                value: fields.number("value")?,
            }
        }
        Kind::ActiveCondition => Condition::ActiveCondition(fields.code_source()?),
        Kind::ActiveMedication => Condition::ActiveMedication(fields.code_source()?),
        Kind::ActiveCarePlan => Condition::ActiveCarePlan(fields.code_source()?),
        Kind::Attribute => {
            let op = fields.operator()?;
            let value = fields.literal("value")?;
            match &value {
                Some(Literal::Text(_)) if op.is_ordering() => {
                    return Err(fields.inapplicable(op, "a string value"));
                }
                Some(Literal::Bool(_)) if op.is_ordering() => {
                    return Err(fields.inapplicable(op, "a boolean value"));
                }
                None if op.is_ordering() => {
                    return Err(fields.inapplicable(op, "an omitted value"));
                }
                _ => {}
            }
            Condition::Attribute {
                attribute: fields.string("attribute")?,
                op,
                value,
            }
        }
        Kind::PriorState => Condition::PriorState {
            name: fields.string("name")?,
            since: fields.opt_str("since")?.map(str::to_string),
            within: fields.window("within")?,
        },
        Kind::True => Condition::True,
        Kind::False => Condition::False,
        Kind::And => Condition::And(fields.children()?),
        Kind::Or => Condition::Or(fields.children()?),
        Kind::Not => {
            let inner = fields.required("condition")?;
            Condition::negate(parse_node(inner, &format!("{}.condition", path))?)
        }
        Kind::AtLeast => Condition::AtLeast {
            minimum: fields.count("minimum")?,
            conditions: fields.children()?,
        },
        Kind::AtMost => Condition::AtMost {
            maximum: fields.count("maximum")?,
            conditions: fields.children()?,
        },
    };

    Ok(condition)
}

/// typed access to the fields of one definition object
struct Fields<'a> {
    obj: &'a Map<String, JsonValue>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    fn missing(&self, field: &'static str) -> ConfigError {
        ConfigError::MissingField {
            path: self.path.to_string(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidField {
            path: self.path.to_string(),
            field,
            expected,
        }
    }

    fn inapplicable(&self, op: Operator, operand: &'static str) -> ConfigError {
        ConfigError::InapplicableOperator {
            path: self.path.to_string(),
            operator: op.to_string(),
            operand,
        }
    }

    /// a present, non-null field
    fn get(&self, field: &str) -> Option<&'a JsonValue> {
        self.obj.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &'static str) -> Result<&'a JsonValue, ConfigError> {
        self.get(field).ok_or_else(|| self.missing(field))
    }

    fn str(&self, field: &'static str) -> Result<&'a str, ConfigError> {
        self.required(field)?
            .as_str()
            .ok_or_else(|| self.invalid(field, "a string"))
    }

    fn string(&self, field: &'static str) -> Result<String, ConfigError> {
        self.str(field).map(str::to_string)
    }

    fn opt_str(&self, field: &'static str) -> Result<Option<&'a str>, ConfigError> {
        match self.get(field) {
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "a string")),
            None => Ok(None),
        }
    }

    fn number(&self, field: &'static str) -> Result<f64, ConfigError> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| self.invalid(field, "a number"))
    }

    fn opt_number(&self, field: &'static str) -> Result<Option<f64>, ConfigError> {
        match self.get(field) {
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "a number")),
            None => Ok(None),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64, ConfigError> {
        self.required(field)?
            .as_i64()
            .ok_or_else(|| self.invalid(field, "an integer"))
    }

    fn count(&self, field: &'static str) -> Result<usize, ConfigError> {
        self.required(field)?
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| self.invalid(field, "a non-negative integer"))
    }

    fn operator(&self) -> Result<Operator, ConfigError> {
        let s = self.str("operator")?;
        Operator::parse(s).ok_or_else(|| ConfigError::UnknownOperator {
            path: self.path.to_string(),
            operator: s.to_string(),
        })
    }

    /// operator for kinds whose left operand always exists
    fn numeric_operator(&self) -> Result<Operator, ConfigError> {
        let op = self.operator()?;
        if op.is_presence_test() {
            return Err(self.inapplicable(op, "a value that is always present"));
        }
        Ok(op)
    }

    fn literal(&self, field: &'static str) -> Result<Option<Literal>, ConfigError> {
        match self.get(field) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(Literal::Text(s.clone()))),
            Some(JsonValue::Bool(b)) => Ok(Some(Literal::Bool(*b))),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(|n| Some(Literal::Number(n)))
                .ok_or_else(|| self.invalid(field, "a string, number or boolean")),
            Some(_) => Err(self.invalid(field, "a string, number or boolean")),
        }
    }

    /// `codes` takes precedence over `referenced_by_attribute`
    fn code_source(&self) -> Result<CodeSource, ConfigError> {
        if let Some(codes) = self.get("codes") {
            let codes: Vec<Code> = serde_json::from_value(codes.clone())
                .map_err(|_| self.invalid("codes", "an array of code objects"))?;
            return Ok(CodeSource::Codes(codes));
        }

        if let Some(attribute) = self.opt_str("referenced_by_attribute")? {
            return Ok(CodeSource::Attribute(attribute.to_string()));
        }

        Err(ConfigError::MissingCodeSource {
            path: self.path.to_string(),
        })
    }

    fn window(&self, field: &'static str) -> Result<Option<Window>, ConfigError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let obj = value
            .as_object()
            .ok_or_else(|| self.invalid(field, "an object with 'quantity' and 'unit'"))?;
        let path = format!("{}.{}", self.path, field);
        let inner = Fields { obj, path: &path };

        let quantity = inner.integer("quantity")?;
        if quantity < 0 {
            return Err(inner.invalid("quantity", "a non-negative integer"));
        }
        let unit_name = inner.str("unit")?;
        let unit = TimeUnit::parse(unit_name).ok_or_else(|| ConfigError::UnsupportedUnit {
            path: path.clone(),
            unit: unit_name.to_string(),
            context: "PriorState window",
        })?;

        Ok(Some(Window { quantity, unit }))
    }

    fn children(&self) -> Result<Vec<Condition>, ConfigError> {
        let arr = self
            .required("conditions")?
            .as_array()
            .ok_or_else(|| self.invalid("conditions", "an array"))?;

        arr.iter()
            .enumerate()
            .map(|(i, v)| parse_node(v, &format!("{}.conditions[{}]", self.path, i)))
            .collect()
    }
}

fn describe(json: &JsonValue) -> String {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
    .to_string()
}
