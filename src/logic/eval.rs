//! condition evaluator
//!
//! evaluates condition trees against a read-only view of one subject at one
//! point in time. evaluation is pure: the same tree, context and timestamp
//! always give the same answer, and neither the tree nor the subject is
//! modified.

use tracing::{trace, warn};

use super::compare::{compare, compare_bool, compare_text};
use super::time::{year_of, AgeUnit, Timestamp};
use super::types::{AttrValue, CodeSource, Condition, Literal, Operator};
use super::vital::VitalSign;

/// attribute keys backing the identity lookups
pub const GENDER: &str = "gender";
pub const RACE: &str = "race";
pub const SOCIOECONOMIC_CATEGORY: &str = "socioeconomic_category";

/// read-only facts about one subject
///
/// implemented by the subject/record store; the engine never mutates it.
/// a context belongs to the worker evaluating that subject and is not shared.
pub trait EvalContext {
    fn age_in_years(&self, time: Timestamp) -> i64;

    fn age_in_months(&self, time: Timestamp) -> i64;

    /// named attribute, `None` when unset
    fn attribute(&self, name: &str) -> Option<&AttrValue>;

    /// current severity of a symptom, 0 when never experienced
    fn symptom_severity(&self, name: &str) -> f64;

    fn vital_sign(&self, vital_sign: VitalSign) -> Option<f64>;

    /// most recent observation recorded with this code
    ///
    /// `None` when nothing was recorded; `Some(None)` when the latest
    /// observation carries no value
    fn latest_observation(&self, code: &str) -> Option<Option<f64>>;

    fn is_condition_active(&self, code: &str) -> bool;

    fn is_medication_active(&self, code: &str) -> bool;

    fn is_care_plan_active(&self, code: &str) -> bool;

    /// was the subject ever in state `name`
    ///
    /// `since` stops the search at the most recent occurrence of that state;
    /// `since_time` ignores states exited before that time
    fn was_ever_in_state(
        &self,
        name: &str,
        since: Option<&str>,
        since_time: Option<Timestamp>,
    ) -> bool;

    fn gender(&self) -> Option<&str> {
        self.attribute(GENDER).and_then(AttrValue::as_str)
    }

    fn race(&self) -> Option<&str> {
        self.attribute(RACE).and_then(AttrValue::as_str)
    }

    fn socioeconomic_category(&self) -> Option<&str> {
        self.attribute(SOCIOECONOMIC_CATEGORY).and_then(AttrValue::as_str)
    }
}

impl Condition {
    /// evaluate this tree for one subject at `time`
    pub fn test(&self, ctx: &dyn EvalContext, time: Timestamp) -> bool {
        evaluate(self, ctx, time)
    }
}

/// evaluate a condition against the given context
pub fn evaluate(condition: &Condition, ctx: &dyn EvalContext, time: Timestamp) -> bool {
    match condition {
        // identity
        Condition::Gender(gender) => ctx.gender() == Some(gender.as_str()),
        Condition::SocioeconomicStatus(category) => {
            ctx.socioeconomic_category() == Some(category.as_str())
        }
        Condition::Race(race) => ctx.race() == Some(race.as_str()),

        // time relative
        Condition::Age { op, quantity, unit } => {
            let age = match unit {
                AgeUnit::Years => ctx.age_in_years(time),
                AgeUnit::Months => ctx.age_in_months(time),
            };
            compare(Some(age as f64), Some(*quantity as f64), *op)
        }
        Condition::Date { op, year } => compare(
            year_of(time).map(|y| y as f64),
            Some(*year as f64),
            *op,
        ),
        Condition::PriorState {
            name,
            since,
            within,
        } => ctx.was_ever_in_state(name, since.as_deref(), within.map(|w| w.start(time))),

        // measurements
        Condition::Symptom { symptom, op, value } => {
            compare(Some(ctx.symptom_severity(symptom)), Some(*value), *op)
        }
        Condition::VitalSign {
            vital_sign,
            op,
            value,
        } => compare(ctx.vital_sign(*vital_sign), Some(*value), *op),
        Condition::Observation { source, op, value } => {
            match resolve_observation(source, ctx) {
                Some(observed) => compare(observed, *value, *op),
                None => false,
            }
        }
        Condition::Attribute {
            attribute,
            op,
            value,
        } => evaluate_attribute(ctx.attribute(attribute), value.as_ref(), *op),

        // clinical record
        Condition::ActiveCondition(source) => {
            is_active(source, ctx, |code| ctx.is_condition_active(code))
        }
        Condition::ActiveMedication(source) => {
            is_active(source, ctx, |code| ctx.is_medication_active(code))
        }
        Condition::ActiveCarePlan(source) => {
            is_active(source, ctx, |code| ctx.is_care_plan_active(code))
        }

        Condition::True => true,
        Condition::False => false,

        // composites
        Condition::And(conditions) => {
            // every child runs even after the result is decided
            conditions
                .iter()
                .fold(true, |all, c| evaluate(c, ctx, time) && all)
        }
        Condition::Or(conditions) => conditions.iter().any(|c| evaluate(c, ctx, time)),
        Condition::Not(inner) => !evaluate(inner, ctx, time),
        Condition::AtLeast {
            minimum,
            conditions,
        } => count_true(conditions, ctx, time) >= *minimum,
        Condition::AtMost {
            maximum,
            conditions,
        } => count_true(conditions, ctx, time) <= *maximum,
    }
}

fn count_true(conditions: &[Condition], ctx: &dyn EvalContext, time: Timestamp) -> usize {
    let count = conditions
        .iter()
        .filter(|c| evaluate(c, ctx, time))
        .count();
    trace!(count, of = conditions.len(), "counted true children");
    count
}

/// the observed value to compare
///
/// `None` means the referencing attribute is unset (the condition is false);
/// `Some(None)` means no observation or one without a value, which goes
/// through the comparator's absent-operand rules. with several codes the
/// first code that has any observation decides, even if it has no value.
fn resolve_observation(source: &CodeSource, ctx: &dyn EvalContext) -> Option<Option<f64>> {
    match source {
        CodeSource::Codes(codes) => Some(
            codes
                .iter()
                .find_map(|c| ctx.latest_observation(&c.code))
                .flatten(),
        ),
        CodeSource::Attribute(name) => match ctx.attribute(name)? {
            AttrValue::Entry(entry) => Some(entry.value),
            other => {
                warn!(
                    attribute = %name,
                    kind = other.kind(),
                    "attribute referenced by observation is not a record entry"
                );
                None
            }
        },
    }
}

fn evaluate_attribute(
    actual: Option<&AttrValue>,
    expected: Option<&Literal>,
    op: Operator,
) -> bool {
    // presence tests look at whether the attribute is set, whatever its type
    if op.is_presence_test() {
        return compare(actual.map(|_| 0.0), None, op);
    }

    match expected {
        Some(Literal::Text(s)) => {
            compare_text(actual.and_then(AttrValue::as_str), Some(s.as_str()), op)
        }
        Some(Literal::Bool(b)) => compare_bool(actual.and_then(AttrValue::as_bool), Some(*b), op),
        Some(Literal::Number(n)) => compare(actual.and_then(AttrValue::as_f64), Some(*n), op),
        None => compare(actual.map(|_| 0.0), None, op),
    }
}

fn is_active(source: &CodeSource, ctx: &dyn EvalContext, active: impl Fn(&str) -> bool) -> bool {
    match source {
        CodeSource::Codes(codes) => codes.iter().any(|c| active(&c.code)),
        CodeSource::Attribute(name) => match ctx.attribute(name) {
            Some(AttrValue::Entry(entry)) => active(&entry.code),
            Some(other) => {
                warn!(
                    attribute = %name,
                    kind = other.kind(),
                    "attribute referenced by active check is not a record entry"
                );
                false
            }
            None => {
                trace!(attribute = %name, "referenced attribute unset");
                false
            }
        },
    }
}
