//! transition logic for simulation modules
//!
//! provides the predicate engine that gates transitions between module states:
//! - identity facts: gender, race, socioeconomic status
//! - time-relative facts: age, calendar year, prior states
//! - clinical-record facts: symptoms, vital signs, observations, active
//!   conditions, medications and care plans, attributes
//! - composition: and, or, not, at least, at most
//!
//! definitions are built once with [`parse_condition`] into an immutable
//! [`Condition`] tree, then evaluated per subject with [`Condition::test`].

mod compare;
mod error;
mod eval;
mod parser;
mod time;
mod types;
mod vital;

pub use compare::{compare, compare_bool, compare_text};
pub use error::ConfigError;
pub use eval::{evaluate, EvalContext, GENDER, RACE, SOCIOECONOMIC_CATEGORY};
pub use parser::{parse_condition, parse_definitions, ConditionLibrary};
pub use time::{elapsed_units, parse_timestamp, year_of, AgeUnit, TimeUnit, Timestamp, Window};
pub use types::{AttrValue, Code, CodeSource, Condition, Literal, Operator, RecordEntry};
pub use vital::VitalSign;
