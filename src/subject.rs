//! in-memory subject snapshot
//!
//! a serde-loadable view of one subject that implements [`EvalContext`].
//! timestamps in files may be epoch millis, RFC 3339 or "YYYY-MM-DD".

use std::collections::{BTreeSet, HashMap};

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::logic::{
    elapsed_units, parse_timestamp, AttrValue, EvalContext, RecordEntry, TimeUnit, Timestamp,
    VitalSign, GENDER, RACE, SOCIOECONOMIC_CATEGORY,
};

/// one recorded observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub code: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub time: Timestamp,
    #[serde(default)]
    pub value: Option<f64>,
}

/// one visit to a module state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVisit {
    pub name: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub entered: Timestamp,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub exited: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_timestamp")]
    pub birthdate: Timestamp,
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,
    #[serde(default)]
    pub symptoms: HashMap<String, f64>,
    #[serde(default)]
    pub vital_signs: HashMap<VitalSign, f64>,
    #[serde(default)]
    pub observations: Vec<ObservationRecord>,
    /// codes of currently active conditions
    #[serde(default)]
    pub conditions: BTreeSet<String>,
    #[serde(default)]
    pub medications: BTreeSet<String>,
    #[serde(default)]
    pub care_plans: BTreeSet<String>,
    /// state visits, oldest first
    #[serde(default)]
    pub history: Vec<StateVisit>,
}

impl Subject {
    pub fn new(birthdate: Timestamp) -> Self {
        Self {
            birthdate,
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: AttrValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_gender(self, gender: &str) -> Self {
        self.with_attribute(GENDER, AttrValue::Text(gender.to_string()))
    }

    pub fn with_race(self, race: &str) -> Self {
        self.with_attribute(RACE, AttrValue::Text(race.to_string()))
    }

    pub fn with_socioeconomic_category(self, category: &str) -> Self {
        self.with_attribute(SOCIOECONOMIC_CATEGORY, AttrValue::Text(category.to_string()))
    }

    /// store a record entry under an attribute, as a state would
    pub fn with_entry(self, name: &str, code: &str, value: Option<f64>) -> Self {
        self.with_attribute(
            name,
            AttrValue::Entry(RecordEntry {
                code: code.to_string(),
                value,
            }),
        )
    }

    pub fn with_symptom(mut self, name: &str, severity: f64) -> Self {
        self.symptoms.insert(name.to_string(), severity);
        self
    }

    pub fn with_vital_sign(mut self, vital_sign: VitalSign, value: f64) -> Self {
        self.vital_signs.insert(vital_sign, value);
        self
    }

    pub fn with_observation(mut self, code: &str, time: Timestamp, value: Option<f64>) -> Self {
        self.observations.push(ObservationRecord {
            code: code.to_string(),
            time,
            value,
        });
        self
    }

    pub fn with_condition(mut self, code: &str) -> Self {
        self.conditions.insert(code.to_string());
        self
    }

    pub fn with_medication(mut self, code: &str) -> Self {
        self.medications.insert(code.to_string());
        self
    }

    pub fn with_care_plan(mut self, code: &str) -> Self {
        self.care_plans.insert(code.to_string());
        self
    }

    /// append a state visit; visits must be added in chronological order
    pub fn with_state(mut self, name: &str, entered: Timestamp, exited: Option<Timestamp>) -> Self {
        self.history.push(StateVisit {
            name: name.to_string(),
            entered,
            exited,
        });
        self
    }
}

impl EvalContext for Subject {
    fn age_in_years(&self, time: Timestamp) -> i64 {
        elapsed_units(self.birthdate, time, TimeUnit::Years)
    }

    fn age_in_months(&self, time: Timestamp) -> i64 {
        elapsed_units(self.birthdate, time, TimeUnit::Months)
    }

    fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    fn symptom_severity(&self, name: &str) -> f64 {
        self.symptoms.get(name).copied().unwrap_or(0.0)
    }

    fn vital_sign(&self, vital_sign: VitalSign) -> Option<f64> {
        self.vital_signs.get(&vital_sign).copied()
    }

    fn latest_observation(&self, code: &str) -> Option<Option<f64>> {
        self.observations
            .iter()
            .filter(|o| o.code == code)
            .max_by_key(|o| o.time)
            .map(|o| o.value)
    }

    fn is_condition_active(&self, code: &str) -> bool {
        self.conditions.contains(code)
    }

    fn is_medication_active(&self, code: &str) -> bool {
        self.medications.contains(code)
    }

    fn is_care_plan_active(&self, code: &str) -> bool {
        self.care_plans.contains(code)
    }

    fn was_ever_in_state(
        &self,
        name: &str,
        since: Option<&str>,
        since_time: Option<Timestamp>,
    ) -> bool {
        // walk back from the most recent visit
        for visit in self.history.iter().rev() {
            if let (Some(limit), Some(exited)) = (since_time, visit.exited) {
                if exited <= limit {
                    return false;
                }
            }
            if visit.name == name {
                return true;
            }
            if since == Some(visit.name.as_str()) {
                return false;
            }
        }
        false
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Millis(i64),
    Text(String),
}

impl RawTime {
    fn resolve<E: de::Error>(self) -> Result<Timestamp, E> {
        match self {
            RawTime::Millis(millis) => Ok(millis),
            RawTime::Text(s) => {
                parse_timestamp(&s).ok_or_else(|| E::custom(format!("invalid timestamp: {}", s)))
            }
        }
    }
}

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    RawTime::deserialize(deserializer)?.resolve()
}

fn de_opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    Option::<RawTime>::deserialize(deserializer)?
        .map(RawTime::resolve)
        .transpose()
}
