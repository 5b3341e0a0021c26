//! recognised vital signs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VitalSign {
    Height,
    Weight,
    HeightPercentile,
    WeightPercentile,
    Bmi,
    SystolicBloodPressure,
    DiastolicBloodPressure,
    HeartRate,
    RespirationRate,
    OxygenSaturation,
    BloodGlucose,
    TotalCholesterol,
    Ldl,
    Hdl,
    Triglycerides,
    Egfr,
}

impl VitalSign {
    pub const ALL: [VitalSign; 16] = [
        VitalSign::Height,
        VitalSign::Weight,
        VitalSign::HeightPercentile,
        VitalSign::WeightPercentile,
        VitalSign::Bmi,
        VitalSign::SystolicBloodPressure,
        VitalSign::DiastolicBloodPressure,
        VitalSign::HeartRate,
        VitalSign::RespirationRate,
        VitalSign::OxygenSaturation,
        VitalSign::BloodGlucose,
        VitalSign::TotalCholesterol,
        VitalSign::Ldl,
        VitalSign::Hdl,
        VitalSign::Triglycerides,
        VitalSign::Egfr,
    ];

    /// display name used in module definitions
    pub fn name(self) -> &'static str {
        match self {
            VitalSign::Height => "Height",
            VitalSign::Weight => "Weight",
            VitalSign::HeightPercentile => "Height Percentile",
            VitalSign::WeightPercentile => "Weight Percentile",
            VitalSign::Bmi => "BMI",
            VitalSign::SystolicBloodPressure => "Systolic Blood Pressure",
            VitalSign::DiastolicBloodPressure => "Diastolic Blood Pressure",
            VitalSign::HeartRate => "Heart Rate",
            VitalSign::RespirationRate => "Respiration Rate",
            VitalSign::OxygenSaturation => "Oxygen Saturation",
            VitalSign::BloodGlucose => "Blood Glucose",
            VitalSign::TotalCholesterol => "Total Cholesterol",
            VitalSign::Ldl => "LDL",
            VitalSign::Hdl => "HDL",
            VitalSign::Triglycerides => "Triglycerides",
            VitalSign::Egfr => "EGFR",
        }
    }
}

impl FromStr for VitalSign {
    type Err = String;

    /// case-insensitive; spaces and underscores are interchangeable
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        VitalSign::ALL
            .into_iter()
            .find(|vs| normalize(vs.name()) == wanted)
            .ok_or_else(|| format!("unknown vital sign: {}", s))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl TryFrom<String> for VitalSign {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VitalSign> for String {
    fn from(vs: VitalSign) -> Self {
        vs.name().to_string()
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
