//! Composite formulation identifiers.
//!
//! SetCode / WeightCode / BatchCode / PartnerCode: two-letter family codes
//! FormulationCode: `"SS WW BB"` (set, weight, batch-variant)
//! LocationId: `"SS WW BB PP YYMMDD"` (formulation, partner, production date)

use std::fmt;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::code::{Code, DEFAULT_CODE_WIDTH};
use crate::error::{CodeError, InvalidCode, ValidationError};

macro_rules! letter_code {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Code);

        impl $name {
            pub fn new(code: Code) -> Self {
                Self(code)
            }

            /// Normalize a raw string at the default family width.
            pub fn parse(raw: &str) -> Result<Self, CodeError> {
                Code::normalize(raw, DEFAULT_CODE_WIDTH).map(Self)
            }

            pub fn code(&self) -> &Code {
                &self.0
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

letter_code! {
    /// Code of an ingredient set, globally scoped.
    SetCode
}
letter_code! {
    /// Code of a dry-weight variant, scoped to its parent set.
    WeightCode
}
letter_code! {
    /// Code of a batch variant, scoped to its (set, weight) pair.
    BatchCode
}
letter_code! {
    /// Code of a production partner/machine.
    PartnerCode
}

/// Space-joined composite code naming one formulation: set, weight split,
/// batch combination.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormulationCode {
    pub set: SetCode,
    pub weight: WeightCode,
    pub batch: BatchCode,
}

impl FormulationCode {
    pub fn new(set: SetCode, weight: WeightCode, batch: BatchCode) -> Self {
        Self { set, weight, batch }
    }

    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(InvalidCode {
                raw: raw.to_string(),
                reason: "expected three space-separated codes".to_string(),
            }
            .into());
        }
        Ok(Self {
            set: SetCode::parse(parts[0])?,
            weight: WeightCode::parse(parts[1])?,
            batch: BatchCode::parse(parts[2])?,
        })
    }
}

impl fmt::Display for FormulationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.set, self.weight, self.batch)
    }
}

impl TryFrom<String> for FormulationCode {
    type Error = CodeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        FormulationCode::parse(&s)
    }
}

impl From<FormulationCode> for String {
    fn from(code: FormulationCode) -> String {
        code.to_string()
    }
}

/// A production date accepted as ISO `YYYY-MM-DD`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionDate(Date);

impl ProductionDate {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(raw.trim(), &format)
            .map(Self)
            .map_err(|err| ValidationError::InvalidDate {
                raw: raw.to_string(),
                reason: err.to_string(),
            })
    }

    /// The six-digit `YYMMDD` token used inside location ids.
    pub fn yymmdd(&self) -> String {
        format!(
            "{:02}{:02}{:02}",
            self.0.year().rem_euclid(100),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl fmt::Debug for ProductionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductionDate({self})")
    }
}

impl fmt::Display for ProductionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

/// The full human-readable location id: formulation + partner + date token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId {
    pub formulation: FormulationCode,
    pub partner: PartnerCode,
    pub production_date: ProductionDate,
}

impl LocationId {
    pub fn new(
        formulation: FormulationCode,
        partner: PartnerCode,
        production_date: ProductionDate,
    ) -> Self {
        Self {
            formulation,
            partner,
            production_date,
        }
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.formulation,
            self.partner,
            self.production_date.yymmdd()
        )
    }
}
