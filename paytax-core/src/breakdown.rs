use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::Jurisdiction;

/// Uniform, ordered view of a calculation result.
///
/// Each jurisdiction reports its own field set; no common superset is forced.
/// Serializes as a flat map: `country`, `year`, `is_resident`, then the fields
/// in the order the calculator added them. Amounts are JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakdown {
    pub jurisdiction: Jurisdiction,
    pub year: i32,
    pub is_resident: bool,
    fields: Vec<(&'static str, Decimal)>,
}

impl Breakdown {
    pub fn new(
        jurisdiction: Jurisdiction,
        year: i32,
        is_resident: bool,
    ) -> Self {
        Self {
            jurisdiction,
            year,
            is_resident,
            fields: Vec::new(),
        }
    }

    /// Appends a field, replacing any earlier value under the same name.
    pub fn with(
        mut self,
        name: &'static str,
        value: Decimal,
    ) -> Self {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Decimal> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Decimal)> + '_ {
        self.fields.iter().copied()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        map.serialize_entry("country", self.jurisdiction.display_name())?;
        map.serialize_entry("year", &self.year)?;
        map.serialize_entry("is_resident", &self.is_resident)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &Amount(*value))?;
        }
        map.end()
    }
}

struct Amount(Decimal);

impl Serialize for Amount {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}
