// SPDX-License-Identifier: Apache-2.0

/// Number of positional fields in the fixed delimited schema
/// (timestamp, level, logger, message, exception).
pub(crate) const FIXED_FIELDS: usize = 5;

/// Result of aligning a record's trailing fields to the declared schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFields {
    /// Declared names in schema order; unmapped names carry empty values
    pub values: Vec<(String, String)>,
    /// Whether the trailing field count differs from the declared schema
    pub mismatch: bool,
}

/// CustomFieldMapper aligns delimited fields beyond the fixed schema to the
/// caller-declared extra columns.
///
/// Built once from the declared schema descriptor; mapping is purely
/// positional, an explicit ordered list in place of any runtime
/// introspection.
#[derive(Debug, Clone)]
pub struct CustomFieldMapper {
    declared: Vec<String>,
}

impl CustomFieldMapper {
    /// Create a mapper for the declared extra column names
    pub fn new(declared: Vec<String>) -> Self {
        Self { declared }
    }

    /// The declared schema, in order
    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Map the record's full field list against the declared schema.
    ///
    /// Fields at positions `FIXED_FIELDS..` map positionally onto the
    /// declared names, as many as both sides allow; declared names without a
    /// field are kept with an empty value. `mismatch` reports whether the
    /// trailing count and the schema length disagree in either direction,
    /// records shorter than the fixed schema included.
    pub fn map(&self, fields: &[&str]) -> MappedFields {
        let extras: &[&str] = if fields.len() > FIXED_FIELDS {
            &fields[FIXED_FIELDS..]
        } else {
            &[]
        };

        let values = self
            .declared
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = extras.get(i).map(|v| v.to_string()).unwrap_or_default();
                (name.clone(), value)
            })
            .collect();

        let mismatch = fields.len() as i64 - FIXED_FIELDS as i64 != self.declared.len() as i64;

        MappedFields { values, mismatch }
    }
}
