use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::MergedRecord;
use crate::error::{BomError, BomWarning, MAX_GROUP_FIELDS};
use crate::refdes::RefDes;
use crate::{FIELD_DATASHEET, FIELD_FOOTPRINT, FIELD_VALUE};

/// Ordered, validated list of grouping fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GroupFields(Vec<String>);

impl GroupFields {
    /// Blank entries are dropped and duplicates keep their first position.
    /// `Value` and `Footprint` are mandatory and at most
    /// [`MAX_GROUP_FIELDS`] fields are allowed.
    pub fn new<I, S>(fields: I) -> Result<Self, BomError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.as_ref().trim();
            if !field.is_empty() && !out.iter().any(|f| f == field) {
                out.push(field.to_string());
            }
        }

        if out.len() > MAX_GROUP_FIELDS {
            return Err(BomError::TooManyGroupFields {
                max: MAX_GROUP_FIELDS,
                got: out.len(),
            });
        }
        for mandatory in [FIELD_VALUE, FIELD_FOOTPRINT] {
            if !out.iter().any(|f| f == mandatory) {
                return Err(BomError::MissingMandatoryGroupField(mandatory));
            }
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for GroupFields {
    type Error = BomError;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<GroupFields> for Vec<String> {
    fn from(fields: GroupFields) -> Self {
        fields.0
    }
}

impl std::fmt::Display for GroupFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// One BOM line: records sharing every grouping field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<String>,
    /// Members in reference order; never empty.
    pub members: Vec<MergedRecord>,
    /// Summed per-board quantity.
    pub quantity: u64,
}

impl Group {
    /// The first contributor, used for every non-key column.
    pub fn representative(&self) -> &MergedRecord {
        &self.members[0]
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.component.reference.as_str())
    }

    pub fn is_dnp(&self) -> bool {
        self.representative().component.dnp
    }

    /// Datasheet link of the group, preferring the schematic field over the
    /// supplier's. KiCad's "~" placeholder reads as no datasheet.
    pub fn datasheet(&self) -> Option<String> {
        let rep = self.representative();
        rep.component
            .field(FIELD_DATASHEET)
            .map(str::trim)
            .filter(|d| !d.is_empty() && *d != "~")
            .map(str::to_string)
            .or_else(|| rep.offer.datasheet.clone())
    }
}

/// Sort records by reference designator, the order grouping relies on.
///
/// Malformed references are ordered lexically and reported.
pub fn sort_by_reference(records: &mut Vec<MergedRecord>, warnings: &mut Vec<BomWarning>) {
    let mut keyed: Vec<(RefDes, MergedRecord)> = records
        .drain(..)
        .map(|record| {
            let (refdes, malformed) = RefDes::normalize(&record.component.reference);
            if let Some(err) = malformed {
                log::warn!("{err}");
                warnings.push(err.into());
            }
            (refdes, record)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    records.extend(keyed.into_iter().map(|(_, record)| record));
}

/// Buckets merged records into groups.
pub struct Grouper<'a> {
    fields: &'a GroupFields,
    quantity_field: Option<&'a str>,
}

impl<'a> Grouper<'a> {
    pub fn new(fields: &'a GroupFields) -> Self {
        Self {
            fields,
            quantity_field: None,
        }
    }

    /// Field holding an explicit per-instance repeat count.
    pub fn with_quantity_field(mut self, field: Option<&'a str>) -> Self {
        self.quantity_field = field;
        self
    }

    /// Group `records`, which must already be in reference order.
    ///
    /// Groups are emitted in first-seen order and members keep arrival order.
    pub fn group(&self, records: Vec<MergedRecord>, warnings: &mut Vec<BomWarning>) -> Vec<Group> {
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for record in records {
            let key: Vec<String> = self
                .fields
                .as_slice()
                .iter()
                .map(|field| record.component.group_value(field))
                .collect();
            let quantity = self.quantity_of(&record, warnings);

            match index.get(&key) {
                Some(&i) => {
                    let group = &mut groups[i];
                    group.quantity = group.quantity.saturating_add(quantity);
                    group.members.push(record);
                }
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        members: vec![record],
                        quantity,
                    });
                }
            }
        }

        log::debug!("Grouped into {} lines by {}", groups.len(), self.fields);
        groups
    }

    fn quantity_of(&self, record: &MergedRecord, warnings: &mut Vec<BomWarning>) -> u64 {
        let Some(raw) = self
            .quantity_field
            .and_then(|field| record.component.field(field))
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        else {
            return 1;
        };

        match raw.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => {
                let warning = BomWarning::InvalidQuantity {
                    reference: record.component.reference.clone(),
                    value: raw.to_string(),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                1
            }
        }
    }
}
