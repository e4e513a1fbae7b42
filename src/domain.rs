use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TaxaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(u64);

impl TaxonId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = TaxaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Strictly decimal: u64::from_str would also accept a leading '+'.
        if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(TaxaError::MalformedId(value.to_string()));
        }
        value
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TaxaError::MalformedId(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonRecord {
    pub rank: String,
    pub sci_name: String,
    pub taxon_id: TaxonId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    records: Vec<TaxonRecord>,
}

impl Lineage {
    pub fn new(records: Vec<TaxonRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: TaxonRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TaxonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_rank(&self, rank: &str) -> Vec<&TaxonRecord> {
        self.records
            .iter()
            .filter(|record| record.rank == rank)
            .collect()
    }

    // Grouping view over the ordered records; ranks appear in first-occurrence
    // order and a recurring rank (e.g. "clade") keeps every member.
    pub fn grouped(&self) -> Vec<(&str, Vec<&TaxonRecord>)> {
        let mut groups: Vec<(&str, Vec<&TaxonRecord>)> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|(rank, _)| *rank == record.rank) {
                Some((_, members)) => members.push(record),
                None => groups.push((record.rank.as_str(), vec![record])),
            }
        }
        groups
    }
}

#[derive(Serialize)]
struct LineageNodeRef<'a> {
    sci_name: &'a str,
    taxon_id: TaxonId,
}

#[derive(Deserialize)]
struct LineageNode {
    sci_name: String,
    taxon_id: TaxonId,
}

impl Serialize for Lineage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups = self.grouped();
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (rank, members) in groups {
            let nodes: Vec<LineageNodeRef<'_>> = members
                .iter()
                .map(|record| LineageNodeRef {
                    sci_name: &record.sci_name,
                    taxon_id: record.taxon_id,
                })
                .collect();
            map.serialize_entry(rank, &nodes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Lineage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LineageVisitor;

        impl<'de> Visitor<'de> for LineageVisitor {
            type Value = Lineage;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map from rank to a list of lineage nodes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut lineage = Lineage::default();
                while let Some((rank, nodes)) = access.next_entry::<String, Vec<LineageNode>>()? {
                    for node in nodes {
                        lineage.push(TaxonRecord {
                            rank: rank.clone(),
                            sci_name: node.sci_name,
                            taxon_id: node.taxon_id,
                        });
                    }
                }
                Ok(lineage)
            }
        }

        deserializer.deserialize_map(LineageVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonInfo {
    pub rank: String,
    pub sci_name: String,
    pub taxon_id: TaxonId,
    pub lineage: Lineage,
}
