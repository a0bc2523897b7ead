//! Key → (offset, action) tables and the line-oriented profile format that
//! fills them.
//!
//! ```text
//! vel:30          # velocity threshold
//! 60:0:0:1        # key 60 strikes the block at +z 1
//! 62:1:0:0:2      # key 62 interacts with the east face at +x 1
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use crate::action::{Action, PositionOffset};
use crate::decoder::Key;
use crate::error::{ParseReason, ProfileError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub offset: PositionOffset,
    pub action: Action,
}

/// Associative store that remembers the order keys were first written in.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<Key, MappingEntry>,
    order: Vec<Key>,
}

impl MappingTable {
    /// Inserts unless the key is already present. Returns whether it was kept.
    pub fn insert(&mut self, key: Key, entry: MappingEntry) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        self.order.push(key);
        true
    }

    pub fn lookup(&self, key: Key) -> Option<&MappingEntry> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &MappingEntry)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (*key, entry)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Primary,
    Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub applied: usize,
    pub duplicates: Vec<Key>,
    pub threshold: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLine {
    Threshold(u8),
    Mapping { key: Key, entry: MappingEntry },
}

pub fn parse_line(line: &str) -> Result<ProfileLine, ParseReason> {
    let mut fields = line.split(':');
    let head = fields.next().unwrap_or_default();

    if head == "vel" {
        let value = next_field(&mut fields, "vel")?;
        return Ok(ProfileLine::Threshold(parse_int(value, "vel")?));
    }

    let key = Key(parse_int(head, "key")?);
    let dx = parse_int(next_field(&mut fields, "dx")?, "dx")?;
    let dy = parse_int(next_field(&mut fields, "dy")?, "dy")?;
    let dz = parse_int(next_field(&mut fields, "dz")?, "dz")?;
    let action = match fields.next() {
        Some(raw) => {
            let code = parse_int(raw, "action")?;
            Action::from_code(code).ok_or(ParseReason::ActionOutOfRange(code))?
        }
        None => Action::Strike,
    };

    Ok(ProfileLine::Mapping {
        key,
        entry: MappingEntry {
            offset: PositionOffset::new(dx, dy, dz),
            action,
        },
    })
}

/// Primary table plus the secret overlay. Keys are unique across both.
#[derive(Debug, Clone, Default)]
pub struct Mappings {
    pub primary: MappingTable,
    pub secret: MappingTable,
}

impl Mappings {
    pub fn table(&self, kind: TableKind) -> &MappingTable {
        match kind {
            TableKind::Primary => &self.primary,
            TableKind::Secret => &self.secret,
        }
    }

    pub fn table_mut(&mut self, kind: TableKind) -> &mut MappingTable {
        match kind {
            TableKind::Primary => &mut self.primary,
            TableKind::Secret => &mut self.secret,
        }
    }

    pub fn contains(&self, key: Key) -> bool {
        self.primary.contains(key) || self.secret.contains(key)
    }

    /// Applies profile lines in order to `target`.
    ///
    /// A record whose key already exists in either table is skipped and
    /// reported. The first malformed line aborts the load; lines before it
    /// stay applied.
    pub fn load<'a, I>(
        &mut self,
        lines: I,
        target: TableKind,
        mode: LoadMode,
        threshold: &mut u8,
    ) -> Result<LoadReport, ProfileError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if mode == LoadMode::Replace {
            self.table_mut(target).clear();
        }

        let mut report = LoadReport::default();
        for (idx, raw) in lines.into_iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let parsed = parse_line(line).map_err(|reason| ProfileError::Parse {
                line: idx + 1,
                content: line.to_string(),
                reason,
            })?;

            match parsed {
                ProfileLine::Threshold(value) => {
                    *threshold = value;
                    report.threshold = Some(value);
                }
                ProfileLine::Mapping { key, entry } => {
                    if self.contains(key) {
                        report.duplicates.push(key);
                        continue;
                    }
                    self.table_mut(target).insert(key, entry);
                    report.applied += 1;
                }
            }
        }
        Ok(report)
    }
}

// ───────────────────────────── helpers ─────────────────────────────────── //

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<&'a str, ParseReason> {
    fields.next().ok_or(ParseReason::MissingField(name))
}

fn parse_int<T: FromStr>(value: &str, field: &'static str) -> Result<T, ParseReason> {
    value.parse().map_err(|_| ParseReason::BadInteger {
        field,
        value: value.to_string(),
    })
}
