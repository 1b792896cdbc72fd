// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed set of record collections and the trait tying a type to one.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// Named logical partition of the encrypted record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Single settings record, fixed id.
    Settings,
    /// School classes, keyed by generated id.
    Classes,
    /// Students, keyed by generated id.
    Students,
    /// Graded contributions, keyed by generated id.
    Contributions,
    /// Seat plans, keyed by class id (one plan per class).
    SeatPlans,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Settings,
        Collection::Classes,
        Collection::Students,
        Collection::Contributions,
        Collection::SeatPlans,
    ];

    /// Table name in the database. Stable; part of the on-disk format.
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Settings => "settings",
            Collection::Classes => "classes",
            Collection::Students => "students",
            Collection::Contributions => "contributions",
            Collection::SeatPlans => "seat_plans",
        }
    }

    /// Associated data binding a ciphertext to `<collection>/<key>`.
    pub(crate) fn binding(self, key: &str) -> Vec<u8> {
        let name = self.name();
        let mut aad = Vec::with_capacity(name.len() + 1 + key.len());
        aad.extend_from_slice(name.as_bytes());
        aad.push(b'/');
        aad.extend_from_slice(key.as_bytes());
        aad
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A domain type persisted in exactly one collection.
///
/// The store reads nothing from a record except its storage key.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// Plaintext identifier the record is stored under.
    fn storage_key(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_names_are_unique() {
        let names: HashSet<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Collection::ALL.len());
    }

    #[test]
    fn binding_includes_collection_and_key() {
        assert_eq!(Collection::Students.binding("s1"), b"students/s1".to_vec());
        assert_ne!(
            Collection::Students.binding("c1"),
            Collection::Classes.binding("c1")
        );
    }
}
