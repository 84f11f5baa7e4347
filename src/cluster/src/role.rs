//! Master/worker role derivation.
//!
//! A node never stores its role. It is recomputed from the machine name and the
//! cluster's master set wherever a decision needs it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Machine names designated as clustering masters (managers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasterSet(BTreeSet<String>);

impl MasterSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, machine_name: &str) -> bool {
        self.0.contains(machine_name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Role of a node in the clustering control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Worker,
}

impl Role {
    pub fn of(machine_name: &str, masters: &MasterSet) -> Self {
        if is_master(machine_name, masters) {
            Role::Master
        } else {
            Role::Worker
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

/// Returns true if `machine_name` is a clustering master.
pub fn is_master(machine_name: &str, masters: &MasterSet) -> bool {
    masters.contains(machine_name)
}
