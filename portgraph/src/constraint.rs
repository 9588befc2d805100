// TestbedBinding: Reserving lab devices for abstract testbeds
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Constraints on node and port attributes.

use std::{collections::BTreeMap, fmt};

use regex::Regex;

/// Attribute values of a concrete node or port.
pub type Attrs = BTreeMap<String, String>;

/// Constraints of an abstract node or port, indexed by the attribute they constrain.
pub type Constraints = BTreeMap<String, Constraint>;

/// A constraint on a single attribute.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The attribute must be present and equal to the value.
    Equal(String),
    /// The attribute must be present, and the regular expression must match the entire value.
    Regex(Regex),
}

impl Constraint {
    /// Create an [`Constraint::Equal`] constraint.
    pub fn equal(value: impl Into<String>) -> Self {
        Self::Equal(value.into())
    }

    /// Create a [`Constraint::Regex`] constraint. The pattern is anchored on both sides.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(Regex::new(&format!("^(?:{pattern})$"))?))
    }

    /// Check if the attribute value (or its absence) satisfies the constraint.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Equal(x), Some(v)) => x == v,
            (Self::Regex(re), Some(v)) => re.is_match(v),
            (_, None) => false,
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Equal(a), Self::Equal(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal(x) => write!(f, "== {x:?}"),
            Self::Regex(re) => write!(f, "=~ /{}/", re.as_str()),
        }
    }
}

/// Check if all constraints are satisfied by the attributes.
pub(crate) fn satisfied(constraints: &Constraints, attrs: &Attrs) -> bool {
    constraints
        .iter()
        .all(|(key, c)| c.matches(attrs.get(key).map(String::as_str)))
}
