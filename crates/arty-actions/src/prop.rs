//! Artifactory properties
//!
//! A property renders as `name=value`, or `name=v1,v2` when it carries a
//! list, and a set of properties joins with `;`. Artifactory parses exactly
//! this form, so rendering must not change.

use std::fmt;

use arty_core::Error;
use serde::{Deserialize, Serialize};

/// One property to attach to matched artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    #[serde(default)]
    pub name: String,
    /// Single value; wins over `values` when both are set
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Prop {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            values: Vec::new(),
        }
    }

    pub fn multi<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: String::new(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        tracing::trace!("validating prop configuration");

        if self.name.is_empty() {
            return Err(Error::invalid_property("no prop name provided"));
        }
        if self.value.is_empty() && self.values.is_empty() {
            return Err(Error::invalid_property("no prop value(s) provided"));
        }
        Ok(())
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}={}", self.name, self.values.join(","))
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

/// Join properties into the `a=1;b=x,y` wire form
pub fn render_props(props: &[Prop]) -> String {
    props
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a JSON or YAML list of `{name, value, values}` records
pub fn parse_props(raw: &str) -> Result<Vec<Prop>, Error> {
    Ok(serde_yaml_ng::from_str(raw)?)
}
