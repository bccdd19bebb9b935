// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Target descriptors.
//!
//! A [`TargetSpec`] names one external executable under test together with
//! the arguments it is launched with. Specs are supplied before a run starts
//! and are never mutated afterwards.

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Immutable descriptor of a thing to benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

impl TargetSpec {
    /// Create a new target spec.
    ///
    /// Returns `Err` if the name or command is blank.
    pub fn new<I, S>(name: impl Into<String>, command: impl Into<String>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Self::builder().name(name).command(command);
        for arg in args {
            builder = builder.arg(arg);
        }
        builder.build()
    }

    /// Create a new builder.
    pub fn builder() -> TargetSpecBuilder {
        TargetSpecBuilder::default()
    }

    /// Symbolic name used in reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executable path or command looked up on `PATH`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Ordered argument list.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Check the fields of a spec that was deserialized rather than built.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::invalid_argument("target name is required"));
        }
        if self.command.trim().is_empty() {
            return Err(HarnessError::invalid_argument(format!(
                "target '{}' has an empty command",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Parses `name=command arg1 arg2`, splitting arguments on whitespace.
impl FromStr for TargetSpec {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s.split_once('=').ok_or_else(|| {
            HarnessError::invalid_argument(format!(
                "target '{}' must have the form name=command [args...]",
                s
            ))
        })?;
        let mut parts = rest.split_whitespace();
        let command = parts.next().unwrap_or_default();
        Self::new(name.trim(), command, parts)
    }
}

/// Builder for [`TargetSpec`] instances.
#[derive(Default)]
pub struct TargetSpecBuilder {
    name: Option<String>,
    command: Option<String>,
    args: Vec<String>,
}

impl TargetSpecBuilder {
    /// Set target name (required).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set executable (required).
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build the [`TargetSpec`]. Returns `Err` if required fields are missing.
    pub fn build(self) -> Result<TargetSpec> {
        let name = self
            .name
            .ok_or_else(|| HarnessError::invalid_argument("target name is required"))?;
        let command = self
            .command
            .ok_or_else(|| HarnessError::invalid_argument("target command is required"))?;

        let spec = TargetSpec {
            name,
            command,
            args: self.args,
        };
        spec.validate()?;
        Ok(spec)
    }
}
