//! Deployment template models

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DashboardError;
use crate::models::step::{DeploymentStep, StepKind};
use crate::utils::sha256_hash;

/// Template metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub ft_number: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_steps: u32,
}

/// Execution-order edge for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDependency {
    pub step: u32,
    #[serde(default)]
    pub depends_on: Vec<u32>,
    #[serde(default)]
    pub parallel: bool,
}

/// Strict linear chain: step i depends on step i-1 only
pub fn linear_dependencies(step_count: usize) -> Vec<StepDependency> {
    (1..=step_count as u32)
        .map(|step| StepDependency {
            step,
            depends_on: if step > 1 { vec![step - 1] } else { vec![] },
            parallel: false,
        })
        .collect()
}

/// A full multi-step deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTemplate {
    pub metadata: TemplateMetadata,
    #[serde(default)]
    pub steps: Vec<DeploymentStep>,
    #[serde(default)]
    pub dependencies: Vec<StepDependency>,
}

impl DeploymentTemplate {
    /// Build a template from steps in execution order
    ///
    /// Steps are renumbered 1..N and chained linearly.
    pub fn new(
        ft_number: impl Into<String>,
        mut steps: Vec<DeploymentStep>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let ft_number = ft_number.into();
        for (index, step) in steps.iter_mut().enumerate() {
            step.order = index as u32 + 1;
        }

        Self {
            metadata: TemplateMetadata {
                description: format!("Deployment template for {}", ft_number),
                ft_number,
                generated_at,
                total_steps: steps.len() as u32,
            },
            dependencies: linear_dependencies(steps.len()),
            steps,
        }
    }

    /// Parse a persisted template and check its structure
    pub fn from_json(json: &str) -> Result<Self, DashboardError> {
        let template: DeploymentTemplate = serde_json::from_str(json)
            .map_err(|e| DashboardError::Parse(format!("malformed template: {}", e)))?;
        template.into_checked()
    }

    /// Fill fields older templates omit, then check the structure
    ///
    /// Templates saved before `total_steps` and `dependencies` existed get
    /// them derived; anything else inconsistent is a parse error.
    pub fn into_checked(mut self) -> Result<Self, DashboardError> {
        if self.metadata.total_steps == 0 {
            self.metadata.total_steps = self.steps.len() as u32;
        }
        if self.dependencies.is_empty() && !self.steps.is_empty() {
            self.dependencies = linear_dependencies(self.steps.len());
        }
        self.steps.sort_by_key(|s| s.order);
        self.check_structure()?;
        Ok(self)
    }

    /// Verify dense ordering and that every edge points backwards
    pub fn check_structure(&self) -> Result<(), DashboardError> {
        for (index, step) in self.steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.order != expected {
                return Err(DashboardError::Parse(format!(
                    "step orders are not dense: expected {}, found {}",
                    expected, step.order
                )));
            }
        }

        if self.metadata.total_steps as usize != self.steps.len() {
            return Err(DashboardError::Parse(format!(
                "total_steps is {} but template has {} steps",
                self.metadata.total_steps,
                self.steps.len()
            )));
        }

        if self.dependencies.len() != self.steps.len() {
            return Err(DashboardError::Parse(format!(
                "{} dependency entries for {} steps",
                self.dependencies.len(),
                self.steps.len()
            )));
        }

        let mut seen = HashSet::new();
        for dep in &self.dependencies {
            if dep.step == 0 || dep.step as usize > self.steps.len() || !seen.insert(dep.step) {
                return Err(DashboardError::Parse(format!(
                    "invalid dependency entry for step {}",
                    dep.step
                )));
            }
            if let Some(bad) = dep.depends_on.iter().find(|&&d| d == 0 || d >= dep.step) {
                return Err(DashboardError::Parse(format!(
                    "step {} depends on step {} which does not precede it",
                    dep.step, bad
                )));
            }
        }

        Ok(())
    }

    /// Whether the dependencies follow the default linear chain
    pub fn is_linear(&self) -> bool {
        self.dependencies == linear_dependencies(self.steps.len())
    }

    /// Digest of everything except the generation timestamp
    pub fn digest(&self) -> Result<String, DashboardError> {
        let canonical = serde_json::json!({
            "ft_number": self.metadata.ft_number,
            "description": self.metadata.description,
            "steps": self.steps,
            "dependencies": self.dependencies,
        });
        Ok(sha256_hash(serde_json::to_string(&canonical)?.as_bytes()))
    }

    /// Copy with every SQL step's password removed
    pub fn without_db_passwords(&self) -> Self {
        let mut template = self.clone();
        for step in &mut template.steps {
            if let StepKind::SqlDeployment(sql) = &mut step.kind {
                sql.db_password = None;
            }
        }
        template
    }

    /// Name under which the backend stores this template
    pub fn saved_name(&self) -> String {
        format!("{}_template", self.metadata.ft_number)
    }
}
