//! Free-text instruction parser

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::authoring::defaults::ParserDefaults;
use crate::authoring::rules::Rules;
use crate::errors::DashboardError;
use crate::models::step::{
    AnsiblePlaybook, ConfigChange, DeploymentStep, FileDeployment, HelmUpgrade, ServiceRestart,
    SqlDeployment, StepKind, StepType,
};
use crate::models::template::DeploymentTemplate;

/// Turns operator instructions, one per line, into deployment steps
///
/// Lines no rule recognises are dropped. Parsing never fails.
#[derive(Debug, Clone)]
pub struct InstructionParser {
    rules: Rules,
    defaults: ParserDefaults,
}

impl InstructionParser {
    pub fn new(defaults: ParserDefaults) -> Result<Self, DashboardError> {
        Ok(Self {
            rules: Rules::compile()?,
            defaults,
        })
    }

    pub fn defaults(&self) -> &ParserDefaults {
        &self.defaults
    }

    /// Replace the ambient selection (e.g. after the operator picks VMs)
    pub fn set_defaults(&mut self, defaults: ParserDefaults) {
        self.defaults = defaults;
    }

    /// Parse instructions into a template stamped with the current time
    pub fn parse(&self, ft_number: &str, instructions: &str) -> DeploymentTemplate {
        self.parse_at(ft_number, instructions, Utc::now())
    }

    pub fn parse_at(
        &self,
        ft_number: &str,
        instructions: &str,
        generated_at: DateTime<Utc>,
    ) -> DeploymentTemplate {
        DeploymentTemplate::new(ft_number, self.parse_steps(instructions), generated_at)
    }

    /// Steps numbered 1..N in line order
    pub fn parse_steps(&self, instructions: &str) -> Vec<DeploymentStep> {
        let mut steps = Vec::new();
        for line in instructions.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match self.parse_line(line) {
                Some(kind) => {
                    let order = steps.len() as u32 + 1;
                    debug!("Instruction {} -> {}: {}", order, kind.step_type(), line);
                    steps.push(DeploymentStep::new(order, line, kind));
                }
                None => debug!("No rule matches instruction, skipping: {}", line),
            }
        }
        steps
    }

    /// Classify and extract a single trimmed line
    pub fn parse_line(&self, line: &str) -> Option<StepKind> {
        let step_type = self.rules.classify(line)?;
        Some(self.extract(step_type, line))
    }

    fn extract(&self, step_type: StepType, line: &str) -> StepKind {
        let d = &self.defaults;
        let rules = &self.rules;

        match step_type {
            StepType::FileDeployment => StepKind::FileDeployment(FileDeployment {
                files: rules.file_names(line),
                target_path: rules
                    .target_path(line)
                    .unwrap_or_else(|| d.target_path.clone()),
                target_user: rules.user(line).unwrap_or_else(|| d.target_user.clone()),
                target_vms: self.target_vms(line),
                ft_number: None,
            }),
            StepType::SqlDeployment => StepKind::SqlDeployment(SqlDeployment {
                files: rules.sql_files(line),
                db_connection: rules
                    .db_connection(line)
                    .unwrap_or_else(|| d.db_connection.clone()),
                db_user: rules.user(line).unwrap_or_else(|| d.db_user.clone()),
                db_name: rules.db_name(line).or_else(|| d.db_name.clone()),
                db_password: None,
                ft_number: None,
            }),
            StepType::ServiceRestart => StepKind::ServiceRestart(ServiceRestart {
                service: rules.service(line).unwrap_or_else(|| d.service.clone()),
                operation: rules.operation(line).unwrap_or(d.operation),
                target_vms: self.target_vms(line),
            }),
            StepType::AnsiblePlaybook => StepKind::AnsiblePlaybook(AnsiblePlaybook {
                playbook: rules
                    .playbook(line, &d.known_playbooks)
                    .unwrap_or_else(|| d.playbook.clone()),
            }),
            StepType::HelmUpgrade => StepKind::HelmUpgrade(HelmUpgrade {
                helm_deployment_type: rules
                    .helm_deployment_type(line, &d.known_helm_types)
                    .unwrap_or_else(|| d.helm_deployment_type.clone()),
            }),
            StepType::ConfigChange => StepKind::ConfigChange(ConfigChange {}),
        }
    }

    fn target_vms(&self, line: &str) -> Vec<String> {
        let vms = self.rules.vms(line, &self.defaults.known_vms);
        if vms.is_empty() {
            self.defaults.selected_vms.clone()
        } else {
            vms
        }
    }
}
