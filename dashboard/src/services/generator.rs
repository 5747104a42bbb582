//! Template generation from free-text instructions

use std::sync::Arc;

use tracing::warn;

use crate::authn::AuthGate;
use crate::authoring::parser::InstructionParser;
use crate::errors::{DashboardError, ValidationError};
use crate::http::client::HttpClient;
use crate::models::template::DeploymentTemplate;
use crate::services::oplog::OperationLog;

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    pub template: DeploymentTemplate,

    /// Whether the backend accepted the save
    pub saved: bool,

    pub log: OperationLog,
}

/// Parses instructions into a template and saves it
pub struct TemplateGenerator {
    client: Arc<HttpClient>,
    parser: InstructionParser,
    auth: Arc<dyn AuthGate>,
}

impl TemplateGenerator {
    pub fn new(client: Arc<HttpClient>, parser: InstructionParser, auth: Arc<dyn AuthGate>) -> Self {
        Self {
            client,
            parser,
            auth,
        }
    }

    pub fn parser(&self) -> &InstructionParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut InstructionParser {
        &mut self.parser
    }

    /// Parse, build and save a template for `ft_number`
    ///
    /// A failed save still returns the template, with `saved` unset and a
    /// warning in the log.
    pub async fn generate(
        &self,
        ft_number: &str,
        instructions: &str,
    ) -> Result<GeneratedTemplate, DashboardError> {
        self.auth.require("generate templates")?;

        let ft_number = ft_number.trim();
        let mut missing = Vec::new();
        if ft_number.is_empty() {
            missing.push("ftNumber");
        }
        if instructions.trim().is_empty() {
            missing.push("instructions");
        }
        if !missing.is_empty() {
            return Err(ValidationError::missing("template generation", missing).into());
        }

        let mut log = OperationLog::new();
        log.push(format!("Starting template generation for {}", ft_number));
        log.push("Parsing deployment instructions...");
        let template = self.parser.parse(ft_number, instructions);
        log.push(format!(
            "Identified {} deployment steps",
            template.metadata.total_steps
        ));
        log.push("Template generated successfully");

        let saved = match self.client.save_template(&template).await {
            Ok(_) => {
                log.push("Template saved successfully");
                true
            }
            Err(e) => {
                warn!("Saving template for {} failed: {}", ft_number, e);
                log.push("Warning: Template generated but failed to save to backend");
                false
            }
        };

        Ok(GeneratedTemplate {
            template,
            saved,
            log,
        })
    }
}
