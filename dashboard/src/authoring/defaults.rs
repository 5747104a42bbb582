//! Fallback values for fields an instruction does not mention

use crate::models::step::ServiceOperation;

pub const DEFAULT_TARGET_PATH: &str = "/home/users/abpwrk1/pbin/app";
pub const DEFAULT_TARGET_USER: &str = "abpwrk1";
pub const DEFAULT_DB_CONNECTION: &str = "default";
pub const DEFAULT_DB_USER: &str = "postgres";
pub const DEFAULT_SERVICE: &str = "docker.service";
pub const DEFAULT_PLAYBOOK: &str = "playbook.yml";
pub const DEFAULT_HELM_DEPLOYMENT_TYPE: &str = "default";

/// Ambient selection state handed to the parser
///
/// The dashboard screens keep a current VM selection, a DB connection and
/// the backend inventory; the parser only ever sees them through this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDefaults {
    /// VMs currently selected by the operator
    pub selected_vms: Vec<String>,

    /// VM names known to the backend inventory
    pub known_vms: Vec<String>,

    /// Playbook names known to the backend inventory
    pub known_playbooks: Vec<String>,

    /// Helm deployment types known to the backend inventory
    pub known_helm_types: Vec<String>,

    pub target_path: String,
    pub target_user: String,
    pub db_connection: String,
    pub db_user: String,
    pub db_name: Option<String>,
    pub service: String,
    pub operation: ServiceOperation,
    pub playbook: String,
    pub helm_deployment_type: String,
}

impl Default for ParserDefaults {
    fn default() -> Self {
        Self {
            selected_vms: Vec::new(),
            known_vms: Vec::new(),
            known_playbooks: Vec::new(),
            known_helm_types: Vec::new(),
            target_path: DEFAULT_TARGET_PATH.to_string(),
            target_user: DEFAULT_TARGET_USER.to_string(),
            db_connection: DEFAULT_DB_CONNECTION.to_string(),
            db_user: DEFAULT_DB_USER.to_string(),
            db_name: None,
            service: DEFAULT_SERVICE.to_string(),
            operation: ServiceOperation::Restart,
            playbook: DEFAULT_PLAYBOOK.to_string(),
            helm_deployment_type: DEFAULT_HELM_DEPLOYMENT_TYPE.to_string(),
        }
    }
}

impl ParserDefaults {
    pub fn with_selected_vms<I, S>(mut self, vms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_vms = vms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_known_vms<I, S>(mut self, vms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_vms = vms.into_iter().map(Into::into).collect();
        self
    }
}
