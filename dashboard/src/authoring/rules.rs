//! Keyword classification and field extraction for instruction lines
//!
//! Classification precedence, first match wins:
//!
//! 1. file deployment: `copy`, `deploy`, `file`
//! 2. ansible playbook: `ansible`, `playbook`
//! 3. service: `restart`, `service`, `systemctl`
//! 4. helm upgrade: `helm`
//! 5. sql deployment: `sql`, `database`, `postgres`, the word `pg`
//! 6. config change: both `change` and `value`
//!
//! Keywords match case-insensitively anywhere in the line. A line such as
//! `copy schema.sql to batch1` is therefore a file deployment, and
//! `run ansible deploy_app` is one too.

use regex::Regex;

use crate::errors::DashboardError;
use crate::models::step::{ServiceOperation, StepType};

const PRECEDENCE: [(StepType, &str); 6] = [
    (StepType::FileDeployment, r"(?i)copy|deploy|file"),
    (StepType::AnsiblePlaybook, r"(?i)ansible|playbook"),
    (StepType::ServiceRestart, r"(?i)restart|service|systemctl"),
    (StepType::HelmUpgrade, r"(?i)helm"),
    (StepType::SqlDeployment, r"(?i)sql|database|postgres|\bpg\b"),
    (StepType::ConfigChange, r"(?i)change.*value|value.*change"),
];

/// A VM name as written in instructions must contain a digit (`batch1`,
/// `app-02`), otherwise `to server` would read as a VM
const VM_NAME: &str = r"[A-Za-z][\w-]*\d[\w-]*";

/// Words never taken as a captured value
const STOPWORDS: [&str; 20] = [
    "a", "an", "and", "as", "at", "connection", "file", "files", "for", "helm", "in", "on",
    "path", "service", "the", "this", "to", "user", "with", "chart",
];

fn regex_err(e: regex::Error) -> DashboardError {
    DashboardError::Config(format!("invalid instruction pattern: {}", e))
}

fn clean_token(token: &str) -> &str {
    token
        .trim_matches(|c: char| ",;:()[]{}\"'`".contains(c))
        .trim_end_matches('.')
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word.to_lowercase().as_str())
}

/// Compiled instruction patterns
#[derive(Debug, Clone)]
pub struct Rules {
    precedence: Vec<(StepType, Regex)>,
    file_name: Regex,
    path_keyword: Regex,
    absolute_path: Regex,
    user_keyword: Regex,
    vm_list: Regex,
    vm_separator: Regex,
    connection_keyword: Regex,
    db_name_keyword: Regex,
    service_keyword: Regex,
    operation_target: Regex,
    operation_word: Regex,
    playbook_file: Regex,
    helm_upgrade_target: Regex,
}

impl Rules {
    pub fn compile() -> Result<Self, DashboardError> {
        let precedence = PRECEDENCE
            .iter()
            .map(|(step_type, pattern)| Ok((*step_type, Regex::new(pattern).map_err(regex_err)?)))
            .collect::<Result<Vec<_>, DashboardError>>()?;

        let re = |pattern: &str| Regex::new(pattern).map_err(regex_err);

        Ok(Self {
            precedence,
            file_name: re(r"^[A-Za-z0-9_][\w.-]*\.[A-Za-z][A-Za-z0-9]{0,9}$")?,
            path_keyword: re(r"(?i)\bpath\s+(\S+)")?,
            absolute_path: re(r"(?:^|\s)(/[^\s,;]*)")?,
            user_keyword: re(r"(?i)\b(?:user|as)\s+([A-Za-z_][\w.-]*)")?,
            vm_list: re(&format!(
                r"(?i)\b(?:on|to)\s+({name}(?:(?:\s*,\s*|\s+and\s+){name})*)",
                name = VM_NAME
            ))?,
            vm_separator: re(r"(?i)\s*,\s*|\s+and\s+")?,
            connection_keyword: re(r"(?i)\bconnection\s+([\w.:@/-]+)")?,
            db_name_keyword: re(r"(?i)\b(?:dbname|database|db)\s+([A-Za-z_][\w-]*)")?,
            service_keyword: re(r"(?i)\bservice\s+([\w@.:-]+)")?,
            operation_target: re(
                r"(?i)\b(?:restart|start|stop|reload|enable|disable|status)\s+(?:the\s+)?([\w@.:-]+)",
            )?,
            operation_word: re(r"(?i)\b(start|stop|restart|status|enable|disable|reload)\b")?,
            playbook_file: re(r"(?i)^[\w./-]+\.ya?ml$")?,
            helm_upgrade_target: re(r"(?i)\bupgrade\s+([\w.-]+)")?,
        })
    }

    /// Step type for a line, by fixed precedence
    pub fn classify(&self, line: &str) -> Option<StepType> {
        self.precedence
            .iter()
            .find(|(_, pattern)| pattern.is_match(line))
            .map(|(step_type, _)| *step_type)
    }

    fn tokens<'a>(&self, line: &'a str) -> impl Iterator<Item = &'a str> {
        line.split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
    }

    /// Tokens that look like `name.ext`
    pub fn file_names(&self, line: &str) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for token in self.tokens(line) {
            if !token.contains('/')
                && self.file_name.is_match(token)
                && !files.iter().any(|f| f == token)
            {
                files.push(token.to_string());
            }
        }
        files
    }

    /// Tokens ending in `.sql`
    pub fn sql_files(&self, line: &str) -> Vec<String> {
        self.file_names(line)
            .into_iter()
            .filter(|f| f.to_lowercase().ends_with(".sql"))
            .collect()
    }

    /// `path <p>`, else the first absolute path
    pub fn target_path(&self, line: &str) -> Option<String> {
        self.path_keyword
            .captures(line)
            .map(|c| clean_token(&c[1]).to_string())
            .or_else(|| {
                self.absolute_path
                    .captures(line)
                    .map(|c| clean_token(&c[1]).to_string())
            })
            .filter(|p| !p.is_empty())
    }

    /// `user <u>` or `as <u>`
    pub fn user(&self, line: &str) -> Option<String> {
        self.user_keyword
            .captures_iter(line)
            .map(|c| clean_token(&c[1]).to_string())
            .find(|u| !u.is_empty() && !is_stopword(u))
    }

    /// Known inventory VMs mentioned in the line, else `on|to <vm>[, <vm>]`
    pub fn vms(&self, line: &str, known_vms: &[String]) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for token in self.tokens(line) {
            if let Some(vm) = known_vms.iter().find(|vm| vm.eq_ignore_ascii_case(token)) {
                if !found.contains(vm) {
                    found.push(vm.clone());
                }
            }
        }
        if !found.is_empty() {
            return found;
        }

        if let Some(captures) = self.vm_list.captures(line) {
            for vm in self.vm_separator.split(&captures[1]) {
                let vm = vm.trim();
                if !vm.is_empty() && !found.iter().any(|f| f == vm) {
                    found.push(vm.to_string());
                }
            }
        }
        found
    }

    pub fn db_connection(&self, line: &str) -> Option<String> {
        self.connection_keyword
            .captures(line)
            .map(|c| clean_token(&c[1]).to_string())
            .filter(|c| !c.is_empty())
    }

    pub fn db_name(&self, line: &str) -> Option<String> {
        self.db_name_keyword
            .captures_iter(line)
            .map(|c| c[1].to_string())
            .find(|name| !is_stopword(name))
    }

    /// `service <s>`, else the word after an operation verb
    pub fn service(&self, line: &str) -> Option<String> {
        let after_keyword = self
            .service_keyword
            .captures_iter(line)
            .map(|c| clean_token(&c[1]).to_string())
            .find(|s| !s.is_empty() && !is_stopword(s));

        after_keyword.or_else(|| {
            self.operation_target
                .captures_iter(line)
                .map(|c| clean_token(&c[1]).to_string())
                .find(|s| !s.is_empty() && !is_stopword(s))
        })
    }

    /// First operation word by position
    pub fn operation(&self, line: &str) -> Option<ServiceOperation> {
        self.operation_word
            .captures(line)
            .and_then(|c| c[1].parse().ok())
    }

    /// Known playbook mentioned in the line, else a `*.yml` token
    pub fn playbook(&self, line: &str, known_playbooks: &[String]) -> Option<String> {
        self.known_name(line, known_playbooks).or_else(|| {
            self.tokens(line)
                .find(|t| self.playbook_file.is_match(t))
                .map(str::to_string)
        })
    }

    /// Known helm type mentioned in the line, else `upgrade <x>`
    pub fn helm_deployment_type(&self, line: &str, known_types: &[String]) -> Option<String> {
        self.known_name(line, known_types).or_else(|| {
            self.helm_upgrade_target
                .captures_iter(line)
                .map(|c| clean_token(&c[1]).to_string())
                .find(|t| !t.is_empty() && !is_stopword(t))
        })
    }

    fn known_name(&self, line: &str, known: &[String]) -> Option<String> {
        self.tokens(line)
            .find_map(|token| known.iter().find(|k| k.eq_ignore_ascii_case(token)))
            .cloned()
    }
}
