//! Template authoring: free-text parsing and interactive building

pub mod builder;
pub mod defaults;
pub mod parser;
pub mod rules;

pub use builder::{StepDraft, StepId, TemplateBuilder};
pub use defaults::ParserDefaults;
pub use parser::InstructionParser;
