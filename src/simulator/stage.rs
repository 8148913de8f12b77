use serde::{Deserialize, Serialize};
use crate::config::StageConfig;

/// Placeholder replaced by the company label when messages are rendered.
pub const LABEL_PLACEHOLDER: &str = "{label}";

struct StageTemplate {
    id: &'static str,
    display_name: &'static str,
    description: &'static str,
    estimated_duration_secs: f64,
    messages: &'static [&'static str],
}

static STAGE_CATALOGUE: &[StageTemplate] = &[
    StageTemplate {
        id: "company-researcher",
        display_name: "Company Researcher",
        description: "Analyzes company information and industry context",
        estimated_duration_secs: 5.0,
        messages: &[
            "Searching for information about \"{label}\"...",
            "Found company website and social media profiles",
            "Analyzing recent news and press releases",
            "Identifying industry trends and competitive landscape",
            "Compiling company insights and business focus areas",
        ],
    },
    StageTemplate {
        id: "decision-maker-profiler",
        display_name: "Decision Maker Profiler",
        description: "Identifies key decision makers and their preferences",
        estimated_duration_secs: 5.0,
        messages: &[
            "Identifying key decision makers at \"{label}\"",
            "Analyzing professional backgrounds and communication styles",
            "Mapping reporting structures and decision authority",
            "Determining potential interest points for sponsorship",
            "Profiling complete for target stakeholders",
        ],
    },
    StageTemplate {
        id: "value-proposition-generator",
        display_name: "Value Proposition Generator",
        description: "Creates personalized value propositions",
        estimated_duration_secs: 5.0,
        messages: &[
            "Creating customized value propositions for \"{label}\"",
            "Mapping team strengths to company priorities",
            "Developing quantifiable benefit statements",
            "Aligning proposal with company's strategic objectives",
            "Value propositions prioritized and refined",
        ],
    },
    StageTemplate {
        id: "tone-analyzer",
        display_name: "Tone Analyzer",
        description: "Determines appropriate communication style",
        estimated_duration_secs: 5.0,
        messages: &[
            "Analyzing optimal communication tone for \"{label}\"",
            "Evaluating corporate culture and communication style",
            "Determining formality level and technical depth",
            "Setting appropriate enthusiasm and assertiveness levels",
            "Communication approach optimized for recipient preferences",
        ],
    },
    StageTemplate {
        id: "email-composer",
        display_name: "Email Composer",
        description: "Drafts the final email with all inputs",
        estimated_duration_secs: 5.0,
        messages: &[
            "Structuring email for \"{label}\" with all agent inputs",
            "Crafting compelling subject line and introduction",
            "Incorporating value propositions and evidence points",
            "Adding appropriate call-to-action",
            "Email draft completed and ready for review",
        ],
    },
];

/// One entry of the simulated pipeline, before it is instantiated for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub estimated_duration_secs: f64,
    pub message_templates: Vec<String>,
}

impl StageDefinition {
    /// Message templates with the label substituted, in template order.
    pub fn render_messages(&self, label: &str) -> Vec<String> {
        self.message_templates
            .iter()
            .map(|t| t.replace(LABEL_PLACEHOLDER, label))
            .collect()
    }
}

impl From<&StageConfig> for StageDefinition {
    fn from(cfg: &StageConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            display_name: cfg.display_name.clone(),
            description: cfg.description.clone(),
            estimated_duration_secs: cfg.estimated_duration_secs,
            message_templates: cfg.messages.clone(),
        }
    }
}

/// The five-agent email generation pipeline.
pub fn default_stages() -> Vec<StageDefinition> {
    STAGE_CATALOGUE
        .iter()
        .map(|t| StageDefinition {
            id: t.id.to_string(),
            display_name: t.display_name.to_string(),
            description: t.description.to_string(),
            estimated_duration_secs: t.estimated_duration_secs,
            message_templates: t.messages.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}

/// Stage list from config when overridden, otherwise the default catalogue.
pub fn stages_from_config(stages: Option<&[StageConfig]>) -> Vec<StageDefinition> {
    match stages {
        Some(list) if !list.is_empty() => list.iter().map(StageDefinition::from).collect(),
        _ => default_stages(),
    }
}
