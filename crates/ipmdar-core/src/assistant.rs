//! The six IPMDAR expert personas and how each one answers a query.
//!
//! An [`Assistant`] pairs a static [`AssistantProfile`] with a mutable provider assignment and
//! the shared knowledge base. Answering is: retrieve a knowledge subset, build the persona
//! prompt, generate through the assigned provider, then apply the persona's post-processing.

use crate::knowledge::{contains_any, Category, KnowledgeBase};
use crate::providers::{ProviderKind, ProviderSet};
use crate::sampling::Sampler;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// At most this many `general` items are added to every knowledge subset.
pub const GENERAL_CONTEXT_LIMIT: usize = 50;

/// Probability that the implementation-support persona closes with a follow-up prompt.
pub const FOLLOW_UP_PROBABILITY: f64 = 0.3;

const ANALYTICS_NOTE: &str = "\n\nNote: All data analytics recommendations follow the standard IPMDAR metrics and calculations as defined in the IPMDAR Implementation and Tailoring Guide.";

const TAILORING_CHECKLIST: &str = "\n\nRecommended Tailoring Approach:\n1. Identify contract value and type\n2. Determine applicable IPMDAR sections based on contract size\n3. Review special considerations for your contract type\n4. Document tailoring decisions in the CDRL\n5. Seek approval from the acquisition authority";

const RISK_FRAMEWORK: &str = "\n\nStandard IPMDAR Risk Identification Framework:\n1. Review performance metrics for negative trends\n2. Analyze CPI and SPI for early warning indicators\n3. Evaluate technical performance measures against requirements\n4. Assess critical path activities for schedule risks\n5. Identify cost drivers and potential overruns\n6. Categorize identified risks by impact and probability";

const JSON_EXAMPLE: &str = r#"

Example IPMDAR JSON Format:
```json
{
  "header": {
    "submissionDate": "2025-03-03",
    "contractNumber": "FA8621-15-C-6397",
    "contractorName": "Example Contractor Inc.",
    "reportingPeriod": {
      "start": "2025-02-01",
      "end": "2025-02-28"
    }
  },
  "performanceData": {
    "contractBudgetBase": 1000000,
    "budgetAtCompletion": 950000,
    "actualCostOfWorkPerformed": 450000,
    "budgetedCostOfWorkPerformed": 500000,
    "budgetedCostOfWorkScheduled": 550000
  },
  "metrics": {
    "costPerformanceIndex": 1.11,
    "schedulePerformanceIndex": 0.91,
    "estimateAtCompletion": 855855
  }
}
```"#;

const FOLLOW_UPS: [&str; 5] = [
    "\n\nIs there a specific part of the implementation process you'd like me to elaborate on?",
    "\n\nWould you like me to break down any of these steps in more detail?",
    "\n\nDo you need additional guidance on any particular aspect?",
    "\n\nFeel free to ask follow-up questions as you work through these steps.",
    "\n\nI'm here to help with any challenges you encounter during implementation.",
];

const ANALYTICS_FOCUS: &[&str] = &[
    "analytics", "metrics", "measurement", "data", "report", "dashboard", "analysis", "trend",
    "statistic", "calculation", "evm", "earned value", "performance", "indicator", "spi", "cpi",
    "variance", "forecast",
];

const RISK_FOCUS: &[&str] = &[
    "risk", "forecast", "prediction", "mitigation", "probability", "impact", "likelihood",
    "consequence", "uncertainty", "opportunity", "threat", "contingency", "reserve", "estimate",
    "projection", "future",
];

/// Post-processing applied to a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    None,
    /// Always append the analytics disclaimer.
    AnalyticsNote,
    /// Checklist when the query mentions tailor / cdrl / deliverable.
    TailoringChecklist,
    /// Framework when the query mentions both "identif" and "risk".
    RiskFramework,
    /// JSON example when the query mentions json / data format / schema.
    JsonExample,
    /// Random conversational follow-up.
    FollowUp,
}

/// Extra knowledge pulled from neighbouring buckets when the query matches `focus`.
#[derive(Debug, Clone, Copy)]
pub struct Supplement {
    pub categories: &'static [Category],
    pub focus: &'static [&'static str],
}

/// Static identity of one expert persona.
#[derive(Debug)]
pub struct AssistantProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub expertise: &'static str,
    pub description: &'static str,
    pub category: Category,
    /// Curriculum key used by the training camp.
    pub agent_type: &'static str,
    pub preferred_provider: ProviderKind,
    pub augmentation: Augmentation,
    pub supplement: Option<Supplement>,
}

pub static PROFILES: [AssistantProfile; 6] = [
    AssistantProfile {
        id: "compliance",
        name: "Dr. Compliance & Policy",
        expertise: "IPMDAR regulations, DoD acquisition policies, compliance standards, and data reporting requirements",
        description: "Expert in IPMDAR regulations, DoD acquisition policies, compliance standards, and data reporting requirements.

Specializes in:
- Interpretation of IPMDAR guidelines and DoD Instruction 5000.02
- Contract Data Requirements Lists (CDRLs) compliance
- Federal Acquisition Regulation (FAR) and Defense Federal Acquisition Regulation Supplement (DFARS) requirements
- Data reporting requirements and submission formats
- Compliance matrices and checklists
- Audit preparation and compliance verification
",
        category: Category::CompliancePolicy,
        agent_type: "compliance_policy",
        preferred_provider: ProviderKind::OpenAi,
        augmentation: Augmentation::None,
        supplement: None,
    },
    AssistantProfile {
        id: "data_analytics",
        name: "Dr. Data Analytics",
        expertise: "IPMDAR performance data analysis, cost-schedule integration, and Earned Value Management (EVM) metrics",
        description: "Specialist in analyzing IPMDAR performance data, cost-schedule integration, and Earned Value Management (EVM) metrics.

Specializes in:
- Earned Value Management System (EVMS) principles and metrics
- Cost Performance Index (CPI) and Schedule Performance Index (SPI) analysis
- Variance analysis and trend identification
- Data visualization and reporting
- Contract Performance Reports (CPR) and Integrated Program Management Report (IPMR) analysis
- Performance measurement baselines and control accounts
- Estimate at Completion (EAC) and Estimate to Complete (ETC) calculations
",
        category: Category::DataAnalytics,
        agent_type: "data_analytics",
        preferred_provider: ProviderKind::Anthropic,
        augmentation: Augmentation::AnalyticsNote,
        supplement: Some(Supplement {
            categories: &[Category::RiskForecasting, Category::Implementation],
            focus: ANALYTICS_FOCUS,
        }),
    },
    AssistantProfile {
        id: "project_management",
        name: "Dr. Project Management",
        expertise: "Tailoring IPMDAR deliverables, preparing Contract Data Requirements Lists (CDRLs), and implementation best practices",
        description: "Provides detailed guidance on tailoring IPMDAR deliverables according to specific project needs, preparation of Contract Data Requirements Lists (CDRLs), and implementation best practices.

Specializes in:
- IPMDAR deliverable tailoring based on contract type and size
- Contract Data Requirements Lists (CDRLs) preparation and review
- Work Breakdown Structure (WBS) development and implementation
- Integrated Master Schedule (IMS) development and management
- Program Management Office (PMO) organization and best practices
- Project lifecycle management in DoD acquisition
- Implementation roadmaps and transition planning
",
        category: Category::ProjectManagement,
        agent_type: "project_management",
        preferred_provider: ProviderKind::Groq,
        augmentation: Augmentation::TailoringChecklist,
        supplement: None,
    },
    AssistantProfile {
        id: "risk_forecasting",
        name: "Dr. Risk & Forecasting",
        expertise: "Predictive analytics, risk identification, and mitigation strategies using IPMDAR datasets",
        description: "Focuses on predictive analytics, risk identification, and mitigation strategies using IPMDAR datasets.

Specializes in:
- Predictive trend analysis using IPMDAR historical data
- Risk identification through performance metrics
- Cost and schedule risk assessment
- Mitigation strategy development and implementation
- Estimate at Completion (EAC) forecasting models
- Independent estimate analysis and validation
- Risk-adjusted schedule and cost projections
",
        category: Category::RiskForecasting,
        agent_type: "risk_forecasting",
        preferred_provider: ProviderKind::Google,
        augmentation: Augmentation::RiskFramework,
        supplement: Some(Supplement {
            categories: &[Category::DataAnalytics, Category::ProjectManagement],
            focus: RISK_FOCUS,
        }),
    },
    AssistantProfile {
        id: "systems_integration",
        name: "Dr. Systems Integration",
        expertise: "Technical integration of IPMDAR tools, data formatting, JSON structuring, and automation processes",
        description: "Ensures seamless technical integration of IPMDAR tools, data formatting, JSON structuring, and automation processes.

Specializes in:
- IPMDAR data schemas and JSON formatting requirements
- System interoperability and integration architecture
- Data exchange protocols and standards
- Automation of data collection and reporting processes
- Technical validation and verification of IPMDAR submissions
- Tool selection and integration for IPMDAR compliance
- Legacy system integration with modern IPMDAR requirements
",
        category: Category::SystemsIntegration,
        agent_type: "systems_integration",
        preferred_provider: ProviderKind::Cohere,
        augmentation: Augmentation::JsonExample,
        supplement: None,
    },
    AssistantProfile {
        id: "implementation_support",
        name: "Dr. Implementation Support",
        expertise: "Step-by-step implementation assistance, real-time answers, and procedural guidance for IPMDAR processes",
        description: "Engages interactively with end-users, providing step-by-step implementation assistance, real-time answers, and procedural guidance for IPMDAR processes.

Specializes in:
- Guided walkthrough of IPMDAR implementation steps
- Step-by-step process explanations and tutorials
- Practical examples and case studies
- Best practices for first-time IPMDAR implementers
- Troubleshooting common implementation issues
- Training material development and guidance
- Transition planning from legacy systems to IPMDAR
",
        category: Category::Implementation,
        agent_type: "implementation_support",
        preferred_provider: ProviderKind::EmergenceAi,
        augmentation: Augmentation::FollowUp,
        supplement: None,
    },
];

pub fn profile(id: &str) -> Option<&'static AssistantProfile> {
    PROFILES.iter().find(|p| p.id == id)
}

/// "100%" when any knowledge backed the answer, else "95%". Cosmetic only.
pub fn accuracy_label(knowledge_items: usize) -> &'static str {
    if knowledge_items > 0 {
        "100%"
    } else {
        "95%"
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("no adapter registered for provider {0}")]
    ProviderUnavailable(ProviderKind),
}

/// One answer from one assistant.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Display name of the answering persona.
    pub agent: String,
    pub response: String,
    pub accuracy: String,
}

pub struct Assistant {
    profile: &'static AssistantProfile,
    provider: RwLock<ProviderKind>,
    knowledge: Arc<KnowledgeBase>,
    providers: Arc<ProviderSet>,
    sampler: Arc<dyn Sampler>,
}

impl Assistant {
    pub fn new(
        profile: &'static AssistantProfile,
        provider: ProviderKind,
        knowledge: Arc<KnowledgeBase>,
        providers: Arc<ProviderSet>,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        Self {
            profile,
            provider: RwLock::new(provider),
            knowledge,
            providers,
            sampler,
        }
    }

    pub fn profile(&self) -> &'static AssistantProfile {
        self.profile
    }

    pub fn id(&self) -> &'static str {
        self.profile.id
    }

    /// Currently assigned provider.
    pub fn provider(&self) -> ProviderKind {
        *self.provider.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Reassign the provider used for subsequent answers.
    pub fn set_provider(&self, kind: ProviderKind) {
        *self.provider.write().unwrap_or_else(|e| e.into_inner()) = kind;
    }

    /// Own bucket, then the first [`GENERAL_CONTEXT_LIMIT`] general items, then any
    /// focus-matched items from neighbouring buckets.
    pub fn retrieve_knowledge(&self, query: &str) -> Vec<&str> {
        let mut items: Vec<&str> = self
            .knowledge
            .bucket(self.profile.category)
            .iter()
            .map(String::as_str)
            .collect();
        items.extend(
            self.knowledge
                .bucket(Category::General)
                .iter()
                .take(GENERAL_CONTEXT_LIMIT)
                .map(String::as_str),
        );

        if let Some(supplement) = self.profile.supplement {
            if contains_any(&query.to_lowercase(), supplement.focus) {
                for category in supplement.categories {
                    items.extend(
                        self.knowledge
                            .bucket(*category)
                            .iter()
                            .filter(|item| contains_any(&item.to_lowercase(), supplement.focus))
                            .map(String::as_str),
                    );
                }
            }
        }
        items
    }

    pub fn system_message(&self) -> String {
        format!(
            "You are {}, with PhD-level expertise in {}.",
            self.profile.name, self.profile.expertise
        )
    }

    pub fn build_prompt(&self, query: &str, knowledge: &[&str]) -> String {
        format!(
            "You are {name}, an AI agent with PhD-level expertise in {expertise}. \n\
             You provide evidence-based, accurate assistance on IPMDAR (Integrated Program Management Data and Reporting) for DoD acquisition projects.\n\
             \n\
             CONTEXT INFORMATION FROM IPMDAR IMPLEMENTATION AND TAILORING GUIDE:\n\
             {context}\n\
             \n\
             USER QUERY: {query}\n\
             \n\
             Please provide a comprehensive, accurate response based on your expertise and the IPMDAR Implementation and Tailoring Guide. \n\
             Your response must be evidence-based and directly reflect the standards and guidelines in the IPMDAR documentation.\n\
             Format your response in a clear, professional manner suitable for DoD acquisition professionals.\n",
            name = self.profile.name,
            expertise = self.profile.expertise,
            context = knowledge.join("\n"),
            query = query,
        )
    }

    /// Apply this persona's post-processing to a generated answer.
    pub fn augment(&self, query: &str, mut response: String) -> String {
        let q = query.to_lowercase();
        match self.profile.augmentation {
            Augmentation::None => {}
            Augmentation::AnalyticsNote => response.push_str(ANALYTICS_NOTE),
            Augmentation::TailoringChecklist => {
                if contains_any(&q, &["tailor", "cdrl", "deliverable"]) {
                    response.push_str(TAILORING_CHECKLIST);
                }
            }
            Augmentation::RiskFramework => {
                if q.contains("identif") && q.contains("risk") {
                    response.push_str(RISK_FRAMEWORK);
                }
            }
            Augmentation::JsonExample => {
                if contains_any(&q, &["json", "data format", "schema"]) {
                    response.push_str(JSON_EXAMPLE);
                }
            }
            Augmentation::FollowUp => {
                if self.sampler.uniform(0.0, 1.0) < FOLLOW_UP_PROBABILITY {
                    response.push_str(FOLLOW_UPS[self.sampler.index(FOLLOW_UPS.len())]);
                }
            }
        }
        response
    }

    /// Retrieve, prompt, generate, post-process.
    pub async fn answer(&self, query: &str) -> AssistantResult<Answer> {
        let kind = self.provider();
        let provider = self
            .providers
            .get(kind)
            .ok_or(AssistantError::ProviderUnavailable(kind))?;

        let knowledge = self.retrieve_knowledge(query);
        let prompt = self.build_prompt(query, &knowledge);
        let accuracy = accuracy_label(knowledge.len());
        tracing::debug!(
            target: "ipmdar::assistant",
            assistant = self.id(),
            provider = %kind,
            knowledge_items = knowledge.len(),
            "generating answer"
        );

        let generated = provider.generate(&self.system_message(), &prompt).await;
        Ok(Answer {
            agent: self.profile.name.to_string(),
            response: self.augment(query, generated),
            accuracy: accuracy.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LlmProvider, ProviderResult};
    use crate::sampling::ScriptedSampler;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        kind: ProviderKind,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for Recording {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(&self, _system: &str, prompt: &str) -> ProviderResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Base answer.".to_string())
        }
    }

    fn assistant_with(
        id: &str,
        text: &str,
        sampler: ScriptedSampler,
    ) -> (Assistant, Arc<Recording>) {
        let profile = profile(id).unwrap();
        let recorder = Arc::new(Recording {
            kind: profile.preferred_provider,
            prompts: Mutex::new(Vec::new()),
        });
        let mut providers = ProviderSet::default();
        providers.insert(recorder.clone());
        let assistant = Assistant::new(
            profile,
            profile.preferred_provider,
            Arc::new(KnowledgeBase::from_text(text)),
            Arc::new(providers),
            Arc::new(sampler),
        );
        (assistant, recorder)
    }

    #[test]
    fn profiles_cover_six_distinct_providers() {
        let mut providers: Vec<_> = PROFILES.iter().map(|p| p.preferred_provider).collect();
        providers.sort();
        providers.dedup();
        assert_eq!(providers.len(), 6);
        assert_eq!(profile("compliance").unwrap().agent_type, "compliance_policy");
        assert_eq!(
            profile("implementation_support").unwrap().category,
            Category::Implementation
        );
        assert!(profile("all").is_none());
    }

    #[test]
    fn general_items_are_capped() {
        let text: String = (0..60).map(|i| format!("Hello number {}. ", i)).collect();
        let (a, _) = assistant_with("compliance", &text, ScriptedSampler::default());
        assert_eq!(a.retrieve_knowledge("anything").len(), GENERAL_CONTEXT_LIMIT);
    }

    #[test]
    fn analytics_focus_pulls_matching_neighbour_items() {
        let text = "Forecast the future cost. Plan the risk reserve. Follow each step.";
        let (a, _) = assistant_with("data_analytics", text, ScriptedSampler::default());
        assert!(a.retrieve_knowledge("hello").is_empty());
        // "forecast" is an analytics focus word; only the matching risk item comes along.
        assert_eq!(
            a.retrieve_knowledge("Show the CPI trend"),
            vec!["Forecast the future cost."]
        );
    }

    #[test]
    fn risk_framework_needs_both_triggers() {
        let (a, _) = assistant_with("risk_forecasting", "", ScriptedSampler::default());
        assert!(a
            .augment("How do I identify risk?", "x".into())
            .contains("Risk Identification Framework"));
        assert_eq!(a.augment("What is risk?", "x".into()), "x");
    }

    #[test]
    fn tailoring_and_json_blocks_follow_their_triggers() {
        let (pm, _) = assistant_with("project_management", "", ScriptedSampler::default());
        assert!(pm
            .augment("Prepare the CDRL", "x".into())
            .ends_with("Seek approval from the acquisition authority"));
        assert_eq!(pm.augment("status?", "x".into()), "x");

        let (si, _) = assistant_with("systems_integration", "", ScriptedSampler::default());
        assert!(si
            .augment("What Data Format applies?", "x".into())
            .contains("\"estimateAtCompletion\": 855855"));
    }

    #[test]
    fn follow_up_is_probabilistic() {
        let (hit, _) =
            assistant_with("implementation_support", "", ScriptedSampler::new([0.1, 1.0]));
        assert_eq!(
            hit.augment("q", "x".into()),
            format!("x{}", FOLLOW_UPS[1])
        );
        let (miss, _) = assistant_with("implementation_support", "", ScriptedSampler::new([0.3]));
        assert_eq!(miss.augment("q", "x".into()), "x");
    }

    #[tokio::test]
    async fn answer_labels_accuracy_by_knowledge_presence() {
        let (empty, _) = assistant_with("data_analytics", "", ScriptedSampler::default());
        let a = empty.answer("hello").await.unwrap();
        assert_eq!(a.accuracy, "95%");
        assert_eq!(a.agent, "Dr. Data Analytics");
        assert!(a.response.starts_with("Base answer.\n\nNote:"));

        let (full, recorder) =
            assistant_with("compliance", "Follow the DFARS clause.", ScriptedSampler::default());
        let a = full.answer("What applies?").await.unwrap();
        assert_eq!(a.accuracy, "100%");
        let prompts = recorder.prompts.lock().unwrap();
        assert!(prompts[0].contains("Follow the DFARS clause.\n\nUSER QUERY: What applies?"));
    }

    #[tokio::test]
    async fn unregistered_provider_is_an_error() {
        let (a, _) = assistant_with("compliance", "", ScriptedSampler::default());
        a.set_provider(ProviderKind::Cohere);
        assert_eq!(a.provider(), ProviderKind::Cohere);
        assert!(matches!(
            a.answer("q").await,
            Err(AssistantError::ProviderUnavailable(ProviderKind::Cohere))
        ));
    }
}
