//! Curriculum tables: module names, simulated durations and score ranges per stage.

use std::time::Duration;

/// Training agent types the camp has curricula for.
pub const AGENT_TYPES: [&str; 6] = [
    "compliance_policy",
    "data_analytics",
    "project_management",
    "risk_forecasting",
    "systems_integration",
    "implementation_support",
];

pub const CORE_MODULES: [&str; 4] = [
    "ipmdar_fundamentals",
    "dod_acquisition_framework",
    "data_requirements_basics",
    "regulatory_compliance_overview",
];

pub const ASSESSMENT_AREAS: [&str; 5] = [
    "knowledge_comprehension",
    "practical_application",
    "problem_solving",
    "adaptability",
    "cross_domain_understanding",
];

/// Minimum mean assessment score for certification.
pub const CERTIFICATION_THRESHOLD: f64 = 0.85;

/// Simulated duration and uniform score range for one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub label: &'static str,
    pub delay: Duration,
    pub low: f64,
    pub high: f64,
}

pub const CORE_STAGE: StageSpec = StageSpec {
    label: "core",
    delay: Duration::from_millis(500),
    low: 0.90,
    high: 1.0,
};

pub const SPECIALIZED_STAGE: StageSpec = StageSpec {
    label: "specialized",
    delay: Duration::from_millis(700),
    low: 0.85,
    high: 1.0,
};

pub const CROSS_DOMAIN_STAGE: StageSpec = StageSpec {
    label: "cross-domain",
    delay: Duration::from_millis(600),
    low: 0.80,
    high: 0.95,
};

/// One pause for the whole assessment, then one draw per area.
pub const ASSESSMENT_STAGE: StageSpec = StageSpec {
    label: "assessment",
    delay: Duration::from_millis(1000),
    low: 0.85,
    high: 1.0,
};

pub fn specialized_modules(agent_type: &str) -> Option<&'static [&'static str]> {
    let modules: &'static [&'static str] = match agent_type {
        "compliance_policy" => &[
            "regulatory_frameworks_deep_dive",
            "policy_interpretation_techniques",
            "compliance_verification_methods",
            "acquisition_regulations_mastery",
            "cdrl_development_and_review",
        ],
        "data_analytics" => &[
            "evms_principles_and_practices",
            "performance_metric_analysis",
            "data_visualization_techniques",
            "statistical_analysis_for_ipmdar",
            "predictive_modeling_basics",
        ],
        "project_management" => &[
            "project_lifecycle_management",
            "ipmdar_tailoring_strategies",
            "wbs_development_and_management",
            "schedule_integration_techniques",
            "resource_management_best_practices",
        ],
        "risk_forecasting" => &[
            "risk_identification_methods",
            "quantitative_risk_analysis",
            "forecasting_techniques",
            "eac_etc_calculation_methods",
            "monte_carlo_simulation_basics",
        ],
        "systems_integration" => &[
            "data_schemas_and_formats",
            "system_interoperability_standards",
            "integration_architecture_design",
            "automated_data_validation",
            "legacy_system_integration",
        ],
        "implementation_support" => &[
            "change_management_strategies",
            "training_program_development",
            "process_documentation_techniques",
            "stakeholder_communication",
            "implementation_roadmap_design",
        ],
        _ => return None,
    };
    Some(modules)
}

/// Modules borrowed from other domains, named `domain:module`.
pub fn cross_domain_modules(agent_type: &str) -> Option<&'static [&'static str]> {
    let modules: &'static [&'static str] = match agent_type {
        "compliance_policy" => &[
            "data_analytics:performance_metric_basics",
            "project_management:tailoring_fundamentals",
            "systems_integration:data_format_requirements",
        ],
        "data_analytics" => &[
            "compliance_policy:reporting_requirements",
            "risk_forecasting:risk_analysis_basics",
            "project_management:schedule_fundamentals",
        ],
        "project_management" => &[
            "compliance_policy:acquisition_requirements",
            "risk_forecasting:risk_management_basics",
            "implementation_support:stakeholder_engagement",
        ],
        "risk_forecasting" => &[
            "data_analytics:statistical_foundations",
            "project_management:critical_path_analysis",
            "compliance_policy:contract_types_and_risks",
        ],
        "systems_integration" => &[
            "data_analytics:data_structure_fundamentals",
            "implementation_support:system_deployment_basics",
            "compliance_policy:data_security_requirements",
        ],
        "implementation_support" => &[
            "project_management:implementation_planning",
            "systems_integration:user_interface_basics",
            "compliance_policy:training_requirements",
        ],
        _ => return None,
    };
    Some(modules)
}

/// Mean of the assessment scores and whether it clears [`CERTIFICATION_THRESHOLD`].
/// An empty slice never certifies.
pub fn certification_outcome(scores: &[f64]) -> (f64, bool) {
    if scores.is_empty() {
        return (0.0, false);
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean, mean >= CERTIFICATION_THRESHOLD)
}
