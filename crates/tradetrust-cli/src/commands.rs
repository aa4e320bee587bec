//! Command implementations.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tradetrust_core::{
    ClassificationResult, ProvenanceLookup, ProvenanceRecord, SavingsResult, ScoreOptions,
    ScoredResult, TrustEngine, UsmcaResult,
};
use tradetrust_runtime::{
    CertificateData, CertificateError, CertificateRecoveryEngine, LookupKind, RuntimeConfig,
    WorkflowInputs, WorkflowOrchestrator,
};

use crate::cli::{
    EscalateArgs, InputArgs, OutputFormat, ProvenanceArgs, RecoverArgs, ScoreCommand, SourcesArgs,
};
use crate::store::StaticProvenance;

/// Load the runtime configuration once, with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let config = match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

pub fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Read a YAML or JSON document from a file, or stdin for `-`.
fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn provenance(args: ProvenanceArgs, engine: &TrustEngine, format: OutputFormat) -> Result<()> {
    let record: ProvenanceRecord = read_input(&args.input)?;
    let now = args.at.unwrap_or_else(Utc::now);
    let provenance = engine.calculate_provenance(&record, now);
    let verification = engine.check_verification_needs(&record, &provenance);

    emit(
        &serde_json::json!({
            "provenance": provenance,
            "verification": verification,
        }),
        format,
    )
}

#[derive(Deserialize)]
struct ClassificationInput {
    #[serde(default)]
    lookup: Option<ProvenanceLookup>,
    #[serde(default)]
    classification: ClassificationResult,
    #[serde(default)]
    options: ScoreOptions,
}

#[derive(Deserialize)]
struct UsmcaInput {
    #[serde(default)]
    lookup: Option<ProvenanceLookup>,
    #[serde(default)]
    usmca: UsmcaResult,
}

#[derive(Deserialize)]
struct SavingsInput {
    #[serde(default)]
    lookup: Option<ProvenanceLookup>,
    #[serde(default)]
    savings: SavingsResult,
}

pub fn score(command: ScoreCommand, engine: &TrustEngine, format: OutputFormat) -> Result<()> {
    let trust_score = match command {
        ScoreCommand::Classification(args) => {
            let input: ClassificationInput = read_input(&args.input)?;
            engine.calculate_trust_score(input.lookup.as_ref(), &input.classification, &input.options)
        }
        ScoreCommand::Usmca(args) => {
            let input: UsmcaInput = read_input(&args.input)?;
            engine.calculate_usmca_trust_score(&input.usmca, input.lookup.as_ref())
        }
        ScoreCommand::Savings(args) => {
            let input: SavingsInput = read_input(&args.input)?;
            engine.calculate_savings_trust_score(&input.savings, input.lookup.as_ref())
        }
    };

    emit(
        &serde_json::json!({
            "trust_score": trust_score,
            "expert_validation": engine.evaluate_expert_validation_need(trust_score),
        }),
        format,
    )
}

pub fn summary(args: InputArgs, engine: &TrustEngine, format: OutputFormat) -> Result<()> {
    let value: serde_json::Value = read_input(&args.input)?;
    let summary = engine.generate_trust_summary_value(&value);
    let results: Vec<ScoredResult> = serde_json::from_value(value).unwrap_or_default();

    emit(
        &serde_json::json!({
            "trust_summary": summary,
            "professional_disclaimers": engine.generate_professional_disclaimer(&results),
        }),
        format,
    )
}

pub fn escalate(args: EscalateArgs, engine: &TrustEngine, format: OutputFormat) -> Result<()> {
    emit(&engine.evaluate_expert_validation_need(args.score), format)
}

pub fn sources(args: SourcesArgs, engine: &TrustEngine, format: OutputFormat) -> Result<()> {
    emit(&engine.verify_data_sources(&args.sources), format)
}

/// Workflow document: collaborator outputs plus the recorded lookups.
#[derive(Deserialize)]
struct WorkflowDocument {
    #[serde(flatten)]
    inputs: WorkflowInputs,

    #[serde(default)]
    lookups: HashMap<LookupKind, ProvenanceLookup>,
}

pub async fn workflow(args: InputArgs, config: RuntimeConfig, format: OutputFormat) -> Result<()> {
    let document: WorkflowDocument = read_input(&args.input)?;
    let orchestrator = WorkflowOrchestrator::new(
        Arc::new(config),
        Arc::new(StaticProvenance::new(document.lookups)),
    );
    let report = orchestrator.run(&document.inputs, Utc::now()).await;
    emit(&report, format)
}

pub fn recover(args: RecoverArgs, format: OutputFormat) -> Result<()> {
    let data: CertificateData = match &args.data {
        Some(path) => read_input(path)?,
        None => CertificateData::default(),
    };

    let engine = CertificateRecoveryEngine::new();
    let error = CertificateError::External(args.error);
    emit(&engine.recover(&error, &data, Utc::now()), format)
}

pub fn config(config: &RuntimeConfig, format: OutputFormat) -> Result<()> {
    emit(&config_document(config), format)
}

/// The effective configuration in the same shape as a config file.
fn config_document(config: &RuntimeConfig) -> serde_json::Value {
    serde_json::json!({
        "trust": config.trust,
        "collaborator_timeout": humantime::format_duration(config.collaborator_timeout).to_string(),
        "cache": config.cache,
    })
}
