use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::generation::sections::SectionSpec;
use crate::generation::template::validate_template;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable generation backend. Default: GeminiClient.
    pub generator: Arc<dyn TextGenerator>,
    /// Master prompt, validated for both placeholders at startup.
    pub prompt_template: Arc<str>,
    pub section_spec: Arc<SectionSpec>,
    /// Raw bytes of the AcroForm letter template, if one is configured.
    pub form_template: Option<Arc<[u8]>>,
}

impl AppState {
    /// Reads the template files named in `config` and wires them to `generator`.
    pub fn load(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let prompt_template = read_prompt_template(&config.prompt_template_path)?;
        let section_spec =
            SectionSpec::cover_letter().context("Invalid cover letter section layout")?;

        let form_template = match &config.form_template_path {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read form template '{}'", path.display()))?;
                info!("Loaded form template {} ({} bytes)", path.display(), bytes.len());
                Some(Arc::from(bytes))
            }
            None => {
                info!("No FORM_TEMPLATE_PATH set; PDF endpoints disabled");
                None
            }
        };

        Ok(Self {
            generator,
            prompt_template: Arc::from(prompt_template),
            section_spec: Arc::new(section_spec),
            form_template,
        })
    }
}

fn read_prompt_template(path: &Path) -> Result<String> {
    let template = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt template '{}'", path.display()))?;
    validate_template(&template)
        .with_context(|| format!("Invalid prompt template '{}'", path.display()))?;
    info!(
        "Loaded prompt template {} ({} chars)",
        path.display(),
        template.len()
    );
    Ok(template)
}
