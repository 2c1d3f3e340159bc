/*!
 * Post-processing pipeline.
 *
 * Resolves every configured step to action library functions once, then
 * applies the steps in order to each document:
 * select candidates → run every filter → act on each survivor.
 *
 * Unknown targets or names fail at load time, before any file is touched.
 */

pub mod config;

use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::actions::{
    self, ActFn, Domain, EventDomain, FilterFn, InfoDomain, MiscFn, Params, SelectFn, StyleDomain,
};
use crate::errors::{ActionError, PipelineError};
use crate::subtitle::Document;

pub use config::{FilterConfig, PipelineConfig, StepConfig};

/// A step resolved against one domain
struct Step<D: Domain> {
    select: SelectFn<D::Candidate>,
    filters: Vec<(String, FilterFn<D::Candidate>, Params)>,
    action: ActFn<D::Candidate, D::Output>,
    params: Params,
}

impl<D: Domain> Step<D> {
    fn compile(config: &StepConfig) -> Result<Self, PipelineError> {
        let select = D::select(&config.select).ok_or_else(|| PipelineError::UnknownSelect {
            target: D::NAME.to_string(),
            name: config.select.clone(),
        })?;

        let filters = config
            .filters
            .iter()
            .map(|f| {
                D::filter(&f.name)
                    .map(|func| (f.name.clone(), func, f.params.clone()))
                    .ok_or_else(|| PipelineError::UnknownFilter {
                        target: D::NAME.to_string(),
                        name: f.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let action = D::action(&config.action).ok_or_else(|| PipelineError::UnknownAction {
            target: D::NAME.to_string(),
            name: config.action.clone(),
        })?;

        Ok(Self {
            select,
            filters,
            action,
            params: config.params.clone(),
        })
    }

    /// Apply to one document, returning how many candidates were acted on
    fn apply(&self, doc: &mut Document) -> Result<usize, ActionError> {
        let candidates = (self.select)(doc, &self.params)?;
        let mut acted = 0;

        'candidates: for candidate in candidates {
            // an earlier act in this step may have removed it
            if !D::contains(doc, candidate) {
                debug!("Skipping {}: no longer in the document", candidate);
                continue;
            }

            for (name, filter, params) in &self.filters {
                if !filter(doc, candidate, params)? {
                    trace!("{} dropped by filter '{}'", candidate, name);
                    continue 'candidates;
                }
            }

            let output = (self.action)(doc, candidate, &self.params)?;
            trace!("{} -> {:?}", candidate, output);
            acted += 1;
        }

        Ok(acted)
    }
}

enum CompiledStep {
    Info(Step<InfoDomain>),
    Styles(Step<StyleDomain>),
    Events(Step<EventDomain>),
    Misc { run: MiscFn, params: Params },
}

impl CompiledStep {
    fn compile(config: &StepConfig) -> Result<Self, PipelineError> {
        match config.target.as_str() {
            "info" => Ok(Self::Info(Step::compile(config)?)),
            "styles" => Ok(Self::Styles(Step::compile(config)?)),
            "events" => Ok(Self::Events(Step::compile(config)?)),
            "misc" => {
                let run = actions::misc(&config.action).ok_or_else(|| PipelineError::UnknownAction {
                    target: "misc".to_string(),
                    name: config.action.clone(),
                })?;
                Ok(Self::Misc { run, params: config.params.clone() })
            }
            other => Err(PipelineError::UnknownTarget(other.to_string())),
        }
    }

    fn apply(&self, doc: &mut Document) -> Result<usize, ActionError> {
        match self {
            Self::Info(step) => step.apply(doc),
            Self::Styles(step) => step.apply(doc),
            Self::Events(step) => step.apply(doc),
            Self::Misc { run, params } => run(doc, params).map(|_| 1),
        }
    }
}

/// Applies a configured pipeline to subtitle files
pub struct SubtitleFormatter {
    steps: Vec<(StepConfig, CompiledStep)>,
}

impl SubtitleFormatter {
    /// Resolve every step of the configuration
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let steps = config
            .steps
            .into_iter()
            .map(|step| CompiledStep::compile(&step).map(|compiled| (step, compiled)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { steps })
    }

    /// Load and resolve a pipeline configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        Self::new(PipelineConfig::from_file(path)?)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Run every step, in order, on an in-memory document
    pub fn apply(&self, doc: &mut Document) -> Result<(), PipelineError> {
        let mut dangling = doc.dangling_style_references();

        for (index, (config, step)) in self.steps.iter().enumerate() {
            let acted = step.apply(doc).map_err(|source| PipelineError::Step {
                step: index + 1,
                target: config.target.clone(),
                action: config.action.clone(),
                source,
            })?;
            debug!("Step {} ({}.{}) acted on {} candidates", index + 1, config.target, config.action, acted);

            // Removals never cascade; report new dangling references once
            let current = doc.dangling_style_references();
            if current != dangling && !current.is_empty() {
                warn!("Events reference undefined styles after step {}: {}", index + 1, current.join(", "));
            }
            dangling = current;
        }
        Ok(())
    }

    /// Load, transform and rewrite one subtitle file in place
    pub fn format(&self, path: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut doc = Document::load(path)?;
        self.apply(&mut doc)?;
        doc.save(path)?;
        debug!("Post-processed {:?}", path);
        Ok(vec![path.to_path_buf()])
    }
}
