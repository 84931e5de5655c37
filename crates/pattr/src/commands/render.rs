//! Render command - hydrate a page, apply scripted changes, print the HTML

use std::path::PathBuf;

use clap::Args;
use pattr_atelier::Event;
use pattr_carton::CompactString;
use pattr_croquis::{ScopeId, Value};

use super::{data_dir, hydrate_with_files, load_engine, CliError};
use crate::config::PattrConfig;

#[derive(Args)]
pub struct RenderArgs {
    /// Page to render
    pub page: PathBuf,

    /// Fire an event after hydration (repeatable)
    #[arg(long = "fire", value_name = "ID:EVENT[=VALUE]")]
    pub fire: Vec<String>,

    /// Set a root variable after hydration, before any event (repeatable)
    #[arg(long = "set", value_name = "NAME=JSON")]
    pub set: Vec<String>,

    /// Directory `p-src` urls resolve against
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// A scripted event
#[derive(Debug, Clone, PartialEq)]
pub struct Fire {
    pub element: String,
    pub event: CompactString,
    pub value: Option<String>,
}

impl Fire {
    pub fn parse(spec: &str) -> Result<Self, CliError> {
        let invalid = || CliError::InvalidFire(spec.to_string());
        let (element, rest) = spec.split_once(':').ok_or_else(invalid)?;
        let (event, value) = match rest.split_once('=') {
            Some((event, value)) => (event, Some(value.to_string())),
            None => (rest, None),
        };
        if element.is_empty() || event.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            element: element.to_string(),
            event: event.into(),
            value,
        })
    }

    fn to_event(&self) -> Event {
        let event = Event::new(self.event.clone());
        match &self.value {
            Some(value) => event.with_value(value.as_str()),
            None => event,
        }
    }
}

/// Parse `<name>=<json>`
pub fn parse_assignment(spec: &str) -> Result<(String, Value), CliError> {
    let invalid = || CliError::InvalidSet(spec.to_string());
    let (name, json) = spec.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if !pattr_carton::is_simple_identifier(name) {
        return Err(invalid());
    }
    let json: serde_json::Value = serde_json::from_str(json).map_err(|_| invalid())?;
    Ok((name.to_string(), Value::from_json(json)))
}

pub fn run(args: RenderArgs, config: &PattrConfig) -> Result<String, CliError> {
    let fires = args
        .fire
        .iter()
        .map(|spec| Fire::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let sets = args
        .set
        .iter()
        .map(|spec| parse_assignment(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let mut engine = load_engine(&args.page, config)?;
    let data_dir = data_dir(args.data_dir.as_deref(), config, &args.page);
    hydrate_with_files(&mut engine, &data_dir)?;

    for (name, value) in sets {
        let report = engine.set(ScopeId::ROOT, &name, value)?;
        tracing::debug!(name = %name, visited = report.visited, "root variable set");
    }
    for fire in &fires {
        let target = engine
            .document()
            .get_element_by_id(&fire.element)
            .ok_or_else(|| CliError::UnknownElement(fire.element.clone()))?;
        let report = engine.dispatch(target, &fire.to_event())?;
        if report.handlers == 0 {
            tracing::warn!(element = %fire.element, event = %fire.event, "no listener ran");
        }
    }

    Ok(engine.to_html())
}
