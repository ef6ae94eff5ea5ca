//! `boxcutter replay`: run a preview headlessly from a step script.
//!
//! ```json
//! [
//!   { "source": { "id": "a", "html": "<p>hello</p>" } },
//!   { "wait": 300 },
//!   { "source": { "id": "a", "html": "<p>hello again</p>" } },
//!   "settle",
//!   { "scroll": { "scrollTop": 120 } },
//!   { "click": { "target": [1, 0], "x": 10, "y": 4 } },
//!   { "call": { "function": "now" } }
//! ]
//! ```
//!
//! The first step must be a `source`; it mounts the preview.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use boxcutter::dom::{NodePath, Viewport};
use boxcutter::protocol::ScrollPosition;
use boxcutter::runtime::DomInput;
use boxcutter::{HostChannel, NoScripts, Preview, PreviewConfig, Source};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Hand a new source to the preview
    Source(Source),
    /// Sleep for the given milliseconds
    Wait(u64),
    /// Wait until every source is applied
    Settle,
    Call {
        function: String,
        #[serde(default)]
        data: Value,
    },
    Emit {
        name: String,
        #[serde(default)]
        data: Value,
    },
    Scroll(ScrollPosition),
    Resize {
        width: f64,
        height: f64,
    },
    Click {
        target: NodePath,
        x: f64,
        y: f64,
    },
}

pub fn parse_steps(content: &str) -> Result<Vec<Step>> {
    serde_json::from_str(content).context("invalid step script")
}

pub async fn run(config: PreviewConfig, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read step script `{}`", path.display()))?;
    let mut steps = parse_steps(&content)?.into_iter();

    let Some(Step::Source(first)) = steps.next() else {
        bail!("the first step must be a `source`");
    };

    let channel = HostChannel::new();
    let printer = super::print_traffic(&channel);
    let preview = Preview::mount(&channel, config, first, Arc::new(NoScripts)).await?;

    for step in steps {
        boxcutter::debug!("replay"; "{:?}", step);
        match step {
            Step::Source(source) => preview.set_source(source),
            Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            Step::Settle => preview.settle().await,
            Step::Call { function, data } => match preview.call(&function, data).await {
                Ok(value) => boxcutter::log!("replay"; "{} -> {}", function, value),
                Err(e) => boxcutter::log!("replay"; "{} failed: {}", function, e),
            },
            Step::Emit { name, data } => preview.emit(&name, data),
            Step::Scroll(position) => {
                preview.input(DomInput::Scroll(position));
            }
            Step::Resize { width, height } => {
                preview.input(DomInput::Resize(Viewport::new(width, height)));
            }
            Step::Click { target, x, y } => {
                preview.input(DomInput::Click { target, x, y });
            }
        }
    }

    preview.settle().await;
    // Let the last frame reports reach the printer.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = preview.state();
    preview.shutdown().await;
    printer.abort();

    println!("= {}", serde_json::to_string(&state)?);
    if let Some(error) = state.last_error {
        bail!("preview reported an error: {}", error);
    }
    Ok(())
}
