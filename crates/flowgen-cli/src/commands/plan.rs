//! `flowgen plan`.

use anyhow::Result;
use flowgen_core::Workflow;

use super::{LoadOptions, load};

pub async fn run(options: LoadOptions, json: bool) -> Result<()> {
    let loaded = load(options, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.workflows)?);
    } else {
        print!("{}", format_plan(&loaded.workflows));
    }
    Ok(())
}

/// Human-readable listing of each workflow's jobs in execution order.
fn format_plan(workflows: &[Workflow]) -> String {
    let mut out = String::new();
    for workflow in workflows {
        out.push_str(&format!(
            "{} ({} jobs)\n",
            workflow.identifier,
            workflow.jobs.len()
        ));
        for job in &workflow.jobs {
            out.push_str(&format!("  {} [{}]", job.identifier, job.runs_on));
            if !job.dependencies.is_empty() {
                out.push_str(&format!(" <- {}", job.dependencies.join(", ")));
            }
            out.push('\n');
        }
    }
    out
}
