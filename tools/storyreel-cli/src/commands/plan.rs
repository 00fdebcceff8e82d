//! Plan a storyboard and print it.

use std::path::PathBuf;

use storyreel_planner::PlanOptions;

pub fn run(path: PathBuf, title: Option<String>) -> anyhow::Result<()> {
    let narration = super::read_narration(&path)?;

    let mut options = PlanOptions::default();
    if let Some(title) = title {
        options.title = title;
    }

    let storyboard = storyreel_planner::plan_with(&narration, &options)?;
    for problem in storyboard.validate() {
        tracing::warn!(%problem, "Storyboard check failed");
    }

    println!("{}", storyboard.to_json_pretty()?);
    Ok(())
}
