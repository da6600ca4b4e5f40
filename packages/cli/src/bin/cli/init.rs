use marmot_cli::output;
use marmot_config::WorkingContext;
use marmot_scaffold::{run_init, InquirePrompter};

pub fn handle_init(context: &WorkingContext, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut prompter = InquirePrompter;
    let report = run_init(context, force, &mut prompter)?;

    let summary = output::initialized(&report);
    if !summary.is_empty() {
        println!("{}", summary);
    }
    Ok(())
}
