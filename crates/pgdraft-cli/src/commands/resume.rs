//! Resume command - inspect a failed or interrupted import state.

use std::path::PathBuf;

use colored::Colorize;

use pgdraft::StateManager;

pub fn run(state_file: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !state_file.exists() {
        return Err(format!("State file not found: {}", state_file.display()).into());
    }

    println!();
    println!(
        "{} {}",
        "Resuming import from:".bold(),
        state_file.display().to_string().cyan()
    );
    println!();

    let manager = StateManager::new(&state_file);
    let state = manager.load_state()?;

    println!("CSV:    {}", state.csv_path.display().to_string().cyan());
    println!("Table:  {}", state.table_name.cyan());
    println!("Status: {}", format!("{:?}", state.status).cyan());
    println!("Phase:  {}", format!("{:?}", state.phase).cyan());
    if let Some(ref error) = state.error {
        println!("Error:  {}", error.red());
    }

    if !state.csv_path.exists() {
        return Err(format!("CSV file not found: {}", state.csv_path.display()).into());
    }

    let (can_resume, reason) = manager.can_resume(&state, &state.csv_path);

    println!();
    if force {
        println!("{}", "Force restart requested.".yellow());
        println!(
            "Re-run the {} command to start a fresh import.",
            "import".cyan()
        );
    } else if can_resume {
        println!("{} {}", "Resume possible:".green(), reason);
        println!(
            "Re-run the {} command to continue from the saved state.",
            "import".cyan()
        );
    } else {
        println!("{} {}", "Cannot resume:".yellow(), reason);
        println!("Use {} to restart from the beginning.", "--force".cyan());
    }
    println!();

    Ok(())
}
