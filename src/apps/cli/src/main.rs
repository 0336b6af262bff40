mod api;
mod brief;
mod cli;
mod logging;

use anyhow::Result;
use api::ApiClient;
use clap::Parser;
use cli::{Cli, Command};
use onething_core::{Task, TaskTier};

fn print_task(task: &Task) {
    let check = if task.completed { "x" } else { " " };
    println!("[{}] {}  {}  ({})", check, task.id, task.title, task.tier.label());
}

async fn list(api: &ApiClient) -> Result<()> {
    let tasks = api.list_tasks().await?;
    if let Some(review) = api.todays_briefing().await? {
        let title = tasks
            .iter()
            .find(|task| task.id == review.one_thing_id)
            .map(|task| task.title.as_str())
            .unwrap_or("(deleted task)");
        println!("Today's ONE Thing: {}", title);
        println!("Goal: {}\n", review.one_thing_goal);
    }

    if tasks.is_empty() {
        println!("No tasks yet.");
        return Ok(());
    }
    for tier in TaskTier::ALL {
        let in_tier: Vec<&Task> = tasks.iter().filter(|task| task.tier == tier).collect();
        if in_tier.is_empty() {
            continue;
        }
        println!("{}", tier.label());
        for task in in_tier {
            print_task(task);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let api = ApiClient::new(&cli.server);
    match cli.command {
        Command::List => list(&api).await?,
        Command::Add { title, description } => {
            let task = api.create_task(&title, description.as_deref()).await?;
            print_task(&task);
        }
        Command::Done { id } => print_task(&api.toggle_task(&id).await?),
        Command::Delete { id } => {
            api.delete_task(&id).await?;
            println!("Deleted {}", id);
        }
        Command::Tier { id, tier } => print_task(&api.update_tier(&id, &tier).await?),
        Command::Brief => brief::run_briefing(&api).await?,
    }
    Ok(())
}
