use fitcoach_plan_builder::{
    config::CoachConfig, CoachServices, CoachSession, ConversationTurn, GeneratedPlan,
    GenerationOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const HELP: &str = "Commands: /save [workout|diet|comprehensive], /reset, /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they don't mix with the chat
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = CoachConfig::from_env()?;
    let session = CoachSession::new(CoachServices::from_config(&config)?);
    info!(session_id = %session.id(), "FitCoach terminal session started");

    for turn in session.turns().await {
        print_turn(&turn);
    }
    println!("{}", HELP);

    let mut last_plan: Option<Uuid> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        match line.split_whitespace().next() {
            Some("/quit") => break,
            Some("/reset") => {
                session.abandon().await;
                println!("(collection reset)");
                continue;
            }
            Some("/save") => {
                let Some(turn_id) = last_plan else {
                    println!("(no plan to save yet)");
                    continue;
                };
                let category = line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|c| serde_json::from_value(serde_json::json!(c)).ok());

                match session.save_plan(turn_id, category).await {
                    Ok(_) => {
                        if let Some(turn) = session.turns().await.last() {
                            print_turn(turn);
                        }
                    }
                    Err(e) => eprintln!("Save failed: {}", e),
                }
                continue;
            }
            _ => {}
        }

        match session.send(line).await {
            Ok(outcome) => {
                // The user's own turn is already on screen
                for turn in outcome.turns.iter().skip(1) {
                    print_turn(turn);
                    if turn.plan.is_some() {
                        last_plan = Some(turn.id);
                    }
                }
                if let Some(GenerationOutcome::FallbackUsed(reason)) = outcome.generation {
                    println!("(offline plan used: {} failure)", reason);
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn print_turn(turn: &ConversationTurn) {
    println!("\nCoach: {}", turn.text);
    if let Some(plan) = &turn.plan {
        print_plan(plan);
    }
}

fn print_plan(plan: &GeneratedPlan) {
    println!("\n=== {} ===", plan.plan_name);
    println!("{}", plan.overview);

    for day in &plan.schedule {
        println!("\n{}: {}", day.day, day.focus);
        for exercise in &day.exercises {
            println!("  - {} {}x{}", exercise.name, exercise.sets, exercise.reps);
        }
    }

    if !plan.nutrition.meal_plan.is_empty() {
        println!(
            "\nNutrition: {} ({})",
            plan.nutrition.daily_calories, plan.nutrition.macros
        );
        for meal in &plan.nutrition.meal_plan {
            println!("  - {}", meal);
        }
    }

    if !plan.tips.is_empty() {
        println!("\nTips:");
        for (i, tip) in plan.tips.iter().enumerate() {
            println!("  {}. {}", i + 1, tip);
        }
    }
}
