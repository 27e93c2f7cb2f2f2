mod app;
mod cli;
mod config;
mod db;
mod entities;
mod error;
mod expand;
mod logging;
mod model;
mod refs;
mod snapshot;
mod util;

use std::fs;
use std::path::Path;

use clap::Parser;
use uuid::Uuid;

use crate::app::App;
use crate::cli::{
    CategoryAdd, CategoryCommand, CategoryRename, Cli, Command, CompletionCommand,
    CompletionFile, IdArg, ItemAdd, ItemCommand, ItemUpdate, PlanAdd, PlanCommand, PlanList,
    PlanReplace, ProfileAdd, ProfileCommand, ProfileFilter, ProfileUpdate, SyncCommand,
    SyncExport, SyncImport,
};
use crate::config::Config;
use crate::error::AppError;
use crate::model::{
    ExerciseCompletionInput, ExerciseItemChanges, ExerciseItemInput, ExerciseSpec,
    PlanCompletionInput, PlanInput, ProfileChanges, ProfileInput,
};
use crate::snapshot::Snapshot;
use crate::util::{
    format_datetime, format_execution_steps, format_item_detail, format_plan_detail,
    format_profile_detail,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::debug!(code = err.code(), "command failed");
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), AppError> {
    let Cli {
        config,
        db: db_override,
        command,
    } = Cli::parse();

    let config = Config::load(config.as_deref())?;
    logging::init_with_level(&config.logging.level);

    let db_path = db_override.unwrap_or_else(|| config.database.path.clone());
    db::ensure_parent_dir(&db_path)?;
    let mut lock = db::open_lock(&db_path)?;
    let _guard = lock.write()?;

    let db = db::connect(&db_path).await?;
    db::ensure_schema(&db).await?;
    let app = App::new(db);
    if config.seed.default_categories {
        app.seed_default_categories().await?;
    }

    match command {
        Command::Profile(command) => handle_profile(&app, command).await,
        Command::Category(command) => handle_category(&app, command).await,
        Command::Item(command) => handle_item(&app, command).await,
        Command::Plan(command) => handle_plan(&app, command).await,
        Command::Completion(command) => handle_completion(&app, command).await,
        Command::Sync(command) => handle_sync(&app, command).await,
    }
}

async fn handle_profile(app: &App, command: ProfileCommand) -> Result<(), AppError> {
    match command {
        ProfileCommand::Add(args) => handle_profile_add(app, args).await,
        ProfileCommand::List => {
            print_profile_list(&app.list_profiles().await?);
            Ok(())
        }
        ProfileCommand::Show(args) => handle_profile_show(app, args).await,
        ProfileCommand::Update(args) => handle_profile_update(app, args).await,
        ProfileCommand::Remove(args) => {
            app.delete_profile(args.id).await?;
            println!("Removed profile ID: {}", args.id);
            Ok(())
        }
    }
}

async fn handle_category(app: &App, command: CategoryCommand) -> Result<(), AppError> {
    match command {
        CategoryCommand::Add(args) => handle_category_add(app, args).await,
        CategoryCommand::List => {
            print_category_list(&app.list_categories().await?);
            Ok(())
        }
        CategoryCommand::Rename(args) => handle_category_rename(app, args).await,
        CategoryCommand::Remove(args) => {
            app.delete_category(args.id).await?;
            println!("Removed body category ID: {}", args.id);
            Ok(())
        }
        CategoryCommand::Seed => {
            let seeded = app.seed_default_categories().await?;
            println!("Seeded {seeded} body categories");
            Ok(())
        }
    }
}

async fn handle_item(app: &App, command: ItemCommand) -> Result<(), AppError> {
    match command {
        ItemCommand::Add(args) => handle_item_add(app, args).await,
        ItemCommand::List => {
            print_item_list(&app.list_items().await?);
            Ok(())
        }
        ItemCommand::Show(args) => handle_item_show(app, args).await,
        ItemCommand::Update(args) => handle_item_update(app, args).await,
        ItemCommand::Remove(args) => {
            app.delete_item(args.id).await?;
            println!("Removed exercise item ID: {}", args.id);
            Ok(())
        }
    }
}

async fn handle_plan(app: &App, command: PlanCommand) -> Result<(), AppError> {
    match command {
        PlanCommand::Add(args) => handle_plan_add(app, args).await,
        PlanCommand::List(args) => handle_plan_list(app, args).await,
        PlanCommand::Show(args) => handle_plan_show(app, args).await,
        PlanCommand::Replace(args) => handle_plan_replace(app, args).await,
        PlanCommand::Remove(args) => {
            app.delete_plan(args.id).await?;
            println!("Removed plan ID: {}", args.id);
            Ok(())
        }
        PlanCommand::Execute(args) => handle_plan_execute(app, args).await,
    }
}

async fn handle_completion(app: &App, command: CompletionCommand) -> Result<(), AppError> {
    match command {
        CompletionCommand::AddPlan(args) => handle_completion_add_plan(app, args).await,
        CompletionCommand::AddExercise(args) => handle_completion_add_exercise(app, args).await,
        CompletionCommand::ListPlans(args) => handle_completion_list_plans(app, args).await,
        CompletionCommand::ListExercises(args) => {
            handle_completion_list_exercises(app, args).await
        }
    }
}

async fn handle_sync(app: &App, command: SyncCommand) -> Result<(), AppError> {
    match command {
        SyncCommand::Export(args) => handle_sync_export(app, args).await,
        SyncCommand::Import(args) => handle_sync_import(app, args).await,
    }
}

async fn handle_profile_add(app: &App, args: ProfileAdd) -> Result<(), AppError> {
    let profile = app
        .add_profile(ProfileInput {
            name: args.name,
            emoji: args.emoji,
        })
        .await?;
    println!("Created profile ID: {}: {}", profile.id, profile.name);
    Ok(())
}

async fn handle_profile_show(app: &App, args: IdArg) -> Result<(), AppError> {
    let profile = app.get_profile(args.id).await?;
    let plan_names: Vec<String> = app
        .list_plan_details_for_profile(args.id)
        .await?
        .into_iter()
        .map(|detail| detail.plan.name)
        .collect();
    println!("{}", format_profile_detail(&profile, &plan_names));
    Ok(())
}

async fn handle_profile_update(app: &App, args: ProfileUpdate) -> Result<(), AppError> {
    if args.name.is_none() && args.emoji.is_none() {
        return Err(AppError::InvalidInput(
            "profile update requires --name or --emoji".to_string(),
        ));
    }
    let profile = app
        .update_profile(
            args.id,
            ProfileChanges {
                name: args.name,
                emoji: args.emoji,
            },
        )
        .await?;
    println!("Updated profile ID: {}: {}", profile.id, profile.name);
    Ok(())
}

async fn handle_category_add(app: &App, args: CategoryAdd) -> Result<(), AppError> {
    let category = app.add_category(&args.name).await?;
    println!("Created body category ID: {}: {}", category.id, category.name);
    Ok(())
}

async fn handle_category_rename(app: &App, args: CategoryRename) -> Result<(), AppError> {
    let category = app.rename_category(args.id, &args.name).await?;
    println!("Updated body category ID: {}: {}", category.id, category.name);
    Ok(())
}

async fn handle_item_add(app: &App, args: ItemAdd) -> Result<(), AppError> {
    let item = app
        .add_item(ExerciseItemInput {
            description: args.description,
            video_url: args.video_url,
            body_category_id: args.category,
        })
        .await?;
    println!("Created exercise item ID: {}: {}", item.id, item.description);
    Ok(())
}

async fn handle_item_show(app: &App, args: IdArg) -> Result<(), AppError> {
    let item = app.get_item(args.id).await?;
    let category = app.get_category(item.body_category_id).await?;
    println!("{}", format_item_detail(&item, &category));
    Ok(())
}

async fn handle_item_update(app: &App, args: ItemUpdate) -> Result<(), AppError> {
    if args.description.is_none() && args.category.is_none() && args.video_url.is_none() {
        return Err(AppError::InvalidInput(
            "item update requires --description, --category or --video-url".to_string(),
        ));
    }
    let item = app
        .update_item(
            args.id,
            ExerciseItemChanges {
                description: args.description,
                video_url: args.video_url,
                body_category_id: args.category,
            },
        )
        .await?;
    println!("Updated exercise item ID: {}: {}", item.id, item.description);
    Ok(())
}

async fn handle_plan_add(app: &App, args: PlanAdd) -> Result<(), AppError> {
    let exercises = parse_exercise_specs(&args.exercises)?;
    let detail = app
        .create_plan(PlanInput {
            name: args.name,
            profile_id: args.profile,
            exercises,
        })
        .await?;

    println!(
        "Created plan ID: {}: {} (exercises: {})",
        detail.plan.id,
        detail.plan.name,
        detail.exercises.len()
    );
    for entry in &detail.exercises {
        println!(
            "Created plan exercise ID: {}: {}",
            entry.exercise.id, entry.item.description
        );
    }
    Ok(())
}

async fn handle_plan_replace(app: &App, args: PlanReplace) -> Result<(), AppError> {
    let exercises = parse_exercise_specs(&args.exercises)?;
    let detail = app
        .replace_plan(
            args.id,
            PlanInput {
                name: args.name,
                profile_id: args.profile,
                exercises,
            },
        )
        .await?;

    println!(
        "Replaced plan ID: {}: {} (exercises: {})",
        detail.plan.id,
        detail.plan.name,
        detail.exercises.len()
    );
    for entry in &detail.exercises {
        println!(
            "Created plan exercise ID: {}: {}",
            entry.exercise.id, entry.item.description
        );
    }
    Ok(())
}

async fn handle_plan_list(app: &App, args: PlanList) -> Result<(), AppError> {
    let details = match args.profile {
        Some(profile_id) => app.list_plan_details_for_profile(profile_id).await?,
        None => app.list_plan_details().await?,
    };
    print_plan_list(&details);
    Ok(())
}

async fn handle_plan_show(app: &App, args: IdArg) -> Result<(), AppError> {
    let detail = app.get_plan_detail(args.id).await?;
    let owner = app.get_profile(detail.plan.profile_id).await?;
    println!("{}", format_plan_detail(&detail, &owner));
    Ok(())
}

async fn handle_plan_execute(app: &App, args: IdArg) -> Result<(), AppError> {
    let detail = app.get_plan_detail(args.id).await?;
    let steps = expand::expand(&detail);
    println!("{}", format_execution_steps(&detail, &steps));
    Ok(())
}

async fn handle_completion_add_plan(app: &App, args: CompletionFile) -> Result<(), AppError> {
    let batch: Vec<PlanCompletionInput> = read_json(&args.file)?;
    let ids = app.record_plan_completions(batch).await?;
    for id in &ids {
        println!("Created plan completion ID: {id}");
    }
    Ok(())
}

async fn handle_completion_add_exercise(
    app: &App,
    args: CompletionFile,
) -> Result<(), AppError> {
    let batch: Vec<ExerciseCompletionInput> = read_json(&args.file)?;
    let ids = app.record_exercise_completions(batch).await?;
    for id in &ids {
        println!("Created exercise completion ID: {id}");
    }
    Ok(())
}

async fn handle_completion_list_plans(app: &App, args: ProfileFilter) -> Result<(), AppError> {
    let rows = app.list_plan_completions(args.profile).await?;
    println!(
        "{:<10} {:<16} {:<9} {}",
        "DAY", "RECORDED", "DONE", "PLAN"
    );
    for row in rows {
        let total = row.count_completed_exercises + row.count_open_exercises;
        println!(
            "{:<10} {:<16} {:<9} {}",
            row.training_day,
            format_datetime(row.created_at),
            format!("{}/{}", row.count_completed_exercises, total),
            row.training_plan_name
        );
    }
    Ok(())
}

async fn handle_completion_list_exercises(
    app: &App,
    args: ProfileFilter,
) -> Result<(), AppError> {
    let rows = app.list_exercise_completions(args.profile).await?;
    println!(
        "{:<10} {:<5} {:<5} {:<30} {}",
        "DAY", "ORDER", "REPS", "EXERCISE", "CATEGORY"
    );
    for row in rows {
        println!(
            "{:<10} {:<5} {:<5} {:<30} {}",
            row.training_day,
            row.sort_order,
            row.reps,
            row.exercise_description,
            row.body_category_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn handle_sync_export(app: &App, args: SyncExport) -> Result<(), AppError> {
    let snapshot = app.export().await?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match args.out {
        Some(path) => {
            db::ensure_parent_dir(&path)?;
            fs::write(&path, json)?;
            println!(
                "Exported {} rows to {}",
                snapshot.total_rows(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn handle_sync_import(app: &App, args: SyncImport) -> Result<(), AppError> {
    let snapshot: Snapshot = read_json(&args.path)?;
    let inserted = app.import(snapshot).await?;
    println!("Imported {inserted} rows from {}", args.path.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|err| AppError::InvalidInput(format!("{}: {err}", path.display())))
}

fn parse_exercise_specs(values: &[String]) -> Result<Vec<ExerciseSpec>, AppError> {
    values.iter().map(|value| parse_exercise_spec(value)).collect()
}

/// Parses `item=<id>,order=<n>[,sets=<n>][,reps=<n>][,break=<secs>][,equipment=<text>]`.
/// `equipment` must come last when its text contains commas.
fn parse_exercise_spec(value: &str) -> Result<ExerciseSpec, AppError> {
    let mut item = None;
    let mut order = None;
    let mut sets = None;
    let mut reps = None;
    let mut break_time_seconds = 0;
    let mut equipment = None;

    let mut rest = value.trim();
    while !rest.is_empty() {
        let (key, tail) = rest.split_once('=').ok_or_else(|| {
            AppError::InvalidInput(format!("invalid exercise spec '{value}': expected key=value"))
        })?;
        let key = key.trim();
        if key == "equipment" {
            equipment = Some(tail.to_string());
            break;
        }
        let (raw, next) = match tail.split_once(',') {
            Some((raw, next)) => (raw, next),
            None => (tail, ""),
        };
        let raw = raw.trim();
        match key {
            "item" => {
                item = Some(raw.parse::<Uuid>().map_err(|_| {
                    AppError::InvalidInput(format!("invalid exercise item id '{raw}'"))
                })?)
            }
            "order" => order = Some(parse_number(key, raw)?),
            "sets" => sets = Some(parse_number(key, raw)?),
            "reps" => reps = Some(parse_number(key, raw)?),
            "break" => break_time_seconds = parse_number(key, raw)?,
            unexpected => {
                return Err(AppError::InvalidInput(format!(
                    "invalid exercise spec '{value}': unknown key '{unexpected}'"
                )));
            }
        }
        rest = next.trim_start();
    }

    let exercise_item_id = item.ok_or_else(|| {
        AppError::InvalidInput(format!("exercise spec '{value}' requires item=<id>"))
    })?;
    let order = order.ok_or_else(|| {
        AppError::InvalidInput(format!("exercise spec '{value}' requires order=<n>"))
    })?;
    Ok(ExerciseSpec {
        order,
        equipment,
        sets,
        reps,
        break_time_seconds,
        exercise_item_id,
    })
}

fn parse_number(key: &str, raw: &str) -> Result<i32, AppError> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid {key} '{raw}', expected an integer")))
}

fn print_profile_list(profiles: &[entities::profile::Model]) {
    println!("{:<36} {:<6} {}", "ID", "EMOJI", "NAME");
    for profile in profiles {
        println!(
            "{:<36} {:<6} {}",
            profile.id,
            profile.emoji.as_deref().unwrap_or(""),
            profile.name
        );
    }
}

fn print_category_list(categories: &[entities::body_category::Model]) {
    println!("{:<36} {}", "ID", "NAME");
    for category in categories {
        println!("{:<36} {}", category.id, category.name);
    }
}

fn print_item_list(items: &[entities::exercise_item::Model]) {
    println!("{:<36} {:<36} {}", "ID", "CATEGORY", "DESCRIPTION");
    for item in items {
        println!(
            "{:<36} {:<36} {}",
            item.id, item.body_category_id, item.description
        );
    }
}

fn print_plan_list(details: &[app::PlanDetail]) {
    println!("{:<36} {:<9} {:<6} {}", "ID", "EXERCISES", "SETS", "NAME");
    for detail in details {
        let sets: i32 = detail
            .exercises
            .iter()
            .map(|entry| entry.exercise.sets)
            .sum();
        println!(
            "{:<36} {:<9} {:<6} {}",
            detail.plan.id,
            detail.exercises.len(),
            sets,
            detail.plan.name
        );
    }
}
