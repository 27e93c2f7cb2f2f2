use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "bearmode",
    version,
    about = "Plan workouts, record completions and sync training data with SQLite"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (defaults to the user config directory)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "SQLite database file, overrides the config"
    )]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Item(ItemCommand),
    #[command(subcommand)]
    Plan(PlanCommand),
    #[command(subcommand)]
    Completion(CompletionCommand),
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Add(ProfileAdd),
    List,
    Show(IdArg),
    Update(ProfileUpdate),
    Remove(IdArg),
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Add(CategoryAdd),
    List,
    Rename(CategoryRename),
    Remove(IdArg),
    #[command(about = "Insert the default body categories into an empty catalog")]
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    Add(ItemAdd),
    List,
    Show(IdArg),
    Update(ItemUpdate),
    Remove(IdArg),
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    Add(PlanAdd),
    List(PlanList),
    Show(IdArg),
    #[command(about = "Replace name, owner and the whole exercise list of a plan")]
    Replace(PlanReplace),
    Remove(IdArg),
    #[command(about = "Print the plan as one step per set")]
    Execute(IdArg),
}

#[derive(Subcommand, Debug)]
pub enum CompletionCommand {
    #[command(name = "add-plan")]
    AddPlan(CompletionFile),
    #[command(name = "add-exercise")]
    AddExercise(CompletionFile),
    #[command(name = "list-plans")]
    ListPlans(ProfileFilter),
    #[command(name = "list-exercises")]
    ListExercises(ProfileFilter),
}

#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    Export(SyncExport),
    Import(SyncImport),
}

#[derive(Args, Debug)]
pub struct IdArg {
    pub id: Uuid,
}

#[derive(Args, Debug)]
pub struct ProfileAdd {
    pub name: String,
    #[arg(long)]
    pub emoji: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProfileUpdate {
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, help = "New emoji; pass an empty string to clear it")]
    pub emoji: Option<String>,
}

#[derive(Args, Debug)]
pub struct CategoryAdd {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CategoryRename {
    pub id: Uuid,
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ItemAdd {
    pub description: String,
    #[arg(long, value_name = "ID")]
    pub category: Uuid,
    #[arg(long)]
    pub video_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct ItemUpdate {
    pub id: Uuid,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_name = "ID")]
    pub category: Option<Uuid>,
    #[arg(long, help = "New video URL; pass an empty string to clear it")]
    pub video_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct PlanAdd {
    pub name: String,
    #[arg(long, value_name = "ID")]
    pub profile: Uuid,
    #[arg(
        long = "exercise",
        value_name = "SPEC",
        help = "item=<id>,order=<n>[,sets=<n>][,reps=<n>][,break=<secs>][,equipment=<text>]"
    )]
    pub exercises: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PlanReplace {
    pub id: Uuid,
    #[arg(long)]
    pub name: String,
    #[arg(long, value_name = "ID")]
    pub profile: Uuid,
    #[arg(
        long = "exercise",
        value_name = "SPEC",
        help = "item=<id>,order=<n>[,sets=<n>][,reps=<n>][,break=<secs>][,equipment=<text>]"
    )]
    pub exercises: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PlanList {
    #[arg(long, value_name = "ID")]
    pub profile: Option<Uuid>,
}

#[derive(Args, Debug)]
pub struct CompletionFile {
    #[arg(long, value_name = "PATH", help = "JSON array of completion records")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProfileFilter {
    #[arg(long, value_name = "ID")]
    pub profile: Uuid,
}

#[derive(Args, Debug)]
pub struct SyncExport {
    #[arg(long, value_name = "PATH", help = "Write to a file instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SyncImport {
    pub path: PathBuf,
}
