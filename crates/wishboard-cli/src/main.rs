use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use wishboard_contracts::commands::{parse_command, BoardCommand, BOARD_HELP};
use wishboard_contracts::events::{EventPayload, EventWriter, EVENTS_FILE_NAME};
use wishboard_contracts::store::{NewWish, WishPatch, WishStore, STORE_FILE_NAME};
use wishboard_contracts::wish::{Category, Importance, Wish};
use wishboard_engine::WishEngine;

#[derive(Debug, Parser)]
#[command(name = "wishboard", version, about = "Personal vision board for savings goals")]
struct Cli {
    /// Board directory holding wishes.json and events.jsonl.
    #[arg(long, global = true, default_value = ".wishboard")]
    board: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a wish; its image is resolved before anything is saved.
    Add(AddArgs),
    /// Show the board, optionally filtered by category.
    List(ListArgs),
    /// Add savings toward a wish.
    Save(SaveArgs),
    /// Mark a wish achieved. One-way.
    Complete(IdArgs),
    /// Delete a wish after confirmation.
    Remove(RemoveArgs),
    /// Edit wish fields.
    Edit(EditArgs),
    /// Generate (or regenerate) the wish's 3-step action plan.
    Plan(IdArgs),
    /// Regenerate the wish image with a fresh variant.
    Regenerate(RegenerateArgs),
    /// Interactive board shell.
    Board,
}

#[derive(Debug, Parser)]
struct AddArgs {
    title: String,
    amount: f64,
    #[arg(long, default_value = "")]
    description: String,
    /// Custom image prompt; defaults to the description, then the title.
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long, default_value = "otros")]
    category: Category,
    #[arg(long)]
    importance: Option<Importance>,
    /// Target date, YYYY-MM-DD.
    #[arg(long)]
    date: Option<String>,
    /// Also generate an action plan for the new wish.
    #[arg(long)]
    plan: bool,
}

#[derive(Debug, Parser)]
struct ListArgs {
    #[arg(long)]
    category: Option<Category>,
}

#[derive(Debug, Parser)]
struct SaveArgs {
    id: String,
    amount: f64,
}

#[derive(Debug, Parser)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Parser)]
struct RemoveArgs {
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Parser)]
struct EditArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    amount: Option<f64>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    importance: Option<Importance>,
    #[arg(long)]
    date: Option<String>,
    /// Regenerate the image as part of the edit.
    #[arg(long)]
    regenerate_image: bool,
    /// Custom prompt for the regenerated image.
    #[arg(long)]
    prompt: Option<String>,
}

#[derive(Debug, Parser)]
struct RegenerateArgs {
    id: String,
    #[arg(long)]
    prompt: Option<String>,
}

struct BoardContext {
    store: WishStore,
    engine: WishEngine,
    events: EventWriter,
}

impl BoardContext {
    fn open(dir: &Path) -> Self {
        let store = WishStore::load(dir.join(STORE_FILE_NAME));
        let events = EventWriter::new(dir.join(EVENTS_FILE_NAME), store.board_id.clone());
        let engine = WishEngine::new(events.clone());
        Self {
            store,
            engine,
            events,
        }
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("wishboard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut ctx = BoardContext::open(&cli.board);
    match cli.command {
        Command::Add(args) => run_add(&mut ctx, args)?,
        Command::List(args) => list_board(&ctx.store, args.category),
        Command::Save(args) => run_save(&mut ctx, &args.id, args.amount)?,
        Command::Complete(args) => run_complete(&mut ctx, &args.id)?,
        Command::Remove(args) => run_remove(&mut ctx, &args.id, args.yes)?,
        Command::Edit(args) => run_edit(&mut ctx, args)?,
        Command::Plan(args) => run_plan(&mut ctx, &args.id)?,
        Command::Regenerate(args) => run_regenerate(&mut ctx, &args.id, args.prompt)?,
        Command::Board => run_board(&mut ctx)?,
    }
    Ok(0)
}

fn run_add(ctx: &mut BoardContext, args: AddArgs) -> Result<()> {
    let params = NewWish {
        title: args.title,
        description: args.description,
        target_amount: args.amount,
        category: args.category,
        importance: args.importance,
        target_date: args.date,
        action_plan: None,
    };
    let wish = create_wish(ctx, params, args.prompt, args.plan)?;
    println!("Created:");
    print_card(&wish);
    Ok(())
}

/// Shared create path for the subcommand and the board shell. Validation
/// happens before any network call; the image is resolved before the wish is
/// persisted.
fn create_wish(
    ctx: &mut BoardContext,
    mut params: NewWish,
    prompt: Option<String>,
    with_plan: bool,
) -> Result<Wish> {
    if params.title.trim().is_empty() {
        bail!("a wish needs a title");
    }
    if !(params.target_amount > 0.0) {
        bail!("the target amount must be positive");
    }

    let image_prompt = image_prompt_for(prompt.as_deref(), &params.description, &params.title);
    let image_url = ctx.engine.generate_wish_image(&image_prompt, false);
    if with_plan {
        params.action_plan = Some(
            ctx.engine
                .generate_action_plan(&params.title, params.target_amount),
        );
    }

    let wish = ctx.store.create(params, image_url);
    ctx.store.save()?;
    ctx.events.emit(
        "wish_created",
        payload(json!({
            "wish_id": wish.id,
            "title": wish.title,
            "category": wish.category.label(),
            "target_amount": wish.target_amount,
        })),
    )?;
    Ok(wish)
}

fn run_save(ctx: &mut BoardContext, id_or_prefix: &str, amount: f64) -> Result<()> {
    if !(amount > 0.0) {
        bail!("the amount must be positive");
    }
    let id = ctx.store.find(id_or_prefix)?.id.clone();
    let Some(wish) = ctx.store.add_savings(&id, amount).cloned() else {
        bail!("no wish matches '{id_or_prefix}'");
    };
    ctx.store.save()?;
    ctx.events.emit(
        "savings_added",
        payload(json!({
            "wish_id": wish.id,
            "amount": amount,
            "saved_amount": wish.saved_amount,
        })),
    )?;

    println!(
        "{}  {} {}%  ${} / ${}",
        wish.title,
        render_progress(wish.progress_pct()),
        wish.progress_pct().round(),
        format_amount(wish.saved_amount),
        format_amount(wish.target_amount),
    );
    if wish.is_funded() && !wish.is_completed {
        println!(
            "Goal reached. Run `wishboard complete {}` to celebrate it.",
            short(&wish.id)
        );
    }
    Ok(())
}

fn run_complete(ctx: &mut BoardContext, id_or_prefix: &str) -> Result<()> {
    let found = ctx.store.find(id_or_prefix)?;
    if found.is_completed {
        println!("'{}' is already completed.", found.title);
        return Ok(());
    }
    let id = found.id.clone();
    let Some(wish) = ctx.store.complete(&id).cloned() else {
        bail!("no wish matches '{id_or_prefix}'");
    };
    ctx.store.save()?;
    ctx.events.emit(
        "wish_completed",
        payload(json!({ "wish_id": wish.id, "title": wish.title })),
    )?;

    println!("★ ¡META LOGRADA! ★");
    println!("  {}", wish.title);
    println!(
        "  ${} saved toward ${}.",
        format_amount(wish.saved_amount),
        format_amount(wish.target_amount)
    );
    Ok(())
}

fn run_remove(ctx: &mut BoardContext, id_or_prefix: &str, assume_yes: bool) -> Result<()> {
    let found = ctx.store.find(id_or_prefix)?;
    let id = found.id.clone();
    let title = found.title.clone();
    if !assume_yes && !confirm(&format!("Delete '{title}'? This cannot be undone."))? {
        println!("Cancelled.");
        return Ok(());
    }
    ctx.store.remove(&id);
    ctx.store.save()?;
    ctx.events.emit(
        "wish_removed",
        payload(json!({ "wish_id": id, "title": title })),
    )?;
    println!("Removed '{title}'.");
    Ok(())
}

fn run_edit(ctx: &mut BoardContext, args: EditArgs) -> Result<()> {
    let found = ctx.store.find(&args.id)?;
    let id = found.id.clone();

    let mut patch = WishPatch {
        title: args.title,
        description: args.description,
        target_amount: args.amount,
        category: args.category,
        importance: args.importance,
        target_date: args.date,
        ..WishPatch::default()
    };
    if let Some(amount) = patch.target_amount {
        if !(amount > 0.0) {
            bail!("the target amount must be positive");
        }
    }
    if args.regenerate_image {
        let current = ctx.store.get(&id).cloned();
        let (description, title) = current
            .map(|wish| (wish.description, wish.title))
            .unwrap_or_default();
        let image_prompt = image_prompt_for(
            args.prompt.as_deref(),
            patch.description.as_deref().unwrap_or(&description),
            patch.title.as_deref().unwrap_or(&title),
        );
        patch.image_url = Some(ctx.engine.generate_wish_image(&image_prompt, true));
    }

    let Some(wish) = ctx.store.update(&id, patch).cloned() else {
        bail!("no wish matches '{}'", args.id);
    };
    ctx.store.save()?;
    ctx.events.emit(
        "wish_updated",
        payload(json!({ "wish_id": wish.id, "title": wish.title })),
    )?;
    println!("Updated:");
    print_card(&wish);
    Ok(())
}

fn run_plan(ctx: &mut BoardContext, id_or_prefix: &str) -> Result<()> {
    let found = ctx.store.find(id_or_prefix)?;
    let id = found.id.clone();
    let title = found.title.clone();
    let target_amount = found.target_amount;

    let plan = ctx.engine.generate_action_plan(&title, target_amount);
    ctx.store.update(
        &id,
        WishPatch {
            action_plan: Some(plan.clone()),
            ..WishPatch::default()
        },
    );
    ctx.store.save()?;
    ctx.events
        .emit("plan_attached", payload(json!({ "wish_id": id })))?;

    println!("Plan for '{title}':");
    println!("{plan}");
    Ok(())
}

fn run_regenerate(
    ctx: &mut BoardContext,
    id_or_prefix: &str,
    prompt: Option<String>,
) -> Result<()> {
    let found = ctx.store.find(id_or_prefix)?;
    let id = found.id.clone();
    let description = found.description.clone();
    let title = found.title.clone();

    let image_prompt = image_prompt_for(prompt.as_deref(), &description, &title);
    let image_url = ctx.engine.generate_wish_image(&image_prompt, true);
    ctx.store.update(
        &id,
        WishPatch {
            image_url: Some(image_url.clone()),
            ..WishPatch::default()
        },
    );
    ctx.store.save()?;
    ctx.events
        .emit("image_regenerated", payload(json!({ "wish_id": id })))?;

    println!("New image for '{title}': {}", describe_image(&image_url));
    Ok(())
}

fn run_board(ctx: &mut BoardContext) -> Result<()> {
    println!("Wishboard. Type /help for commands, /quit to leave.");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\n', '\r']);

        let outcome = match parse_command(input) {
            BoardCommand::Noop => Ok(()),
            BoardCommand::Help => {
                for entry in BOARD_HELP {
                    println!("{entry}");
                }
                Ok(())
            }
            BoardCommand::Quit => break,
            BoardCommand::List { category } => {
                list_board(&ctx.store, category);
                Ok(())
            }
            BoardCommand::Add {
                title,
                amount,
                category,
            } => create_wish(
                ctx,
                NewWish {
                    title,
                    target_amount: amount,
                    category: category.unwrap_or_default(),
                    ..NewWish::default()
                },
                None,
                false,
            )
            .map(|wish| print_card(&wish)),
            BoardCommand::Save { id, amount } => run_save(ctx, &id, amount),
            BoardCommand::Complete { id } => run_complete(ctx, &id),
            BoardCommand::Remove { id } => run_remove(ctx, &id, false),
            BoardCommand::Plan { id } => run_plan(ctx, &id),
            BoardCommand::Regenerate { id, prompt } => run_regenerate(ctx, &id, prompt),
            BoardCommand::Invalid { message } => {
                println!("{message}");
                Ok(())
            }
            BoardCommand::Unknown { input } => {
                println!("Unrecognized: '{input}'. Try /help.");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            println!("error: {err:#}");
        }
    }
    Ok(())
}

fn list_board(store: &WishStore, category: Option<Category>) {
    if store.is_empty() {
        println!("The board is empty. Create your first wish with `wishboard add`.");
        return;
    }

    let wishes: Vec<&Wish> = match category {
        Some(category) => store.by_category(category).collect(),
        None => store.wishes().collect(),
    };
    if wishes.is_empty() {
        println!(
            "No wishes in {}.",
            category.map(|c| c.label()).unwrap_or("this category")
        );
        return;
    }
    for wish in &wishes {
        print_card(wish);
    }

    let totals = store.totals();
    println!(
        "board: ${} / ${} ({}%) across {} wishes",
        format_amount(totals.total_saved),
        format_amount(totals.total_target),
        totals.pct.round(),
        store.len(),
    );
}

fn print_card(wish: &Wish) {
    let marker = if wish.is_completed { "✔" } else { "○" };
    let importance = wish
        .importance
        .map(|value| format!(" · {value}"))
        .unwrap_or_default();
    println!(
        "{marker} {}  [{}{importance}]  ({})",
        wish.title,
        wish.category,
        short(&wish.id)
    );
    println!(
        "   {} {}%  ${} / ${}",
        render_progress(wish.progress_pct()),
        wish.progress_pct().round(),
        format_amount(wish.saved_amount),
        format_amount(wish.target_amount),
    );
    let mut details: Vec<String> = Vec::new();
    if let Some(date) = &wish.target_date {
        details.push(format!("target {date}"));
    }
    if wish.action_plan.is_some() {
        details.push("plan ✓".to_string());
    }
    if !wish.image_url.is_empty() {
        details.push(format!("image {}", describe_image(&wish.image_url)));
    }
    if !details.is_empty() {
        println!("   {}", details.join(" · "));
    }
}

fn render_progress(pct: f64) -> String {
    const CELLS: usize = 20;
    let filled = ((pct / 100.0) * CELLS as f64).round() as usize;
    let filled = filled.min(CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(CELLS - filled))
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn short(id: &str) -> &str {
    &id[..id.len().min(8)]
}

fn describe_image(image_url: &str) -> String {
    match image_url.split_once(';') {
        // Data URIs are megabytes of base64; show the shape, not the bytes.
        Some((mime, payload)) if mime.starts_with("data:") => {
            format!("{} ({} bytes inline)", &mime["data:".len()..], payload.len())
        }
        _ => image_url.to_string(),
    }
}

fn image_prompt_for(prompt: Option<&str>, description: &str, title: &str) -> String {
    for candidate in [prompt.unwrap_or(""), description, title] {
        if !candidate.trim().is_empty() {
            return candidate.trim().to_string();
        }
    }
    String::new()
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(
        line.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    ))
}

fn payload(value: Value) -> EventPayload {
    value.as_object().cloned().unwrap_or_else(Map::new)
}

#[cfg(test)]
mod tests {
    use super::{format_amount, image_prompt_for, render_progress};

    #[test]
    fn image_prompt_prefers_prompt_then_description_then_title() {
        assert_eq!(
            image_prompt_for(Some("mansión futurista"), "una casa", "Casa"),
            "mansión futurista"
        );
        assert_eq!(image_prompt_for(None, "una casa", "Casa"), "una casa");
        assert_eq!(image_prompt_for(Some("  "), "", "Casa"), "Casa");
        assert_eq!(image_prompt_for(None, "", ""), "");
    }

    #[test]
    fn progress_bar_spans_zero_to_full() {
        assert_eq!(render_progress(0.0), "░".repeat(20));
        assert_eq!(render_progress(100.0), "█".repeat(20));
        assert_eq!(render_progress(50.0), format!("{}{}", "█".repeat(10), "░".repeat(10)));
    }

    #[test]
    fn amounts_drop_trailing_zero_cents() {
        assert_eq!(format_amount(1000.0), "1000");
        assert_eq!(format_amount(1000.5), "1000.50");
    }
}
