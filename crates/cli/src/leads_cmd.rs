use crate::context::{AppContext, now, parse_stage};
use crate::output::{OutputFormat, date_or_dash, expect_applied, or_dash, print_json, truncate};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use leadflow_core::interaction::history_for;
use leadflow_core::query::{LeadFilter, find, paginate};
use leadflow_core::{Lead, LeadDraft, LeadPatch, Operator, Stage};
use leadflow_local_store::export_csv;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct LeadsArgs {
    #[command(subcommand)]
    pub action: LeadsAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum LeadsAction {
    /// List leads, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Leads per page
        #[arg(long, default_value_t = 25)]
        page_size: usize,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show one lead with its follow-up history
    Show {
        id: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Register a new lead owned by the logged-in user
    Add(AddArgs),
    /// Edit fields of an existing lead
    Edit(EditArgs),
    /// Write the filtered leads as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Search name, surname, gender, email and phones
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long = "stage", value_parser = parse_stage)]
    pub stages: Vec<Stage>,
    #[arg(long = "course")]
    pub courses: Vec<String>,
    #[arg(long = "owner")]
    pub owners: Vec<String>,
    #[arg(long = "gender")]
    pub genders: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> LeadFilter {
        LeadFilter {
            search: self.search.clone(),
            stages: self.stages.clone(),
            courses: self.courses.clone(),
            owners: self.owners.clone(),
            genders: self.genders.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub surname: String,
    #[arg(long, default_value = "")]
    pub gender: String,
    /// Free text: "30", "25-35", "40+", "29 años"
    #[arg(long, default_value = "")]
    pub age: String,
    #[arg(long, default_value = "")]
    pub mobile: String,
    #[arg(long, default_value = "")]
    pub landline: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub course: String,
    #[arg(long, default_value = "")]
    pub channel: String,
    #[arg(long, value_parser = parse_stage, default_value = "Awareness")]
    pub stage: Stage,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub landline: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub channel: Option<String>,
    #[arg(long, value_parser = parse_stage)]
    pub stage: Option<Stage>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
    /// Next action date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_next_action")]
    pub next_action_on: Option<NaiveDate>,
    #[arg(long)]
    pub next_action: Option<String>,
    /// Remove the scheduled next action
    #[arg(long)]
    pub clear_next_action: bool,
    #[arg(long)]
    pub close_probability: Option<String>,
    #[arg(long)]
    pub estimated_amount: Option<String>,
    #[arg(long)]
    pub loss_reason: Option<String>,
}

impl EditArgs {
    fn to_patch(&self) -> LeadPatch {
        let (next_action_on, next_action) = if self.clear_next_action {
            (Some(None), Some(String::new()))
        } else {
            (self.next_action_on.map(Some), self.next_action.clone())
        };
        LeadPatch {
            name: self.name.clone(),
            surname: self.surname.clone(),
            gender: self.gender.clone(),
            age: self.age.clone(),
            mobile: self.mobile.clone(),
            landline: self.landline.clone(),
            email: self.email.clone(),
            course: self.course.clone(),
            channel: self.channel.clone(),
            stage: self.stage,
            notes: self.notes.clone(),
            owner: self.owner.clone(),
            next_action_on,
            next_action,
            last_contact_on: None,
            close_probability: self.close_probability.clone(),
            estimated_amount: self.estimated_amount.clone(),
            loss_reason: self.loss_reason.clone(),
        }
    }
}

pub fn run(args: LeadsArgs, ctx: &AppContext, user: Option<&str>) -> Result<()> {
    match args.action {
        LeadsAction::List {
            filter,
            page_size,
            page,
            format,
        } => {
            ctx.login(user)?;
            run_list(ctx, &filter, page_size, page, format)
        }
        LeadsAction::Show { id, format } => {
            ctx.login(user)?;
            run_show(ctx, &id, format)
        }
        LeadsAction::Add(add) => {
            let operator = ctx.login(user)?;
            run_add(ctx, &operator, add)
        }
        LeadsAction::Edit(edit) => {
            ctx.login(user)?;
            run_edit(ctx, &edit)
        }
        LeadsAction::Export { filter, output } => {
            ctx.login(user)?;
            run_export(ctx, &filter, output)
        }
    }
}

fn load_leads(ctx: &AppContext) -> Result<Vec<Lead>> {
    ctx.store
        .leads
        .load()
        .context("Failed to load leads")
}

fn run_list(
    ctx: &AppContext,
    filter: &FilterArgs,
    page_size: usize,
    page: usize,
    format: OutputFormat,
) -> Result<()> {
    let leads = load_leads(ctx)?;
    let matching = filter.to_filter().apply(&leads);
    let (page, rows) = paginate(&matching, page_size, page.saturating_sub(1));

    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No leads match.");
        return Ok(());
    }

    println!(
        "{:<6} {:<26} {:<12} {:<24} {:<12} {:<11} {:>5}",
        "ID", "NAME", "STAGE", "COURSE", "OWNER", "NEXT", "SCORE"
    );
    for lead in rows {
        println!(
            "{:<6} {:<26} {:<12} {:<24} {:<12} {:<11} {:>5}",
            lead.id,
            truncate(&lead.full_name(), 26),
            lead.stage.as_str(),
            truncate(or_dash(&lead.course), 24),
            truncate(or_dash(&lead.owner), 12),
            date_or_dash(lead.next_action_on),
            lead.score
        );
    }
    println!();
    println!(
        "Page {}/{} ({} lead(s))",
        page.index + 1,
        page.total_pages,
        page.total_items
    );
    Ok(())
}

fn run_show(ctx: &AppContext, id: &str, format: OutputFormat) -> Result<()> {
    let leads = load_leads(ctx)?;
    let Some(lead) = find(&leads, id) else {
        bail!("lead {id} not found");
    };
    let events = ctx
        .store
        .interactions
        .load()
        .context("Failed to load follow-ups")?;
    let history = history_for(&events, &lead.id);

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "lead": lead, "history": history }));
    }

    println!("{}", lead.label());
    println!();
    println!("  id            {}", lead.id);
    println!(
        "  registered    {} {}",
        date_or_dash(lead.registered_on),
        lead.registered_at.format("%H:%M:%S")
    );
    println!("  stage         {} ({})", lead.stage.as_str(), lead.stage.label());
    println!("  stage since   {}", date_or_dash(lead.stage_entered_on));
    println!("  score         {}", lead.score);
    println!("  age           {}", or_dash(&lead.age));
    println!("  mobile        {}", or_dash(&lead.mobile));
    println!("  landline      {}", or_dash(&lead.landline));
    println!("  email         {}", or_dash(&lead.email));
    println!("  course        {}", or_dash(&lead.course));
    println!("  channel       {}", or_dash(&lead.channel));
    println!("  owner         {}", or_dash(&lead.owner));
    println!("  last contact  {}", date_or_dash(lead.last_contact_on));
    println!(
        "  next action   {} {}",
        date_or_dash(lead.next_action_on),
        lead.next_action
    );
    println!("  notes         {}", or_dash(&lead.notes));
    for (column, value) in &lead.extra {
        println!("  {column:<13} {}", or_dash(value));
    }

    println!();
    if history.is_empty() {
        println!("No follow-ups recorded.");
    } else {
        println!("History ({}):", history.len());
        for event in history {
            println!(
                "  {:<10} {}  {:<12} {:<14} {:<10} {}",
                date_or_dash(event.date),
                event.time.format("%H:%M"),
                event.stage.as_str(),
                or_dash(&event.message_status),
                or_dash(&event.operator),
                truncate(&event.notes.replace('\n', " "), 60)
            );
        }
    }
    Ok(())
}

fn run_add(ctx: &AppContext, operator: &Operator, add: AddArgs) -> Result<()> {
    let draft = LeadDraft {
        name: add.name,
        surname: add.surname,
        gender: add.gender,
        age: add.age,
        mobile: add.mobile,
        landline: add.landline,
        email: add.email,
        course: add.course,
        channel: add.channel,
        stage: add.stage,
        notes: add.notes,
    };
    let outcome = ctx
        .store
        .leads
        .register(draft, &operator.display_name, &ctx.catalog(), now())
        .context("Failed to save lead")?;
    let lead = expect_applied(outcome, "lead")?;
    println!("Registered lead {} ({}), score {}", lead.id, lead.full_name(), lead.score);
    Ok(())
}

fn run_edit(ctx: &AppContext, edit: &EditArgs) -> Result<()> {
    let patch = edit.to_patch();
    if patch.is_empty() {
        bail!("nothing to change (pass at least one field option)");
    }
    let outcome = ctx
        .store
        .leads
        .update(&edit.id, patch, &ctx.catalog(), now())
        .context("Failed to save lead")?;
    let lead = expect_applied(outcome, "edit")?;
    println!(
        "Updated lead {} ({}), stage {}, score {}",
        lead.id,
        lead.full_name(),
        lead.stage.as_str(),
        lead.score
    );
    Ok(())
}

fn run_export(ctx: &AppContext, filter: &FilterArgs, output: Option<PathBuf>) -> Result<()> {
    let leads = load_leads(ctx)?;
    let matching = filter.to_filter().apply(&leads);
    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let count = export_csv(file, matching).context("Failed to export leads")?;
            eprintln!("Exported {count} lead(s) to {}", path.display());
        }
        None => {
            export_csv(std::io::stdout().lock(), matching).context("Failed to export leads")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(id: &str) -> EditArgs {
        EditArgs {
            id: id.to_string(),
            name: None,
            surname: None,
            gender: None,
            age: None,
            mobile: None,
            landline: None,
            email: None,
            course: None,
            channel: None,
            stage: None,
            notes: None,
            owner: None,
            next_action_on: None,
            next_action: None,
            clear_next_action: false,
            close_probability: None,
            estimated_amount: None,
            loss_reason: None,
        }
    }

    #[test]
    fn empty_edit_produces_empty_patch() {
        assert!(edit("1").to_patch().is_empty());
    }

    #[test]
    fn clearing_next_action_resets_date_and_text() {
        let mut args = edit("1");
        args.clear_next_action = true;
        let patch = args.to_patch();
        assert_eq!(patch.next_action_on, Some(None));
        assert_eq!(patch.next_action, Some(String::new()));
    }

    #[test]
    fn next_action_date_is_set() {
        let mut args = edit("1");
        let day = NaiveDate::from_ymd_opt(2026, 11, 2).expect("date");
        args.next_action_on = Some(day);
        assert_eq!(args.to_patch().next_action_on, Some(Some(day)));
    }
}
