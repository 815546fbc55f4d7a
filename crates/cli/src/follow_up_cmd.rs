use crate::context::{AppContext, now, parse_stage};
use crate::output::{OutputFormat, date_or_dash, expect_applied, or_dash, print_json, truncate};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use leadflow_core::outreach::{compose, render_template, template_for, whatsapp_link};
use leadflow_core::query::{due_on, find};
use leadflow_core::{FollowUp, Lead, Stage};
use leadflow_local_store::record_follow_up;

#[derive(Debug, Clone, Args)]
pub struct FollowUpArgs {
    #[command(subcommand)]
    pub action: FollowUpAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum FollowUpAction {
    /// Leads whose next action falls on a date
    Due {
        /// Day to check (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only leads owned by the logged-in user
        #[arg(long)]
        mine: bool,
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Follow-up history of one lead, oldest first
    History {
        id: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Render stage templates for a lead, with a chat link
    Templates(TemplateArgs),
    /// Log a follow-up and update the lead
    Record(RecordArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    pub id: String,
    /// Stages whose templates to use (defaults to the lead's stage)
    #[arg(long = "template", value_parser = parse_stage)]
    pub templates: Vec<Stage>,
    /// Value for the {fecha_limite} placeholder
    #[arg(long, default_value = "")]
    pub deadline: String,
}

#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    pub id: String,
    /// Message text, appended after any rendered templates
    #[arg(long, short)]
    pub message: Option<String>,
    /// Stage templates to render into the message
    #[arg(long = "template", value_parser = parse_stage)]
    pub templates: Vec<Stage>,
    /// Value for the {fecha_limite} placeholder
    #[arg(long, default_value = "")]
    pub deadline: String,
    /// Move the lead to this stage
    #[arg(long, value_parser = parse_stage)]
    pub stage: Option<Stage>,
    /// Next action date (YYYY-MM-DD)
    #[arg(long)]
    pub next_action_on: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    pub next_action: String,
    /// Channel used (defaults to the configured follow-up channel)
    #[arg(long)]
    pub channel: Option<String>,
    #[arg(long, default_value = "Enviado")]
    pub status: String,
    /// Name logged as "attended by" (defaults to the logged-in user)
    #[arg(long)]
    pub operator: Option<String>,
    /// Calendar day being worked (defaults to today)
    #[arg(long)]
    pub worked_on: Option<NaiveDate>,
    /// Keep the next action even when it falls on the day being worked
    #[arg(long)]
    pub keep_action: bool,
}

pub fn run(args: FollowUpArgs, ctx: &AppContext, user: Option<&str>) -> Result<()> {
    let operator = ctx.login(user)?;
    match args.action {
        FollowUpAction::Due {
            date,
            mine,
            search,
            format,
        } => {
            let owner = mine.then_some(operator.display_name.as_str());
            run_due(ctx, date, owner, search.as_deref(), format)
        }
        FollowUpAction::History { id, format } => run_history(ctx, &id, format),
        FollowUpAction::Templates(templates) => run_templates(ctx, &templates),
        FollowUpAction::Record(record) => run_record(ctx, &operator.display_name, record),
    }
}

fn load_lead(ctx: &AppContext, id: &str) -> Result<Lead> {
    let leads = ctx
        .store
        .leads
        .load()
        .context("Failed to load leads")?;
    match find(&leads, id) {
        Some(lead) => Ok(lead.clone()),
        None => bail!("lead {id} not found"),
    }
}

fn run_due(
    ctx: &AppContext,
    date: Option<NaiveDate>,
    owner: Option<&str>,
    search: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let day = date.unwrap_or_else(|| now().date());
    let leads = ctx
        .store
        .leads
        .load()
        .context("Failed to load leads")?;
    let due = due_on(&leads, day, owner, search);

    if format == OutputFormat::Json {
        return print_json(&due);
    }
    if due.is_empty() {
        println!("Nothing scheduled for {}.", day.format("%Y-%m-%d"));
        return Ok(());
    }

    println!("Scheduled for {} ({}):", day.format("%Y-%m-%d"), due.len());
    for lead in due {
        println!(
            "  {:<6} {:<40} {:<12} {}",
            lead.id,
            truncate(&lead.label(), 40),
            lead.stage.as_str(),
            or_dash(&lead.next_action)
        );
    }
    Ok(())
}

fn run_history(ctx: &AppContext, id: &str, format: OutputFormat) -> Result<()> {
    let events = ctx
        .store
        .interactions
        .history(id.trim())
        .context("Failed to load follow-ups")?;

    if format == OutputFormat::Json {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No follow-ups recorded for lead {id}.");
        return Ok(());
    }
    for event in &events {
        println!(
            "{:<10} {}  {:<12} next {:<10}  {:<14} {:<10} {:<10}",
            date_or_dash(event.date),
            event.time.format("%H:%M:%S"),
            event.stage.as_str(),
            date_or_dash(event.next_action_on),
            or_dash(&event.message_status),
            or_dash(&event.channel),
            or_dash(&event.operator)
        );
        if !event.notes.trim().is_empty() {
            for line in event.notes.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

/// Render the chosen templates against `lead`, defaulting to its stage.
fn render(lead: &Lead, stages: &[Stage], deadline: &str) -> Vec<String> {
    let stages = if stages.is_empty() {
        vec![lead.stage]
    } else {
        stages.to_vec()
    };
    stages
        .into_iter()
        .map(|stage| render_template(template_for(stage).body, lead, deadline))
        .collect()
}

fn run_templates(ctx: &AppContext, args: &TemplateArgs) -> Result<()> {
    let lead = load_lead(ctx, &args.id)?;
    let stages = if args.templates.is_empty() {
        vec![lead.stage]
    } else {
        args.templates.clone()
    };

    println!("{}", lead.label());
    for stage in &stages {
        let template = template_for(*stage);
        println!();
        println!(
            "[{}] {} · {}",
            stage.label(),
            template.kind,
            template.channel
        );
        println!("{}", render_template(template.body, &lead, &args.deadline));
    }

    let message = compose(&render(&lead, &stages, &args.deadline));
    println!();
    println!("{}", whatsapp_link(lead.contact_phone(), &message));
    Ok(())
}

fn run_record(ctx: &AppContext, operator: &str, args: RecordArgs) -> Result<()> {
    let lead = load_lead(ctx, &args.id)?;

    let mut parts = if args.templates.is_empty() {
        Vec::new()
    } else {
        render(&lead, &args.templates, &args.deadline)
    };
    if let Some(message) = &args.message {
        parts.push(message.clone());
    }

    let today = now().date();
    let mut follow_up = FollowUp::new(
        args.operator.as_deref().unwrap_or(operator),
        &compose(&parts),
    );
    follow_up.stage = args.stage;
    follow_up.next_action_on = args.next_action_on;
    follow_up.next_action = args.next_action;
    follow_up.channel = args
        .channel
        .unwrap_or_else(|| ctx.config.follow_up.default_channel.clone());
    follow_up.message_status = args.status;
    follow_up.message_kind = ctx.config.follow_up.message_kind.clone();
    follow_up.closes_action_on = (!args.keep_action).then(|| args.worked_on.unwrap_or(today));

    let outcome = record_follow_up(
        &ctx.store.leads,
        &ctx.store.interactions,
        &lead.id,
        &follow_up,
        &ctx.catalog(),
        now(),
    )
    .context("Failed to record follow-up")?;
    let recorded = expect_applied(outcome, "follow-up")?;

    println!(
        "Logged follow-up {} for lead {} ({}), stage {}, next action {}",
        recorded.event.id,
        recorded.lead.id,
        recorded.lead.full_name(),
        recorded.lead.stage.as_str(),
        date_or_dash(recorded.lead.next_action_on)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::testing;

    #[test]
    fn render_defaults_to_the_lead_stage() {
        let lead = testing::lead("1", "Ana");
        let rendered = render(&lead, &[], "");
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].starts_with("Hola Ana, gracias por tu interés en Inglés."));
    }

    #[test]
    fn render_fills_deadline_for_each_template() {
        let lead = testing::lead("1", "Ana");
        let rendered = render(&lead, &[Stage::Nurturing, Stage::Won], "30 de octubre");
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("30 de octubre"));
        assert!(rendered[1].contains("¡Bienvenido(a), Ana!"));
    }
}
