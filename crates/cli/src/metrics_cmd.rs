use crate::context::{AppContext, now, parse_stage};
use crate::output::{OutputFormat, print_json};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use leadflow_core::Stage;
use leadflow_core::stats::{FunnelReport, Period, PeriodPreset, ReportFilter, build_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Today,
    Week,
    Last7,
    Month,
}

impl From<PeriodArg> for PeriodPreset {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Today => PeriodPreset::Today,
            PeriodArg::Week => PeriodPreset::ThisWeek,
            PeriodArg::Last7 => PeriodPreset::Last7Days,
            PeriodArg::Month => PeriodPreset::ThisMonth,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct MetricsArgs {
    /// Preset period (ignored when --from/--to are given)
    #[arg(long, value_enum, default_value = "month")]
    pub period: PeriodArg,
    /// Custom period start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,
    /// Custom period end, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long, value_parser = parse_stage)]
    pub stage: Option<Stage>,
    /// Include the per-day series
    #[arg(long)]
    pub daily: bool,
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl MetricsArgs {
    fn period(&self, today: NaiveDate) -> Result<Period> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok(Period::new(from, to)),
            (None, None) => Ok(Period::preset(self.period.into(), today)),
            _ => bail!("--from and --to must be given together"),
        }
    }

    fn filter(&self) -> ReportFilter {
        ReportFilter {
            course: self.course.clone(),
            owner: self.owner.clone(),
            stage: self.stage,
        }
    }
}

pub fn run(args: MetricsArgs, ctx: &AppContext, user: Option<&str>) -> Result<()> {
    ctx.login(user)?;
    let today = now().date();
    let period = args.period(today)?;
    let leads = ctx.store.leads.load().context("Failed to load leads")?;
    let events = ctx
        .store
        .interactions
        .load()
        .context("Failed to load follow-ups")?;
    let report = build_report(&leads, &events, period, &args.filter());

    match args.format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_report(&report, args.daily);
            Ok(())
        }
    }
}

fn print_report(report: &FunnelReport, daily: bool) {
    println!(
        "Period {} .. {}",
        report.period.from.format("%Y-%m-%d"),
        report.period.to.format("%Y-%m-%d")
    );
    println!();
    println!("  New leads    {}", report.new_leads);
    println!("  Won          {}", report.won_in_period);
    println!("  Follow-ups   {}", report.events_in_period);
    println!("  Conversion   {:.1}%", report.conversion_percent());

    println!();
    println!("Funnel (current):");
    for (stage, count) in &report.stage_counts {
        println!("  {:<32} {:>5}", stage.label(), count);
    }

    if !report.by_course.is_empty() {
        println!();
        println!("{:<32} {:>5} {:>10} {:>5}", "COURSE", "NEW", "FOLLOW-UPS", "WON");
        for row in &report.by_course {
            let course = if row.course.is_empty() {
                "(none)"
            } else {
                row.course.as_str()
            };
            println!(
                "{:<32} {:>5} {:>10} {:>5}",
                course, row.new_leads, row.events, row.won
            );
        }
    }

    if daily {
        println!();
        println!("{:<10} {:>5} {:>10} {:>5}", "DATE", "NEW", "FOLLOW-UPS", "WON");
        for point in &report.daily {
            println!(
                "{:<10} {:>5} {:>10} {:>5}",
                point.date.format("%Y-%m-%d").to_string(),
                point.new_leads,
                point.events,
                point.won
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> MetricsArgs {
        MetricsArgs {
            period: PeriodArg::Month,
            from: None,
            to: None,
            course: None,
            owner: None,
            stage: None,
            daily: false,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn custom_range_overrides_preset() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        let mut custom = args();
        custom.from = NaiveDate::from_ymd_opt(2026, 9, 1);
        custom.to = NaiveDate::from_ymd_opt(2026, 9, 30);
        let period = custom.period(today).expect("period");
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2026, 9, 1).expect("date"));
        assert_eq!(period.to, NaiveDate::from_ymd_opt(2026, 9, 30).expect("date"));
    }

    #[test]
    fn preset_month_covers_the_calendar_month() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        let period = args().period(today).expect("period");
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2026, 10, 1).expect("date"));
        assert_eq!(period.to, NaiveDate::from_ymd_opt(2026, 10, 31).expect("date"));
    }
}
