use crate::infra::{load_call_export, load_store, parse_precision, parse_timeframe, window};
use callqa::analytics::scoring::views::LeaderboardRow;
use callqa::analytics::timeframe::parse_date;
use callqa::analytics::{
    AnalyticsService, CallAudit, CallId, DateRange, DurationReport, InMemoryStore, Precision,
    ScoreBand, Timeframe, ValidationReport,
};
use callqa::config::AppConfig;
use callqa::error::AppError;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct WindowArgs {
    /// Reporting window: 7d, 30d, 90d, 3m, yesterday, all or custom
    #[arg(long, value_parser = parse_timeframe)]
    pub(crate) timeframe: Option<Timeframe>,
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
}

impl WindowArgs {
    fn range(&self, default: Timeframe) -> DateRange {
        window(
            self.timeframe.unwrap_or(default),
            self.start_date,
            self.end_date,
        )
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ValidateArgs {
    /// JSON dataset snapshot (defaults to CALLQA_DATASET)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) window: WindowArgs,
    /// Score precision: exact (analysis) or rounded (display)
    #[arg(long, value_parser = parse_precision)]
    pub(crate) precision: Option<Precision>,
    /// Minimum calls an agent needs to enter the sample
    #[arg(long)]
    pub(crate) min_calls: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LeaderboardArgs {
    /// JSON dataset snapshot (defaults to CALLQA_DATASET)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) window: WindowArgs,
    /// Score precision: exact (analysis) or rounded (display)
    #[arg(long, value_parser = parse_precision)]
    pub(crate) precision: Option<Precision>,
    /// Minimum calls an agent needs to be ranked (defaults to CALLQA_MIN_AGENT_CALLS)
    #[arg(long)]
    pub(crate) min_calls: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AuditArgs {
    /// JSON dataset snapshot (defaults to CALLQA_DATASET)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Audit a single call and print its evidence
    #[arg(long)]
    pub(crate) call_id: Option<String>,
    /// Number of calls to audit, newest first
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,
    #[arg(long, default_value_t = 0)]
    pub(crate) offset: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DurationArgs {
    /// JSON dataset snapshot (defaults to CALLQA_DATASET)
    #[arg(long, conflicts_with = "calls_csv")]
    pub(crate) dataset: Option<PathBuf>,
    /// Call export CSV (id, agentId, startedAt, duration, outcome, isOnsiteCompleted)
    #[arg(long)]
    pub(crate) calls_csv: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) window: WindowArgs,
}

fn dataset_service(
    dataset: Option<PathBuf>,
    config: &AppConfig,
) -> Result<AnalyticsService<InMemoryStore>, AppError> {
    let path = dataset.or_else(|| config.dataset.clone());
    let store = load_store(path.as_deref())?;
    Ok(AnalyticsService::new(store, config.analysis))
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(min_calls) = args.min_calls {
        config.analysis.min_agent_calls = min_calls;
    }

    let service = dataset_service(args.dataset, &config)?;
    let range = args.window.range(Timeframe::ThreeMonths);
    let report = service.validation_report(&range, args.precision)?;
    render_validation(&report, config.analysis.min_agent_calls);
    Ok(())
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let min_calls = args.min_calls.unwrap_or(config.analysis.min_agent_calls);
    let precision = args.precision.unwrap_or(config.analysis.precision);

    let service = dataset_service(args.dataset, &config)?;
    let rows = service.leaderboard(
        &args.window.range(Timeframe::ThreeMonths),
        precision,
        min_calls,
    )?;
    render_leaderboard(&rows, min_calls);
    Ok(())
}

pub(crate) fn run_audit(args: AuditArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = dataset_service(args.dataset, &config)?;

    if let Some(call_id) = args.call_id {
        let audit = service.audit_call(&CallId(call_id))?;
        render_call_audit(&audit, true);
        return Ok(());
    }

    let page = service.audit_calls(args.limit, args.offset)?;
    println!(
        "Signal aggregation audit: {} of {} assessed calls (offset {})",
        page.data.len(),
        page.total,
        page.offset
    );
    if page.data.is_empty() {
        println!("No assessed calls found");
    }
    for audit in &page.data {
        render_call_audit(audit, false);
    }
    Ok(())
}

pub(crate) fn run_duration(args: DurationArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store: Arc<InMemoryStore> = match args.calls_csv.as_deref() {
        Some(path) => load_call_export(path)?,
        None => load_store(args.dataset.or_else(|| config.dataset.clone()).as_deref())?,
    };
    let service = AnalyticsService::new(store, config.analysis);
    let report = service.duration_report(&args.window.range(Timeframe::ThirtyDays))?;
    render_duration(&report);
    Ok(())
}

pub(crate) fn render_validation(report: &ValidationReport, min_calls: usize) {
    println!(
        "Score validation ({:?} precision, agents with >= {} calls)",
        report.precision, min_calls
    );
    println!(
        "Correlation r = {:.3} over {} agents ({:?})",
        report.correlation, report.sample_size, report.summary.strength
    );
    println!("Verdict: {}", report.summary.message);

    if !report.agents.is_empty() {
        println!("\nAgents");
        for agent in &report.agents {
            println!(
                "- {}: score {:.1} | win rate {:.1}% ({}/{} calls)",
                agent.name, agent.overall_score, agent.win_rate, agent.won_calls, agent.total_calls
            );
        }
    }

    println!("\nQuartiles");
    for stats in report.quartile_analysis.groups() {
        println!(
            "- {}: avg score {} | avg win rate {}% | {} agents",
            stats.range, stats.avg_score, stats.avg_win_rate, stats.sample_size
        );
    }

    println!("\nBusiness thresholds");
    for threshold in &report.business_thresholds {
        println!(
            "- {} (score >= {}): win rate {}% vs expected {}% over {} agents [{}]",
            threshold.description,
            threshold.min_score,
            threshold.actual_win_rate,
            threshold.expected_win_rate,
            threshold.sample_size,
            if threshold.meets_expectation {
                "met"
            } else {
                "missed"
            }
        );
    }

    if report.trend_analysis.is_empty() {
        println!("\nMonthly trend: no assessed calls");
    } else {
        println!("\nMonthly trend");
        for point in &report.trend_analysis {
            println!(
                "- {}: avg score {} | win rate {}% | {} calls",
                point.month, point.avg_score, point.win_rate, point.sample_size
            );
        }
    }
}

pub(crate) fn render_leaderboard(rows: &[LeaderboardRow], min_calls: usize) {
    println!("Agent leaderboard (agents with >= {} calls)", min_calls);
    if rows.is_empty() {
        println!("No agents met the minimum call count");
        return;
    }
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{}. {}: score {:.1} ({}) | win rate {:.1}% ({}/{} calls)",
            rank + 1,
            row.name,
            row.overall_score,
            ScoreBand::for_score(row.overall_score).label(),
            row.win_rate,
            row.won_calls,
            row.total_calls
        );
    }
}

pub(crate) fn render_call_audit(audit: &CallAudit, with_evidence: bool) {
    println!(
        "\n{} ({}, {}): consistency {}% | {} tags | {} signals | {} issues",
        audit.call_id,
        audit.agent_name.as_deref().unwrap_or("unknown agent"),
        audit.started_at.format("%Y-%m-%d %H:%M"),
        audit.total_consistency_score,
        audit.tag_count,
        audit.signal_count,
        audit.issues_count
    );
    for entry in &audit.analysis {
        println!(
            "  - {}: {} events vs {} signals (diff {:+}) {}",
            entry.tag_code,
            entry.event_count,
            entry.signal_count,
            entry.diff,
            entry.status.label()
        );
        if !with_evidence {
            continue;
        }
        for signal in &entry.details.signals {
            println!(
                "      signal @{}s: {}",
                offset_label(signal.timestamp_sec),
                signal.context_text.as_deref().unwrap_or("")
            );
        }
        for event in &entry.details.events {
            println!(
                "      event  @{}s: {}",
                offset_label(event.timestamp_sec),
                event.context_text.as_deref().unwrap_or("")
            );
        }
    }
}

fn offset_label(timestamp_sec: Option<f64>) -> String {
    timestamp_sec
        .map(|secs| format!("{secs:.1}"))
        .unwrap_or_else(|| "?".to_string())
}

pub(crate) fn render_duration(report: &DurationReport) {
    let summary = &report.summary;
    println!("Call duration analysis ({} calls)", summary.total_calls);
    println!(
        "Average duration {}s | compliance {}% (<= 150s) | friction {}% (> 240s)",
        summary.avg_duration, summary.compliance_rate, summary.friction_rate
    );
    println!(
        "Predicted additional onsite visits at compliant conversion: {}",
        summary.predicted_gain
    );

    println!("\nDistribution");
    for bucket in report.distribution.iter().filter(|bucket| bucket.count > 0) {
        println!(
            "- {}: {} calls | onsite {:.0}% | won {:.0}%",
            bucket.label, bucket.count, bucket.onsite_rate, bucket.win_rate
        );
    }

    if report.agent_rankings.is_empty() {
        println!("\nAgent rankings: none");
    } else {
        println!("\nAgent rankings (shortest average first)");
        for agent in &report.agent_rankings {
            println!(
                "- {}: avg {}s | onsite {}% | won {}% | {} deals",
                agent.name, agent.avg_duration, agent.onsite_rate, agent.win_rate, agent.count
            );
        }
    }
}
