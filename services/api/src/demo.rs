use crate::infra::InMemoryClaimStore;
use chrono::NaiveDate;
use clap::Args;
use claimdesk::config::AppConfig;
use claimdesk::error::AppError;
use claimdesk::workflows::intake::{
    format_amount, format_naive_date, generate_claim_text, CaseId, CaseType, ClaimStore,
    ConfirmationChoice, IntakeService, SessionView, Transaction, TransactionImporter,
};
use claimdesk::workflows::ledger::{
    Bond, BondRecord, ClaimBreakdown, Clock, DateBound, DayCount, EnforcementAction, Expense,
    FixedClock, InterestCalculator, InterestInterval, RecoverySummary, SystemClock,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ClaimTotalArgs {
    /// JSON bond record (principal, interest columns, expenses)
    #[arg(long)]
    pub(crate) bond: PathBuf,
    /// Evaluation date for open-ended intervals (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// JSON list of enforcement actions used for the recovery rate
    #[arg(long)]
    pub(crate) enforcement: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ClaimTextArgs {
    /// CSV export with transaction_date,start_date,end_date,amount,due_date columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the intake conversation portion of the demo.
    #[arg(long)]
    pub(crate) skip_intake: bool,
}

pub(crate) fn run_claim_total(args: ClaimTotalArgs) -> Result<(), AppError> {
    let ClaimTotalArgs {
        bond,
        today,
        enforcement,
    } = args;

    let config = AppConfig::load()?;
    let record: BondRecord = serde_json::from_str(&std::fs::read_to_string(bond)?)?;
    let bond = Bond::try_from(record)?;
    let actions: Vec<EnforcementAction> = match enforcement {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let calculator = calculator_for(today, config.ledger.day_count);
    let breakdown = calculator.breakdown(&bond);
    render_breakdown(&breakdown, calculator.day_count());

    if !actions.is_empty() {
        let summary = RecoverySummary::from_actions(&actions, Some(breakdown.principal));
        render_recovery(&summary);
    }

    Ok(())
}

pub(crate) fn run_claim_text(args: ClaimTextArgs) -> Result<(), AppError> {
    let transactions = TransactionImporter::from_path(args.csv)?;
    if transactions.is_empty() {
        println!("No transactions found in export.");
        return Ok(());
    }

    println!("{}", generate_claim_text(&transactions));
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, skip_intake } = args;
    let config = AppConfig::load()?;
    let calculator = calculator_for(today, config.ledger.day_count);

    println!("Claim ledger demo (evaluated {})", calculator.today());
    let bond = demo_bond(calculator.today())?;
    let breakdown = calculator.breakdown(&bond);
    render_breakdown(&breakdown, calculator.day_count());
    render_recovery(&RecoverySummary::from_actions(
        &demo_enforcement(),
        Some(breakdown.principal),
    ));

    if skip_intake {
        return Ok(());
    }

    println!("\nClaim intake demo");
    let store = Arc::new(InMemoryClaimStore::default());
    let service = IntakeService::new(store.clone());
    let case_id = CaseId("demo-case-001".to_string());

    let view = run_goods_intake(&service, case_id.clone(), calculator.today())?;
    let Some(claim) = view.claim else {
        println!("  Intake did not reach submission.");
        return Ok(());
    };

    println!(
        "- Stored {} claim {} for case {}",
        claim.case_type.label(),
        claim.idempotency_key,
        claim.case_id.0
    );
    println!("{}", indent(&claim.claim_text));

    let confirmed = service.confirm_claim(&claim.idempotency_key)?;
    println!(
        "- Claim text confirmed: {} ({} record(s) on file)",
        confirmed.claim_confirmed,
        store.fetch(&case_id).map(|records| records.len()).unwrap_or(0)
    );

    Ok(())
}

fn calculator_for(today: Option<NaiveDate>, day_count: DayCount) -> InterestCalculator {
    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock(date)),
        None => Arc::new(SystemClock),
    };
    InterestCalculator::new(clock, day_count)
}

fn render_breakdown(breakdown: &ClaimBreakdown, day_count: DayCount) {
    println!(
        "Principal: {}원 (day basis {})",
        format_amount(breakdown.principal),
        day_count.days_per_year()
    );
    if breakdown.intervals.is_empty() {
        println!("- No interest intervals recorded");
    }
    for (index, accrual) in breakdown.intervals.iter().enumerate() {
        let rate = accrual
            .rate
            .map(|rate| format!("{rate}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- Interval {}: {} from {} to {} ({} days) -> {}원",
            index + 1,
            rate,
            format_naive_date(accrual.start),
            format_naive_date(accrual.end),
            accrual
                .days
                .map(|days| days.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_amount(accrual.interest)
        );
    }
    for expense in &breakdown.expenses {
        println!("- {}: {}원", expense.label, format_amount(expense.amount));
    }
    println!(
        "Total claim: {}원 (interest {}원, expenses {}원)",
        format_amount(breakdown.total),
        format_amount(breakdown.interest_total),
        format_amount(breakdown.expense_total)
    );
}

fn render_recovery(summary: &RecoverySummary) {
    println!(
        "Recovery: {}원 recovered | {}% of principal | band {}{}",
        format_amount(summary.recovered),
        summary.rate,
        summary.tier_label,
        if summary.over_recovered {
            " (exceeds principal)"
        } else {
            ""
        }
    );
}

fn run_goods_intake<S>(
    service: &IntakeService<S>,
    case_id: CaseId,
    today: NaiveDate,
) -> Result<SessionView, AppError>
where
    S: ClaimStore + 'static,
{
    let session_id = service.open_session(case_id).session_id;
    let mut view = service.select_case_type(session_id, CaseType::Goods)?;

    for answer in ["주식회사 한빛상사", "박민수", "사무용 가구 납품"] {
        print_exchange(&view, answer);
        view = service.answer(session_id, answer)?;
    }

    for transaction in demo_transactions(today) {
        view = service.add_transaction(session_id, transaction)?;
    }
    print_exchange(
        &view,
        &format!("{} transaction(s) entered", view.pending_transactions.len()),
    );
    view = service.answer(session_id, "")?;

    print_exchange(&view, ConfirmationChoice::AFFIRMATIVE);
    Ok(service.confirm(session_id, ConfirmationChoice::Affirmative)?)
}

fn print_exchange(view: &SessionView, reply: &str) {
    if let Some(prompt) = &view.prompt {
        println!("  Q: {prompt}");
        println!("  A: {reply}");
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn demo_transactions(today: NaiveDate) -> Vec<Transaction> {
    let days = |count: i64| today.checked_sub_signed(chrono::Duration::days(count));
    vec![
        Transaction::dated(days(120), Decimal::from(3_200_000), days(90)),
        Transaction::dated(days(200), Decimal::from(1_850_000), days(170)),
        Transaction::dated(days(45), Decimal::from(640_000), None),
    ]
}

fn demo_bond(today: NaiveDate) -> Result<Bond, AppError> {
    let start = today
        .checked_sub_signed(chrono::Duration::days(400))
        .unwrap_or(today);
    let switch = today
        .checked_sub_signed(chrono::Duration::days(100))
        .unwrap_or(today);

    let bond = Bond::new(Decimal::from(5_690_000))
        .with_interval(InterestInterval::new(
            Decimal::from(6),
            DateBound::Fixed(start),
            DateBound::Fixed(switch),
        ))?
        .with_interval(InterestInterval::new(
            Decimal::from(12),
            DateBound::Fixed(switch),
            DateBound::Today,
        ))?
        .with_expense(Expense::new("인지대", Decimal::from(27_500)))
        .with_expense(Expense::new("송달료", Decimal::from(62_400)))
        .with_expense(Expense::new("감정료", Decimal::ZERO));
    Ok(bond)
}

fn demo_enforcement() -> Vec<EnforcementAction> {
    vec![
        EnforcementAction {
            amount: Decimal::from(2_000_000),
            status: "closed".to_string().into(),
        },
        EnforcementAction {
            amount: Decimal::from(1_500_000),
            status: "in_progress".to_string().into(),
        },
    ]
}
