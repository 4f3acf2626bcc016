use chrono::NaiveDate;
use claimdesk::workflows::intake::{
    generate_claim_text, Answer, CaseType, ConfirmationChoice, IntakeError, IntakeSession,
    IntakeState, Transaction, TransactionImporter, TransactionLayout, Transition,
};
use rust_decimal::Decimal;
use std::io::Cursor;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn dated(amount: i64, due: Option<NaiveDate>) -> Transaction {
    Transaction::dated(Some(date(2023, 12, 1)), Decimal::from(amount), due)
}

/// Loan intake answered through the demand date, waiting on the final confirmation.
fn loan_at_confirmation() -> IntakeSession {
    let mut session = IntakeSession::new();
    session
        .select_case_type(CaseType::Loan)
        .expect("case type selected");
    session.answer("김채권").expect("creditor");
    session.answer("이채무").expect("debtor");
    session
        .add_transaction(dated(5_000_000, Some(date(2024, 3, 1))))
        .expect("transaction added");
    session.answer("").expect("table closed");
    session.answer("2024-06-30").expect("demand date");
    assert_eq!(session.state(), IntakeState::AwaitingFinalConfirmation);
    session
}

#[test]
fn loan_scenario_starts_at_its_first_question() {
    let mut session = IntakeSession::new();
    let transition = session
        .select_case_type(CaseType::Loan)
        .expect("case type selected");

    assert_eq!(session.question_index(), Some(0));
    assert_eq!(
        transition.prompt(),
        Some("채권자(원고)의 이름을 입력해 주세요.")
    );
    assert_eq!(session.prompt(), transition.prompt());
}

#[test]
fn going_back_from_the_first_question_clears_the_case_type() {
    let mut session = IntakeSession::new();
    session
        .select_case_type(CaseType::Goods)
        .expect("case type selected");

    assert_eq!(session.go_back(), Ok(Transition::CaseTypeCleared));
    assert_eq!(session.case_type(), None);
    assert_eq!(session.state(), IntakeState::NoCaseTypeSelected);
    assert_eq!(session.answer("김채권"), Err(IntakeError::NoCaseTypeSelected));
}

#[test]
fn going_back_reopens_the_previous_question_without_its_answer() {
    let mut session = IntakeSession::new();
    session
        .select_case_type(CaseType::Goods)
        .expect("case type selected");
    session.answer("김채권").expect("creditor");
    session.answer("이채무").expect("debtor");
    assert_eq!(session.question_index(), Some(2));

    let transition = session.go_back().expect("went back");
    assert!(matches!(transition, Transition::Reopened(step) if step.key == "debtor_name"));
    assert_eq!(session.question_index(), Some(1));
    assert!(session.answers().contains_key("creditor_name"));
    assert!(!session.answers().contains_key("debtor_name"));
}

#[test]
fn submission_happens_once_until_reset() {
    let mut session = loan_at_confirmation();
    let first_key = session.idempotency_key();

    let submission = match session.confirm(ConfirmationChoice::Affirmative) {
        Ok(Transition::Submitted(submission)) => submission,
        other => panic!("expected submission, got {other:?}"),
    };
    assert_eq!(submission.idempotency_key, first_key);
    assert_eq!(submission.total_amount, Decimal::from(5_000_000));
    assert!(submission.claim_text.contains("5,000,000원"));

    assert_eq!(
        session.confirm(ConfirmationChoice::Affirmative),
        Err(IntakeError::AlreadySubmitted)
    );
    assert_eq!(session.answer("예"), Err(IntakeError::AlreadySubmitted));

    session.reset();
    assert_eq!(session.state(), IntakeState::NoCaseTypeSelected);
    assert_ne!(session.idempotency_key(), first_key);
}

#[test]
fn declining_confirmation_reopens_the_last_question() {
    let mut session = loan_at_confirmation();

    let transition = session
        .confirm(ConfirmationChoice::Negative)
        .expect("declined");
    assert!(matches!(transition, Transition::Reopened(step) if step.key == "demand_date"));
    assert!(!session.answers().contains_key("demand_date"));
    assert!(matches!(
        session.answers().get("transactions"),
        Some(Answer::Transactions(list)) if list.len() == 1
    ));
}

#[test]
fn empty_transaction_table_blocks_progress() {
    let mut session = IntakeSession::new();
    session
        .select_case_type(CaseType::Goods)
        .expect("case type selected");
    session.answer("김채권").expect("creditor");
    session.answer("이채무").expect("debtor");
    session.answer("사무용 의자").expect("goods");

    assert_eq!(session.answer(""), Err(IntakeError::NoTransactions));
    assert_eq!(
        session.add_transaction(dated(0, None)),
        Err(IntakeError::NonPositiveAmount)
    );
}

#[test]
fn construction_claims_take_period_rows_from_a_csv_export() {
    let csv = "transaction_date,start_date,end_date,amount,due_date\n\
               ,2024-01-01,2024-01-31,\"12,000,000\",2024-02-15\n\
               ,2024-02-01,2024-02-29,8000000,2024-03-15\n";
    let rows = TransactionImporter::from_reader(Cursor::new(csv)).expect("rows import");

    let mut session = IntakeSession::new();
    session
        .select_case_type(CaseType::Construction)
        .expect("case type selected");
    session.answer("대한건설").expect("creditor");
    session.answer("한빛개발").expect("debtor");
    session.answer("서울특별시 중구 세종대로 110").expect("site");
    session
        .answer("2024-01-01 ~ 2024-02-29")
        .expect("contract period");
    session.answer("20,000,000원").expect("contract amount");

    assert_eq!(
        session.add_transaction(dated(1_000, None)),
        Err(IntakeError::TransactionLayout {
            expected: TransactionLayout::Period
        })
    );
    for row in rows {
        session.add_transaction(row).expect("period row accepted");
    }
    assert_eq!(session.answer(""), Ok(Transition::AwaitingConfirmation));

    let submission = match session.answer("예") {
        Ok(Transition::Submitted(submission)) => submission,
        other => panic!("expected submission, got {other:?}"),
    };
    let lines: Vec<&str> = submission.claim_text.lines().collect();
    assert_eq!(lines[0], "피고는 원고에게 20,000,000원 및 그 중");
    assert_eq!(lines[1], "가. 12,000,000원에 대하여는 2024.02.15.부터,");
    assert_eq!(lines[2], "나. 8,000,000원에 대하여는 2024.03.15.부터");
}

#[test]
fn claim_text_orders_clauses_by_due_date_regardless_of_input_order() {
    let text = generate_claim_text(&[
        dated(700_000, None),
        dated(300_000, Some(date(2024, 5, 1))),
        dated(200_000, Some(date(2024, 4, 1))),
    ]);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "피고는 원고에게 1,200,000원 및 그 중");
    assert!(lines[1].starts_with("가. 200,000원"));
    assert!(lines[2].starts_with("나. 300,000원"));
    assert_eq!(lines[3], "다. 700,000원에 대하여는 날짜 미입력부터");
    assert_eq!(generate_claim_text(&[]), "");
}
