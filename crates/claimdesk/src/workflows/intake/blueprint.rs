use super::domain::{CaseType, Step, StepKind};

pub const CONFIRMATION_PROMPT: &str =
    "입력하신 내용으로 청구취지를 작성할까요? ('예' 또는 '아니오')";

#[derive(Debug, Clone)]
pub struct ScenarioBlueprint {
    case_type: CaseType,
    steps: Vec<Step>,
}

impl ScenarioBlueprint {
    pub fn for_case_type(case_type: CaseType) -> Self {
        let steps = match case_type {
            CaseType::Loan => loan_steps(),
            CaseType::Goods => goods_steps(),
            CaseType::Construction => construction_steps(),
        };
        Self { case_type, steps }
    }

    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn party_steps() -> [Step; 2] {
    [
        Step {
            key: "creditor_name",
            prompt: "채권자(원고)의 이름을 입력해 주세요.",
            kind: StepKind::Text,
        },
        Step {
            key: "debtor_name",
            prompt: "채무자(피고)의 이름을 입력해 주세요.",
            kind: StepKind::Text,
        },
    ]
}

fn loan_steps() -> Vec<Step> {
    let mut steps = party_steps().to_vec();
    steps.extend([
        Step {
            key: "transactions",
            prompt: "빌려준 돈의 내역을 입력해 주세요. (대여일, 금액, 변제기일)",
            kind: StepKind::Transactions,
        },
        Step {
            key: "demand_date",
            prompt: "마지막으로 변제를 요구한 날짜를 입력해 주세요. (YYYY-MM-DD)",
            kind: StepKind::Date,
        },
    ]);
    steps
}

fn goods_steps() -> Vec<Step> {
    let mut steps = party_steps().to_vec();
    steps.extend([
        Step {
            key: "goods_description",
            prompt: "공급한 물품의 종류를 입력해 주세요.",
            kind: StepKind::Text,
        },
        Step {
            key: "transactions",
            prompt: "물품 공급 내역을 입력해 주세요. (공급일, 대금, 지급기일)",
            kind: StepKind::Transactions,
        },
    ]);
    steps
}

fn construction_steps() -> Vec<Step> {
    let mut steps = party_steps().to_vec();
    steps.extend([
        Step {
            key: "site_address",
            prompt: "공사 현장 주소를 입력해 주세요.",
            kind: StepKind::Text,
        },
        Step {
            key: "contract_period",
            prompt: "공사 기간을 입력해 주세요. (YYYY-MM-DD ~ YYYY-MM-DD)",
            kind: StepKind::DateRange,
        },
        Step {
            key: "contract_amount",
            prompt: "총 공사 대금을 입력해 주세요.",
            kind: StepKind::Number,
        },
        Step {
            key: "transactions",
            prompt: "미지급 공사대금 내역을 입력해 주세요. (공사 기간, 금액, 지급기일)",
            kind: StepKind::Transactions,
        },
    ]);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_collects_parties_and_one_transaction_table() {
        for case_type in CaseType::ordered() {
            let blueprint = ScenarioBlueprint::for_case_type(case_type);
            assert_eq!(blueprint.step(0).map(|step| step.key), Some("creditor_name"));
            assert_eq!(blueprint.step(1).map(|step| step.key), Some("debtor_name"));
            let tables = blueprint
                .steps()
                .iter()
                .filter(|step| step.kind == StepKind::Transactions)
                .count();
            assert_eq!(tables, 1, "{case_type:?} should have one transaction table");
        }
    }

    #[test]
    fn step_keys_are_unique_within_a_scenario() {
        for case_type in CaseType::ordered() {
            let blueprint = ScenarioBlueprint::for_case_type(case_type);
            let mut keys: Vec<_> = blueprint.steps().iter().map(|step| step.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), blueprint.len());
        }
    }
}
