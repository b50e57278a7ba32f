use crate::schools::{OTHER_CITY, OTHER_SCHOOL};

use super::record::{FieldValue, SubmissionRecord};

/// What the selector field must hold for its dependents to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(String),
    OneOf(Vec<String>),
    /// For multi-selects: the option must be among the selections.
    Contains(String),
}

impl Condition {
    fn matches(&self, value: Option<&FieldValue>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Condition::Equals(expected) => value.as_single() == Some(expected.as_str()),
            Condition::OneOf(options) => value
                .as_single()
                .is_some_and(|v| options.iter().any(|o| o == v)),
            Condition::Contains(option) => value.contains(option),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    pub selector: String,
    pub condition: Condition,
    pub dependents: Vec<String>,
}

impl ConditionalRule {
    pub fn new(selector: &str, condition: Condition, dependents: &[&str]) -> Self {
        Self {
            selector: selector.to_string(),
            condition,
            dependents: dependents.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Declarative table of conditional fields.
///
/// A dependent field survives only if every rule that names it is satisfied
/// by the record's current selector values.
#[derive(Debug, Clone, Default)]
pub struct ConditionTable {
    rules: Vec<ConditionalRule>,
}

impl ConditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: ConditionalRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    /// The rules for the student survey form.
    pub fn survey() -> Self {
        let interest_or_doubt =
            Condition::OneOf(vec!["Não".to_string(), "Ainda estou em dúvida".to_string()]);

        Self::new()
            .with_rule(ConditionalRule::new(
                "genero",
                Condition::Equals("Outro".into()),
                &["generoOutro"],
            ))
            .with_rule(ConditionalRule::new(
                "cidade",
                Condition::Equals(OTHER_CITY.into()),
                &["cidadeOutra"],
            ))
            .with_rule(ConditionalRule::new(
                "escola",
                Condition::Equals(OTHER_SCHOOL.into()),
                &["escolaOutra"],
            ))
            .with_rule(ConditionalRule::new(
                "interesseEnsinoSuperior",
                Condition::Equals("Sim".into()),
                &["cursoInteresse", "fatorMotivacao", "acoesInteresseSuperior"],
            ))
            .with_rule(ConditionalRule::new(
                "interesseEnsinoSuperior",
                Condition::Equals("Não".into()),
                &["motivoNaoInteresse"],
            ))
            .with_rule(ConditionalRule::new(
                "interesseEnsinoSuperior",
                interest_or_doubt,
                &["orientacaoProfissional", "participouOrientacao", "interesseTecnico"],
            ))
            .with_rule(ConditionalRule::new(
                "cursoInteresse",
                Condition::Contains("Outro".into()),
                &["cursoInteresseOutro"],
            ))
            .with_rule(ConditionalRule::new(
                "fatorMotivacao",
                Condition::Contains("Outro".into()),
                &["fatorMotivacaoOutro"],
            ))
            .with_rule(ConditionalRule::new(
                "motivoNaoInteresse",
                Condition::Contains("Outro".into()),
                &["motivoNaoInteresseOutro"],
            ))
            .with_rule(ConditionalRule::new(
                "acoesInteresseSuperior",
                Condition::Contains("Outra".into()),
                &["acoesInteresseSuperiorOutro"],
            ))
    }

    /// Remove every dependent field whose governing rule does not hold.
    ///
    /// Rules are evaluated in order against the record as it is being pruned,
    /// so a selector removed by an earlier rule also drops its own dependents.
    pub fn prune(&self, record: &mut SubmissionRecord) -> Vec<String> {
        let mut removed = Vec::new();

        for rule in &self.rules {
            if rule.condition.matches(record.get(&rule.selector)) {
                continue;
            }
            for dependent in &rule.dependents {
                if record.remove(dependent).is_some() {
                    removed.push(dependent.clone());
                }
            }
        }

        removed
    }
}
