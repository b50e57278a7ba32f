use super::conditions::ConditionTable;
use super::record::{FieldValue, SubmissionRecord};

/// Fields answered through checkbox groups.
pub const SURVEY_MULTI_SELECT: &[&str] = &[
    "cursoInteresse",
    "fatorMotivacao",
    "motivoNaoInteresse",
    "acoesInteresseSuperior",
];

/// Builds a `SubmissionRecord` from the successful controls of a form.
#[derive(Debug, Clone)]
pub struct FormCollector {
    conditions: ConditionTable,
    multi_select: Vec<String>,
}

impl FormCollector {
    pub fn new(conditions: ConditionTable, multi_select: &[&str]) -> Self {
        Self {
            conditions,
            multi_select: multi_select.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn survey() -> Self {
        Self::new(ConditionTable::survey(), SURVEY_MULTI_SELECT)
    }

    /// Collect `(name, value)` entries into a record.
    ///
    /// Unchecked boxes never appear among the entries, so a checkbox group
    /// with no selection is simply absent. When `email` is given (the signed
    /// in user's address) it replaces any submitted email.
    pub fn collect<I, K, V>(&self, entries: I, email: Option<&str>) -> SubmissionRecord
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = SubmissionRecord::new();
        for (name, value) in entries {
            record.append(name.as_ref(), value.into());
        }

        for name in &self.multi_select {
            if let Some(value) = record.get_mut(name) {
                if let FieldValue::Single(single) = value {
                    *value = FieldValue::Multiple(vec![std::mem::take(single)]);
                }
            }
        }

        if let Some(email) = email {
            record.insert("email", email);
        }

        let removed = self.conditions.prune(&mut record);
        if !removed.is_empty() {
            tracing::debug!("Pruned inapplicable fields: {removed:?}");
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_record() {
        let collector = FormCollector::survey();
        let record = collector.collect(
            [
                ("nome", "Ana"),
                ("idade", "16"),
                ("genero", "Feminino"),
                ("cidade", "Canoinhas"),
                ("escola", "EEB Santa Cruz"),
                ("anoEscolar", "2º Ano"),
                ("turno", "Matutino"),
                ("interesseEnsinoSuperior", "Sim"),
                ("cursoInteresse", "Engenharia"),
            ],
            None,
        );

        assert_eq!(record.len(), 9);
        assert_eq!(
            record.get("cursoInteresse"),
            Some(&FieldValue::from(vec!["Engenharia"]))
        );
        assert_eq!(record.get("idade"), Some(&FieldValue::from("16")));
    }

    #[test]
    fn empty_checkbox_group_is_absent() {
        let collector = FormCollector::survey();
        let record = collector.collect([("nome", "Ana"), ("interesseEnsinoSuperior", "Sim")], None);

        assert!(!record.contains_key("cursoInteresse"));
        assert!(!record.contains_key("fatorMotivacao"));
    }

    #[test]
    fn other_city_text_needs_sentinel() {
        let collector = FormCollector::survey();
        let record = collector.collect(
            [("cidade", "Canoinhas"), ("cidadeOutra", "Mafra")],
            None,
        );
        assert!(!record.contains_key("cidadeOutra"));
    }

    #[test]
    fn signed_in_email_overrides_form_value() {
        let collector = FormCollector::survey();
        let record = collector.collect(
            [("nome", "Ana"), ("email", "typed@example.com")],
            Some("ana@example.com"),
        );
        assert_eq!(record.get("email"), Some(&FieldValue::from("ana@example.com")));
    }

    #[test]
    fn unknown_repeated_names_accumulate() {
        let collector = FormCollector::new(ConditionTable::new(), &[]);
        let record = collector.collect([("tag", "a"), ("tag", "b"), ("tag", "c")], None);
        assert_eq!(record.get("tag"), Some(&FieldValue::from(vec!["a", "b", "c"])));
    }
}
