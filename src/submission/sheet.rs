use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::record::SubmissionRecord;

/// Spreadsheet column and the record field that fills it.
pub const COLUMNS: &[(&str, &str)] = &[
    ("Nome", "nome"),
    ("Email", "email"),
    ("Telefone", "telefone"),
    ("Idade", "idade"),
    ("Genero", "genero"),
    ("GeneroOutro", "generoOutro"),
    ("Escola", "escola"),
    ("EscolaOutra", "escolaOutra"),
    ("Cidade", "cidade"),
    ("CidadeOutra", "cidadeOutra"),
    ("AnoEscolar", "anoEscolar"),
    ("Turno", "turno"),
    ("InteresseEnsinoSuperior", "interesseEnsinoSuperior"),
    ("CursoInteresse", "cursoInteresse"),
    ("FatorMotivacao", "fatorMotivacao"),
    ("MotivoNaoInteresse", "motivoNaoInteresse"),
    ("InteresseTecnico", "interesseTecnico"),
    ("OrientacaoProfissional", "orientacaoProfissional"),
    ("ParticipouOrientacao", "participouOrientacao"),
    ("AcoesInteresseSuperior", "acoesInteresseSuperior"),
    ("SugestoesGerais", "sugestoesGerais"),
];

pub const TIMESTAMP_COLUMN: &str = "Data";

/// One spreadsheet row, keyed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    cells: Vec<(String, String)>,
}

impl SheetRow {
    /// Map a record onto the column scheme. Missing fields become empty cells
    /// and multi-selects are joined with ", ".
    pub fn from_record(record: &SubmissionRecord, submitted_at: DateTime<Utc>) -> Self {
        let mut cells = Vec::with_capacity(COLUMNS.len() + 1);
        cells.push((
            TIMESTAMP_COLUMN.to_string(),
            submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ));

        for (column, field) in COLUMNS {
            let cell = record.get(field).map(|v| v.to_cell()).unwrap_or_default();
            cells.push((column.to_string(), cell));
        }

        Self { cells }
    }

    /// Add a key outside the column scheme, such as the relay's `secret`.
    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.cells.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .cells
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::record::FieldValue;
    use chrono::TimeZone;

    #[test]
    fn joins_multi_select_and_fills_blanks() {
        let record: SubmissionRecord = [
            ("nome", FieldValue::from("Ana")),
            ("cursoInteresse", vec!["Engenharia", "Direito"].into()),
        ]
        .into_iter()
        .collect();
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();

        let row = SheetRow::from_record(&record, at);

        assert_eq!(row.get("Data"), Some("2025-03-14T12:00:00.000Z"));
        assert_eq!(row.get("Nome"), Some("Ana"));
        assert_eq!(row.get("CursoInteresse"), Some("Engenharia, Direito"));
        assert_eq!(row.get("Telefone"), Some(""));
        assert_eq!(row.cells().len(), COLUMNS.len() + 1);
    }

    #[test]
    fn extra_key_follows_columns() {
        let row = SheetRow::from_record(&SubmissionRecord::new(), Utc::now())
            .with_extra("secret", "s3cret");
        assert_eq!(row.cells().last().map(|(k, _)| k.as_str()), Some("secret"));
        assert_eq!(row.to_json()["secret"], "s3cret");
    }

    #[test]
    fn single_course_is_plain_text() {
        let record: SubmissionRecord = [("cursoInteresse", FieldValue::from(vec!["Engenharia"]))]
            .into_iter()
            .collect();
        let row = SheetRow::from_record(&record, Utc::now());
        assert_eq!(row.to_json()["CursoInteresse"], "Engenharia");
    }
}
