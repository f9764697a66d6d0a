use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::{is_valid_email, validate_br_phone};

/// Sentinel used when neither grade-of-interest field is populated.
pub const SERIES_NOT_INFORMED: &str = "Não informado";

/// Wix form-submission webhook payload.
///
/// Current form revisions nest the submitted fields under a `data` object
/// whose keys are form-field identifiers. Identifiers are unstable across
/// revisions (raw names, `field:`-prefixed names, hash-suffixed names), so
/// the payload is kept opaque and decoded by the lookup tables below.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WixWebhookPayload {
    /// Submitted form fields, keyed by form-field identifier.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,

    /// Raw payload for any additional fields (submission id, form name, ...)
    #[serde(flatten)]
    pub raw: Value,
}

/// Canonical contact shape built from one form submission.
///
/// `email` is the identity key used for CRM-side deduplication. Custom
/// attributes map onto the CRM's `cf_*` custom fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactRecord {
    /// Responsible guardian's name.
    pub name: Option<String>,
    pub email: Option<String>,
    /// Phone, normalized to E.164 when it parses as a valid BR number.
    pub phone: Option<String>,
    pub student_name: Option<String>,
    pub birth_date: Option<String>,
    pub cpf: Option<String>,
    /// Grade/series of interest, `SERIES_NOT_INFORMED` when absent.
    pub series_of_interest: String,
    pub exam_help: Option<String>,
    pub notes: Option<String>,
    pub data_confirmed: Option<String>,
    pub marketing_consent: Option<String>,
}

// Field identifier lookup tables, one group per canonical attribute.
// Ordered newest revision first; within a group the first non-empty value
// wins. Hash-suffixed identifiers come from Wix form regenerations and are
// pinned here verbatim as they were observed.
const NAME_FIELDS: &[&str] = &[
    "field:first_name",
    "field:responsavel",
    "field:nome_do_responsavel_c2b4",
    "responsavel",
];
const EMAIL_FIELDS: &[&str] = &["field:email", "field:email_5019", "email"];
const PHONE_FIELDS: &[&str] = &[
    "field:phone",
    "field:telefone",
    "field:telefone_9a3b",
    "telefone",
];
const STUDENT_FIELDS: &[&str] = &[
    "field:aluno",
    "field:nome_do_aluno",
    "field:nome_do_aluno_7e21",
    "aluno",
];
const BIRTH_DATE_FIELDS: &[&str] = &[
    "field:data_nascimento",
    "field:data_de_nascimento_fb60",
    "data_nascimento",
];
const CPF_FIELDS: &[&str] = &["field:cpf", "field:cpf_do_responsavel_44d1", "cpf"];
// Mutually exclusive grade-of-interest fields. Secondary education is
// checked before primary; the legacy flat identifier is the last resort.
const SECONDARY_SERIES_FIELDS: &[&str] = &["field:ensino_medio", "ensino_medio"];
const PRIMARY_SERIES_FIELDS: &[&str] = &["field:ensino_fundamental", "ensino_fundamental"];
const LEGACY_SERIES_FIELDS: &[&str] = &["field:serie_interesse", "serie_interesse"];
const EXAM_HELP_FIELDS: &[&str] = &["field:ajuda_prova", "ajuda_prova"];
const NOTES_FIELDS: &[&str] = &["field:observacao", "field:mensagem", "observacao"];
const DATA_CONFIRMED_FIELDS: &[&str] = &["field:confirma_dados", "confirma_dados"];
const CONSENT_FIELDS: &[&str] = &[
    "field:autorizacao",
    "field:aceito_receber_comunicacoes",
    "autorizacao",
];

/// Render a scalar form value as a trimmed string, `None` when empty or null.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty value among the given field identifiers.
fn first_non_empty(data: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|key| data.get(*key))
        .find_map(scalar_to_string)
}

/// Map a raw form submission onto the canonical `ContactRecord`.
///
/// Pure function: schema drift across form revisions is absorbed by the
/// lookup tables above, nothing downstream needs to change.
pub fn normalize(data: &Map<String, Value>) -> ContactRecord {
    let name = first_non_empty(data, NAME_FIELDS);

    let email = first_non_empty(data, EMAIL_FIELDS).and_then(|e| {
        let lowered = e.to_lowercase();
        if is_valid_email(&lowered) {
            Some(lowered)
        } else {
            tracing::warn!("Dropping invalid email from form submission: {}", e);
            None
        }
    });

    let phone = first_non_empty(data, PHONE_FIELDS).map(|p| {
        let (valid, normalized) = validate_br_phone(&p);
        if valid {
            normalized
        } else {
            // Keep the raw value: the CRM tolerates free-form phones and a
            // mistyped number is still useful to a salesperson.
            p
        }
    });

    // Remove formatting: 123.456.789-01 -> 12345678901
    let cpf = first_non_empty(data, CPF_FIELDS)
        .map(|c| c.chars().filter(|ch| ch.is_ascii_digit()).collect::<String>())
        .filter(|c| !c.is_empty());

    let series_of_interest = first_non_empty(data, SECONDARY_SERIES_FIELDS)
        .or_else(|| first_non_empty(data, PRIMARY_SERIES_FIELDS))
        .or_else(|| first_non_empty(data, LEGACY_SERIES_FIELDS))
        .unwrap_or_else(|| SERIES_NOT_INFORMED.to_string());

    ContactRecord {
        name,
        email,
        phone,
        student_name: first_non_empty(data, STUDENT_FIELDS),
        birth_date: first_non_empty(data, BIRTH_DATE_FIELDS),
        cpf,
        series_of_interest,
        exam_help: first_non_empty(data, EXAM_HELP_FIELDS),
        notes: first_non_empty(data, NOTES_FIELDS),
        data_confirmed: first_non_empty(data, DATA_CONFIRMED_FIELDS),
        marketing_consent: first_non_empty(data, CONSENT_FIELDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn parses_payload_without_data_object() {
        let payload: WixWebhookPayload =
            serde_json::from_str(r#"{"formName": "matricula"}"#).unwrap();
        assert!(payload.data.is_none());
    }

    #[test]
    fn maps_current_revision_identifiers() {
        let data = as_map(json!({
            "field:first_name": "Ana",
            "field:email": "ana@x.com",
            "field:phone": "+5511999999999",
            "field:ensino_medio": "1º Ano"
        }));

        let record = normalize(&data);
        assert_eq!(record.name.as_deref(), Some("Ana"));
        assert_eq!(record.email.as_deref(), Some("ana@x.com"));
        assert_eq!(record.phone.as_deref(), Some("+5511999999999"));
        assert_eq!(record.series_of_interest, "1º Ano");
    }

    #[test]
    fn maps_legacy_flat_identifiers() {
        let data = as_map(json!({
            "responsavel": "Carlos Souza",
            "aluno": "Pedro Souza",
            "email": "Carlos@Example.com",
            "cpf": "123.456.789-01",
            "serie_interesse": "5º Ano"
        }));

        let record = normalize(&data);
        assert_eq!(record.name.as_deref(), Some("Carlos Souza"));
        assert_eq!(record.student_name.as_deref(), Some("Pedro Souza"));
        assert_eq!(record.email.as_deref(), Some("carlos@example.com"));
        assert_eq!(record.cpf.as_deref(), Some("12345678901"));
        assert_eq!(record.series_of_interest, "5º Ano");
    }

    #[test]
    fn secondary_education_wins_over_primary() {
        let data = as_map(json!({
            "field:ensino_medio": "2º Ano",
            "field:ensino_fundamental": "9º Ano"
        }));
        assert_eq!(normalize(&data).series_of_interest, "2º Ano");
    }

    #[test]
    fn primary_education_used_when_secondary_empty() {
        let data = as_map(json!({
            "field:ensino_medio": "",
            "field:ensino_fundamental": "9º Ano"
        }));
        assert_eq!(normalize(&data).series_of_interest, "9º Ano");
    }

    #[test]
    fn series_defaults_to_sentinel() {
        let data = as_map(json!({ "field:first_name": "Ana" }));
        assert_eq!(normalize(&data).series_of_interest, SERIES_NOT_INFORMED);
    }

    #[test]
    fn invalid_email_is_dropped() {
        let data = as_map(json!({ "field:email": "not-an-email" }));
        assert_eq!(normalize(&data).email, None);
    }

    #[test]
    fn invalid_phone_kept_raw() {
        let data = as_map(json!({ "field:phone": "ramal 1234-x" }));
        assert_eq!(normalize(&data).phone.as_deref(), Some("ramal 1234-x"));
    }

    #[test]
    fn tolerates_null_and_missing_keys() {
        let data = as_map(json!({
            "field:first_name": null,
            "field:email": "ana@x.com"
        }));
        let record = normalize(&data);
        assert_eq!(record.name, None);
        assert_eq!(record.email.as_deref(), Some("ana@x.com"));
    }
}
