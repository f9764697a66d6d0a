use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::webhook_models::ContactRecord;

/// Sales pipeline as listed by `GET /deal_pipelines`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
}

/// Pipeline stage as listed by `GET /deal_stages?pipeline_id=…`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    /// Ordering position within the pipeline, lowest is the entry stage.
    pub position: i64,
}

/// Contact as returned by the CRM (create or by-email lookup).
#[derive(Debug, Clone, Deserialize)]
pub struct CrmContact {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Envelope of `GET /contacts?email=…`.
#[derive(Debug, Deserialize)]
pub struct ContactListResponse {
    #[serde(default)]
    pub contacts: Vec<CrmContact>,
}

/// Deal as returned by `POST /deals`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmDeal {
    pub id: String,
}

/// Deal creation payload.
///
/// Observed deals always carry zero value, the interest is purely
/// pipeline placement.
#[derive(Debug, Clone, Serialize)]
pub struct DealPayload {
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub deal_pipeline_id: String,
    pub deal_stage_id: String,
    pub contact_id: String,
    pub origin_note: String,
}

/// Build the CRM contact creation body from a canonical record.
///
/// Emails and phones go as nested arrays, everything else as `cf_*` custom
/// fields keyed by the identifiers configured in the CRM account.
pub fn contact_payload(record: &ContactRecord) -> Value {
    let mut body = serde_json::Map::new();

    if let Some(ref name) = record.name {
        body.insert("name".to_string(), json!(name));
    }
    if let Some(ref email) = record.email {
        body.insert("emails".to_string(), json!([{ "email": email }]));
    }
    if let Some(ref phone) = record.phone {
        body.insert("phones".to_string(), json!([{ "phone": phone }]));
    }

    let mut custom = serde_json::Map::new();
    custom.insert(
        "cf_serie_interesse".to_string(),
        json!(record.series_of_interest),
    );
    if let Some(ref student) = record.student_name {
        custom.insert("cf_aluno".to_string(), json!(student));
    }
    if let Some(ref birth) = record.birth_date {
        custom.insert("cf_data_nascimento".to_string(), json!(birth));
    }
    if let Some(ref cpf) = record.cpf {
        custom.insert("cf_cpf".to_string(), json!(cpf));
    }
    if let Some(ref help) = record.exam_help {
        custom.insert("cf_ajuda_prova".to_string(), json!(help));
    }
    if let Some(ref notes) = record.notes {
        custom.insert("cf_observacao".to_string(), json!(notes));
    }
    if let Some(ref confirmed) = record.data_confirmed {
        custom.insert("cf_confirma_dados".to_string(), json!(confirmed));
    }
    if let Some(ref consent) = record.marketing_consent {
        custom.insert("cf_autorizacao".to_string(), json!(consent));
    }
    body.insert("custom_fields".to_string(), Value::Object(custom));

    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_payload_nests_emails_and_phones() {
        let record = ContactRecord {
            name: Some("Ana".to_string()),
            email: Some("ana@x.com".to_string()),
            phone: Some("+5511999999999".to_string()),
            series_of_interest: "1º Ano".to_string(),
            ..Default::default()
        };

        let body = contact_payload(&record);
        assert_eq!(body["name"], "Ana");
        assert_eq!(body["emails"][0]["email"], "ana@x.com");
        assert_eq!(body["phones"][0]["phone"], "+5511999999999");
        assert_eq!(body["custom_fields"]["cf_serie_interesse"], "1º Ano");
    }

    #[test]
    fn contact_payload_skips_absent_custom_fields() {
        let record = ContactRecord {
            email: Some("ana@x.com".to_string()),
            series_of_interest: "Não informado".to_string(),
            ..Default::default()
        };

        let body = contact_payload(&record);
        assert!(body.get("name").is_none());
        assert!(body["custom_fields"].get("cf_aluno").is_none());
        assert!(body["custom_fields"].get("cf_cpf").is_none());
    }

    #[test]
    fn parses_contact_list_envelope() {
        let parsed: ContactListResponse =
            serde_json::from_str(r#"{"total": 1, "contacts": [{"id": "c1", "name": "Ana"}]}"#)
                .unwrap();
        assert_eq!(parsed.contacts.len(), 1);
        assert_eq!(parsed.contacts[0].id, "c1");
    }
}
