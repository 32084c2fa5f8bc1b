use serde::{Deserialize, Deserializer, Serialize};

use crate::formatting::format_labelled;

/// A contact as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emails: Vec<ContactEmail>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phones: Vec<ContactPhone>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPhone {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
}

impl Contact {
    /// `first last`, trimmed when the last name is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn emails_summary(&self) -> String {
        format_labelled(
            self.emails
                .iter()
                .filter(|e| !e.email.is_empty())
                .map(|e| (e.label.as_str(), e.email.as_str())),
        )
    }

    pub fn phones_summary(&self) -> String {
        format_labelled(
            self.phones
                .iter()
                .filter(|p| !p.phone_number.is_empty())
                .map(|p| (p.label.as_str(), p.phone_number.as_str())),
        )
    }
}

/// Body of `POST /api/contacts` and `PUT /api/contacts/{id}`.
///
/// Entries never carry ids: an update replaces both arrays wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub emails: Vec<EmailPayload>,
    pub phones: Vec<PhonePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    pub label: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePayload {
    pub label: String,
    pub phone_number: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_tolerates_nulls_and_missing_fields() {
        let json = r#"{
            "id": 7,
            "firstName": "Ada",
            "lastName": null,
            "emails": [{"id": 1, "label": null, "email": "ada@x.com"}]
        }"#;
        let contact: Contact = serde_json::from_str(json).unwrap();

        assert_eq!(contact.id, 7);
        assert_eq!(contact.last_name, "");
        assert_eq!(contact.title, "");
        assert!(contact.phones.is_empty());
        assert_eq!(contact.full_name(), "Ada");
        assert_eq!(contact.emails_summary(), "ada@x.com");
        assert_eq!(contact.phones_summary(), "N/A");
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = ContactPayload {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            title: "Eng".into(),
            emails: vec![],
            phones: vec![PhonePayload {
                label: "Mobile".into(),
                phone_number: "03001234567".into(),
            }],
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["lastName"], "Lovelace");
        assert_eq!(value["phones"][0]["phoneNumber"], "03001234567");
    }
}
