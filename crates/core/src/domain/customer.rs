use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub license_number: String,
    pub license_image: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Customer-capture form payload; the store assigns the id on insert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub license_number: String,
    pub license_image: Option<String>,
}

impl CustomerDraft {
    /// Labels of required fields that are empty or whitespace only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("id_card_number", &self.id_card_number),
            ("license_number", &self.license_number),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| label)
            .collect()
    }

    pub fn into_customer(self, id: CustomerId) -> Customer {
        Customer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            id_card_number: self.id_card_number,
            license_number: self.license_number,
            license_image: self.license_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomerDraft, CustomerId};

    fn complete_draft() -> CustomerDraft {
        CustomerDraft {
            first_name: "Jan".to_string(),
            last_name: "Novák".to_string(),
            email: "jan.novak@example.com".to_string(),
            phone: "+420 601 111 222".to_string(),
            id_card_number: "123456789".to_string(),
            license_number: "987654321".to_string(),
            license_image: None,
        }
    }

    #[test]
    fn complete_draft_has_no_missing_fields() {
        assert!(complete_draft().missing_fields().is_empty());
    }

    #[test]
    fn blank_and_whitespace_fields_are_reported() {
        let draft = CustomerDraft {
            email: String::new(),
            phone: "   ".to_string(),
            ..complete_draft()
        };

        assert_eq!(draft.missing_fields(), vec!["email", "phone"]);
    }

    #[test]
    fn draft_becomes_customer_with_assigned_id() {
        let customer = complete_draft().into_customer(CustomerId(7));
        assert_eq!(customer.id, CustomerId(7));
        assert_eq!(customer.full_name(), "Jan Novák");
    }
}
