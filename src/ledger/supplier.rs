use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::SupplierAccount;

/// Contact details editable from the supplier form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierProfile {
    pub name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

impl SupplierProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, contact_person: impl Into<String>) -> Self {
        self.contact_person = contact_person.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: SupplierProfile,
    #[serde(flatten)]
    account: SupplierAccount,
}

impl Supplier {
    /// Registers a supplier with an empty ledger and a zero balance.
    pub fn new(profile: SupplierProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            account: SupplierAccount::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn account(&self) -> &SupplierAccount {
        &self.account
    }

    pub fn balance_cents(&self) -> i64 {
        self.account.balance_cents()
    }

    /// Swaps in an account returned by the reconciler.
    pub(crate) fn replace_account(&mut self, account: SupplierAccount) {
        self.account = account;
    }

    /// Case-insensitive match on name or contact person.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.profile.name.to_lowercase().contains(&needle)
            || self.profile.contact_person.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_profile_and_account_on_the_wire() {
        let supplier = Supplier::new(SupplierProfile::named("MobileSentrix").with_contact("Mike"));
        let json = serde_json::to_value(&supplier).unwrap();
        assert_eq!(json["name"], "MobileSentrix");
        assert_eq!(json["contact_person"], "Mike");
        assert_eq!(json["balance_cents"], 0);
        assert!(json["ledger"].as_array().unwrap().is_empty());

        let back: Supplier = serde_json::from_value(json).unwrap();
        assert_eq!(back, supplier);
    }

    #[test]
    fn matches_name_or_contact() {
        let supplier =
            Supplier::new(SupplierProfile::named("Injured Gadgets").with_contact("Sarah Supply"));
        assert!(supplier.matches("gadget"));
        assert!(supplier.matches("SARAH"));
        assert!(supplier.matches(""));
        assert!(!supplier.matches("samsung"));
    }
}
