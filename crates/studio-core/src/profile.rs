//! Form-filling profiles.
//!
//! A profile is a named bundle of visitor identity fields (personal, address,
//! company, social, additional and payment data) that an automation agent
//! would use to pre-fill web forms. Values are free text; no format checks
//! are applied to emails, phone numbers or card data.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PROFILE: &str = "default";

/// Grouping used when listing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSection {
    Personal,
    Address,
    Company,
    Social,
    Additional,
    Payment,
}

impl FieldSection {
    pub fn label(&self) -> &'static str {
        match self {
            FieldSection::Personal => "Personal Information",
            FieldSection::Address => "Address Information",
            FieldSection::Company => "Company Information",
            FieldSection::Social => "Social Media",
            FieldSection::Additional => "Additional Fields",
            FieldSection::Payment => "Payment Information",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Street,
    City,
    State,
    ZipCode,
    Country,
    CompanyName,
    JobTitle,
    Department,
    CompanyWebsite,
    CompanyPhone,
    Linkedin,
    Twitter,
    Github,
    Bio,
    Interests,
    Skills,
    CardNumber,
    CardExpiry,
    #[serde(rename = "cardCVV")]
    CardCvv,
    BillingAddress,
}

impl ProfileField {
    pub const ALL: [ProfileField; 25] = [
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::DateOfBirth,
        ProfileField::Street,
        ProfileField::City,
        ProfileField::State,
        ProfileField::ZipCode,
        ProfileField::Country,
        ProfileField::CompanyName,
        ProfileField::JobTitle,
        ProfileField::Department,
        ProfileField::CompanyWebsite,
        ProfileField::CompanyPhone,
        ProfileField::Linkedin,
        ProfileField::Twitter,
        ProfileField::Github,
        ProfileField::Bio,
        ProfileField::Interests,
        ProfileField::Skills,
        ProfileField::CardNumber,
        ProfileField::CardExpiry,
        ProfileField::CardCvv,
        ProfileField::BillingAddress,
    ];

    /// Wire name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::FirstName => "firstName",
            ProfileField::LastName => "lastName",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::DateOfBirth => "dateOfBirth",
            ProfileField::Street => "street",
            ProfileField::City => "city",
            ProfileField::State => "state",
            ProfileField::ZipCode => "zipCode",
            ProfileField::Country => "country",
            ProfileField::CompanyName => "companyName",
            ProfileField::JobTitle => "jobTitle",
            ProfileField::Department => "department",
            ProfileField::CompanyWebsite => "companyWebsite",
            ProfileField::CompanyPhone => "companyPhone",
            ProfileField::Linkedin => "linkedin",
            ProfileField::Twitter => "twitter",
            ProfileField::Github => "github",
            ProfileField::Bio => "bio",
            ProfileField::Interests => "interests",
            ProfileField::Skills => "skills",
            ProfileField::CardNumber => "cardNumber",
            ProfileField::CardExpiry => "cardExpiry",
            ProfileField::CardCvv => "cardCVV",
            ProfileField::BillingAddress => "billingAddress",
        }
    }

    pub fn section(&self) -> FieldSection {
        use ProfileField::*;
        match self {
            FirstName | LastName | Email | Phone | DateOfBirth => FieldSection::Personal,
            Street | City | State | ZipCode | Country => FieldSection::Address,
            CompanyName | JobTitle | Department | CompanyWebsite | CompanyPhone => {
                FieldSection::Company
            }
            Linkedin | Twitter | Github => FieldSection::Social,
            Bio | Interests | Skills => FieldSection::Additional,
            CardNumber | CardExpiry | CardCvv | BillingAddress => FieldSection::Payment,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProfileField {
    type Err = Error;

    /// Accepts the camelCase wire name, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        ProfileField::ALL
            .iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// A named set of form values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub fields: BTreeMap<ProfileField, String>,
}

impl Profile {
    /// Create a profile with every field present and empty
    pub fn empty(name: impl Into<String>) -> Self {
        let fields = ProfileField::ALL
            .iter()
            .map(|f| (*f, String::new()))
            .collect();
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn get(&self, field: ProfileField) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }
}

/// Profiles keyed by name, plus the current selection
#[derive(Debug, Serialize)]
pub struct ProfileStore {
    profiles: BTreeMap<String, Profile>,
    selected: String,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    /// A store seeded with the empty `default` profile, selected
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), Profile::empty(DEFAULT_PROFILE));
        Self {
            profiles,
            selected: DEFAULT_PROFILE.to_string(),
        }
    }

    /// Create a new profile with all fields empty
    pub fn create_profile(&mut self, name: &str) -> Result<&Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidValue("profile name cannot be empty".to_string()));
        }
        if self.profiles.contains_key(name) {
            return Err(Error::ProfileExists(name.to_string()));
        }

        tracing::debug!("Creating profile '{}'", name);
        Ok(self
            .profiles
            .entry(name.to_string())
            .or_insert_with(|| Profile::empty(name)))
    }

    /// Make `name` the selected profile
    ///
    /// An unknown name leaves the current selection untouched.
    pub fn select_profile(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            tracing::debug!("Refusing to select missing profile '{}'", name);
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        self.selected = name.to_string();
        Ok(())
    }

    /// Set one field on an existing profile
    pub fn update_field(&mut self, name: &str, field: ProfileField, value: &str) -> Result<()> {
        let profile = self
            .profiles
            .get_mut(name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))?;
        profile.set(field, value);
        Ok(())
    }

    pub fn field(&self, name: &str, field: ProfileField) -> Result<&str> {
        self.get(name)
            .map(|p| p.get(field))
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn selected_name(&self) -> &str {
        &self.selected
    }

    pub fn selected(&self) -> Option<&Profile> {
        self.profiles.get(&self.selected)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_fields_are_empty() {
        let store = ProfileStore::new();
        let profile = store.get(DEFAULT_PROFILE).unwrap();

        assert_eq!(profile.fields.len(), 25);
        for field in ProfileField::ALL {
            assert_eq!(store.field(DEFAULT_PROFILE, field).unwrap(), "");
        }
    }

    #[test]
    fn test_select_missing_profile_keeps_selection() {
        let mut store = ProfileStore::new();
        let result = store.select_profile("business");

        assert!(matches!(result, Err(Error::ProfileNotFound(_))));
        assert_eq!(store.selected_name(), DEFAULT_PROFILE);
        assert!(store.selected().is_some());
    }

    #[test]
    fn test_update_field_requires_existing_profile() {
        let mut store = ProfileStore::new();
        let result = store.update_field("personal", ProfileField::Email, "a@b.c");

        assert!(result.is_err());
        assert!(store.get("personal").is_none());
    }

    #[test]
    fn test_update_field_accepts_unvalidated_values() {
        let mut store = ProfileStore::new();
        store
            .update_field(DEFAULT_PROFILE, ProfileField::Email, "not-an-email")
            .unwrap();
        store
            .update_field(DEFAULT_PROFILE, ProfileField::CardNumber, "1234")
            .unwrap();

        assert_eq!(
            store.field(DEFAULT_PROFILE, ProfileField::Email).unwrap(),
            "not-an-email"
        );
        assert_eq!(
            store.field(DEFAULT_PROFILE, ProfileField::CardNumber).unwrap(),
            "1234"
        );
    }

    #[test]
    fn test_create_profile_rejects_duplicates() {
        let mut store = ProfileStore::new();
        store.create_profile("business").unwrap();

        assert!(matches!(
            store.create_profile("business"),
            Err(Error::ProfileExists(_))
        ));
        assert_eq!(store.len(), 2);
        store.select_profile("business").unwrap();
        assert_eq!(store.selected_name(), "business");
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!("cardCVV".parse::<ProfileField>().unwrap(), ProfileField::CardCvv);
        assert_eq!("zipcode".parse::<ProfileField>().unwrap(), ProfileField::ZipCode);
        assert!("favouriteColour".parse::<ProfileField>().is_err());
    }

    #[test]
    fn test_profile_serializes_wire_names() {
        let profile = Profile::empty("default");
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["fields"]["cardCVV"], "");
        assert_eq!(json["fields"]["firstName"], "");
    }
}
