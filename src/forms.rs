//! Text fields of the profile forms, checked and normalized at the request
//! boundary before anything reaches the stores or the media lifecycle manager.

use crate::models::{
    property::{FunctionType, Location, PropertyAttributes, VenueService},
    user::{BankDetails, OwnerDetails},
};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Repeated form field naming an existing photo to delete.
pub const DELETE_IMAGE_FIELD: &str = "delete_image";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Multipart text fields; a name may repeat.
#[derive(Debug, Default, Clone)]
pub struct FormFields {
    values: HashMap<String, Vec<String>>,
}

impl FormFields {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// First value of `name`, trimmed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(|value| value.trim())
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Checkbox semantics: present with a non-empty value other than "false"/"off".
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(v) if !v.is_empty() && v != "false" && v != "off")
    }

    fn required(&self, name: &str, label: &str) -> Result<&str, ValidationError> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ValidationError(format!("{label} is required."))),
        }
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|value| !value.is_empty())
            .map(String::from)
    }
}

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut fields = Self::default();
        for (name, value) in pairs {
            fields.push(name, value);
        }
        fields
    }
}

/// Owner details from the account form. Names and PAN are uppercased and the
/// email lowercased.
pub fn owner_details(fields: &FormFields) -> Result<OwnerDetails, ValidationError> {
    let first_name = fields.required("first_name", "First name")?.to_uppercase();

    let email = fields.required("email", "Email")?;
    if !is_email(email) {
        return Err(ValidationError("Email is not valid.".into()));
    }

    let phone = fields.required("phone", "Phone number")?;
    if !is_phone_number(phone) {
        return Err(ValidationError("Phone number is not valid.".into()));
    }

    Ok(OwnerDetails {
        first_name,
        last_name: fields.get("last_name").unwrap_or_default().to_uppercase(),
        email: email.to_lowercase(),
        phone: phone.to_string(),
        pan: fields.get("pan_num").unwrap_or_default().to_uppercase(),
    })
}

/// Bank account from the payout form. Holder name and IFSC are uppercased.
pub fn bank_details(fields: &FormFields) -> Result<BankDetails, ValidationError> {
    let name = fields
        .required("acholdername", "Account holder name")?
        .to_uppercase();

    let account_number = fields.required("acnum", "Account number")?;
    if !account_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError("Account number must be numeric.".into()));
    }

    let ifsc = fields.required("ifsc", "IFSC")?;
    if !ifsc.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError("IFSC must be alphanumeric.".into()));
    }

    Ok(BankDetails {
        name,
        account_number: account_number.to_string(),
        ifsc: ifsc.to_uppercase(),
    })
}

/// Build the property attributes from the submitted form.
pub fn property_attributes(fields: &FormFields) -> Result<PropertyAttributes, ValidationError> {
    let address = fields.required("address", "Address")?.to_uppercase();
    let city = fields.required("city", "City")?.to_uppercase();
    let state = fields.required("state", "State")?.to_uppercase();

    let pincode = fields.required("pincode", "Pincode")?;
    if !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError("Pincode must be numeric.".into()));
    }

    let contact = fields.required("contact", "Contact number")?;
    if !is_phone_number(contact) {
        return Err(ValidationError("Contact number is not valid.".into()));
    }

    let size = digits(fields.required("size", "Size")?, "Size")?;
    let capacity = digits(fields.required("capacity", "Capacity")?, "Capacity")?;
    let price = digits(fields.required("cost", "Cost")?, "Cost")?;

    let location = Location {
        latitude: coordinate(fields, "latitude")?,
        longitude: coordinate(fields, "longitude")?,
        address,
        city,
        state,
        pincode: pincode.to_string(),
    };

    Ok(PropertyAttributes {
        name: fields.get("propname").unwrap_or_default().to_uppercase(),
        location,
        contact: contact.to_string(),
        mail_id: fields.optional("mailid"),
        office_hours: fields.optional("officeHours"),
        capacity,
        price,
        size,
        function_types: FunctionType::ALL
            .into_iter()
            .filter(|ty| fields.flag(ty.label()))
            .collect(),
        services: VenueService::ALL
            .into_iter()
            .filter(|svc| fields.flag(svc.label()))
            .collect(),
        cctv: fields.flag("cctv"),
        dressing_room: fields.flag("dressingRoom"),
        allow_booking: fields.flag("allowBooking"),
        description: fields.get("desc").unwrap_or_default().to_string(),
    })
}

/// Filenames submitted under [`DELETE_IMAGE_FIELD`].
pub fn delete_flags(fields: &FormFields) -> BTreeSet<String> {
    fields
        .all(DELETE_IMAGE_FIELD)
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}

/// Keep only the digits of `raw`, e.g. "4,000 sq ft" -> 4000.
fn digits(raw: &str, label: &str) -> Result<i64, ValidationError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| ValidationError(format!("{label} must contain a number.")))
}

fn coordinate(fields: &FormFields, name: &str) -> Result<Option<f64>, ValidationError> {
    match fields.get(name).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ValidationError(format!("{name} must be a number."))),
    }
}

fn is_phone_number(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    (10..=13).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// `local@domain.tld` with no whitespace and a dot inside the domain.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
