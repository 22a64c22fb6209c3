//! Contacts CSV export.

use chrono::NaiveDate;
use entity::company::Company;
use entity::contact::Contact;

use crate::lookup::NameIndex;
use crate::mapping::format_timestamp;

pub const CONTACTS_HEADER: &str =
    "ID,First Name,Last Name,Email,Phone,Title,Company,Created At,Updated At";

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One header row plus one row per contact, joined with `\n`. The company
/// column holds the resolved name, empty when the reference is dangling.
pub fn contacts_csv(contacts: &[Contact], companies: &[Company]) -> String {
    let names = NameIndex::companies(companies);
    let mut rows = Vec::with_capacity(contacts.len() + 1);
    rows.push(CONTACTS_HEADER.to_string());
    for contact in contacts {
        let created = contact.created_at.map(format_timestamp).unwrap_or_default();
        let updated = contact.updated_at.map(format_timestamp).unwrap_or_default();
        let fields = [
            contact.id.to_string(),
            quoted(&contact.first_name),
            quoted(&contact.last_name),
            quoted(&contact.email),
            quoted(contact.phone.as_deref().unwrap_or_default()),
            quoted(contact.title.as_deref().unwrap_or_default()),
            quoted(names.get(contact.company_id).unwrap_or_default()),
            quoted(&created),
            quoted(&updated),
        ];
        rows.push(fields.join(","));
    }
    rows.join("\n")
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("contacts_export_{}.csv", date.format("%Y-%m-%d"))
}
