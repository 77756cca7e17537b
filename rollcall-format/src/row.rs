//! Person → row conversion.
//!
//! # Column table
//!
//! | # | Column        | Source                                   | Fallback |
//! |---|---------------|------------------------------------------|----------|
//! | 0 | Name          | first name record, family-name first     | `unk`    |
//! | 1 | Position      | first organization's title               | empty    |
//! | 2 | Status        | group label                              | -        |
//! | 3 | Phone         | first phone number                       | empty    |
//! | 4 | Home Address  | first address: street, city, region, zip | empty    |
//! | 5 | Primary Email | first email address                      | empty    |
//! | 6 | Other Email   | second email address                     | empty    |
//!
//! Each column is looked up independently; a fallback applies only when the
//! source record list is empty. A record that exists but lacks the field
//! renders as an empty cell.

use rollcall_core::{GroupLabel, Person};

/// Number of columns in every row block.
pub const COLUMN_COUNT: usize = 7;

/// Separator between address sub-fields.
const ADDRESS_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// Column table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Position,
    Status,
    Phone,
    HomeAddress,
    PrimaryEmail,
    OtherEmail,
}

impl Column {
    /// All columns in sheet order.
    pub fn all() -> &'static [Column] {
        &[
            Column::Name,
            Column::Position,
            Column::Status,
            Column::Phone,
            Column::HomeAddress,
            Column::PrimaryEmail,
            Column::OtherEmail,
        ]
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Position => "Position",
            Column::Status => "Status",
            Column::Phone => "Phone",
            Column::HomeAddress => "Home Address",
            Column::PrimaryEmail => "Primary Email",
            Column::OtherEmail => "Other Email",
        }
    }

    /// Value written when the person has no record for this column.
    pub fn fallback(self) -> &'static str {
        match self {
            Column::Name => "unk",
            _ => "",
        }
    }

    /// Raw lookup; `None` means "no source record", not "empty field".
    fn extract(self, person: &Person, label: GroupLabel) -> Option<String> {
        match self {
            Column::Name => person.names.first().map(|name| {
                name.display_name_last_first
                    .clone()
                    .or_else(|| family_first(name.family_name.as_deref(), name.given_name.as_deref()))
                    .unwrap_or_default()
            }),
            Column::Position => person
                .organizations
                .first()
                .map(|org| org.title.clone().unwrap_or_default()),
            Column::Status => Some(label.label().to_string()),
            Column::Phone => person
                .phone_numbers
                .first()
                .map(|phone| phone.value.clone().unwrap_or_default()),
            Column::HomeAddress => person.addresses.first().map(|addr| {
                [
                    &addr.street_address,
                    &addr.city,
                    &addr.region,
                    &addr.postal_code,
                ]
                .iter()
                .map(|part| part.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(ADDRESS_SEPARATOR)
            }),
            Column::PrimaryEmail => person
                .email_addresses
                .first()
                .map(|email| email.value.clone().unwrap_or_default()),
            Column::OtherEmail => person
                .email_addresses
                .get(1)
                .map(|email| email.value.clone().unwrap_or_default()),
        }
    }

    fn cell(self, person: &Person, label: GroupLabel) -> String {
        self.extract(person, label)
            .unwrap_or_else(|| self.fallback().to_string())
    }
}

fn family_first(family: Option<&str>, given: Option<&str>) -> Option<String> {
    match (family, given) {
        (Some(family), Some(given)) => Some(format!("{family}, {given}")),
        (Some(family), None) => Some(family.to_string()),
        (None, Some(given)) => Some(given.to_string()),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One sheet row. Field order is the column order, so the derived `Ord`
/// compares rows field by field, left to right.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row {
    pub name: String,
    pub position: String,
    pub status: String,
    pub phone: String,
    pub home_address: String,
    pub primary_email: String,
    pub other_email: String,
}

impl Row {
    /// The seven cell values in column order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.position.clone(),
            self.status.clone(),
            self.phone.clone(),
            self.home_address.clone(),
            self.primary_email.clone(),
            self.other_email.clone(),
        ]
    }
}

/// Header cells for row 1.
pub fn header_row() -> Vec<String> {
    Column::all().iter().map(|c| c.header().to_string()).collect()
}

/// Format one person as a row of group `label`.
pub fn format_person(person: &Person, label: GroupLabel) -> Row {
    Row {
        name: Column::Name.cell(person, label),
        position: Column::Position.cell(person, label),
        status: Column::Status.cell(person, label),
        phone: Column::Phone.cell(person, label),
        home_address: Column::HomeAddress.cell(person, label),
        primary_email: Column::PrimaryEmail.cell(person, label),
        other_email: Column::OtherEmail.cell(person, label),
    }
}

/// Format a group's people and sort the rows.
pub fn format_group(people: &[Person], label: GroupLabel) -> Vec<Row> {
    let mut rows: Vec<Row> = people.iter().map(|p| format_person(p, label)).collect();
    rows.sort();
    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::types::{Address, EmailAddress, Organization, PersonName, PhoneNumber};

    fn email(value: &str) -> EmailAddress {
        EmailAddress {
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn bare_person_gets_fallbacks() {
        let row = format_person(&Person::default(), GroupLabel::Inactive);
        assert_eq!(
            row.cells(),
            vec!["unk", "", "Inactive", "", "", "", ""]
        );
    }

    #[test]
    fn fully_populated_person() {
        let person = Person {
            names: vec![PersonName {
                display_name_last_first: Some("Doe, Jane".to_string()),
                ..PersonName::default()
            }],
            organizations: vec![Organization {
                title: Some("Treasurer".to_string()),
                ..Organization::default()
            }],
            phone_numbers: vec![
                PhoneNumber {
                    value: Some("555-0100".to_string()),
                },
                PhoneNumber {
                    value: Some("555-0199".to_string()),
                },
            ],
            addresses: vec![Address {
                street_address: Some("1 Main St".to_string()),
                city: Some("Springfield".to_string()),
                region: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
            }],
            email_addresses: vec![email("jane@x.com"), email("jd@y.org"), email("third@z.net")],
            ..Person::default()
        };

        let row = format_person(&person, GroupLabel::Active);
        assert_eq!(
            row.cells(),
            vec![
                "Doe, Jane",
                "Treasurer",
                "Active",
                "555-0100",
                "1 Main St, Springfield, IL, 62701",
                "jane@x.com",
                "jd@y.org",
            ]
        );
    }

    #[test]
    fn missing_address_parts_keep_separators() {
        let person = Person {
            addresses: vec![Address {
                city: Some("Springfield".to_string()),
                ..Address::default()
            }],
            ..Person::default()
        };
        assert_eq!(
            format_person(&person, GroupLabel::Guest).home_address,
            ", Springfield, , "
        );
    }

    #[test]
    fn name_record_without_display_form_is_composed() {
        let person = Person {
            names: vec![PersonName {
                given_name: Some("John".to_string()),
                family_name: Some("Doe".to_string()),
                ..PersonName::default()
            }],
            ..Person::default()
        };
        assert_eq!(format_person(&person, GroupLabel::Guest).name, "Doe, John");
    }

    #[test]
    fn empty_name_record_is_blank_not_unk() {
        let person = Person {
            names: vec![PersonName::default()],
            ..Person::default()
        };
        assert_eq!(format_person(&person, GroupLabel::Guest).name, "");
    }

    #[test]
    fn given_first_display_name_is_not_used() {
        let person = Person {
            names: vec![PersonName {
                display_name: Some("John Doe".to_string()),
                ..PersonName::default()
            }],
            ..Person::default()
        };
        assert_eq!(format_person(&person, GroupLabel::Guest).name, "");
    }

    #[test]
    fn group_rows_sort_field_by_field() {
        let named = |n: &str, mail: &str| Person {
            names: vec![PersonName {
                display_name_last_first: Some(n.to_string()),
                ..PersonName::default()
            }],
            email_addresses: vec![email(mail)],
            ..Person::default()
        };
        let people = vec![
            named("Smith, Ann", "b@x.com"),
            named("Doe, John", "z@x.com"),
            named("Smith, Ann", "a@x.com"),
        ];

        let rows = format_group(&people, GroupLabel::Student);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.primary_email.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Doe, John", "z@x.com"),
                ("Smith, Ann", "a@x.com"),
                ("Smith, Ann", "b@x.com"),
            ]
        );
    }

    #[test]
    fn header_matches_column_table() {
        assert_eq!(header_row().len(), COLUMN_COUNT);
        assert_eq!(header_row()[4], "Home Address");
    }
}
