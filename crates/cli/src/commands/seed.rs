//! Seed the database with contacts and interaction history.
//!
//! Reads a YAML file (or the bundled `samples.yaml`), validates every entry
//! before connecting, then inserts contacts and their interactions.
//! Interaction dates are written as `days_ago` relative to the time of
//! seeding.

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use round_again_core::{ContactDraft, ContactFieldError, InteractionType};
use round_again_server::db::{self, ContactRepository, InteractionRepository};

const BUNDLED_SAMPLES: &str = include_str!("../../samples.yaml");

/// Top-level layout of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub contacts: Vec<SeedContact>,
}

#[derive(Debug, Deserialize)]
pub struct SeedContact {
    #[serde(flatten)]
    pub contact: ContactDraft,
    #[serde(default)]
    pub interactions: Vec<SeedInteraction>,
}

#[derive(Debug, Deserialize)]
pub struct SeedInteraction {
    #[serde(default)]
    pub interaction_type: InteractionType,
    pub days_ago: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A problem with one entry of a seed file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("contact #{index}: {source}")]
    Contact {
        index: usize,
        source: ContactFieldError,
    },
    #[error("contact #{index}, interaction #{interaction}: days_ago must be between 0 and 36500")]
    DaysAgo { index: usize, interaction: usize },
}

/// A validated contact ready to insert.
#[derive(Debug)]
pub struct PlannedContact {
    pub draft: ContactDraft,
    pub interactions: Vec<PlannedInteraction>,
}

#[derive(Debug)]
pub struct PlannedInteraction {
    pub interaction_type: InteractionType,
    pub interaction_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Validate a seed file and resolve interaction dates against `now`.
///
/// All errors are collected so a bad file can be fixed in one pass.
///
/// # Errors
///
/// Returns every [`SeedError`] found if any entry is invalid.
pub fn plan(file: SeedFile, now: DateTime<Utc>) -> Result<Vec<PlannedContact>, Vec<SeedError>> {
    let mut planned = Vec::with_capacity(file.contacts.len());
    let mut errors = Vec::new();

    for (index, seed) in file.contacts.into_iter().enumerate() {
        let draft = match seed.contact.validate() {
            Ok(draft) => draft,
            Err(source) => {
                errors.push(SeedError::Contact { index, source });
                continue;
            }
        };

        let mut interactions = Vec::with_capacity(seed.interactions.len());
        for (interaction, entry) in seed.interactions.into_iter().enumerate() {
            let Some(interaction_date) = (0..=36_500)
                .contains(&entry.days_ago)
                .then(|| TimeDelta::try_days(entry.days_ago))
                .flatten()
                .and_then(|ago| now.checked_sub_signed(ago))
            else {
                errors.push(SeedError::DaysAgo { index, interaction });
                continue;
            };
            interactions.push(PlannedInteraction {
                interaction_type: entry.interaction_type,
                interaction_date,
                notes: entry.notes.filter(|n| !n.trim().is_empty()),
            });
        }

        planned.push(PlannedContact {
            draft,
            interactions,
        });
    }

    if errors.is_empty() {
        Ok(planned)
    } else {
        Err(errors)
    }
}

/// Seed contacts from `file_path`, or from the bundled samples.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or a database operation fails.
pub async fn run(file_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = match file_path {
        Some(path) => {
            info!(path = %path.display(), "Loading contacts from file");
            tokio::fs::read_to_string(path).await?
        }
        None => {
            info!("Loading bundled sample contacts");
            BUNDLED_SAMPLES.to_string()
        }
    };

    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(contacts = file.contacts.len(), "Parsed seed file");

    let now = Utc::now();
    let planned = match plan(file, now) {
        Ok(planned) => planned,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let contacts = ContactRepository::new(&pool);
    let interactions = InteractionRepository::new(&pool);
    let mut interaction_count = 0usize;

    for entry in &planned {
        let contact = contacts.create(&entry.draft, now).await?;
        for interaction in &entry.interactions {
            interactions
                .create(
                    contact.id,
                    interaction.interaction_type,
                    interaction.interaction_date,
                    interaction.notes.as_deref(),
                )
                .await?;
            interaction_count += 1;
        }
        info!(contact_id = %contact.id, name = %contact.name, "Added contact");
    }

    info!(
        contacts = planned.len(),
        interactions = interaction_count,
        "Seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use round_again_core::FrequencyUnit;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_bundled_samples_parse_and_validate() {
        let file: SeedFile = serde_yaml::from_str(BUNDLED_SAMPLES).unwrap();
        let planned = plan(file, now()).unwrap();

        assert_eq!(planned.len(), 5);
        let names: Vec<&str> = planned.iter().map(|p| p.draft.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "John Smith",
                "Emily Johnson",
                "Michael Chen",
                "Sarah Williams",
                "David Rodriguez"
            ]
        );

        let david = &planned[4];
        assert_eq!(david.draft.frequency_unit, FrequencyUnit::Week);
        assert_eq!(david.interactions.len(), 3);
        assert_eq!(
            david.interactions[2].interaction_type,
            InteractionType::InPerson
        );
        assert_eq!(
            david.interactions[0].interaction_date,
            now() - TimeDelta::days(2)
        );
    }

    #[test]
    fn test_defaults_apply_to_sparse_entries() {
        let yaml = "contacts:\n  - name: Pat\n    interactions:\n      - days_ago: 3\n";
        let file: SeedFile = serde_yaml::from_str(yaml).unwrap();
        let planned = plan(file, now()).unwrap();

        let pat = &planned[0];
        assert_eq!(pat.draft.frequency_value, 1);
        assert_eq!(pat.draft.frequency_unit, FrequencyUnit::Month);
        assert_eq!(pat.interactions[0].interaction_type, InteractionType::Call);
        assert!(pat.interactions[0].notes.is_none());
    }

    #[test]
    fn test_all_errors_are_reported() {
        let yaml = "\
contacts:
  - name: '   '
  - name: Ok Person
    frequency_value: 0
  - name: Time Traveller
    interactions:
      - days_ago: -1
";
        let file: SeedFile = serde_yaml::from_str(yaml).unwrap();
        let errors = plan(file, now()).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors[0],
            SeedError::Contact {
                index: 0,
                source: ContactFieldError::EmptyName
            }
        );
        assert!(matches!(errors[1], SeedError::Contact { index: 1, .. }));
        assert_eq!(
            errors[2],
            SeedError::DaysAgo {
                index: 2,
                interaction: 0
            }
        );
    }

    #[test]
    fn test_invalid_email_is_a_parse_error() {
        let yaml = "contacts:\n  - name: Pat\n    email: not-an-email\n";
        assert!(serde_yaml::from_str::<SeedFile>(yaml).is_err());
    }
}
