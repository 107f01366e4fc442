use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::field::Field;

/// How a handler came to be registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum RegistrationMethod {
    /// Registered at runtime by the application itself.
    #[default]
    Dynamic,
    /// Declared in the bundle manifest and registered by the installer.
    Static,
    /// Any other flag value, preserved as-is.
    Other(u32),
}

impl From<u32> for RegistrationMethod {
    fn from(value: u32) -> Self {
        match value {
            0 => RegistrationMethod::Dynamic,
            1 => RegistrationMethod::Static,
            other => RegistrationMethod::Other(other),
        }
    }
}

impl From<RegistrationMethod> for u32 {
    fn from(method: RegistrationMethod) -> Self {
        match method {
            RegistrationMethod::Dynamic => 0,
            RegistrationMethod::Static => 1,
            RegistrationMethod::Other(other) => other,
        }
    }
}

/// Display names of a handler's actions for one locale.
///
/// `names[i]` names `actions[i]` of the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNameMap {
    pub locale: String,
    pub names: Vec<String>,
}

impl ActionNameMap {
    pub fn new<I, S>(locale: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locale: locale.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// One registered content handler.
///
/// Records are never modified once registered; an update is an unregister
/// followed by a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct HandlerRecord {
    #[builder(into)]
    pub id: String,
    pub owner_storage_id: u32,
    #[builder(into)]
    pub class_name: String,
    #[builder(default)]
    #[serde(default)]
    pub registration_method: RegistrationMethod,
    #[builder(default)]
    #[serde(default)]
    pub types: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    pub suffixes: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    pub actions: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    pub action_names: Vec<ActionNameMap>,
    /// Caller ids or id prefixes allowed to discover this handler. Empty means
    /// unrestricted.
    #[builder(default)]
    #[serde(default)]
    pub accesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRecord {
    #[error("handler id must not be empty")]
    EmptyId,

    #[error("empty value in {0} list")]
    EmptyValue(Field),

    #[error("action names given for a handler without actions")]
    ActionNamesWithoutActions,

    #[error("locale '{locale}' names {names} actions but the handler has {actions}")]
    ActionNameCount {
        locale: String,
        names: usize,
        actions: usize,
    },

    #[error("locale '{0}' has more than one action name map")]
    DuplicateLocale(String),
}

impl HandlerRecord {
    /// Checks the shape constraints a record must meet before registration.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.id.is_empty() {
            return Err(InvalidRecord::EmptyId);
        }

        for (field, values) in [
            (Field::Types, &self.types),
            (Field::Suffixes, &self.suffixes),
            (Field::Actions, &self.actions),
            (Field::Accesses, &self.accesses),
        ] {
            if values.iter().any(String::is_empty) {
                return Err(InvalidRecord::EmptyValue(field));
            }
        }

        if !self.action_names.is_empty() && self.actions.is_empty() {
            return Err(InvalidRecord::ActionNamesWithoutActions);
        }

        let mut seen = HashSet::new();
        for map in &self.action_names {
            if map.locale.is_empty() {
                return Err(InvalidRecord::EmptyValue(Field::Locales));
            }
            if !seen.insert(map.locale.as_str()) {
                return Err(InvalidRecord::DuplicateLocale(map.locale.clone()));
            }
            if map.names.len() != self.actions.len() {
                return Err(InvalidRecord::ActionNameCount {
                    locale: map.locale.clone(),
                    names: map.names.len(),
                    actions: self.actions.len(),
                });
            }
        }

        Ok(())
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.action_names.iter().map(|map| map.locale.as_str())
    }

    /// Display name of `action` in `locale`, if both are known.
    pub fn action_name(&self, action: &str, locale: &str) -> Option<&str> {
        let position = self.actions.iter().position(|a| a == action)?;
        self.action_names
            .iter()
            .find(|map| map.locale == locale)
            .and_then(|map| map.names.get(position))
            .map(String::as_str)
    }

    /// Values held in `field`.
    ///
    /// The action map flattens to every locale's names in action order, one
    /// locale after another.
    pub fn field_values(&self, field: Field) -> Vec<&str> {
        match field {
            Field::Id => vec![self.id.as_str()],
            Field::Types => as_strs(&self.types),
            Field::Suffixes => as_strs(&self.suffixes),
            Field::Actions => as_strs(&self.actions),
            Field::Locales => self.locales().collect(),
            Field::ActionMap => self
                .action_names
                .iter()
                .flat_map(|map| map.names.iter().map(String::as_str))
                .collect(),
            Field::Accesses => as_strs(&self.accesses),
        }
    }

    /// Whether a caller may discover this handler through searches.
    ///
    /// Unrestricted handlers are visible to everyone; otherwise one access
    /// entry must equal the caller id or be a prefix of it.
    pub fn is_visible_to(&self, caller_id: &str) -> bool {
        self.accesses.is_empty()
            || self
                .accesses
                .iter()
                .any(|access| caller_id.starts_with(access.as_str()))
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// Whether `a` and `b` are equal or one is a prefix of the other.
pub fn ids_overlap(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> HandlerRecord {
        HandlerRecord::builder()
            .id("com.acme.editor")
            .owner_storage_id(7)
            .class_name("com.acme.Editor")
            .actions(vec!["open".into(), "edit".into()])
            .action_names(vec![
                ActionNameMap::new("en", ["Open", "Edit"]),
                ActionNameMap::new("fr", ["Ouvrir", "Modifier"]),
            ])
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let record = HandlerRecord::builder()
            .id("h")
            .owner_storage_id(1)
            .class_name("Main")
            .build();
        assert_eq!(record.registration_method, RegistrationMethod::Dynamic);
        assert!(record.types.is_empty());
        assert!(record.accesses.is_empty());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_registration_method_flags() {
        assert_eq!(RegistrationMethod::from(1), RegistrationMethod::Static);
        assert_eq!(RegistrationMethod::from(9), RegistrationMethod::Other(9));
        assert_eq!(u32::from(RegistrationMethod::Other(9)), 9);
    }

    #[test]
    fn test_action_name_lookup() {
        let record = editor();
        assert_eq!(record.action_name("edit", "fr"), Some("Modifier"));
        assert_eq!(record.action_name("edit", "de"), None);
        assert_eq!(record.action_name("print", "en"), None);
        assert_eq!(record.locales().collect::<Vec<_>>(), vec!["en", "fr"]);
    }

    #[test]
    fn test_action_map_flattening() {
        let record = editor();
        assert_eq!(
            record.field_values(Field::ActionMap),
            vec!["Open", "Edit", "Ouvrir", "Modifier"]
        );
        assert_eq!(record.field_values(Field::Id), vec!["com.acme.editor"]);
    }

    #[test]
    fn test_validation() {
        let mut record = editor();
        record.id.clear();
        assert_eq!(record.validate(), Err(InvalidRecord::EmptyId));

        let mut record = editor();
        record.action_names[1].names.pop();
        assert!(matches!(
            record.validate(),
            Err(InvalidRecord::ActionNameCount { names: 1, actions: 2, .. })
        ));

        let mut record = editor();
        record.action_names[1].locale = "en".into();
        assert_eq!(record.validate(), Err(InvalidRecord::DuplicateLocale("en".into())));

        let mut record = editor();
        record.actions.clear();
        assert_eq!(record.validate(), Err(InvalidRecord::ActionNamesWithoutActions));

        let mut record = editor();
        record.types = vec!["".into()];
        assert_eq!(record.validate(), Err(InvalidRecord::EmptyValue(Field::Types)));
    }

    #[test]
    fn test_visibility() {
        let mut record = editor();
        assert!(record.is_visible_to("anyone"));

        record.accesses = vec!["com.acme".into()];
        assert!(record.is_visible_to("com.acme"));
        assert!(record.is_visible_to("com.acme.sub"));
        assert!(!record.is_visible_to("com.other"));
        assert!(!record.is_visible_to("com"));
    }

    #[test]
    fn test_ids_overlap() {
        assert!(ids_overlap("a", "a"));
        assert!(ids_overlap("a", "ab"));
        assert!(ids_overlap("ab", "a"));
        assert!(!ids_overlap("ab", "ac"));
    }
}
