//! Variables shared down the actor tree
//!
//! A variable is a named string value. Options reference variables with the
//! padded `@{name}` syntax and resolve them at read time, so a value set by one
//! actor during a run becomes visible to every later option read.

use std::{collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Captures, Regex};

use crate::domain::error::{FlowError, Result};

pub const VAR_START: &str = "@{";
pub const VAR_END: &str = "}";

static VAR_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\{([A-Za-z0-9_-]+)\}").expect("hardcoded regex pattern is valid"));

/// Checks a variable or storage name against `[A-Za-z0-9_-]+`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Whether the whole string is a single padded variable reference
pub fn is_var(text: &str) -> bool {
    text.strip_prefix(VAR_START).and_then(|rest| rest.strip_suffix(VAR_END)).is_some_and(is_valid_name)
}

pub fn pad_var(name: &str) -> String {
    format!("{}{}{}", VAR_START, name, VAR_END)
}

/// Strips the padding from a variable reference, other strings come back as is
pub fn unpad_var(text: &str) -> &str {
    if is_var(text) { &text[VAR_START.len()..text.len() - VAR_END.len()] } else { text }
}

/// Shared handle to a flat name → value store
///
/// Cloning the handle shares the store; children receive a clone of their
/// parent's handle unless explicitly given a new one.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    inner: Arc<RwLock<BTreeMap<String, String>>>
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: impl Into<String>) -> Result<()> {
        if !is_valid_name(name) {
            return Err(FlowError::invalid_variable_name(name));
        }
        self.inner.write().insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner.read().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.inner.write().remove(name)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy of the current name → value pairs
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner.read().clone()
    }

    /// Replaces every `@{name}` reference with the variable's value; references
    /// to unknown variables are left untouched
    pub fn expand(&self, text: &str) -> String {
        let vars = self.inner.read();
        VAR_REFERENCE
            .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string()
            })
            .into_owned()
    }

    /// Whether both handles point at the same store
    pub fn shares_with(&self, other: &Variables) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("a_b-1"));
        assert!(is_valid_name("HOME"));
        assert!(!is_valid_name("a.b"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("with space"));
    }

    #[test]
    fn test_padding() {
        assert_eq!(pad_var("home"), "@{home}");
        assert!(is_var("@{home}"));
        assert!(!is_var("@{ho.me}"));
        assert!(!is_var("prefix @{home}"));
        assert_eq!(unpad_var("@{home}"), "home");
        assert_eq!(unpad_var("home"), "home");
    }

    #[test]
    fn test_set_rejects_invalid_names() {
        let vars = Variables::new();
        assert!(matches!(vars.set("a.b", "x"), Err(FlowError::InvalidName(_))));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_expand() {
        let vars = Variables::new();
        vars.set("i", "3").unwrap();
        assert_eq!(vars.expand("@{i} < 5"), "3 < 5");
        assert_eq!(vars.expand("@{i}/@{missing}"), "3/@{missing}");
    }

    #[test]
    fn test_clones_share_the_store() {
        let parent = Variables::new();
        let child = parent.clone();
        child.set("x", "1").unwrap();
        assert_eq!(parent.get("x").as_deref(), Some("1"));
        assert!(parent.shares_with(&child));
        assert!(!parent.shares_with(&Variables::new()));
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn names_from_the_charset_are_valid(name in "[A-Za-z0-9_-]{1,24}") {
            prop_assert!(is_valid_name(&name));
            let padded = pad_var(&name);
            prop_assert!(is_var(&padded));
            prop_assert_eq!(unpad_var(&padded), name.as_str());
        }

        #[test]
        fn any_foreign_character_invalidates(prefix in "[a-z]{0,5}", bad in "[^A-Za-z0-9_-]", suffix in "[a-z]{0,5}") {
            let name = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(!is_valid_name(&name));
        }
    }
}
