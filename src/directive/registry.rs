//! Directive registry - declarations for every entity type.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::DirectiveDecl;

/// Declared directives of one entity type, by method name.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectives {
    methods: HashMap<String, DirectiveDecl>,
}

impl EntityDirectives {
    /// Declare a primary lookup whose identity is the first argument.
    #[must_use]
    pub fn primary_get(self, method: &str, identity_field: &str) -> Self {
        self.primary_get_at(method, 0, identity_field)
    }

    /// Declare a primary lookup whose identity is argument `identity_arg`.
    #[must_use]
    pub fn primary_get_at(mut self, method: &str, identity_arg: usize, identity_field: &str) -> Self {
        self.methods.insert(
            method.to_string(),
            DirectiveDecl::PrimaryGet {
                identity_arg,
                identity_field: identity_field.to_string(),
            },
        );
        self
    }

    /// Declare a reference lookup resolving to `primary_method`.
    #[must_use]
    pub fn reference_get<I, S>(mut self, method: &str, reference_fields: I, primary_method: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.insert(
            method.to_string(),
            DirectiveDecl::ReferenceGet {
                reference_fields: reference_fields.into_iter().map(Into::into).collect(),
                primary_method: primary_method.to_string(),
            },
        );
        self
    }

    /// Declare a method that must never be cached.
    #[must_use]
    pub fn uncached(mut self, method: &str) -> Self {
        self.methods.insert(method.to_string(), DirectiveDecl::Uncached);
        self
    }

    /// Insert a raw declaration.
    #[must_use]
    pub fn declare(mut self, method: &str, decl: DirectiveDecl) -> Self {
        self.methods.insert(method.to_string(), decl);
        self
    }

    pub fn get(&self, method: &str) -> Option<&DirectiveDecl> {
        self.methods.get(method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Declarations for all entity types, fixed once built.
///
/// Cloning is cheap and shares the same table.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    entities: Arc<HashMap<String, EntityDirectives>>,
}

impl DirectiveRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The declaration of `entity_type.method`, if any.
    pub fn declaration(&self, entity_type: &str, method: &str) -> Option<&DirectiveDecl> {
        self.entities.get(entity_type)?.get(method)
    }

    pub fn entity(&self, entity_type: &str) -> Option<&EntityDirectives> {
        self.entities.get(entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.entities.contains_key(entity_type)
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("entity_count", &self.entities.len())
            .field("entity_types", &self.entities.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`DirectiveRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: HashMap<String, EntityDirectives>,
}

impl RegistryBuilder {
    /// Declare the methods of `entity_type`.
    ///
    /// Calling this twice for the same type extends the earlier declarations;
    /// a method declared twice keeps the later declaration.
    #[must_use]
    pub fn entity<F>(mut self, entity_type: &str, declare: F) -> Self
    where
        F: FnOnce(EntityDirectives) -> EntityDirectives,
    {
        let existing = self.entities.remove(entity_type).unwrap_or_default();
        let declared = declare(existing);
        debug!("Declared {} methods for {}", declared.len(), entity_type);
        self.entities.insert(entity_type.to_string(), declared);
        self
    }

    pub fn build(self) -> DirectiveRegistry {
        info!("Directive registry built with {} entity types", self.entities.len());
        DirectiveRegistry {
            entities: Arc::new(self.entities),
        }
    }
}
