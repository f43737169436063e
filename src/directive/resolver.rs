//! Directive resolution with memoization.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::{Directive, DirectiveDecl, DirectiveRegistry};
use crate::error::DirectiveError;

/// Resolves `(entity type, method)` to a validated [`Directive`].
///
/// Resolution is deterministic and side-effect free apart from the memo
/// table, so each pair is validated once and every later lookup is a map
/// read. Faults are logged once, at the first resolution.
pub struct DirectiveResolver {
    registry: DirectiveRegistry,
    memo: DashMap<(String, String), Arc<Directive>>,
    enabled: bool,
    uncached: Arc<Directive>,
}

impl DirectiveResolver {
    pub fn new(registry: DirectiveRegistry) -> Self {
        Self {
            registry,
            memo: DashMap::with_capacity(64),
            enabled: true,
            uncached: Arc::new(Directive::Uncached),
        }
    }

    /// A resolver that answers [`Directive::Uncached`] for everything.
    pub fn disabled(registry: DirectiveRegistry) -> Self {
        Self {
            enabled: false,
            ..Self::new(registry)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    /// Number of memoized resolutions.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    /// Resolve the directive for `entity_type.method`.
    pub fn resolve(&self, entity_type: &str, method: &str) -> Arc<Directive> {
        if !self.enabled {
            return Arc::clone(&self.uncached);
        }

        let memo_key = (entity_type.to_string(), method.to_string());
        if let Some(directive) = self.memo.get(&memo_key) {
            return Arc::clone(directive.value());
        }

        let directive = match self.validate(entity_type, method) {
            Ok(directive) => {
                debug!("Resolved {}.{} as {}", entity_type, method, directive.kind());
                Arc::new(directive)
            }
            Err(e) => {
                warn!("Caching disabled for {}.{}: {}", entity_type, method, e);
                Arc::clone(&self.uncached)
            }
        };

        Arc::clone(self.memo.entry(memo_key).or_insert(directive).value())
    }

    fn validate(&self, entity_type: &str, method: &str) -> Result<Directive, DirectiveError> {
        let Some(decl) = self.registry.declaration(entity_type, method) else {
            return Ok(Directive::Uncached);
        };

        match decl {
            DirectiveDecl::Uncached => Ok(Directive::Uncached),

            DirectiveDecl::PrimaryGet {
                identity_arg,
                identity_field,
            } => {
                if identity_field.is_empty() {
                    return Err(DirectiveError::EmptyIdentityField {
                        entity: entity_type.to_string(),
                        method: method.to_string(),
                    });
                }
                Ok(Directive::PrimaryGet {
                    identity_arg: *identity_arg,
                    identity_field: identity_field.clone(),
                })
            }

            DirectiveDecl::ReferenceGet {
                reference_fields,
                primary_method,
            } => {
                if reference_fields.is_empty() {
                    return Err(DirectiveError::NoReferenceFields {
                        entity: entity_type.to_string(),
                        method: method.to_string(),
                    });
                }

                match self.registry.declaration(entity_type, primary_method) {
                    Some(DirectiveDecl::PrimaryGet { identity_field, .. }) if !identity_field.is_empty() => {
                        Ok(Directive::ReferenceGet {
                            reference_fields: reference_fields.clone(),
                            primary_method: primary_method.clone(),
                            identity_field: identity_field.clone(),
                        })
                    }
                    Some(DirectiveDecl::PrimaryGet { .. }) => Err(DirectiveError::EmptyIdentityField {
                        entity: entity_type.to_string(),
                        method: primary_method.clone(),
                    }),
                    Some(_) => Err(DirectiveError::NotPrimary {
                        entity: entity_type.to_string(),
                        method: method.to_string(),
                        target: primary_method.clone(),
                    }),
                    None => Err(DirectiveError::UnknownPrimary {
                        entity: entity_type.to_string(),
                        method: method.to_string(),
                        target: primary_method.clone(),
                    }),
                }
            }
        }
    }
}

impl std::fmt::Debug for DirectiveResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveResolver")
            .field("registry", &self.registry)
            .field("memoized", &self.memo.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
