//! Caching directives.
//!
//! Every query method an entity exposes is declared up front with a
//! [`DirectiveDecl`]. The [`DirectiveResolver`] turns declarations into
//! validated [`Directive`]s on first use and memoizes them. Anything that is
//! undeclared or malformed resolves to [`Directive::Uncached`]: a method that
//! is not cached only costs a store round trip, while a method cached under
//! the wrong directive serves wrong rows.
//!
//! ## Usage
//!
//! ```rust
//! use rowcache::directive::{Directive, DirectiveRegistry, DirectiveResolver};
//!
//! let registry = DirectiveRegistry::builder()
//!     .entity("example", |e| {
//!         e.primary_get("get", "id")
//!             .reference_get("getByName", ["name"], "get")
//!             .uncached("findByName")
//!     })
//!     .build();
//!
//! let resolver = DirectiveResolver::new(registry);
//! assert!(matches!(*resolver.resolve("example", "get"), Directive::PrimaryGet { .. }));
//! assert_eq!(*resolver.resolve("example", "searchAll"), Directive::Uncached);
//! ```

mod registry;
mod resolver;

pub use registry::{DirectiveRegistry, EntityDirectives, RegistryBuilder};
pub use resolver::DirectiveResolver;

/// How a method was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveDecl {
    /// Single-row lookup by identity.
    PrimaryGet {
        /// Position of the identity among the call arguments.
        identity_arg: usize,
        /// Row field holding the identity.
        identity_field: String,
    },
    /// Single-row lookup by secondary fields, resolved through a pointer to
    /// the row's primary entry.
    ReferenceGet {
        /// Row fields the call arguments correspond to, in call order.
        reference_fields: Vec<String>,
        /// Sibling primary lookup the pointer resolves to.
        primary_method: String,
    },
    /// Never cached.
    Uncached,
}

/// How a method's results are cached, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    PrimaryGet {
        identity_arg: usize,
        identity_field: String,
    },
    ReferenceGet {
        reference_fields: Vec<String>,
        primary_method: String,
        /// Identity field of `primary_method`, read from the result row.
        identity_field: String,
    },
    Uncached,
}

impl Directive {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::PrimaryGet { .. } => "primary",
            Directive::ReferenceGet { .. } => "reference",
            Directive::Uncached => "uncached",
        }
    }
}
