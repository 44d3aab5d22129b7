//! Metadata value resolution
//!
//! Raw metadata input passes through a three-step cascade before it is
//! stored on a document:
//!
//! 1. `lookup` names an allow-listed validator: the input is passed
//!    through it and replaced only when the validator returns a non-empty
//!    transform.
//! 2. `lookup` is anything else: it is a restricted choice-set expression
//!    evaluated against the model registry, and the input must be a member
//!    of the resolved set.
//! 3. No input but `default` is set: the default expression is evaluated
//!    over the allow-listed function registry.
//!
//! Every expression path routes through the same restricted evaluator as
//! index templates; there is no dynamic code execution.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{IndexError, Result};
use crate::eval::{evaluate, registry, ModelRegistry, ModelScope, Scope};
use crate::model::{DocumentTypeBinding, MetadataType};

/// Empty scope for default expressions (functions and literals only)
struct EmptyScope;

impl Scope for EmptyScope {
    fn resolve(&self, _path: &[String]) -> Option<serde_json::Value> {
        None
    }
}

/// Registry of metadata types and their document-type bindings
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    types: HashMap<String, MetadataType>,
    bindings: Vec<DocumentTypeBinding>,
    models: ModelRegistry,
}

impl MetadataRegistry {
    /// Create an empty registry with the built-in model choice sets
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            bindings: Vec::new(),
            models: ModelRegistry::with_builtins(),
        }
    }

    /// Replace the model registry (host-registered choice sets)
    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = models;
        self
    }

    /// Register (or replace) a metadata type
    pub fn register_type(&mut self, metadata_type: MetadataType) {
        self.types
            .insert(metadata_type.name.clone(), metadata_type);
    }

    /// Get a metadata type by name
    ///
    /// # Errors
    /// Returns `MetadataTypeNotFound` if no type with this name exists.
    pub fn get_type(&self, name: &str) -> Result<&MetadataType> {
        self.types
            .get(name)
            .ok_or_else(|| IndexError::MetadataTypeNotFound {
                name: name.to_string(),
            })
    }

    /// Delete a metadata type
    ///
    /// # Errors
    /// * `MetadataTypeNotFound` - no type with this name
    /// * `MetadataTypeInUse` - document-type bindings still reference it
    pub fn remove_type(&mut self, name: &str) -> Result<MetadataType> {
        if !self.types.contains_key(name) {
            return Err(IndexError::MetadataTypeNotFound {
                name: name.to_string(),
            });
        }
        let binding_count = self
            .bindings
            .iter()
            .filter(|b| b.metadata_type == name)
            .count();
        if binding_count > 0 {
            return Err(IndexError::MetadataTypeInUse {
                name: name.to_string(),
                binding_count,
            });
        }
        self.types
            .remove(name)
            .ok_or_else(|| IndexError::MetadataTypeNotFound {
                name: name.to_string(),
            })
    }

    /// Bind a metadata type to a document type
    ///
    /// # Errors
    /// Returns `MetadataTypeNotFound` if the metadata type isn't registered.
    pub fn bind(&mut self, binding: DocumentTypeBinding) -> Result<()> {
        self.get_type(&binding.metadata_type)?;
        self.bindings
            .retain(|b| {
                !(b.document_type == binding.document_type
                    && b.metadata_type == binding.metadata_type)
            });
        self.bindings.push(binding);
        Ok(())
    }

    /// Bindings declared for a document type, in declaration order
    pub fn bindings_for(&self, document_type: &str) -> Vec<&DocumentTypeBinding> {
        self.bindings
            .iter()
            .filter(|b| b.document_type == document_type)
            .collect()
    }

    /// Resolve a raw input value for a metadata type
    ///
    /// Returns `Ok(None)` when no value results (absent input, no
    /// default); the caller decides whether that violates a `required`
    /// binding.
    ///
    /// # Errors
    /// * `MetadataTypeNotFound` - unknown metadata type
    /// * `InvalidChoice` - input outside the restricted choice set
    /// * `Evaluation` - lookup or default expression failed
    pub fn resolve_value(&self, type_name: &str, raw: Option<&str>) -> Result<Option<String>> {
        let metadata_type = self.get_type(type_name)?;
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());

        if let Some(lookup) = metadata_type.lookup.as_deref() {
            if registry::is_validator(lookup) {
                if let Some(input) = raw {
                    let value = match registry::apply_validator(lookup, input) {
                        Some(transformed) if !transformed.is_empty() => transformed,
                        _ => input.to_string(),
                    };
                    return Ok(Some(value));
                }
            } else if let Some(input) = raw {
                let choices = evaluate(lookup, &ModelScope::new(&self.models))?;
                if !choices.iter().any(|c| c == input) {
                    return Err(IndexError::InvalidChoice {
                        field: metadata_type.name.clone(),
                        value: input.to_string(),
                    });
                }
                return Ok(Some(input.to_string()));
            }
        }

        if let Some(input) = raw {
            return Ok(Some(input.to_string()));
        }

        if let Some(default) = metadata_type.default.as_deref() {
            let values = evaluate(default, &EmptyScope)?;
            return Ok(values.into_iter().next());
        }

        Ok(None)
    }

    /// Resolve the choice set for a metadata type, if its lookup is a
    /// choice-set expression
    pub fn choices_for(&self, type_name: &str) -> Result<Option<Vec<String>>> {
        let metadata_type = self.get_type(type_name)?;
        match metadata_type.lookup.as_deref() {
            Some(lookup) if !registry::is_validator(lookup) => {
                Ok(Some(evaluate(lookup, &ModelScope::new(&self.models))?))
            }
            _ => Ok(None),
        }
    }

    /// Resolve default values for every metadata type bound to a
    /// document type
    ///
    /// A binding-level default expression wins over the metadata type's
    /// own default.
    ///
    /// # Errors
    /// Returns `RequiredValueMissing` when a required binding resolves to
    /// no value.
    pub fn resolve_defaults(&self, document_type: &str) -> Result<BTreeMap<String, String>> {
        let mut defaults = BTreeMap::new();
        for binding in self.bindings_for(document_type) {
            let value = match binding.default.as_deref() {
                Some(default) => evaluate(default, &EmptyScope)?.into_iter().next(),
                None => self.resolve_value(&binding.metadata_type, None)?,
            };
            match value {
                Some(value) => {
                    defaults.insert(binding.metadata_type.clone(), value);
                }
                None if binding.required => {
                    return Err(IndexError::RequiredValueMissing {
                        field: binding.metadata_type.clone(),
                        document_type: document_type.to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(defaults)
    }
}
