//! Schema assembly and provider group merging.
//!
//! [`Schema::from_signature`] builds the required and optional groups from a
//! flattened signature. [`Schema::merge_provider_group`] then folds in
//! argument groups contributed by independent providers, resolving name
//! conflicts with a fixed decision table so the result is deterministic for
//! a given provider order. A built schema is treated as immutable: parsing
//! and reconstruction only read it, so concurrent reads need no locking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SchemaError;
use crate::flatten::{StructuredParam, flatten_signature};
use crate::help::with_providers;
use crate::types::{
    ArgumentGroup, ArgumentSpec, OPTIONAL_GROUP, REQUIRED_GROUP, Signature, union_values,
};
use crate::validate::validate_spec;

/// Built argument schema for one callable.
///
/// Owns the required group, the optional group, zero-or-more provider
/// groups, and the provider index recording which argument names each
/// provider originally contributed. An argument name lives in exactly one
/// group at a time, so a lookup through any group reaches the single
/// authoritative spec.
///
/// # Examples
///
/// ```
/// use callsig_core::{ParamSpec, Schema, Signature, TypeDesc};
/// use serde_json::json;
///
/// let signature = Signature::new("quote")
///     .with_param(ParamSpec::new("symbol", TypeDesc::Str))
///     .with_param(ParamSpec::new("limit", TypeDesc::Int).with_default(json!(100)));
///
/// let schema = Schema::from_signature(&signature).unwrap();
/// assert_eq!(schema.required.len(), 1);
/// assert_eq!(schema.optional.len(), 1);
/// assert!(schema.find_spec("symbol").unwrap().required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Arguments with no default.
    pub required: ArgumentGroup,
    /// Arguments with a default, plus provider arguments migrated here by
    /// conflict resolution.
    pub optional: ArgumentGroup,
    /// Provider groups, in merge order.
    pub providers: Vec<ArgumentGroup>,
    /// Argument names each provider originally contributed, keyed by
    /// provider title. Used at reconstruction time to scope parsed values
    /// to the active provider even after a spec migrates to the optional
    /// group.
    pub provider_index: BTreeMap<String, Vec<String>>,
    pub(crate) structured: Vec<StructuredParam>,
    pub(crate) callable_params: Vec<String>,
}

impl Schema {
    /// Builds the required and optional groups from a callable signature.
    ///
    /// Structured parameters are flattened; build-time errors (separator in
    /// a top-level name, duplicate flattened names, unflattenable shapes)
    /// surface here, before any parsing can occur.
    pub fn from_signature(signature: &Signature) -> Result<Self, SchemaError> {
        let flattened = flatten_signature(signature)?;

        let mut required = ArgumentGroup::new(REQUIRED_GROUP);
        let mut optional = ArgumentGroup::new(OPTIONAL_GROUP);
        for spec in flattened.specs {
            if spec.required {
                required.specs.push(spec);
            } else {
                optional.specs.push(spec);
            }
        }

        Ok(Self {
            required,
            optional,
            providers: Vec::new(),
            provider_index: BTreeMap::new(),
            structured: flattened.structured,
            callable_params: signature.params.iter().map(|p| p.name.clone()).collect(),
        })
    }

    /// Finds a spec by name across every group.
    pub fn find_spec(&self, name: &str) -> Option<&ArgumentSpec> {
        self.required
            .find(name)
            .or_else(|| self.optional.find(name))
            .or_else(|| self.providers.iter().find_map(|group| group.find(name)))
    }

    /// Finds a spec by name across every group, mutably.
    pub fn find_spec_mut(&mut self, name: &str) -> Option<&mut ArgumentSpec> {
        if self.required.contains(name) {
            return self.required.find_mut(name);
        }
        if self.optional.contains(name) {
            return self.optional.find_mut(name);
        }
        self.providers
            .iter_mut()
            .find_map(|group| group.find_mut(name))
    }

    /// Iterates every spec in the schema, required group first.
    pub fn all_specs(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.required
            .specs
            .iter()
            .chain(self.optional.specs.iter())
            .chain(self.providers.iter().flat_map(|group| group.specs.iter()))
    }

    /// Structured-parameter registry recorded during flattening.
    pub fn structured_params(&self) -> &[StructuredParam] {
        &self.structured
    }

    /// Top-level parameter names of the target callable.
    pub fn callable_params(&self) -> &[String] {
        &self.callable_params
    }

    /// Merges provider groups in the given order.
    ///
    /// Provider iteration order is part of the schema's identity: merging
    /// the same groups in the same order always yields the same schema.
    pub fn merge_provider_groups<I>(&mut self, groups: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = ArgumentGroup>,
    {
        for group in groups {
            self.merge_provider_group(group)?;
        }
        Ok(())
    }

    /// Merges one provider group into the schema.
    ///
    /// For each contributed spec, the first matching rule wins:
    ///
    /// 1. Name unknown → insert into this provider's own group and record
    ///    it in the provider index.
    /// 2. Name in the required group → union choices into the existing spec
    ///    (marking the set open if it was previously unconstrained);
    ///    requiredness never changes.
    /// 3. Name in the optional group → union choices; if the argument is
    ///    provider-only, extend its help's provider parenthetical.
    /// 4. Name in another provider's group → remove it from every provider
    ///    group and re-insert one merged spec into the optional group, with
    ///    unioned choices and a parenthetical naming every contributor.
    ///
    /// Flags never union choices. Incoming specs are validated first, so a
    /// flag declaring a value shape is rejected before any rule applies.
    pub fn merge_provider_group(&mut self, group: ArgumentGroup) -> Result<(), SchemaError> {
        let provider = group.title;
        for spec in group.specs {
            validate_spec(&spec)?;
            self.merge_provider_spec(&provider, spec);
        }
        Ok(())
    }

    fn merge_provider_spec(&mut self, provider: &str, incoming: ArgumentSpec) {
        let name = incoming.name.clone();

        if let Some(existing) = self.required.find_mut(&name) {
            if !incoming.is_flag && !incoming.choices.is_empty() {
                let was_unconstrained = existing.choices.is_empty();
                union_values(&mut existing.choices, incoming.choices);
                if was_unconstrained {
                    existing.choices_open = true;
                }
                debug!(argument = %name, provider, "provider extended required argument choices");
            }
            return;
        }

        let provider_only = !self.callable_params.iter().any(|param| param == &name);
        if let Some(existing) = self.optional.find_mut(&name) {
            if !incoming.is_flag && !incoming.choices.is_empty() {
                union_values(&mut existing.choices, incoming.choices);
            }
            if provider_only {
                existing.help = Some(with_providers(
                    existing.help.as_deref(),
                    &[provider.to_string()],
                ));
            }
            return;
        }

        let holders: Vec<String> = self
            .providers
            .iter()
            .filter(|group| group.contains(&name))
            .map(|group| group.title.clone())
            .collect();
        if !holders.is_empty() {
            let mut removed = Vec::new();
            for group in &mut self.providers {
                if let Some(spec) = group.remove(&name) {
                    removed.push(spec);
                }
            }
            let mut iter = removed.into_iter();
            if let Some(mut merged) = iter.next() {
                if !merged.is_flag {
                    for extra in iter {
                        union_values(&mut merged.choices, extra.choices);
                    }
                    union_values(&mut merged.choices, incoming.choices);
                }

                let mut contributors = holders;
                if !contributors.iter().any(|title| title == provider) {
                    contributors.push(provider.to_string());
                }
                merged.help = Some(with_providers(merged.help.as_deref(), &contributors));
                debug!(
                    argument = %name,
                    providers = ?contributors,
                    "migrated shared provider argument to the optional group"
                );
                self.optional.specs.push(merged);
            }
            return;
        }

        debug!(argument = %name, provider, "registered provider argument");
        let index = self
            .provider_index
            .entry(provider.to_string())
            .or_default();
        if !index.iter().any(|entry| entry == &name) {
            index.push(name);
        }
        let position = match self
            .providers
            .iter()
            .position(|group| group.title == provider)
        {
            Some(position) => position,
            None => {
                self.providers.push(ArgumentGroup::new(provider));
                self.providers.len() - 1
            }
        };
        self.providers[position].specs.push(incoming);
    }
}

/// Names each provider may contribute at call time, as a flat union.
///
/// Convenience over [`Schema::provider_index`] for callers that do not
/// select a provider.
pub fn all_provider_arguments(index: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for names in index.values() {
        for name in names {
            if !all.iter().any(|existing| existing == name) {
                all.push(name.clone());
            }
        }
    }
    all
}
