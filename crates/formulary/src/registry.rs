//! Dedup lookup-or-create workflows.
//!
//! Every composite entity follows the same shape: validate the submission,
//! fingerprint it, look up an existing row in scope, and only mint a new code
//! when nothing matches. Allocation contention re-runs the workflow from the
//! lookup step, since a racing writer may have just created the matching
//! entity. A pre-existing fingerprint discovered at persist time (the narrow
//! lookup/insert race) yields the existing code instead of a duplicate.

use std::collections::BTreeSet;
use std::sync::Arc;

use formulary_core::{
    ActorId, BatchCode, Fingerprint, FormulationCode, IngredientBatchRef, LocationId, PartnerCode,
    ProductionDate, SetCode, Sku, ValidationError, WeightCode, WeightPercent,
    validate_weight_sum,
};

use crate::alloc::{Allocator, CounterFamily, RetryPolicy};
use crate::config::Config;
use crate::error::OpError;
use crate::seed;
use crate::store::{
    now_ms, BatchItem, BatchVariantRow, CounterStore, LocationRow, PartnerRow, RegistryStore,
    SetRow, WeightItem, WeightVariantRow,
};

/// Counter names, one per code family.
pub const SET_COUNTER: &str = "set_code";
pub const WEIGHT_COUNTER: &str = "weight_code";
pub const BATCH_COUNTER: &str = "batch_variant_code";
pub const PARTNER_COUNTER: &str = "location_partner_code";

/// Bounded attempts when probing for an unused partner code.
const PARTNER_PROBE_ATTEMPTS: u32 = 20;

/// A partner row as presented to callers: stored rows merged over the seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartnerListing {
    pub partner_code: PartnerCode,
    pub partner_name: String,
    pub machine_specification: String,
}

struct Families {
    set: CounterFamily,
    weight: CounterFamily,
    batch: CounterFamily,
    partner: CounterFamily,
}

/// Orchestrates code allocation and dedup over the storage seams.
pub struct Registry {
    entities: Arc<dyn RegistryStore>,
    allocator: Allocator,
    families: Families,
    workflow_retries: u32,
}

impl Registry {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        entities: Arc<dyn RegistryStore>,
        config: &Config,
    ) -> Self {
        let retry = RetryPolicy {
            max_attempts: config.allocator.max_attempts,
            backoff_base: std::time::Duration::from_millis(config.allocator.backoff_base_ms),
            backoff_max: std::time::Duration::from_millis(config.allocator.backoff_max_ms),
        };
        let width = config.counters.code_width;
        Self {
            entities,
            allocator: Allocator::new(counters, retry),
            families: Families {
                set: CounterFamily::new(SET_COUNTER, config.counters.set_start, width),
                weight: CounterFamily::new(WEIGHT_COUNTER, config.counters.weight_start, width),
                batch: CounterFamily::new(BATCH_COUNTER, config.counters.batch_start, width),
                partner: CounterFamily::new(PARTNER_COUNTER, config.counters.partner_start, width),
            },
            workflow_retries: config.allocator.workflow_retries,
        }
    }

    /// Look up or create an ingredient set from its SKU list.
    pub fn get_or_create_set(
        &self,
        skus: &[Sku],
        actor: Option<&ActorId>,
    ) -> Result<(SetCode, bool), OpError> {
        validate_members(skus.iter().map(Sku::as_str))?;
        let unknown: Vec<&str> = {
            let mut missing = Vec::new();
            for sku in skus {
                if !self.entities.ingredient_exists(sku)? {
                    missing.push(sku.as_str());
                }
            }
            missing
        };
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownSkus {
                skus: unknown.join(", "),
            }
            .into());
        }

        let fingerprint = Fingerprint::of_set(skus);
        let span = tracing::info_span!(
            "get_or_create_set",
            fingerprint = fingerprint.short(),
        );
        let _guard = span.enter();

        self.with_contention_retry("set", |this| {
            if let Some(existing) = this.entities.set_by_fingerprint(&fingerprint)? {
                tracing::debug!(code = %existing, "set fingerprint matched existing row");
                return Ok((existing, false));
            }
            let code = SetCode::new(this.allocator.allocate(&this.families.set, "")?);
            let row = SetRow {
                set_code: code.clone(),
                fingerprint: fingerprint.clone(),
                skus: skus.to_vec(),
                created_at_ms: now_ms(),
                created_by: actor.cloned(),
            };
            match this.entities.insert_set(row)? {
                None => Ok((code, true)),
                Some(existing) => {
                    this.log_persist_race("set", fingerprint.short(), code.as_str(), existing.as_str());
                    Ok((existing, false))
                }
            }
        })
    }

    /// Look up or create a dry-weight variant under its parent set.
    pub fn get_or_create_weight_variant(
        &self,
        set_code: &SetCode,
        items: &[(Sku, WeightPercent)],
        actor: Option<&ActorId>,
    ) -> Result<(WeightCode, bool), OpError> {
        validate_members(items.iter().map(|(sku, _)| sku.as_str()))?;
        validate_weight_sum(items)?;

        let fingerprint = Fingerprint::of_weights(items);
        let span = tracing::info_span!(
            "get_or_create_weight_variant",
            set = %set_code,
            fingerprint = fingerprint.short(),
        );
        let _guard = span.enter();

        self.with_contention_retry("weight variant", |this| {
            if let Some(existing) = this
                .entities
                .weight_by_fingerprint(set_code, &fingerprint)?
            {
                tracing::debug!(code = %existing, "weight fingerprint matched existing row");
                return Ok((existing, false));
            }
            let code = WeightCode::new(
                this.allocator
                    .allocate(&this.families.weight, set_code.as_str())?,
            );
            let row = WeightVariantRow {
                set_code: set_code.clone(),
                weight_code: code.clone(),
                fingerprint: fingerprint.clone(),
                items: items
                    .iter()
                    .map(|(sku, wt)| WeightItem {
                        sku: sku.clone(),
                        wt_percent: *wt,
                    })
                    .collect(),
                created_at_ms: now_ms(),
                created_by: actor.cloned(),
            };
            match this.entities.insert_weight_variant(row)? {
                None => Ok((code, true)),
                Some(existing) => {
                    this.log_persist_race(
                        "weight variant",
                        fingerprint.short(),
                        code.as_str(),
                        existing.as_str(),
                    );
                    Ok((existing, false))
                }
            }
        })
    }

    /// Look up or create a batch variant under its (set, weight) pair.
    pub fn get_or_create_batch_variant(
        &self,
        set_code: &SetCode,
        weight_code: &WeightCode,
        items: &[(Sku, IngredientBatchRef)],
        actor: Option<&ActorId>,
    ) -> Result<(BatchCode, bool), OpError> {
        validate_members(items.iter().map(|(sku, _)| sku.as_str()))?;

        let fingerprint = Fingerprint::of_batches(items);
        let scope = format!("{set_code} {weight_code}");
        let span = tracing::info_span!(
            "get_or_create_batch_variant",
            scope = %scope,
            fingerprint = fingerprint.short(),
        );
        let _guard = span.enter();

        self.with_contention_retry("batch variant", |this| {
            if let Some(existing) =
                this.entities
                    .batch_by_fingerprint(set_code, weight_code, &fingerprint)?
            {
                tracing::debug!(code = %existing, "batch fingerprint matched existing row");
                return Ok((existing, false));
            }
            let code = BatchCode::new(this.allocator.allocate(&this.families.batch, &scope)?);
            let row = BatchVariantRow {
                set_code: set_code.clone(),
                weight_code: weight_code.clone(),
                batch_code: code.clone(),
                fingerprint: fingerprint.clone(),
                items: items
                    .iter()
                    .map(|(sku, batch)| BatchItem {
                        sku: sku.clone(),
                        ingredient_batch_code: batch.clone(),
                    })
                    .collect(),
                created_at_ms: now_ms(),
                created_by: actor.cloned(),
            };
            match this.entities.insert_batch_variant(row)? {
                None => Ok((code, true)),
                Some(existing) => {
                    this.log_persist_race(
                        "batch variant",
                        fingerprint.short(),
                        code.as_str(),
                        existing.as_str(),
                    );
                    Ok((existing, false))
                }
            }
        })
    }

    /// Register a production partner, always reserving a fresh code.
    ///
    /// The counter is seeded above the shipped partner table; the probe loop
    /// skips any code already taken by a seeded or stored row.
    pub fn create_partner(
        &self,
        partner_name: &str,
        machine_specification: &str,
        actor: Option<&ActorId>,
    ) -> Result<PartnerRow, OpError> {
        for _ in 0..PARTNER_PROBE_ATTEMPTS {
            let code = PartnerCode::new(self.allocator.allocate(&self.families.partner, "")?);
            if seed::seeded_partner(code.as_str()).is_some() {
                tracing::debug!(code = %code, "minted partner code is seeded, probing next");
                continue;
            }
            let row = PartnerRow {
                partner_code: code.clone(),
                partner_name: partner_name.to_string(),
                machine_specification: machine_specification.to_string(),
                created_at_ms: now_ms(),
                created_by: actor.cloned(),
            };
            if self.entities.insert_partner(row.clone())? {
                tracing::info!(code = %code, "partner registered");
                return Ok(row);
            }
            tracing::debug!(code = %code, "minted partner code already stored, probing next");
        }
        Err(OpError::PartnerProbeExhausted {
            attempts: PARTNER_PROBE_ATTEMPTS,
        })
    }

    /// Merged partner registry: stored rows override seeded entries, sorted
    /// by code.
    pub fn partners(&self) -> Result<Vec<PartnerListing>, OpError> {
        let mut by_code: std::collections::BTreeMap<String, PartnerListing> = seed::SEEDED_PARTNERS
            .iter()
            .filter_map(|partner| {
                let code = PartnerCode::parse(partner.partner_code).ok()?;
                Some((
                    partner.partner_code.to_string(),
                    PartnerListing {
                        partner_code: code,
                        partner_name: partner.partner_name.to_string(),
                        machine_specification: partner.machine_specification.to_string(),
                    },
                ))
            })
            .collect();
        for row in self.entities.partners()? {
            by_code.insert(
                row.partner_code.as_str().to_string(),
                PartnerListing {
                    partner_code: row.partner_code,
                    partner_name: row.partner_name,
                    machine_specification: row.machine_specification,
                },
            );
        }
        Ok(by_code.into_values().collect())
    }

    /// Record a location code for a produced formulation.
    ///
    /// Validates the partner against the merged registry and the formulation
    /// against recorded batch variants, then performs an exact-key
    /// lookup-or-create on the full location id.
    pub fn create_location_code(
        &self,
        formulation: &FormulationCode,
        partner: &PartnerCode,
        production_date: &str,
        actor: Option<&ActorId>,
    ) -> Result<(LocationId, bool), OpError> {
        if seed::seeded_partner(partner.as_str()).is_none()
            && self.entities.partner(partner)?.is_none()
        {
            return Err(ValidationError::UnknownPartner {
                code: partner.to_string(),
            }
            .into());
        }
        if !self.entities.formulation_exists(
            &formulation.set,
            &formulation.weight,
            &formulation.batch,
        )? {
            return Err(ValidationError::UnknownFormulation {
                code: formulation.to_string(),
            }
            .into());
        }
        let date = ProductionDate::parse(production_date)?;

        let id = LocationId::new(formulation.clone(), partner.clone(), date);
        let rendered = id.to_string();
        if self.entities.location(&rendered)?.is_some() {
            tracing::debug!(location = %rendered, "location id already recorded");
            return Ok((id, false));
        }
        let row = LocationRow {
            location_id: rendered.clone(),
            set_code: formulation.set.clone(),
            weight_code: formulation.weight.clone(),
            batch_code: formulation.batch.clone(),
            partner_code: partner.clone(),
            production_date: date.to_string(),
            created_at_ms: now_ms(),
            created_by: actor.cloned(),
        };
        if self.entities.insert_location(row)? {
            tracing::info!(location = %rendered, "location code recorded");
            Ok((id, true))
        } else {
            // Insert race with an identical request.
            tracing::debug!(location = %rendered, "location id landed first from a racing writer");
            Ok((id, false))
        }
    }

    /// Re-run a lookup-or-create closure after allocation contention, since
    /// the racing writer may have created the entity we were about to mint.
    fn with_contention_retry<T>(
        &self,
        entity: &str,
        mut attempt: impl FnMut(&Self) -> Result<T, OpError>,
    ) -> Result<T, OpError> {
        let mut round = 0;
        loop {
            match attempt(self) {
                Err(err @ OpError::Contention { .. }) if round < self.workflow_retries => {
                    round += 1;
                    tracing::debug!(entity, round, %err, "allocation contention, re-running lookup");
                }
                other => return other,
            }
        }
    }

    fn log_persist_race(&self, entity: &str, fingerprint: &str, minted: &str, existing: &str) {
        tracing::warn!(
            entity,
            fingerprint,
            minted,
            existing,
            "duplicate fingerprint discovered at persist, returning existing code"
        );
    }
}

/// Structural checks shared by all composite submissions: non-empty, no
/// duplicate member keys.
fn validate_members<'a>(keys: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    let mut any = false;
    for key in keys {
        any = true;
        if !seen.insert(key) {
            return Err(ValidationError::DuplicateSku {
                sku: key.to_string(),
            });
        }
    }
    if !any {
        return Err(ValidationError::Empty);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_validation_rejects_empty_and_duplicates() {
        assert!(matches!(
            validate_members(std::iter::empty()),
            Err(ValidationError::Empty)
        ));
        assert!(matches!(
            validate_members(["A", "B", "A"].into_iter()),
            Err(ValidationError::DuplicateSku { .. })
        ));
        assert!(validate_members(["A", "B"].into_iter()).is_ok());
    }
}
