use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::repository::{RepoError, attribute, sku};
use shared::sku_key::{AttributeValuePair, encode_canonical_key};

/// Default upper bound on combinations per request
pub const DEFAULT_MAX_COMBINATIONS: usize = 1000;

/// Values chosen for one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSelection {
    pub attribute_id: i64,
    pub value_ids: Vec<i64>,
}

impl AttributeSelection {
    pub fn new(attribute_id: i64, value_ids: impl Into<Vec<i64>>) -> Self {
        Self {
            attribute_id,
            value_ids: value_ids.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub product_id: i64,
    pub tenant_id: i64,
    pub selections: Vec<AttributeSelection>,
}

/// One SKU of the outcome, new or pre-existing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSku {
    pub sku_id: i64,
    pub canonical_key: String,
    /// Ordered by attribute id
    pub combination: Vec<AttributeValuePair>,
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateOutcome {
    /// In enumeration order: selection order, then value order
    pub skus: Vec<GeneratedSku>,
    pub created: usize,
    pub reused: usize,
}

impl GenerateOutcome {
    pub fn sku_ids(&self) -> Vec<i64> {
        self.skus.iter().map(|s| s.sku_id).collect()
    }
}

/// A request that cannot be applied; nothing was written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("attribute {0} does not exist for this tenant")]
    UnknownAttribute(i64),

    #[error("attribute {0} selected more than once")]
    DuplicateAttribute(i64),

    #[error("attribute {0} has no values selected")]
    EmptySelection(i64),

    #[error("attribute value {0} does not exist")]
    UnknownValue(i64),

    #[error("attribute value {value_id} does not belong to attribute {attribute_id}")]
    ValueNotInAttribute { value_id: i64, attribute_id: i64 },

    #[error("attribute value {0} is disabled")]
    InactiveValue(i64),

    #[error("request expands to {count} combinations, limit is {limit}")]
    TooManyCombinations { count: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for GenerateError {
    fn from(err: sqlx::Error) -> Self {
        GenerateError::Repo(err.into())
    }
}

/// Stateless apart from its combination limit; cheap to construct per run.
#[derive(Debug, Clone, Copy)]
pub struct SkuGenerator {
    max_combinations: usize,
}

impl Default for SkuGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMBINATIONS)
    }
}

impl SkuGenerator {
    /// `max_combinations == 0` disables the limit
    pub fn new(max_combinations: usize) -> Self {
        Self { max_combinations }
    }

    /// Generate (or reuse) every SKU of the request inside one transaction.
    pub async fn generate(
        &self,
        pool: &SqlitePool,
        request: &GenerateRequest,
    ) -> Result<GenerateOutcome, GenerateError> {
        let mut tx = pool.begin().await?;
        let outcome = self.generate_with(&mut *tx, request).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = request.product_id,
            tenant_id = request.tenant_id,
            created = outcome.created,
            reused = outcome.reused,
            "SKUs generated"
        );
        Ok(outcome)
    }

    /// Same as [`generate`](Self::generate) on a connection the caller controls.
    ///
    /// Nothing is written unless validation passes; atomicity is the caller's.
    pub async fn generate_with(
        &self,
        conn: &mut SqliteConnection,
        request: &GenerateRequest,
    ) -> Result<GenerateOutcome, GenerateError> {
        let selections = self.validate(&mut *conn, request).await?;

        let mut outcome = GenerateOutcome::default();
        for combination in cartesian_product(&selections) {
            let canonical_key = encode_canonical_key(&combination);
            let (sku_id, created) =
                find_or_create(&mut *conn, request.product_id, request.tenant_id, &canonical_key, &combination)
                    .await?;
            tracing::debug!(sku_id, canonical_key = %canonical_key, created, "SKU resolved");

            if created {
                outcome.created += 1;
            } else {
                outcome.reused += 1;
            }
            let mut combination = combination;
            combination.sort_unstable();
            outcome.skus.push(GeneratedSku {
                sku_id,
                canonical_key,
                combination,
                created,
            });
        }
        Ok(outcome)
    }

    /// Check the whole request; returns the selections with duplicate values removed.
    async fn validate(
        &self,
        conn: &mut SqliteConnection,
        request: &GenerateRequest,
    ) -> Result<Vec<AttributeSelection>, GenerateError> {
        let mut seen = HashSet::new();
        let mut selections = Vec::with_capacity(request.selections.len());
        for selection in &request.selections {
            if !seen.insert(selection.attribute_id) {
                return Err(ValidationError::DuplicateAttribute(selection.attribute_id).into());
            }
            let mut values = HashSet::new();
            let value_ids: Vec<i64> = selection
                .value_ids
                .iter()
                .copied()
                .filter(|id| values.insert(*id))
                .collect();
            if value_ids.is_empty() {
                return Err(ValidationError::EmptySelection(selection.attribute_id).into());
            }
            selections.push(AttributeSelection::new(selection.attribute_id, value_ids));
        }

        let count = selections
            .iter()
            .try_fold(1usize, |acc, s| acc.checked_mul(s.value_ids.len()))
            .unwrap_or(usize::MAX);
        if self.max_combinations > 0 && count > self.max_combinations {
            return Err(ValidationError::TooManyCombinations {
                count,
                limit: self.max_combinations,
            }
            .into());
        }

        let attribute_ids: Vec<i64> = selections.iter().map(|s| s.attribute_id).collect();
        let known: HashSet<i64> =
            attribute::find_attributes_by_ids(&mut *conn, request.tenant_id, &attribute_ids)
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect();
        if let Some(missing) = attribute_ids.iter().find(|id| !known.contains(id)) {
            return Err(ValidationError::UnknownAttribute(*missing).into());
        }

        let value_ids: Vec<i64> = selections.iter().flat_map(|s| s.value_ids.iter().copied()).collect();
        let values: HashMap<i64, _> = attribute::find_values_by_ids(&mut *conn, &value_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
        for selection in &selections {
            for value_id in &selection.value_ids {
                let value = values
                    .get(value_id)
                    .ok_or(ValidationError::UnknownValue(*value_id))?;
                if value.attribute_id != selection.attribute_id {
                    return Err(ValidationError::ValueNotInAttribute {
                        value_id: *value_id,
                        attribute_id: selection.attribute_id,
                    }
                    .into());
                }
                if !value.is_active {
                    return Err(ValidationError::InactiveValue(*value_id).into());
                }
            }
        }
        Ok(selections)
    }
}

/// Look up the SKU by key, inserting it with its value links when absent.
async fn find_or_create(
    conn: &mut SqliteConnection,
    product_id: i64,
    tenant_id: i64,
    canonical_key: &str,
    combination: &[AttributeValuePair],
) -> Result<(i64, bool), GenerateError> {
    if let Some(existing) = sku::find_by_key(&mut *conn, product_id, tenant_id, canonical_key).await? {
        return Ok((existing.id, false));
    }
    insert_or_reuse(conn, product_id, tenant_id, canonical_key, combination).await
}

/// Insert the SKU with its value links; when the key is already taken, reuse
/// the stored row and leave its links alone.
async fn insert_or_reuse(
    conn: &mut SqliteConnection,
    product_id: i64,
    tenant_id: i64,
    canonical_key: &str,
    combination: &[AttributeValuePair],
) -> Result<(i64, bool), GenerateError> {
    match sku::insert_if_absent(&mut *conn, product_id, tenant_id, canonical_key).await? {
        Some(id) => {
            sku::link_values(&mut *conn, id, combination).await?;
            Ok((id, true))
        }
        // Another writer inserted the key between lookup and insert
        None => {
            let existing = sku::find_by_key(&mut *conn, product_id, tenant_id, canonical_key)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("sku {canonical_key:?}")))?;
            Ok((existing.id, false))
        }
    }
}

/// One pair per selection for every combination; a single empty combination
/// when there are no selections.
fn cartesian_product(selections: &[AttributeSelection]) -> Vec<Vec<AttributeValuePair>> {
    let mut combinations: Vec<Vec<AttributeValuePair>> = vec![Vec::new()];
    for selection in selections {
        let mut next = Vec::with_capacity(combinations.len() * selection.value_ids.len());
        for combination in &combinations {
            for value_id in &selection.value_ids {
                let mut extended = combination.clone();
                extended.push(AttributeValuePair::new(selection.attribute_id, *value_id));
                next.push(extended);
            }
        }
        combinations = next;
    }
    combinations
}
