//! Analysis orchestration
//!
//! One request: validate the address, fetch the three transaction lists
//! concurrently (fail-fast), prefetch contract checks, then run the
//! synchronous resolver.

use crate::address::{canonical, validate_address};
use crate::beneficiary::{contract_candidates, resolve_beneficiaries};
use crate::cache::ContractCache;
use crate::error::{AnalysisError, FetchError};
use crate::payer::resolve_payers;
use crate::records::CounterpartyAggregate;
use crate::source::{ApiKey, ContractOracle, TransactionSource};
use crate::trace::DEFAULT_MAX_HOPS;
use crate::types::{Category, Transaction, TransactionSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Tunables for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Upper bound on each of the three list fetches
    pub fetch_timeout: Duration,
    /// Upper bound on each contract-oracle lookup
    pub oracle_timeout: Duration,
    /// Forwards a single contract-hop trace may follow
    pub max_hops: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(20),
            oracle_timeout: Duration::from_secs(5),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

/// Runs beneficiary and payer analyses against the configured collaborators.
#[derive(Clone)]
pub struct FundFlowService {
    source: Arc<dyn TransactionSource>,
    oracle: Arc<dyn ContractOracle>,
    settings: AnalysisSettings,
}

impl FundFlowService {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        oracle: Arc<dyn ContractOracle>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            source,
            oracle,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Who ultimately received funds that flowed out of `address`.
    pub async fn beneficiaries(
        &self,
        address: &str,
        key: &ApiKey,
    ) -> Result<Vec<CounterpartyAggregate>, AnalysisError> {
        validate_address(address)?;
        let address = canonical(address);
        let txs = self.fetch_all(&address, key).await?;

        let candidates = contract_candidates(&txs);
        let mut cache = ContractCache::new();
        cache
            .prefetch(
                self.oracle.as_ref(),
                key,
                candidates.iter().map(String::as_str),
                self.settings.oracle_timeout,
            )
            .await;

        let aggregates = resolve_beneficiaries(
            &txs,
            |addr| cache.is_contract(addr).unwrap_or(false),
            self.settings.max_hops,
        )?;

        info!(
            "Beneficiary analysis for {}: {} beneficiaries ({} contract checks)",
            address,
            aggregates.len(),
            cache.len()
        );
        Ok(aggregates)
    }

    /// Who funded the inflows of `address`, one hop upstream.
    pub async fn payers(
        &self,
        address: &str,
        key: &ApiKey,
    ) -> Result<Vec<CounterpartyAggregate>, AnalysisError> {
        validate_address(address)?;
        let address = canonical(address);
        let txs = self.fetch_all(&address, key).await?;

        let aggregates = resolve_payers(&txs, &address);
        info!("Payer analysis for {}: {} payers", address, aggregates.len());
        Ok(aggregates)
    }

    /// Fetch the three lists concurrently. The first failure aborts the rest.
    pub async fn fetch_all(&self, address: &str, key: &ApiKey) -> Result<TransactionSet, AnalysisError> {
        let (direct, internal, token) = tokio::try_join!(
            self.fetch_one(address, Category::Direct, key),
            self.fetch_one(address, Category::Internal, key),
            self.fetch_one(address, Category::Token, key),
        )?;

        info!(
            "Fetched {} direct, {} internal, {} token transactions for {}",
            direct.len(),
            internal.len(),
            token.len(),
            address
        );
        Ok(TransactionSet {
            direct,
            internal,
            token,
        })
    }

    async fn fetch_one(
        &self,
        address: &str,
        category: Category,
        key: &ApiKey,
    ) -> Result<Vec<Transaction>, AnalysisError> {
        let fetched =
            tokio::time::timeout(self.settings.fetch_timeout, self.source.fetch(address, category, key)).await;
        match fetched {
            Ok(Ok(txs)) => Ok(txs),
            Ok(Err(source)) => Err(AnalysisError::UpstreamFetch { category, source }),
            Err(_) => Err(AnalysisError::UpstreamFetch {
                category,
                source: FetchError::Timeout { category },
            }),
        }
    }
}
