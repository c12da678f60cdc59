use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use zk_primitives::HASH_DOMAIN;

use crate::{ErrorKind, Result, Stage};

/// The smallest unit of value is `1 / ONE_UNIT` of a unit
pub const ONE_UNIT: u128 = 1_000_000_000_000_000_000;

/// The environment variable prefix read by [`Config::figment`]
const ENV_PREFIX: &str = "POOL_";

/// Deployment parameters the builder must share with the ledger
///
/// Loaded with [`Config::load`], which layers defaults, an optional TOML file, and `POOL_*`
/// environment variables (in increasing priority)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Height of the commitment tree
    pub tree_height: usize,
    /// Name of the hash domain, see [`zk_primitives::HASH_DOMAIN`]
    pub hash_domain: String,
    /// The input counts the ledger has verifiers for, e.g. `[2, 16]`
    pub input_counts: Vec<usize>,
    /// The number of outputs of every transaction
    pub output_count: usize,
    /// The smallest amount that can be withdrawn
    pub min_withdraw: u128,
    /// The largest amount that can be deposited
    pub max_deposit: u128,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree_height: 23,
            hash_domain: HASH_DOMAIN.to_string(),
            input_counts: vec![2, 16],
            output_count: 2,
            min_withdraw: ONE_UNIT / 20,
            max_deposit: ONE_UNIT,
        }
    }
}

/// The parameters the ledger was deployed with
///
/// [`Config::check_ledger`] requires these to match the local [`Config`] exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParameters {
    /// Height of the ledger's commitment tree
    pub tree_height: usize,
    /// The hash domain the ledger's verifier uses
    pub hash_domain: String,
    /// The input counts the ledger has verifiers for
    pub input_counts: Vec<usize>,
    /// The number of outputs the verifiers expect
    pub output_count: usize,
    /// The smallest withdrawal the ledger accepts
    pub min_withdraw: u128,
    /// The largest deposit the ledger accepts
    pub max_deposit: u128,
}

impl From<&Config> for LedgerParameters {
    fn from(config: &Config) -> Self {
        Self {
            tree_height: config.tree_height,
            hash_domain: config.hash_domain.clone(),
            input_counts: config.input_counts.clone(),
            output_count: config.output_count,
            min_withdraw: config.min_withdraw,
            max_deposit: config.max_deposit,
        }
    }
}

impl Config {
    /// The layered configuration sources, without extracting them
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));

        let figment = match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        };

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration from defaults, an optional TOML file, and `POOL_*` variables
    ///
    /// The result still needs to be checked with [`Config::validate`]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Check that the configuration is usable on its own
    ///
    /// ```rust
    /// # use tx_builder::*;
    /// assert!(Config::default().validate().is_ok());
    ///
    /// let config = Config { input_counts: vec![], ..Config::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ErrorKind::InvalidConfig(reason).at(Stage::Configure));

        if self.tree_height == 0 || self.tree_height > accumulator::MAX_HEIGHT {
            return invalid(format!(
                "tree height must be in 1..={}, got {}",
                accumulator::MAX_HEIGHT,
                self.tree_height
            ));
        }

        if self.hash_domain != HASH_DOMAIN {
            return invalid(format!(
                "hash domain {} is not supported, expected {HASH_DOMAIN}",
                self.hash_domain
            ));
        }

        if self.input_counts.is_empty() || self.input_counts.contains(&0) {
            return invalid("input counts must be non-empty and non-zero".to_string());
        }

        if self.input_counts.windows(2).any(|pair| pair[0] >= pair[1]) {
            return invalid("input counts must be strictly increasing".to_string());
        }

        if self.output_count == 0 {
            return invalid("output count must be non-zero".to_string());
        }

        if self.max_deposit > i128::MAX as u128 || self.min_withdraw > i128::MAX as u128 {
            return invalid("amount bounds must fit in an i128".to_string());
        }

        Ok(())
    }

    /// Check that every parameter matches the ledger's deployment
    ///
    /// A mismatch means every proof built with this configuration would be rejected
    pub fn check_ledger(&self, ledger: &LedgerParameters) -> Result<()> {
        fn compare<T: PartialEq + core::fmt::Debug>(
            field: &'static str,
            local: &T,
            ledger: &T,
        ) -> Result<()> {
            if local == ledger {
                return Ok(());
            }

            Err(ErrorKind::ConfigMismatch {
                field,
                local: format!("{local:?}"),
                ledger: format!("{ledger:?}"),
            }
            .at(Stage::Configure))
        }

        compare("tree_height", &self.tree_height, &ledger.tree_height)?;
        compare("hash_domain", &self.hash_domain, &ledger.hash_domain)?;
        compare("input_counts", &self.input_counts, &ledger.input_counts)?;
        compare("output_count", &self.output_count, &ledger.output_count)?;
        compare("min_withdraw", &self.min_withdraw, &ledger.min_withdraw)?;
        compare("max_deposit", &self.max_deposit, &ledger.max_deposit)?;

        Ok(())
    }

    /// The largest configured input count
    #[must_use]
    pub fn max_inputs(&self) -> usize {
        self.input_counts.last().copied().unwrap_or_default()
    }

    /// The smallest configured input count that fits `selected` real inputs
    #[must_use]
    pub fn input_count_for(&self, selected: usize) -> Option<usize> {
        self.input_counts
            .iter()
            .copied()
            .find(|count| *count >= selected)
    }
}
