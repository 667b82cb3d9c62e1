//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Names of the well-known accounts the workflows post to.
    #[serde(default)]
    pub accounts: AccountNamesConfig,
    /// Trial balance classification and presentation.
    #[serde(default)]
    pub trial_balance: TrialBalanceConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Names of the chart-of-account rows and supplier resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountNamesConfig {
    /// Liability account credited with declared customs tax.
    #[serde(default = "default_accounts_payable")]
    pub accounts_payable: String,
    /// Expense account debited per declared product line.
    #[serde(default = "default_income_tax_expense")]
    pub income_tax_expense: String,
    /// Supplier that represents the customs authority.
    #[serde(default = "default_custom_tax_supplier")]
    pub custom_tax_supplier: String,
}

impl Default for AccountNamesConfig {
    fn default() -> Self {
        Self {
            accounts_payable: default_accounts_payable(),
            income_tax_expense: default_income_tax_expense(),
            custom_tax_supplier: default_custom_tax_supplier(),
        }
    }
}

fn default_accounts_payable() -> String {
    "Accounts Payable (A/P) - ETB".to_string()
}

fn default_income_tax_expense() -> String {
    "Income tax expense".to_string()
}

fn default_custom_tax_supplier() -> String {
    "Custom Taxes".to_string()
}

/// Trial balance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrialBalanceConfig {
    /// Account labels whose credits are summed.
    #[serde(default = "default_credit_accounts")]
    pub credit_accounts: Vec<String>,
    /// Account labels whose debits are summed.
    #[serde(default = "default_debit_accounts")]
    pub debit_accounts: Vec<String>,
    /// Currency used to format report amounts.
    #[serde(default)]
    pub currency: Currency,
}

impl Default for TrialBalanceConfig {
    fn default() -> Self {
        Self {
            credit_accounts: default_credit_accounts(),
            debit_accounts: default_debit_accounts(),
            currency: Currency::default(),
        }
    }
}

fn default_credit_accounts() -> Vec<String> {
    [
        "Accounts Payable (A/P) - ETB",
        "Accounts Payable (A/P) - USD",
        "Sales",
        "Capital",
        "Accumulated Depreciation",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_debit_accounts() -> Vec<String> {
    [
        "Income tax expense",
        "Cost of Goods Sold",
        "Accounts Receivable (A/R)",
        "Inventory",
        "Custom Taxes",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `TALLY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__SERVER__PORT", Some("9090")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.accounts, AccountNamesConfig::default());
                assert_eq!(config.trial_balance.currency, Currency::Etb);
            },
        );
    }

    #[test]
    fn test_account_name_override() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__ACCOUNTS__ACCOUNTS_PAYABLE", Some("Accounts Payable (A/P) - USD")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.accounts.accounts_payable, "Accounts Payable (A/P) - USD");
                assert_eq!(config.accounts.income_tax_expense, "Income tax expense");
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_default_classification_covers_well_known_accounts() {
        let names = AccountNamesConfig::default();
        let trial_balance = TrialBalanceConfig::default();
        assert!(trial_balance.credit_accounts.contains(&names.accounts_payable));
        assert!(trial_balance.debit_accounts.contains(&names.income_tax_expense));
    }
}
