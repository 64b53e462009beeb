// src/datasets/mod.rs - Fixed-shape warehouse datasets used as linkage inputs
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt;

use crate::cleaning::business_name::BusinessNameCleaner;
use crate::cleaning::website::clean_website_column;
use crate::models::table::{ColumnType, ColumnTypeManifest, Table};
use crate::utils::config::LinkageConfig;
use crate::utils::progress_bars::logging::{LinkageLogger, LinkageStage};
use crate::utils::warehouse::{with_filter, QueryExecutor};

pub mod enrichment;
pub mod salesforce;

/// Every dataset the job can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum DatasetKind {
    Accounts,
    Opportunities,
    Campaigns,
    CampaignMembers,
    ZoominfoAccounts,
    DnbAccounts,
    InputNames,
}

impl DatasetKind {
    pub fn tag(&self) -> &'static str {
        match self {
            DatasetKind::Accounts => "SF_",
            DatasetKind::Opportunities => "OPP_",
            DatasetKind::Campaigns => "CMP_",
            DatasetKind::CampaignMembers => "CM_",
            DatasetKind::ZoominfoAccounts => "ZI_",
            DatasetKind::DnbAccounts => "DNB_",
            DatasetKind::InputNames => "INP_",
        }
    }

    /// `(country, state)` columns to standardize on account-shaped datasets.
    pub fn geo_columns(&self) -> Option<(&'static str, &'static str)> {
        match self {
            DatasetKind::Accounts => Some(("SF_BillingCountry", "SF_BillingState")),
            DatasetKind::ZoominfoAccounts => Some(("ZI_Country", "ZI_State")),
            DatasetKind::DnbAccounts => Some(("DNB_Country", "DNB_State")),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Accounts => "accounts",
            DatasetKind::Opportunities => "opportunities",
            DatasetKind::Campaigns => "campaigns",
            DatasetKind::CampaignMembers => "campaign-members",
            DatasetKind::ZoominfoAccounts => "zoominfo-accounts",
            DatasetKind::DnbAccounts => "dnb-accounts",
            DatasetKind::InputNames => "input-names",
        };
        write!(f, "{}", name)
    }
}

/// Query, type manifest and business key of one dataset.
pub struct DatasetShape {
    pub kind: DatasetKind,
    pub query: String,
    pub key: &'static str,
    pub manifest: ColumnTypeManifest,
}

/// Builds tagged, indexed tables from the warehouse.
pub struct DatasetBuilder<'a, E: QueryExecutor> {
    client: &'a E,
    config: &'a LinkageConfig,
    cleaner: BusinessNameCleaner<'a, E>,
}

impl<'a, E: QueryExecutor> DatasetBuilder<'a, E> {
    pub fn new(client: &'a E, config: &'a LinkageConfig) -> Self {
        Self {
            client,
            config,
            cleaner: BusinessNameCleaner::new(client, config),
        }
    }

    pub async fn build(&self, kind: DatasetKind, filter_by: Option<&str>) -> Result<Table> {
        match kind {
            DatasetKind::Accounts => self.accounts(filter_by).await,
            DatasetKind::Opportunities => self.opportunities(filter_by).await,
            DatasetKind::Campaigns => self.campaigns(filter_by).await,
            DatasetKind::CampaignMembers => self.campaign_members(filter_by).await,
            DatasetKind::ZoominfoAccounts => self.zoominfo_accounts(filter_by).await,
            DatasetKind::DnbAccounts => self.dnb_accounts(filter_by).await,
            DatasetKind::InputNames => self.input_names(filter_by).await,
        }
    }

    /// Run the shape's query and coerce column types.
    async fn fetch(&self, shape: &DatasetShape, filter_by: Option<&str>) -> Result<Table> {
        let logger = LinkageLogger::new(LinkageStage::Dataset);
        logger.log_start(&shape.kind.to_string());
        let query = with_filter(&shape.query, filter_by);
        let mut table = self.client.execute_query(&query).await?;
        table.convert_column_types(&shape.manifest);
        logger.log_data_loaded(table.len(), &shape.kind.to_string());
        Ok(table)
    }

    /// `{website_col}` -> `WebsiteClean`, `DomainClean`.
    fn add_website_columns(&self, table: &mut Table, website_col: &str) {
        let Some(values) = table.column_values(website_col) else {
            LinkageLogger::new(LinkageStage::Dataset)
                .log_warning(&format!("Column '{}' not found, no website columns derived", website_col));
            return;
        };
        let (websites, domains) = clean_website_column(&values);
        table.set_column("WebsiteClean", ColumnType::Text, websites);
        table.set_column("DomainClean", ColumnType::Text, domains);
    }

    /// `{name_col}` -> `{target}` through the business-name cleaner.
    async fn add_clean_name(&self, table: &mut Table, name_col: &str, target: &str) -> Result<()> {
        let Some(values) = table.column_values(name_col) else {
            LinkageLogger::new(LinkageStage::Dataset)
                .log_warning(&format!("Column '{}' not found, '{}' not derived", name_col, target));
            return Ok(());
        };
        let cleaned = self
            .cleaner
            .clean_names(&values)
            .await
            .with_context(|| format!("Failed to clean '{}'", name_col))?;
        table.set_column(target, ColumnType::Text, cleaned);
        Ok(())
    }
}

/// Index on the business key, prefix with the dataset tag, sort.
pub fn finish(mut table: Table, shape: &DatasetShape) -> Result<Table> {
    table
        .set_index(shape.key, "Index")
        .with_context(|| format!("Failed to index {} on '{}'", shape.kind, shape.key))?;
    table.add_prefix(shape.kind.tag());
    table.sort_index();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_kind_names_and_tags() {
        assert_eq!(DatasetKind::CampaignMembers.to_string(), "campaign-members");
        assert_eq!(DatasetKind::DnbAccounts.tag(), "DNB_");
        assert_eq!(
            DatasetKind::from_str("zoominfo-accounts", false).unwrap(),
            DatasetKind::ZoominfoAccounts
        );
        assert!(DatasetKind::Opportunities.geo_columns().is_none());
    }
}
