// src/datasets/enrichment.rs - Third-party enrichment accounts and uploaded name lists
use anyhow::Result;

use super::{finish, DatasetBuilder, DatasetKind, DatasetShape};
use crate::models::table::{ColumnTypeManifest, Table};
use crate::utils::config::LinkageConfig;
use crate::utils::warehouse::QueryExecutor;

fn firmographic_manifest() -> ColumnTypeManifest {
    ColumnTypeManifest {
        int_cols: vec!["SICCode"],
        float_cols: vec!["AnnualRevenue", "NumberofEmployees"],
        ..Default::default()
    }
}

pub fn zoominfo_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          zi.zoominfo_id AS "ZoomInfoId",
          zi.sf_account_id AS "AccountId",
          zi.company_name AS "AccountName",
          zi.website AS "Website",
          zi.city AS "City",
          zi.state AS "State",
          zi.postal_code AS "PostalCode",
          zi.country AS "Country",
          zi.revenue AS "AnnualRevenue",
          zi.employees AS "NumberofEmployees",
          zi.primary_sic AS "SICCode"
        FROM {} AS zi"#,
        config.warehouse_table("zoominfo_account")
    );
    DatasetShape {
        kind: DatasetKind::ZoominfoAccounts,
        query,
        key: "ZoomInfoId",
        manifest: firmographic_manifest(),
    }
}

pub fn dnb_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          dnb.id AS "Id",
          dnb.duns_number AS "DUNSNumber",
          dnb.business_name AS "BusinessName",
          dnb.website AS "Website",
          dnb.city AS "City",
          dnb.state AS "State",
          dnb.postal_code AS "PostalCode",
          dnb.country AS "Country",
          dnb.annual_revenue AS "AnnualRevenue",
          dnb.employees AS "NumberofEmployees",
          dnb.sic_code AS "SICCode"
        FROM {} AS dnb"#,
        config.warehouse_table("dnb_account")
    );
    DatasetShape {
        kind: DatasetKind::DnbAccounts,
        query,
        key: "Id",
        manifest: firmographic_manifest(),
    }
}

pub fn input_names_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          inp.row_id AS "RowId",
          inp.company AS "Company",
          inp.outreach_account_natural_name AS "Outreach_Account_Natural_Name"
        FROM {} AS inp"#,
        config.warehouse_table("input_names")
    );
    DatasetShape {
        kind: DatasetKind::InputNames,
        query,
        key: "RowId",
        manifest: ColumnTypeManifest {
            str_cols: vec!["Company", "Outreach_Account_Natural_Name"],
            ..Default::default()
        },
    }
}

impl<'a, E: QueryExecutor> DatasetBuilder<'a, E> {
    /// ZoomInfo companies tagged `ZI_`, carrying the CRM account id they were matched to.
    pub async fn zoominfo_accounts(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = zoominfo_shape(self.config);
        let mut table = self.fetch(&shape, filter_by).await?;
        self.add_website_columns(&mut table, "Website");
        self.add_clean_name(&mut table, "AccountName", "AccountNameClean")
            .await?;
        finish(table, &shape)
    }

    /// D&B business records tagged `DNB_`.
    pub async fn dnb_accounts(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = dnb_shape(self.config);
        let mut table = self.fetch(&shape, filter_by).await?;
        self.add_website_columns(&mut table, "Website");
        self.add_clean_name(&mut table, "BusinessName", "BusinessNameClean")
            .await?;
        finish(table, &shape)
    }

    /// Uploaded company names for name-only matching, tagged `INP_`.
    pub async fn input_names(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = input_names_shape(self.config);
        let table = self.fetch(&shape, filter_by).await?;
        finish(table, &shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::{ColumnType, Value};
    use crate::utils::warehouse::fixtures::FixtureWarehouse;

    fn empty_terms() -> Table {
        Table::from_rows(&[("term", ColumnType::Text)], vec![])
    }

    #[tokio::test]
    async fn test_dnb_accounts_shape() {
        let rows = Table::from_rows(
            &[
                ("Id", ColumnType::Text),
                ("BusinessName", ColumnType::Text),
                ("Website", ColumnType::Text),
                ("SICCode", ColumnType::Text),
            ],
            vec![vec!["D-1".into(), "INITECH, INC.".into(), "initech.io/about/".into(), "7371".into()]],
        );
        let warehouse = FixtureWarehouse::new()
            .with_table("maintenance.stopwords", empty_terms())
            .with_table("maintenance.countries", empty_terms())
            .with_table("marketing_ops.dnb_account", rows);
        let config = LinkageConfig::default();
        let table = DatasetBuilder::new(&warehouse, &config)
            .dnb_accounts(None)
            .await
            .unwrap();

        assert_eq!(table.index().unwrap().name, "DNB_Index");
        assert_eq!(table.value(0, "DNB_BusinessNameClean"), Some(&Value::text("Initech")));
        assert_eq!(table.value(0, "DNB_WebsiteClean"), Some(&Value::text("initech.io/about")));
        assert_eq!(table.value(0, "DNB_DomainClean"), Some(&Value::text("initech.io")));
        assert_eq!(table.value(0, "DNB_SICCode"), Some(&Value::Int(7371)));
    }

    #[tokio::test]
    async fn test_zoominfo_keeps_crm_account_id() {
        let rows = Table::from_rows(
            &[
                ("ZoomInfoId", ColumnType::Int),
                ("AccountId", ColumnType::Text),
                ("AccountName", ColumnType::Text),
            ],
            vec![
                vec![Value::Int(9), "0012".into(), "Globex".into()],
                vec![Value::Int(3), Value::Null, "Acme".into()],
            ],
        );
        let warehouse = FixtureWarehouse::new()
            .with_table("maintenance.stopwords", empty_terms())
            .with_table("maintenance.countries", empty_terms())
            .with_table("marketing_ops.zoominfo_account", rows);
        let config = LinkageConfig::default();
        let table = DatasetBuilder::new(&warehouse, &config)
            .build(DatasetKind::ZoominfoAccounts, None)
            .await
            .unwrap();

        assert_eq!(table.index().unwrap().labels, vec![Value::Int(3), Value::Int(9)]);
        assert_eq!(table.value(1, "ZI_AccountId"), Some(&Value::text("0012")));
        // no Website column in the fixture: derived columns are skipped, not fatal
        assert!(!table.has_column("ZI_WebsiteClean"));
    }
}
