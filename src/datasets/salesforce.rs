// src/datasets/salesforce.rs - CRM accounts, opportunities, campaigns and campaign members
use anyhow::Result;

use super::{finish, DatasetBuilder, DatasetKind, DatasetShape};
use crate::models::table::{ColumnTypeManifest, Table};
use crate::utils::config::LinkageConfig;
use crate::utils::warehouse::QueryExecutor;

pub fn accounts_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          aoa.code AS "AccountId",
          aoa.account_name AS "AccountName",
          aoa.outreach_account_natural_name AS "CleanName",
          aoa.type AS "AccountType",
          aoa.website AS "Website",
          aoa.annual_revenue AS "AnnualRevenue",
          aoa.number_of_employees AS "NumberofEmployees",
          aoa.sic_code AS "SIC",
          aoa.industry_profile_final AS "IndustryPortfolio",
          aoa.industry_sub_portfolio AS "IndustrySubPortfolio",
          aoa.primary_industry AS "PrimaryIndustry",
          aoa.sub_industry AS "SubIndustry",
          aoa.billing_city AS "BillingCity",
          aoa.billing_state AS "BillingState",
          aoa.billing_postal_code AS "BillingPostalCode",
          aoa.billing_country AS "BillingCountry",
          aoa.final_pod AS "POD",
          aoa.final_geo AS "Geo",
          aoa.dnb_duns_number AS "DUNSNumber",
          aoa.dnb_company_record AS "DNBCompanyProfile"
        FROM {} AS aoa"#,
        config.warehouse_table("account")
    );
    DatasetShape {
        kind: DatasetKind::Accounts,
        query,
        key: "AccountId",
        manifest: ColumnTypeManifest {
            int_cols: vec!["SIC"],
            float_cols: vec!["AnnualRevenue", "NumberofEmployees"],
            ..Default::default()
        },
    }
}

pub fn opportunities_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          account_id AS "AccountId",
          opportunity_id AS "OpportunityId",
          display_name AS "OpportunityName",
          new_or_expand AS "New_Or_Expand",
          acv_new_expand_converted AS "ACVNewExpandConverted",
          stage_name AS "StageName",
          true_stage AS "True_Stage",
          CAST(created_date AS TIMESTAMP) AS "CreatedDate",
          CAST(first_opp_created_date AS TIMESTAMP) AS "FirstOppCreatedDate",
          CAST(created_date AS TIMESTAMP) - INTERVAL '13 months' AS "AdjustedCreatedDate",
          CAST(stage1_date AS TIMESTAMP) AS "Stage1Date",
          CAST(stage2_date AS TIMESTAMP) AS "Stage2Date",
          CAST(stage3_date AS TIMESTAMP) AS "Stage3Date",
          CAST(stage4_date AS TIMESTAMP) AS "Stage4Date",
          CAST(final_close_date AS TIMESTAMP) AS "CloseDate",
          sql_source_type AS "SQLSourceType",
          sql_source_from_sales_fcst AS "SQLSourcefromSalesFcst",
          CAST(sql_created_date AS TIMESTAMP) AS "SQLCreatedDate",
          CAST(first_mql_created_date AS TIMESTAMP) AS "FirstMQLCreatedDate",
          CAST(first_approved_sdr_meeting_date AS TIMESTAMP) AS "FirstApprovedSDRMeetingDate",
          record_type_text AS "RecordType",
          reason AS "Reason",
          reason_details AS "ReasonDetails",
          duplicate_opportunity_link AS "DuplicateOpportunityLink"
        FROM {}"#,
        config.warehouse_table("opportunity")
    );
    DatasetShape {
        kind: DatasetKind::Opportunities,
        query,
        key: "OpportunityId",
        manifest: ColumnTypeManifest {
            int_cols: vec!["ACVNewExpandConverted"],
            category_cols: vec![
                "New_Or_Expand",
                "StageName",
                "True_Stage",
                "SQLSourceType",
                "SQLSourcefromSalesFcst",
                "RecordType",
                "Reason",
            ],
            ..Default::default()
        },
    }
}

pub fn campaigns_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          cmp.code AS "CampaignId",
          cmp.name AS "CampaignName",
          cmp.campaign_parent_id AS "CampaignParentId",
          cmp.campaign_parent_name AS "CampaignParentName",
          cmp.final_channel AS "CampaignChannel",
          cmp.lob AS "CampaignLOB",
          cmp.industry AS "CampaignIndustry",
          cmp.is_active AS "CampaignStatus"
        FROM {} AS cmp"#,
        config.warehouse_table("campaign")
    );
    DatasetShape {
        kind: DatasetKind::Campaigns,
        query,
        key: "CampaignId",
        manifest: ColumnTypeManifest {
            category_cols: vec![
                "CampaignChannel",
                "CampaignChannels",
                "CampaignLOB",
                "CampaignIndustry",
                "CampaignStatus",
            ],
            ..Default::default()
        },
    }
}

pub fn campaign_members_shape(config: &LinkageConfig) -> DatasetShape {
    let query = format!(
        r#"
        SELECT
          cm.code AS "MemberId",
          cm.contact_lead_id AS "ContactId",
          cm.type AS "ContactType",
          cm.lob AS "LOB",
          cm.final_account_id AS "AccountId",
          cm.account_name AS "AccountName",
          cm.campaign_id AS "CampaignId",
          cm.campaign AS "Campaign",
          cm.campaign_member_status AS "CampaignMemberStatus",
          cm.has_responded AS "HasResponded",
          CAST(cm.created_date AS TIMESTAMP) AS "CreatedDate",
          CAST(cm.first_responded_date AS TIMESTAMP) AS "FirstRespondedDate",
          cm.channel_campaign AS "ChannelCampaign",
          cm.channel_medium AS "ChannelMedium",
          cm.channel_source AS "ChannelSource",
          cm.channel_campaign_final AS "ChannelCampaignFinal",
          cm.final_campaign_channel AS "FinalCampaignChannel",
          cm.edw_lead_channel AS "EDWChannel",
          cm.campaign_channels AS "CampaignChannels",
          cnct.name AS "ContactName",
          cnct.email AS "Email",
          cnct.job_level AS "JobLevel",
          cnct.job_function AS "JobFunction"
        FROM {} AS cm
        LEFT JOIN {} AS cnct
          ON cnct.code = cm.contact_lead_id"#,
        config.warehouse_table("campaign_member"),
        config.warehouse_table("contact_lead")
    );
    DatasetShape {
        kind: DatasetKind::CampaignMembers,
        query,
        key: "MemberId",
        manifest: ColumnTypeManifest {
            int_cols: vec!["CampaignMemberStatus", "HasResponded"],
            category_cols: vec![
                "ContactType",
                "LOB",
                "ChannelCampaign",
                "ChannelMedium",
                "ChannelSource",
                "ChannelCampaignFinal",
                "FinalCampaignChannel",
                "EDWChannel",
                "CampaignChannels",
                "JobLevel",
                "JobFunction",
            ],
            ..Default::default()
        },
    }
}

impl<'a, E: QueryExecutor> DatasetBuilder<'a, E> {
    /// Accounts with `WebsiteClean`, `DomainClean` and `AccountNameClean`, tagged `SF_`.
    pub async fn accounts(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = accounts_shape(self.config);
        let mut table = self.fetch(&shape, filter_by).await?;
        self.add_website_columns(&mut table, "Website");
        self.add_clean_name(&mut table, "AccountName", "AccountNameClean")
            .await?;
        finish(table, &shape)
    }

    pub async fn opportunities(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = opportunities_shape(self.config);
        let table = self.fetch(&shape, filter_by).await?;
        finish(table, &shape)
    }

    pub async fn campaigns(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = campaigns_shape(self.config);
        let table = self.fetch(&shape, filter_by).await?;
        finish(table, &shape)
    }

    pub async fn campaign_members(&self, filter_by: Option<&str>) -> Result<Table> {
        let shape = campaign_members_shape(self.config);
        let table = self.fetch(&shape, filter_by).await?;
        finish(table, &shape)
    }
}
