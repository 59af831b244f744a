//! Direct query strategy
//!
//! Instead of crawling certificate pages, this strategy issues structured
//! queries against the certificate database behind crt.sh:
//! - [`DirectQuery::run`] folds the subject alternative names and common names
//!   of every logged certificate whose organization or organizational unit
//!   starts with the seed into a [`ResultSet`]
//! - [`DirectQuery::linked_orgs`] looks the other way, collecting the
//!   organization names found on certificates for subdomains of a root domain,
//!   which are candidate seeds for a follow-up search

use crate::names::{normalize_name, ResultSet};
use crate::SanError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeSet;
use std::time::Duration;

/// Names of logged certificates whose O or OU starts with `$1` (lowercase)
const LINKED_NAMES_QUERY: &str = r#"
SELECT x509_altNames(c.CERTIFICATE, 2, TRUE) AS san_name,
       x509_nameAttributes(c.CERTIFICATE, 'commonName', TRUE) AS common_name
  FROM ca,
       ct_log_entry ctle,
       certificate_identity ci,
       certificate c
 WHERE ci.ISSUER_CA_ID = ca.ID
   AND c.ID = ctle.CERTIFICATE_ID
   AND ci.CERTIFICATE_ID = c.ID
   AND ci.NAME_TYPE IN ('organizationName', 'organizationalUnitName')
   AND lower(ci.NAME_VALUE) LIKE $1 || '%'
 GROUP BY c.ID, san_name, common_name
"#;

/// O and OU of logged certificates naming a subdomain of `$1` (lowercase)
const LINKED_ORGS_QUERY: &str = r#"
SELECT x509_nameAttributes(c.CERTIFICATE, 'organizationName', TRUE) AS org_name,
       x509_nameAttributes(c.CERTIFICATE, 'organizationalUnitName', TRUE) AS ou_name
  FROM ca,
       ct_log_entry ctle,
       certificate_identity ci,
       certificate c
 WHERE ci.ISSUER_CA_ID = ca.ID
   AND c.ID = ctle.CERTIFICATE_ID
   AND ci.CERTIFICATE_ID = c.ID
   AND reverse(lower(ci.NAME_VALUE)) LIKE reverse('%.' || $1)
 GROUP BY c.ID, org_name, ou_name
"#;

/// Organizations of high-volume certificate authorities and appliance
/// vendors, which show up on certificates for unrelated domains
pub const KNOWN_CA_ORGS: &[&str] = &[
    "Let's Encrypt",
    "cPanel, Inc.",
    "COMODO CA Limited",
    "GoDaddy.com, Inc.",
    "DigiCert Inc",
    "Symantec Corporation",
    "GlobalSign nv-sa",
    "GeoTrust Inc.",
    "CloudFlare, Inc.",
    "LANCOM Systems",
    "Western Digital Technologies",
    "LANCOM Systems GmbH",
    "StartCom Ltd.",
    "D-LINK",
    "GeoTrust, Inc.",
    "Ubiquiti Networks Inc.",
    "SomeOrganization",
    "VeriSign, Inc.",
    "Technicolor",
    "TrustAsia Technologies, Inc.",
];

/// One result row: (subject alternative name, common name)
pub type NameRow = (Option<String>, Option<String>);

/// One organization row: (organization name, organizational unit name)
pub type OrgRow = (Option<String>, Option<String>);

/// A connection to the certificate database
pub struct DirectQuery {
    pool: PgPool,
}

impl DirectQuery {
    /// Connects to the certificate database
    ///
    /// An unreachable database is fatal and reported as
    /// [`SanError::SourceUnavailable`].
    pub async fn connect(database_url: &str) -> Result<Self, SanError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| SanError::SourceUnavailable {
                source_name: "certificate database".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Runs the linked-names query for `seed`
    pub async fn run(&self, seed: &str) -> Result<ResultSet, SanError> {
        let seed = seed.trim().to_lowercase();
        tracing::info!("Querying certificate database for organization '{}'", seed);

        let rows: Vec<NameRow> = sqlx::query_as(LINKED_NAMES_QUERY)
            .bind(&seed)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("{} rows returned", rows.len());
        Ok(fold_rows(rows))
    }

    /// Organizations named on certificates for subdomains of `root_domain`
    pub async fn linked_orgs(&self, root_domain: &str) -> Result<BTreeSet<String>, SanError> {
        let root_domain = root_domain.trim().to_lowercase();
        tracing::info!("Looking for organizations in subdomains of {}", root_domain);

        let rows: Vec<OrgRow> = sqlx::query_as(LINKED_ORGS_QUERY)
            .bind(&root_domain)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("{} rows returned for {}", rows.len(), root_domain);
        Ok(filter_orgs(&root_domain, rows))
    }

    /// Candidate organizations for `seed`: the seed itself plus every
    /// organization linked to one of `domains`
    pub async fn possible_orgs(
        &self,
        seed: &str,
        domains: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, SanError> {
        let mut orgs = BTreeSet::from([seed.trim().to_string()]);
        for domain in domains {
            orgs.extend(self.linked_orgs(domain).await?);
        }
        Ok(orgs)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Folds query rows into a result set
///
/// Both columns of every row contribute; empty and non-hostname values are
/// skipped and names are normalized the same way extracted records are.
pub fn fold_rows<I>(rows: I) -> ResultSet
where
    I: IntoIterator<Item = NameRow>,
{
    rows.into_iter()
        .flat_map(|(san, common)| [san, common])
        .flatten()
        .filter_map(|name| normalize_name(&name))
        .collect()
}

/// Reduces organization rows to candidate organization names
///
/// Values ending with the root domain are hostnames put in the O/OU fields
/// rather than organizations, and known certificate authorities are noise.
pub fn filter_orgs<I>(root_domain: &str, rows: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = OrgRow>,
{
    let root_domain = root_domain.to_lowercase();

    rows.into_iter()
        .flat_map(|(org, unit)| [org, unit])
        .flatten()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| !name.to_lowercase().ends_with(&root_domain))
        .filter(|name| !KNOWN_CA_ORGS.contains(&name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_rows_uses_both_columns() {
        let rows = vec![
            (
                Some("www.example.com".to_string()),
                Some("example.com".to_string()),
            ),
            (Some("API.example.com".to_string()), None),
            (None, Some("www.example.com".to_string())),
        ];

        let set = fold_rows(rows);
        let names: Vec<&str> = set.iter().collect();
        assert_eq!(
            names,
            vec!["api.example.com", "example.com", "www.example.com"]
        );
    }

    #[test]
    fn test_fold_rows_skips_junk() {
        let rows = vec![
            (Some(String::new()), Some("Example Corp".to_string())),
            (Some("localhost".to_string()), None),
        ];
        assert!(fold_rows(rows).is_empty());
    }

    #[test]
    fn test_fold_no_rows() {
        assert!(fold_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_queries_bind_single_parameter() {
        for query in [LINKED_NAMES_QUERY, LINKED_ORGS_QUERY] {
            assert!(query.contains("$1"));
            assert!(!query.contains("$2"));
        }
    }

    #[test]
    fn test_queries_only_return_logged_certificates() {
        for query in [LINKED_NAMES_QUERY, LINKED_ORGS_QUERY] {
            assert!(query.contains("ct_log_entry ctle"));
            assert!(query.contains("c.ID = ctle.CERTIFICATE_ID"));
        }
    }

    fn org_row(org: Option<&str>, unit: Option<&str>) -> OrgRow {
        (org.map(String::from), unit.map(String::from))
    }

    #[test]
    fn test_filter_orgs() {
        let rows = vec![
            org_row(Some("Acme Corporation"), Some("Acme Security")),
            org_row(Some("Let's Encrypt"), None),
            org_row(Some("DigiCert Inc"), Some("www.acme.com")),
            org_row(None, Some("  Acme Labs ")),
            org_row(Some(""), Some("ACME.COM")),
            org_row(Some("Acme Corporation"), None),
        ];

        let orgs: Vec<String> = filter_orgs("acme.com", rows).into_iter().collect();
        assert_eq!(orgs, vec!["Acme Corporation", "Acme Labs", "Acme Security"]);
    }

    #[test]
    fn test_filter_orgs_no_rows() {
        assert!(filter_orgs("acme.com", Vec::new()).is_empty());
    }

    #[test]
    fn test_known_ca_list_entries_are_distinct() {
        let unique: BTreeSet<&str> = KNOWN_CA_ORGS.iter().copied().collect();
        assert_eq!(unique.len(), KNOWN_CA_ORGS.len());
        assert!(KNOWN_CA_ORGS.contains(&"Let's Encrypt"));
    }
}
