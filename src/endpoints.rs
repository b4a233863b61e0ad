//! Catalogue endpoint URL builders

use chrono::NaiveDate;

fn root(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Build login URL
pub fn login_url(base_url: &str) -> String {
    format!("{}/ws/Login", root(base_url))
}

/// Build token refresh URL
pub fn refresh_token_url(base_url: &str) -> String {
    format!("{}/ws/RefreshToken", root(base_url))
}

/// Build norm list URL
pub fn norms_url(base_url: &str) -> String {
    format!("{}/ws/Norme", root(base_url))
}

/// Build norm detail URL (indicators and phases of one norm)
pub fn norm_detail_url(base_url: &str, norm_id: i64) -> String {
    format!("{}/ws/Norme/{}", root(base_url), norm_id)
}

/// Build record index URL
///
/// Archived records are always excluded; `since` restricts the index to records
/// updated since that date.
pub fn record_index_url(base_url: &str, since: Option<NaiveDate>) -> String {
    let mut url = format!("{}/ws/Epd?includeArchived=false", root(base_url));

    if let Some(date) = since {
        url.push_str(&format!("&referenceDateTime={}", date.format("%Y-%m-%d")));
    }

    url
}

/// Build record detail URL
pub fn record_url(base_url: &str, id: i64) -> String {
    format!("{}/ws/Epd/{}", root(base_url), id)
}
