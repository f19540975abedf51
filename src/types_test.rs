use super::*;

// =============================================================
// BriefOptions
// =============================================================

#[test]
fn default_window_is_seven_days() {
    assert_eq!(BriefOptions::default().window(), BriefWindow::Days(7));
}

#[test]
fn both_dates_select_range() {
    let opts = BriefOptions::range("2024-01-01", "2024-01-31");
    assert_eq!(
        opts.window(),
        BriefWindow::Range { from: "2024-01-01".to_owned(), to: "2024-01-31".to_owned() }
    );
}

#[test]
fn range_wins_over_explicit_days() {
    let opts = BriefOptions { days: 30, ..BriefOptions::range("2024-01-01", "2024-01-31") };
    assert!(matches!(opts.window(), BriefWindow::Range { .. }));
}

#[test]
fn single_date_falls_back_to_days() {
    let opts = BriefOptions { from_date: Some("2024-01-01".to_owned()), ..BriefOptions::last_days(14) };
    assert_eq!(opts.window(), BriefWindow::Days(14));
}

#[test]
fn empty_date_strings_fall_back_to_days() {
    let opts = BriefOptions::range("", "2024-01-31");
    assert_eq!(opts.window(), BriefWindow::Days(DEFAULT_BRIEF_DAYS));
}

// =============================================================
// serde shapes
// =============================================================

#[test]
fn token_response_keeps_extra_fields() {
    let json = serde_json::json!({ "access_token": "t1", "expires_in": 86400 });
    let resp: TokenResponse = serde_json::from_value(json).unwrap();
    assert_eq!(resp.access_token, "t1");
    assert_eq!(resp.token_type, "bearer");
    assert_eq!(resp.extra.get("expires_in"), Some(&serde_json::json!(86400)));
}

#[test]
fn token_response_requires_access_token() {
    let json = serde_json::json!({ "token_type": "bearer" });
    assert!(serde_json::from_value::<TokenResponse>(json).is_err());
}

#[test]
fn article_reads_abstract_field() {
    let json = serde_json::json!({
        "pmid": "38000001",
        "title": "Colchicine after myocardial infarction",
        "authors": ["Tardif JC", "Kouz S"],
        "journal": "N Engl J Med",
        "pub_date": "2024 Jan 11",
        "abstract": "Background...",
        "doi": null,
        "pubmed_url": "https://pubmed.ncbi.nlm.nih.gov/38000001/"
    });
    let article: Article = serde_json::from_value(json).unwrap();
    assert_eq!(article.abstract_text.as_deref(), Some("Background..."));
    assert_eq!(article.doi, None);
    assert_eq!(article.authors.len(), 2);
}

#[test]
fn profile_defaults_missing_journal_ids() {
    let profile: Profile = serde_json::from_value(serde_json::json!({ "id": 4, "name": "Empty" })).unwrap();
    assert!(profile.journal_ids.is_empty());
}
