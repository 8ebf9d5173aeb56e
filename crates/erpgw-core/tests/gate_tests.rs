#![allow(clippy::unwrap_used, clippy::expect_used)]

use erpgw_core::errors::RejectReason;
use erpgw_core::gate::{evaluate, validate_read_only, QueryRequest, ValidationOutcome};
use erpgw_core::SqlValue;
use serde_json::json;

fn rejected(text: &str) -> Option<RejectReason> {
    validate_read_only(text).err()
}

#[test]
fn test_empty_and_blank_queries_are_required() {
    assert_eq!(rejected(""), Some(RejectReason::QueryRequired));
    assert_eq!(rejected(" \n\t "), Some(RejectReason::QueryRequired));
}

#[test]
fn test_separator_outside_literal_is_multi_statement() {
    assert_eq!(
        rejected("SELECT 1; SELECT 2"),
        Some(RejectReason::MultiStatement)
    );
    // A trailing separator alone is still a second (empty) statement
    assert_eq!(rejected("SELECT 1;"), Some(RejectReason::MultiStatement));
}

#[test]
fn test_separator_inside_literal_is_allowed() {
    assert_eq!(rejected("SELECT 'a;b' AS x"), None);
}

#[test]
fn test_separator_checked_before_comments() {
    assert_eq!(
        rejected("SELECT 1; -- trailing"),
        Some(RejectReason::MultiStatement)
    );
}

#[test]
fn test_comment_markers_rejected_outside_literals() {
    assert_eq!(
        rejected("SELECT 1 -- note"),
        Some(RejectReason::CommentsNotAllowed)
    );
    assert_eq!(
        rejected("SELECT /* hidden */ 1"),
        Some(RejectReason::CommentsNotAllowed)
    );
    assert_eq!(rejected("SELECT 1 */"), Some(RejectReason::CommentsNotAllowed));
    assert_eq!(rejected("SELECT '--' AS dashes"), None);
}

#[test]
fn test_drop_table_inside_literal_passes() {
    // Given a plain SELECT whose literal mentions a mutating statement
    let text = "SELECT 'drop table Items' AS note FROM Items";

    // When / Then it is accepted
    assert_eq!(rejected(text), None);
}

#[test]
fn test_leading_whitespace_with_cte_accepted() {
    let text = "\n   WiTh recent AS (SELECT TOP 5 * FROM Stock) SELECT * FROM recent";
    assert_eq!(rejected(text), None);
}

#[test]
fn test_non_select_statements_rejected() {
    for text in [
        "UPDATE Items SET Price = 0",
        "sp_who",
        "selectx FROM t",
        "(SELECT 1)",
    ] {
        assert_eq!(rejected(text), Some(RejectReason::NotReadOnly), "{}", text);
    }
}

#[test]
fn test_mutating_keyword_anywhere_rejected() {
    assert_eq!(
        rejected("WITH x AS (SELECT 1 AS a) DELETE FROM x"),
        Some(RejectReason::NotReadOnly)
    );
    assert_eq!(
        rejected("SELECT * INTO #t FROM a EXECUTE('x')"),
        Some(RejectReason::NotReadOnly)
    );
}

#[test]
fn test_offset_hint_binds_string_as_integer() {
    // Given a parameter used as an OFFSET control
    let req = QueryRequest::new(
        "SELECT * FROM Items ORDER BY ItemKey OFFSET @offset ROWS FETCH NEXT @take ROWS ONLY",
    )
    .with_param("offset", json!("10"))
    .with_param("take", json!("abc"));

    // When
    let (_, args) = evaluate(&req).into_result().unwrap();

    // Then the numeric string binds as 10 and the junk passes through
    assert_eq!(
        args,
        vec![
            ("offset".to_string(), SqlValue::Int(10)),
            ("take".to_string(), SqlValue::Text("abc".into())),
        ]
    );
}

#[test]
fn test_unhinted_numeric_string_stays_text() {
    let req = QueryRequest::new("SELECT * FROM Items WHERE ItemKey = @sku")
        .with_param("@sku", json!("000123"));
    let (_, args) = evaluate(&req).into_result().unwrap();
    assert_eq!(args, vec![("sku".to_string(), SqlValue::Text("000123".into()))]);
}

#[test]
fn test_rejected_outcome_carries_reason() {
    let outcome = evaluate(&QueryRequest::new("DELETE FROM Items"));
    assert!(!outcome.is_accepted());
    assert_eq!(
        outcome,
        ValidationOutcome::Rejected {
            reason: RejectReason::NotReadOnly
        }
    );
}
