mod common;

use std::collections::BTreeSet;

use common::{create_type0_pdf, csv_upload, pdf_upload};
use picklist_merge::{
    AccountUpload, AggregateRow, ExportFormat, MergeError, MergeOptions, OutcomeStatus,
    PageSelection, UploadedFile, WarningCode, export, merge_picklists,
};
use pretty_assertions::assert_eq;

fn totals(rows: &[AggregateRow]) -> Vec<(String, u64)> {
    rows.iter()
        .map(|row| (row.product_id.clone(), row.total_quantity))
        .collect()
}

type GroupKey = (String, u64, BTreeSet<String>, BTreeSet<String>);

fn as_sets(rows: &[AggregateRow]) -> Vec<GroupKey> {
    rows.iter()
        .map(|row| {
            (
                row.product_id.clone(),
                row.total_quantity,
                row.source_accounts.iter().cloned().collect(),
                row.order_ids.iter().cloned().collect(),
            )
        })
        .collect()
}

#[test]
fn merges_two_accounts_into_sorted_totals() {
    let uploads = [
        csv_upload("A", "SKU,Qty\nSKU2,3\nSKU1,2\n"),
        csv_upload("B", "Seller SKU,Quantity\nSKU1,5\n"),
    ];

    let report =
        merge_picklists(&uploads, &MergeOptions::default()).expect("merge should succeed");

    assert_eq!(
        report.rows,
        vec![
            AggregateRow {
                product_id: "SKU1".to_string(),
                total_quantity: 7,
                source_accounts: vec!["A".to_string(), "B".to_string()],
                order_ids: Vec::new(),
            },
            AggregateRow {
                product_id: "SKU2".to_string(),
                total_quantity: 3,
                source_accounts: vec!["A".to_string()],
                order_ids: Vec::new(),
            },
        ]
    );
    assert!(
        report
            .outcomes
            .iter()
            .all(|outcome| outcome.status == OutcomeStatus::Success)
    );

    let summary = report.summary();
    assert_eq!(summary.product_count, 2);
    assert_eq!(summary.account_count, 2);
    assert_eq!(summary.total_quantity, 10);
}

#[test]
fn account_order_and_reruns_do_not_change_the_result() {
    let a = csv_upload("A", "SKU,Qty,Order ID\nMUG-1,2,O1\nCAP-9,1,O2\n");
    let b = csv_upload("B", "ProductID,Quantity,OrderID\nCAP-9,4,O3\nMUG-1,1,O1\n");
    let c = csv_upload("C", "Sku,Item Qty\nPEN-3,6\n");
    let options = MergeOptions::default();

    let forward = merge_picklists(&[a.clone(), b.clone(), c.clone()], &options)
        .expect("forward merge");
    let reversed = merge_picklists(&[c.clone(), b.clone(), a.clone()], &options)
        .expect("reversed merge");
    let rerun = merge_picklists(&[a, b, c], &options).expect("rerun");

    assert_eq!(as_sets(&forward.rows), as_sets(&reversed.rows));
    assert_eq!(forward, rerun);
}

#[test]
fn csv_export_reads_back_with_the_same_totals() {
    let uploads = [
        csv_upload("A", "SKU,Qty,Order ID\nMUG-1,2,O1\nCAP-9,1,O2\n"),
        csv_upload("B", "SKU,Qty,Order ID\nMUG-1,5,O3\n"),
    ];
    let options = MergeOptions::default();
    let report = merge_picklists(&uploads, &options).expect("merge");

    let buffer = export(&report.rows, ExportFormat::Csv, "weekly").expect("csv export");
    assert_eq!(buffer.file_name, "weekly.csv");
    let csv = String::from_utf8(buffer.bytes.clone()).expect("utf-8 csv");
    assert!(csv.starts_with("ProductID,Total_Quantity,Source_Accounts,Orders_Involved"));
    assert!(csv.contains("MUG-1,7,\"A, B\",\"O1, O3\""), "unexpected CSV: {csv}");

    let reread = merge_picklists(
        &[AccountUpload::new(
            "merged",
            UploadedFile::new(buffer.file_name, buffer.bytes),
        )],
        &options,
    )
    .expect("exported CSV should merge again");
    assert_eq!(totals(&reread.rows), totals(&report.rows));
}

#[test]
fn xlsx_export_reads_back_with_the_same_totals() {
    let uploads = [
        csv_upload("A", "SKU,Qty\nMUG-1,2\nCAP-9,1\n"),
        csv_upload("B", "SKU,Qty\nMUG-1,5\n"),
    ];
    let options = MergeOptions::default();
    let report = merge_picklists(&uploads, &options).expect("merge");

    let buffer = export(&report.rows, ExportFormat::Xlsx, "Week 42").expect("xlsx export");
    assert_eq!(buffer.file_name, "Week 42.xlsx");

    let reread = merge_picklists(
        &[AccountUpload::new(
            "merged",
            UploadedFile::new(buffer.file_name, buffer.bytes),
        )],
        &options,
    )
    .expect("exported workbook should merge again");
    assert_eq!(totals(&reread.rows), totals(&report.rows));
}

#[test]
fn unreadable_quantities_count_as_zero() {
    let uploads = [csv_upload("A", "SKU,Qty\nMUG-1,two\nMUG-1,3\nCAP-9,\n")];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(
        totals(&report.rows),
        vec![("CAP-9".to_string(), 0), ("MUG-1".to_string(), 3)]
    );
    assert_eq!(report.outcomes[0].rows_used, 3);
    let warning = report
        .warnings
        .iter()
        .find(|warning| warning.code == WarningCode::QuantityCoerced)
        .expect("coercion should be reported");
    assert_eq!(warning.account.as_deref(), Some("A"));
}

#[test]
fn account_without_product_column_is_skipped_while_others_merge() {
    let uploads = [
        csv_upload("A", "Item,Qty\nMUG-1,2\n"),
        csv_upload("B", "SKU,Qty\nMUG-1,5\n"),
        AccountUpload::missing("C"),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(totals(&report.rows), vec![("MUG-1".to_string(), 5)]);
    assert_eq!(report.rows[0].source_accounts, vec!["B".to_string()]);

    let statuses = report
        .outcomes
        .iter()
        .map(|outcome| {
            (
                outcome.account.as_str(),
                outcome.status,
                outcome.code.as_deref(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![
            ("A", OutcomeStatus::Skipped, Some("schema_error")),
            ("B", OutcomeStatus::Success, None),
            ("C", OutcomeStatus::Skipped, Some("missing_upload")),
        ]
    );
}

#[test]
fn unsupported_and_broken_files_fail_without_stopping_the_run() {
    let uploads = [
        AccountUpload::new("A", UploadedFile::new("notes.txt", b"hello".to_vec())),
        AccountUpload::new("B", UploadedFile::new("broken.xlsx", b"not a zip".to_vec())),
        csv_upload("C", "SKU,Qty\nMUG-1,1\n"),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    let codes = report
        .outcomes
        .iter()
        .map(|outcome| (outcome.status, outcome.code.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec![
            (OutcomeStatus::Failed, Some("unsupported_format")),
            (OutcomeStatus::Failed, Some("read_error")),
            (OutcomeStatus::Success, None),
        ]
    );
}

#[test]
fn merges_tables_from_pdf_picklists() {
    let uploads = [
        pdf_upload(
            "A",
            &[
                vec!["SKU  Quantity  OrderID", "MUG-1  2  O1", "CAP-9  4  O2"],
                vec!["PEN-3  1  O3", "MUG-1  1  O4"],
            ],
        ),
        csv_upload("B", "SKU,Qty\nMUG-1,5\n"),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(
        totals(&report.rows),
        vec![
            ("CAP-9".to_string(), 4),
            ("MUG-1".to_string(), 8),
            ("PEN-3".to_string(), 1),
        ]
    );
    assert_eq!(report.rows[1].order_ids, vec!["O1".to_string(), "O4".to_string()]);
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == WarningCode::ContinuationTable)
    );
}

#[test]
fn pdf_footers_do_not_become_products() {
    let uploads = [pdf_upload(
        "A",
        &[vec![
            "SKU  Qty  Order ID",
            "MUG-1  2  O1",
            "CAP-9  1  O2",
            "Total  3",
            "Page 1 of 1",
        ]],
    )];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(
        totals(&report.rows),
        vec![("CAP-9".to_string(), 1), ("MUG-1".to_string(), 2)]
    );
    assert_eq!(report.outcomes[0].rows_used, 2);
}

#[test]
fn pdf_page_selection_limits_contributing_pages() {
    let pages = [
        vec!["SKU  Qty", "MUG-1  2", "CAP-9  1"],
        vec!["SKU  Qty", "PEN-3  4", "MUG-1  5"],
    ];
    let options = MergeOptions {
        pages: Some("2".parse::<PageSelection>().expect("page selection")),
        ..MergeOptions::default()
    };

    let report = merge_picklists(&[pdf_upload("A", &pages)], &options).expect("merge");

    assert_eq!(
        totals(&report.rows),
        vec![("MUG-1".to_string(), 5), ("PEN-3".to_string(), 4)]
    );
}

#[test]
fn pdf_that_breaks_document_text_extraction_does_not_abort_the_run() {
    let pdf = create_type0_pdf(&[vec!["SKU  Qty", "MUG-1  3", "CAP-9  1"]])
        .expect("PDF fixture should be created");
    let uploads = [
        csv_upload("A", "SKU,Qty\nMUG-1,2\n"),
        AccountUpload::new("B", UploadedFile::new("b.pdf", pdf)),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
    assert_eq!(
        totals(&report.rows),
        vec![("CAP-9".to_string(), 1), ("MUG-1".to_string(), 5)]
    );
}

#[test]
fn missing_sheet_index_is_a_read_error() {
    let report = merge_picklists(
        &[csv_upload("A", "SKU,Qty\nMUG-1,2\n")],
        &MergeOptions::default(),
    )
    .expect("merge");
    let workbook = export(&report.rows, ExportFormat::Xlsx, "Week 42").expect("xlsx export");
    let uploads = [
        AccountUpload::new("W", UploadedFile::new("week.xlsx", workbook.bytes)),
        csv_upload("B", "SKU,Qty\nCAP-9,1\n"),
    ];
    let options = MergeOptions {
        sheet_index: 1,
        ..MergeOptions::default()
    };

    let report = merge_picklists(&uploads, &options).expect("merge");

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.code.as_deref(), Some("read_error"));
    assert!(
        outcome
            .reason
            .as_deref()
            .is_some_and(|reason| reason.contains("no sheet at index 1")),
        "unexpected reason: {:?}",
        outcome.reason
    );
    assert_eq!(totals(&report.rows), vec![("CAP-9".to_string(), 1)]);
}

#[test]
fn pdf_without_tables_is_skipped_and_not_a_source() {
    let uploads = [
        csv_upload("A", "SKU,Qty\nSKU1,2\n"),
        pdf_upload(
            "C",
            &[vec!["Thank you for selling with us.", "Nothing to ship this week."]],
        ),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    let outcome = &report.outcomes[1];
    assert_eq!(outcome.account, "C");
    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert_eq!(outcome.code.as_deref(), Some("no_tables"));
    assert!(
        report
            .rows
            .iter()
            .all(|row| !row.source_accounts.contains(&"C".to_string()))
    );
}

#[test]
fn duplicate_order_ids_are_listed_once() {
    let uploads = [
        csv_upload("A", "SKU,Qty,Order ID\nMUG-1,1,O1\nMUG-1,2,O1\nMUG-1,1,\n"),
        csv_upload("B", "SKU,Qty,Order ID\nMUG-1,1,O1\n"),
    ];

    let report = merge_picklists(&uploads, &MergeOptions::default()).expect("merge");

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].total_quantity, 5);
    assert_eq!(report.rows[0].order_ids, vec!["O1".to_string()]);
}

#[test]
fn no_usable_rows_returns_every_outcome() {
    let uploads = [
        csv_upload("A", "Item,Qty\nMUG-1,2\n"),
        AccountUpload::missing("B"),
    ];

    let error = merge_picklists(&uploads, &MergeOptions::default())
        .expect_err("nothing to merge");

    let MergeError::EmptyInput { outcomes } = error else {
        panic!("expected EmptyInput");
    };
    assert_eq!(outcomes.len(), 2);
    assert!(
        outcomes
            .iter()
            .all(|outcome| outcome.status == OutcomeStatus::Skipped)
    );
}

#[test]
fn case_insensitive_headers_are_opt_in() {
    let uploads = [csv_upload("A", "sku,QTY\nMUG-1,2\n")];

    let strict = merge_picklists(&uploads, &MergeOptions::default());
    assert!(matches!(strict, Err(MergeError::EmptyInput { .. })));

    let options = MergeOptions {
        case_insensitive_headers: true,
        ..MergeOptions::default()
    };
    let report = merge_picklists(&uploads, &options).expect("case-insensitive merge");
    assert_eq!(totals(&report.rows), vec![("MUG-1".to_string(), 2)]);
}
