//! Monthly transaction counter.

use std::io::Write;

use crate::cli::TransactionCountArgs;
use crate::client::{AppContext, CliError, CliResult, RequestSpec};
use crate::models::TransactionCount;
use crate::output::{FormatSpec, print_list, report_domain};
use crate::response::{ERROR_TAG, decode_json};

const TRANSACTION_LIST_FORMAT: &str = "table {{ Year }}\t{{ Month }}\t{{ TransactionCount }}";
const TRANSACTION_HEADERS: &[(&str, &str)] = &[
    ("Year", "YEAR"),
    ("Month", "MONTH"),
    ("TransactionCount", "TRANSACTION COUNT"),
];

/// Transaction count for the current month, or for `year`/`month`.
pub(crate) async fn handle_get_transaction_counts(
    ctx: &AppContext,
    args: TransactionCountArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut request = RequestSpec::get(ctx.management_url(&["transactions", "count"])?);
    if let (Some(year), Some(month)) = (args.year, args.month) {
        if !(1..=12).contains(&month) {
            return Err(CliError::validation(format!(
                "invalid month {month}; expected a value between 1 and 12"
            )));
        }
        request = request
            .query("year", year.to_string())
            .query("month", format!("{month:02}"));
    }

    let raw = ctx.execute(&request).await?;
    let result = decode_json::<TransactionCount>(&raw, ERROR_TAG)?.into_result();
    if let Some(count) = report_domain(out, "getting the transaction count", result)? {
        let spec = FormatSpec::resolve(args.target.format.as_deref(), TRANSACTION_LIST_FORMAT);
        print_list(
            out,
            std::slice::from_ref(&count),
            &spec,
            TRANSACTION_HEADERS,
            "No transaction count found",
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::cli::TargetArgs;
    use crate::client::tests::context_with;

    fn args(year: Option<u16>, month: Option<u8>) -> TransactionCountArgs {
        TransactionCountArgs {
            year,
            month,
            target: TargetArgs {
                environment: "dev".to_string(),
                format: None,
            },
        }
    }

    #[tokio::test]
    async fn month_is_zero_padded_in_query() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/management/transactions/count")
                .query_param("year", "2020")
                .query_param("month", "06");
            then.status(200).json_body(json!({
                "Year": 2020,
                "Month": 6,
                "TransactionCount": 1500
            }));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_get_transaction_counts(&ctx, args(Some(2020), Some(6)), &mut out)
            .await
            .expect("count succeeds");

        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "YEAR\tMONTH\tTRANSACTION COUNT\n2020\t6\t1500\n"
        );
    }

    #[tokio::test]
    async fn current_month_has_no_query() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(GET).path("/management/transactions/count");
            then.status(200).json_body(json!({
                "Year": 2024,
                "Month": 11,
                "TransactionCount": 0
            }));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_get_transaction_counts(&ctx, args(None, None), &mut out)
            .await
            .expect("count succeeds");
        mock.assert();
        assert!(String::from_utf8(out).expect("utf8").ends_with("2024\t11\t0\n"));
    }

    #[tokio::test]
    async fn month_out_of_range_is_rejected() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_with(&server, &dir);
        let err = handle_get_transaction_counts(&ctx, args(Some(2020), Some(13)), &mut Vec::new())
            .await
            .expect_err("validation");
        assert!(matches!(err, CliError::Validation(_)));
    }
}
