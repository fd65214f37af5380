//! `fetch`: run a provider fetch and optionally record a run manifest.

use anyhow::anyhow;

use publicdata_http::RetryPolicy;
use publicdata_manifest::{DEFAULT_MANIFEST_NAME, build_run_manifest};
use publicdata_providers::FetchOptions;

use crate::cli::FetchArgs;
use crate::client::{AppContext, CliError, CliResult, classify_provider_error};
use crate::output::render_fetch_result;

pub(crate) async fn handle_fetch(ctx: &AppContext, args: FetchArgs) -> CliResult<()> {
    let provider = ctx
        .registry
        .get(&args.provider)
        .map_err(classify_provider_error)?;

    let options = FetchOptions {
        format_filter: args.format,
        skip_existing: !args.no_skip_existing,
        language: args.language,
        retry: RetryPolicy::default(),
    };

    let result = provider
        .fetch(&args.dataset_id, &args.output, &options)
        .await
        .map_err(classify_provider_error)?;

    render_fetch_result(&result);

    if args.manifest {
        let record = serde_json::to_value(&result)
            .map_err(|err| CliError::failure(anyhow!("failed to encode fetch result: {err}")))?;
        let manifest_path = build_run_manifest(&args.output, &[record], DEFAULT_MANIFEST_NAME)
            .map_err(CliError::failure)?;
        println!("Manifest written to {}", manifest_path.display());
    }

    Ok(())
}
