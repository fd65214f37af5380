//! `search`: query the curated catalog and the provider search indexes.

use publicdata_catalog::{Catalog, CatalogEntry};

use crate::cli::SearchArgs;
use crate::client::{AppContext, CliResult, classify_provider_error};
use crate::output::render_search_results;

pub(crate) async fn handle_search(ctx: &AppContext, args: SearchArgs) -> CliResult<()> {
    let catalog = Catalog::with_default_datasets();
    let mut hits: Vec<CatalogEntry> = catalog
        .search(&args.query)
        .into_iter()
        .filter(|entry| {
            args.provider
                .as_deref()
                .is_none_or(|name| entry.provider == name)
        })
        .cloned()
        .collect();

    let targets = match args.provider.as_deref() {
        Some(name) => vec![name],
        None => ctx.registry.names(),
    };
    for name in targets {
        let provider = ctx.registry.get(name).map_err(classify_provider_error)?;
        let remote = provider
            .search(&args.query)
            .await
            .map_err(classify_provider_error)?;
        hits.extend(remote.into_iter().map(|dataset| CatalogEntry {
            dataset_id: dataset.id.clone(),
            provider: dataset.provider,
            title: dataset.title.unwrap_or(dataset.id),
            description: dataset.description.unwrap_or_default(),
        }));
    }

    render_search_results(&args.query, args.provider.as_deref(), &hits);
    Ok(())
}
