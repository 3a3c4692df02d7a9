use std::{collections::HashSet, pin::pin};

use futures::{
    future::{self, Either},
    stream::{self, StreamExt},
};
use log::{error, info};

use crate::{
    clients::{
        entities::Query,
        errors::{Error, Result},
        spotify::{CatalogClient, ResourceFetcher},
    },
    config::Config,
    reference::Reference,
    resolver::Resolver,
};

/// Resolves a batch of Spotify urls into a deduplicated set of queries
pub struct Pipeline<F> {
    resolver: Resolver<F>,
    concurrency: usize,
}

impl Pipeline<CatalogClient> {
    /// Pipeline over the HTTP catalog client described by `config`
    pub fn try_from_config(config: &Config) -> Result<Self> {
        let client = CatalogClient::try_from_config(config)?;
        Ok(Pipeline::new(
            Resolver::with_api_base(client, config.api_base.clone()),
            config.concurrency,
        ))
    }
}

impl<F: ResourceFetcher> Pipeline<F> {
    /// At least one reference is resolved at a time, whatever `concurrency` says.
    pub fn new(resolver: Resolver<F>, concurrency: usize) -> Self {
        Pipeline {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolver used for every reference
    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// Runs the whole batch.
    ///
    /// Duplicate urls, invalid urls, failed fetches and duplicate queries are
    /// logged and skipped. Fails with [`Error::EmptyResult`] when nothing was
    /// collected.
    pub async fn run<I, S>(&self, urls: I, token: &str) -> Result<HashSet<Query>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Urls are checked and decoded lazily, when the stream pulls them
        let mut visited = HashSet::new();
        let resolved = stream::iter(urls)
            .filter_map(|url| future::ready(visit(&mut visited, url.into())))
            .map(|reference| self.resolver.resolve(&reference, token));

        let mut new_queries = pin!(if self.concurrency == 1 {
            Either::Left(resolved.flatten())
        } else {
            Either::Right(resolved.flatten_unordered(self.concurrency))
        });

        let mut queries = HashSet::new();
        while let Some(query) = new_queries.next().await {
            if queries.contains(&query) {
                info!("Query already exist: {query}.");
            } else {
                info!("Query \"{query}\" was added.");
                queries.insert(query);
            }
        }

        if queries.is_empty() {
            return Err(Error::EmptyResult);
        }
        info!("Found {} track(s).", queries.len());
        Ok(queries)
    }
}

// Marks `url` as visited and decodes it. Repeated and invalid urls are
// logged and yield nothing.
fn visit(visited: &mut HashSet<String>, url: String) -> Option<Reference> {
    if visited.contains(&url) {
        info!("Url already used: {url}. Skipping to the next...");
        return None;
    }
    info!("Using url {url}...");
    let reference = Reference::decode(&url).map_err(|e| error!("{e}")).ok();
    visited.insert(url);
    reference
}
