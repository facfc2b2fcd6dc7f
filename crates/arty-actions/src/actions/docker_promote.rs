use arty_client::{DockerService, ImagePromotion, PropertyService, SearchParams, SearchService};
use arty_core::Error;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info, trace};

use crate::error::Result;
use crate::prop::Prop;
use crate::retry::Retrier;

/// Property recording when an image was promoted
pub const PROMOTED_ON_PROPERTY: &str = "promoted_on";

/// Promote one Docker image tag to one or more target tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerPromoteAction {
    /// Repository holding the image; defaults to `target_repo`
    pub source_repo: String,
    pub target_repo: String,
    /// Image name inside the repository, e.g. `github/octocat`
    pub docker_registry: String,
    /// Image name after promotion; defaults to `docker_registry`
    pub target_docker_registry: String,
    pub tag: String,
    pub target_tags: Vec<String>,
    /// Copy instead of move
    pub copy: bool,
    /// Tag the promoted folder and its contents with `promoted_on`
    pub promote_property: bool,
}

impl DockerPromoteAction {
    pub fn validate(&self) -> Result<()> {
        trace!("validating docker-promote plugin configuration");

        if self.target_repo.is_empty() {
            return Err(Error::missing_field("target repository").into());
        }
        if self.docker_registry.is_empty() {
            return Err(Error::missing_field("docker repository").into());
        }
        Ok(())
    }

    /// One payload per target tag
    ///
    /// An empty source repository means the image is promoted within
    /// `target_repo`, and an empty target registry keeps the image name.
    /// Older pipelines rely on both defaults.
    pub fn payloads(&self) -> Vec<ImagePromotion> {
        let source_repo = non_empty_or(&self.source_repo, &self.target_repo);
        let target_registry = non_empty_or(&self.target_docker_registry, &self.docker_registry);

        self.target_tags
            .iter()
            .map(|target_tag| ImagePromotion {
                source_repo: source_repo.to_string(),
                target_repo: self.target_repo.clone(),
                docker_repository: self.docker_registry.clone(),
                target_docker_repository: target_registry.to_string(),
                tag: self.tag.clone(),
                target_tag: target_tag.clone(),
                copy: self.copy,
            })
            .collect()
    }

    /// Promote every target tag in order, stopping at the first failure
    pub async fn exec<S>(&self, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: DockerService + SearchService + PropertyService + ?Sized,
    {
        trace!("running docker-promote with provided configuration");

        if self.target_tags.is_empty() {
            info!(image = %self.docker_registry, "no target tags provided, nothing to promote");
            return Ok(());
        }

        for payload in self.payloads() {
            let subject = format!(
                "{}/{}:{}",
                payload.source_repo, payload.docker_repository, payload.tag
            );
            debug!(target_tag = %payload.target_tag, payload = ?payload, "promoting target tag");

            let promotion = &payload;
            retrier
                .run("docker-promote", &subject, move || async move {
                    client.promote_docker_image(promotion).await
                })
                .await?;

            if self.promote_property {
                record_promotion(client, retrier, &payload).await?;
            }

            info!(target_tag = %payload.target_tag, "promotion ended successfully for target tag");
        }
        Ok(())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Set `promoted_on` on the promoted tag folder and everything in it
///
/// The promotion itself is not undone when this fails.
async fn record_promotion<S>(client: &S, retrier: &Retrier, payload: &ImagePromotion) -> Result<()>
where
    S: SearchService + PropertyService + ?Sized,
{
    let property = Prop::new(
        PROMOTED_ON_PROPERTY,
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    )
    .to_string();
    let folder = format!(
        "{}/{}/{}",
        payload.target_repo, payload.target_docker_repository, payload.target_tag
    );

    let searches = [
        SearchParams::new(&folder).include_dirs(true),
        SearchParams::new(format!("{}/*", folder)),
    ];

    let mut tagged = 0;
    for search in &searches {
        let outcome = tag_matches(client, retrier, search, &property).await;
        match outcome {
            Ok(count) => tagged += count,
            Err(err) => {
                error!(
                    target_tag = %payload.target_tag,
                    path = %search.pattern,
                    error = %err,
                    "unable to set promotion property, the image stays promoted"
                );
                return Err(err);
            }
        }
    }

    info!(
        target_tag = %payload.target_tag,
        property = %property,
        tagged,
        "set promotion property on promoted image"
    );
    Ok(())
}

async fn tag_matches<S>(
    client: &S,
    retrier: &Retrier,
    search: &SearchParams,
    property: &str,
) -> Result<usize>
where
    S: SearchService + PropertyService + ?Sized,
{
    let items = retrier
        .run("search", &search.pattern, move || async move {
            client.search(search).await
        })
        .await?;

    let items = &items;
    retrier
        .run("set-prop", &search.pattern, move || async move {
            client.set_properties(items, property, false).await
        })
        .await
}
